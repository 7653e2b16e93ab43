//! The `themeType` property and its palette context.

use std::fmt;
use std::str::FromStr;

use appstate_core::{ContextControl, PropertyConfig, ServerContext};
use appstate_types::ValueSet;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

pub const THEME_TYPE_KEY: &str = "themeType";
pub const THEME_TYPE_COOKIE: &str = "theme-type";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeType {
    #[default]
    Auto,
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a theme type (expected auto, light, or dark)")]
pub struct UnknownThemeType(pub String);

impl ThemeType {
    pub const ALL: [Self; 3] = [Self::Auto, Self::Light, Self::Dark];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The concrete palette type. `Auto` resolves to light.
    #[must_use]
    pub const fn resolve(self) -> Self {
        match self {
            Self::Auto | Self::Light => Self::Light,
            Self::Dark => Self::Dark,
        }
    }
}

impl fmt::Display for ThemeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeType {
    type Err = UnknownThemeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownThemeType(s.to_string()))
    }
}

/// `{"palette": {"type": "light" | "dark"}}`
#[must_use]
pub fn palette(theme_type: ThemeType) -> Value {
    json!({ "palette": { "type": theme_type.resolve().as_str() } })
}

fn supported(raw: Option<&str>, values: &ValueSet<ThemeType>) -> Option<ThemeType> {
    raw?.parse().ok().filter(|t| values.contains(t))
}

#[must_use]
pub fn theme_type_server_side(
    values: &ValueSet<ThemeType>,
    ctx: &ServerContext,
    fallback: ThemeType,
) -> ThemeType {
    let cookie = ctx.cookie(THEME_TYPE_COOKIE);
    supported(cookie, values).unwrap_or_else(|| {
        if let Some(cookie) = cookie {
            tracing::warn!(cookie, "theme type cookie is not a supported theme type");
        }
        fallback
    })
}

#[must_use]
pub fn theme_type(default_value: ThemeType) -> PropertyConfig<ThemeType> {
    PropertyConfig::new(THEME_TYPE_KEY, default_value, ThemeType::ALL)
        .sensitive()
        .cookie(THEME_TYPE_COOKIE)
        .server_value(move |values, ctx| async move {
            Ok(theme_type_server_side(&values, &ctx, default_value))
        })
        .client_value(|values, _, env| async move {
            let browser = env.browser("getThemeTypeClientSide")?;
            let stored = browser.local_storage().get(THEME_TYPE_KEY);
            Ok(supported(stored.as_deref(), &values).unwrap_or(ThemeType::Auto))
        })
        .set_value(|args| async move {
            args.ensure_valid()?;
            let browser = args.browser("setThemeType")?;
            browser.local_storage().set(THEME_TYPE_KEY, args.value.as_str());
            args.persist_cookie(THEME_TYPE_COOKIE, args.value.as_str())?;
            Ok(())
        })
        .control_context(ContextControl::sync_on_inject(|theme_type: &ThemeType| {
            palette(*theme_type)
        }))
}
