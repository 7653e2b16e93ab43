//! The `lang` property.
//!
//! Resolution order on the server: `lang` cookie, then `Accept-Language`,
//! then the default. On the client: local storage, session storage, the
//! browser's language list, then the hydrated value.

use std::future::Future;
use std::sync::Arc;

use appstate_core::{Browser, ContextControl, HookFuture, PropertyConfig, ServerContext};
use appstate_types::ValueSet;
use appstate_utils::preferred_languages;
use futures_util::FutureExt;
use serde_json::Value;

pub const LANG_KEY: &str = "lang";
pub const LANG_KEY_PLURAL: &str = "languages";
pub const LANG_COOKIE: &str = "lang";

/// Produces the string resources for a language.
pub type StringsLoader = Arc<dyn Fn(String) -> HookFuture<Value> + Send + Sync>;

pub struct LangOptions {
    pub default_value: String,
    pub supported: Vec<String>,
    /// When set, the loaded strings become the property's server-computed context.
    pub strings: Option<StringsLoader>,
}

impl LangOptions {
    #[must_use]
    pub fn new(
        default_value: impl Into<String>,
        supported: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            default_value: default_value.into(),
            supported: supported.into_iter().map(Into::into).collect(),
            strings: None,
        }
    }

    #[must_use]
    pub fn strings<F, Fut>(mut self, loader: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let loader: StringsLoader = Arc::new(move |lang: String| loader(lang).boxed());
        self.strings = Some(loader);
        self
    }
}

/// First two characters of a language tag (`"sv-SE"` -> `"sv"`).
fn primary(tag: &str) -> &str {
    tag.char_indices().nth(2).map_or(tag, |(end, _)| &tag[..end])
}

#[must_use]
pub fn lang_server_side(
    supported: &ValueSet<String>,
    ctx: &ServerContext,
    fallback: &str,
) -> String {
    if let Some(cookie) = ctx.cookie(LANG_COOKIE) {
        let lang = primary(cookie).to_string();
        if supported.contains(&lang) {
            tracing::debug!(lang = %lang, "language from cookie");
            return lang;
        }
        tracing::warn!(cookie, "language cookie is not a supported language");
    }
    if let Some(header) = ctx.accept_language() {
        let accepted = preferred_languages(header);
        if let Some(range) = accepted.iter().find(|range| supported.contains(&range.lang)) {
            tracing::debug!(lang = %range.lang, header, "language from Accept-Language");
            return range.lang.clone();
        }
        tracing::debug!(header, "no accepted language is supported");
    }
    fallback.to_string()
}

#[must_use]
pub fn lang_client_side(
    supported: &ValueSet<String>,
    existing: String,
    browser: &Browser,
) -> String {
    let stored = [browser.local_storage(), browser.session_storage()]
        .into_iter()
        .find_map(|storage| storage.get(LANG_KEY).filter(|lang| supported.contains(lang)));
    if let Some(lang) = stored {
        return lang;
    }
    let lang = browser
        .languages()
        .iter()
        .map(|tag| primary(tag).to_string())
        .find(|lang| supported.contains(lang))
        .unwrap_or(existing);
    browser.session_storage().set(LANG_KEY, &lang);
    lang
}

#[must_use]
pub fn lang(options: LangOptions) -> PropertyConfig<String> {
    let fallback = options.default_value.clone();
    let config = PropertyConfig::new(LANG_KEY, options.default_value, options.supported)
        .key_plural(LANG_KEY_PLURAL)
        .cookie(LANG_COOKIE)
        .server_value(move |supported, ctx| {
            let fallback = fallback.clone();
            async move { Ok(lang_server_side(&supported, &ctx, &fallback)) }
        })
        .client_value(|supported, existing, env| async move {
            let browser = env.browser("getLangClientSide")?;
            Ok(lang_client_side(&supported, existing, browser))
        })
        .set_value(|args| async move {
            args.ensure_valid()?;
            let browser = args.browser("setLang")?;
            browser.local_storage().set(LANG_KEY, &args.value);
            if args.cookie_consent == Some(true) {
                browser.cookies().set(LANG_COOKIE, &args.value);
            } else {
                tracing::debug!(
                    lang = %args.value,
                    "no cookie consent; language cookie not written"
                );
            }
            Ok(())
        });
    match options.strings {
        Some(loader) => config.control_context(ContextControl::server_computed(
            move |lang: String| loader(lang),
        )),
        None => config,
    }
}
