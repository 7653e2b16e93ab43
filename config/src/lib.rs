//! `appstate.toml` loading.
//!
//! ```toml
//! [lang]
//! default = "en"
//! supported = ["en", "sv", "fi"]
//!
//! [theme]
//! default = "auto"
//!
//! [cookies]
//! max_age_seconds = 31536000
//!
//! [hydration]
//! failure_policy = "isolate"   # or "fail_fast"
//! ```
//!
//! Every section and field is optional. A missing file means defaults.

use std::path::{Path, PathBuf};
use std::{env, fs};

use appstate_core::{FailurePolicy, RegistryOptions};
use appstate_properties::{LangOptions, ThemeType};
use appstate_utils::DEFAULT_COOKIE_MAX_AGE;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "APPSTATE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "appstate.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config at {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Invalid { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppStateConfig {
    pub lang: LangConfig,
    pub theme: ThemeConfig,
    pub cookies: CookieConfig,
    pub hydration: HydrationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LangConfig {
    pub default: String,
    pub supported: Vec<String>,
}

impl Default for LangConfig {
    fn default() -> Self {
        Self {
            default: "en".to_string(),
            supported: vec!["en".to_string()],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub default: ThemeType,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    pub max_age_seconds: u64,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            max_age_seconds: DEFAULT_COOKIE_MAX_AGE,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HydrationConfig {
    pub failure_policy: FailurePolicy,
}

/// `explicit`, else `$APPSTATE_CONFIG`, else `./appstate.toml`.
#[must_use]
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

impl AppStateConfig {
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = config_path(explicit);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        Self::parse(&content, path)
    }

    /// Parses and validates `content`; `path` is only used for error reporting.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = match toml::from_str(content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        config.validate().map_err(|message| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.lang.supported.is_empty() {
            return Err("[lang] supported must list at least one language".to_string());
        }
        if !self.lang.supported.contains(&self.lang.default) {
            return Err(format!(
                "[lang] default `{}` is not one of the supported languages",
                self.lang.default
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            failure_policy: self.hydration.failure_policy,
        }
    }

    #[must_use]
    pub fn lang_options(&self) -> LangOptions {
        LangOptions::new(self.lang.default.clone(), self.lang.supported.iter().cloned())
    }
}
