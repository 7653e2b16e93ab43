//! Ready-made global app state properties: `lang` and `themeType`.
//!
//! Each constructor returns a `PropertyConfig` that can be refined further
//! (e.g. with `server_values` to override the supported set) before it is
//! handed to a `Registry`.

#![allow(clippy::missing_errors_doc)]

mod lang;
mod theme;

pub use lang::{
    LANG_COOKIE, LANG_KEY, LANG_KEY_PLURAL, LangOptions, StringsLoader, lang, lang_client_side,
    lang_server_side,
};
pub use theme::{
    THEME_TYPE_COOKIE, THEME_TYPE_KEY, ThemeType, UnknownThemeType, palette, theme_type,
    theme_type_server_side,
};
