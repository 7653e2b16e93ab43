//! Shared test utilities and fixtures
//!
//! Builds registries and browsers the way an application bootstrap would.

#![allow(dead_code)]

use std::sync::Arc;

use appstate_core::{
    Browser, Environment, PropertyDefinition, Registry, RegistryOptions, ServerRequest,
};
use appstate_properties::{LangOptions, ThemeType, lang, theme_type};
use appstate_types::{Envelope, HydratedState};
use appstate_utils::{CookieJar, MemoryStorage, StorageKind};

pub const SUPPORTED: [&str; 3] = ["en", "sv", "fi"];

pub fn lang_options() -> LangOptions {
    LangOptions::new("en", SUPPORTED)
}

/// `lang` and `themeType`; cookie consent is appended by the registry.
pub fn definitions() -> Vec<PropertyDefinition> {
    vec![lang(lang_options()).into(), theme_type(ThemeType::Auto).into()]
}

pub fn registry() -> Registry {
    Registry::new(definitions(), RegistryOptions::default()).unwrap()
}

pub async fn envelope_for(request: ServerRequest) -> Envelope {
    let mut server = registry();
    let outcome = server.initialize_state_server_side(request).await.unwrap();
    assert!(outcome.is_clean(), "server failures: {:?}", outcome.failures);
    outcome.into_value()
}

/// A client registry after phase 1, along with the hydrated state.
pub fn hydrate(envelope: &Envelope) -> (Registry, HydratedState) {
    let mut client = registry();
    let hydrated = client.initialize_state_client_side_phase1(envelope).unwrap().into_value();
    (client, hydrated)
}

pub fn browser(
    local: &[(&str, &str)],
    session: &[(&str, &str)],
    cookie_header: &str,
    languages: &[&str],
) -> Browser {
    Browser::new(
        Arc::new(MemoryStorage::with_items(StorageKind::Local, local.iter().copied())),
        Arc::new(MemoryStorage::with_items(StorageKind::Session, session.iter().copied())),
        Arc::new(CookieJar::from_header(cookie_header, 60)),
        languages.iter().map(ToString::to_string).collect(),
    )
}

pub fn blank_browser() -> Environment {
    Environment::from(browser(&[], &[], "", &[]))
}
