//! The app state context after hydration

use appstate_core::{AppStateContext, Browser, Environment, ServerRequest, StateError};
use appstate_properties::{ThemeType, palette};
use serde_json::json;

use crate::common::{browser, envelope_for, hydrate};

async fn mounted(cookie_header: &str, local: &[(&str, &str)]) -> (AppStateContext, Browser) {
    let envelope = envelope_for(ServerRequest::new().with_cookie_header(cookie_header)).await;
    let (mut client, hydrated) = hydrate(&envelope);
    let b = browser(local, &[], cookie_header, &[]);
    let env = Environment::from(b.clone());
    let delta = client
        .initialize_state_client_side_phase2(&hydrated, &env)
        .await
        .unwrap()
        .into_value();
    let context = AppStateContext::new(&client, hydrated, env);
    context.merge(delta);
    (context, b)
}

#[tokio::test]
async fn theme_cookie_is_gated_on_consent() {
    let (context, b) = mounted("", &[]).await;
    context.set("setThemeType", ThemeType::Dark).await.unwrap();
    assert_eq!(b.local_storage().get("themeType").as_deref(), Some("dark"));
    assert_eq!(b.cookies().get("theme-type"), None);
    assert_eq!(context.provider("themeType").unwrap().current(), Some(palette(ThemeType::Dark)));

    context.set("setCookieConsent", true).await.unwrap();
    assert_eq!(b.cookies().get("theme-type").as_deref(), Some("dark"));
    context.set("setThemeType", ThemeType::Light).await.unwrap();
    assert_eq!(b.cookies().get("theme-type").as_deref(), Some("light"));
    assert_eq!(b.cookies().get("cookie-consent").as_deref(), Some("true"));
}

#[tokio::test]
async fn lang_setter_persists_and_validates() {
    let (context, b) = mounted("lang=fi", &[]).await;
    assert_eq!(context.value::<String>("lang").as_deref(), Some("fi"));

    context.set("setLang", "sv").await.unwrap();
    assert_eq!(context.value::<String>("lang").as_deref(), Some("sv"));
    assert_eq!(b.local_storage().get("lang").as_deref(), Some("sv"));
    assert_eq!(b.cookies().get("lang").as_deref(), Some("fi"));

    context.set("setCookieConsent", true).await.unwrap();
    context.set("setLang", "sv").await.unwrap();
    assert_eq!(b.cookies().get("lang").as_deref(), Some("sv"));

    let err = context.set("setLang", "de").await.unwrap_err();
    assert!(matches!(err, StateError::InvalidValue { .. }));
    assert_eq!(context.value::<String>("lang").as_deref(), Some("sv"));
}

#[tokio::test]
async fn merge_reflects_client_preferences() {
    let (context, _) = mounted("", &[("themeType", "dark"), ("cookieConsent", "true")]).await;
    let state = context.snapshot();
    assert!(state.mounted);
    assert_eq!(state.value("themeType"), Some(&json!("dark")));
    assert_eq!(state.value("cookieConsent"), Some(&json!(true)));
    assert_eq!(state.context("themeType"), Some(&palette(ThemeType::Dark)));
}

#[tokio::test]
async fn subscribers_see_setter_updates() {
    let (context, _) = mounted("", &[]).await;
    let mut rx = context.subscribe();
    context.set("setLang", "fi").await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().value("lang"), Some(&json!("fi")));
}

#[tokio::test]
async fn withdrawn_consent_keeps_lang_cookie_unset() {
    let (context, b) = mounted("", &[]).await;
    context.set("setCookieConsent", true).await.unwrap();
    context.set("setLang", "fi").await.unwrap();
    assert_eq!(b.cookies().get("lang").as_deref(), Some("fi"));

    context.set("setCookieConsent", false).await.unwrap();
    assert_eq!(b.cookies().get("lang"), None);
    context.set("setLang", "sv").await.unwrap();
    assert_eq!(context.value::<Option<bool>>("cookieConsent"), Some(Some(false)));
    assert_eq!(b.cookies().get("lang"), None);
}

#[tokio::test]
async fn consent_changes_reach_sensitive_properties() {
    let (context, b) = mounted("", &[]).await;
    b.session_storage().set("themeType", "dark");
    context.set("setThemeType", ThemeType::Dark).await.unwrap();
    b.local_storage().remove("themeType");
    assert_eq!(b.cookies().get("theme-type"), None);

    context.set("setCookieConsent", true).await.unwrap();
    assert_eq!(b.cookies().get("theme-type").as_deref(), Some("dark"));
    assert_eq!(b.local_storage().get("themeType").as_deref(), Some("dark"));
    assert_eq!(b.cookies().get("cookie-consent").as_deref(), Some("true"));

    context.set("setCookieConsent", false).await.unwrap();
    assert_eq!(b.local_storage().get("themeType"), None);
    assert!(b.cookies().cookies().is_empty());
    assert_eq!(context.value::<ThemeType>("themeType"), Some(ThemeType::Dark));
}
