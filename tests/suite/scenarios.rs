//! End-to-end behavior of the built-in properties

use appstate_core::{
    AppStateContext, Environment, PropertyConfig, Registry, RegistryOptions, ServerRequest,
    StateError,
};
use serde_json::json;

use crate::common::{browser, envelope_for, hydrate};

#[tokio::test]
async fn lang_cookie_with_region_resolves_to_primary_tag() {
    let envelope = envelope_for(ServerRequest::new().with_cookie_header("lang=sv-SE")).await;
    assert_eq!(envelope.get("lang").unwrap().value, json!("sv"));
}

#[tokio::test]
async fn accept_language_is_used_without_cookie() {
    let envelope = envelope_for(ServerRequest::new().with_accept_language("fi,en;q=0.5")).await;
    assert_eq!(envelope.get("lang").unwrap().value, json!("fi"));
}

#[tokio::test]
async fn consent_cookie_is_read_and_withdrawal_purges_cookies() {
    let header = "cookie-consent=true; theme-type=dark";
    let envelope = envelope_for(ServerRequest::new().with_cookie_header(header)).await;
    assert_eq!(envelope.get("cookieConsent").unwrap().value, json!(true));
    assert_eq!(envelope.get("themeType").unwrap().value, json!("dark"));

    let (client, hydrated) = hydrate(&envelope);
    let b = browser(&[("cookieConsent", "true")], &[], header, &[]);
    let context = AppStateContext::new(&client, hydrated, Environment::from(b.clone()));
    context.merge(None);

    context.set("setCookieConsent", false).await.unwrap();
    assert_eq!(context.value::<Option<bool>>("cookieConsent"), Some(Some(false)));
    assert_eq!(b.cookies().get("cookie-consent"), None);
    assert_eq!(b.cookies().get("theme-type"), None);
    assert_eq!(b.local_storage().get("cookieConsent"), None);
}

#[test]
fn auto_plural_collision_fails_registration() {
    let values = ["light".to_string(), "dark".to_string()];
    let theme = PropertyConfig::new("theme", "light".to_string(), values);
    let themes = PropertyConfig::new("themes", "light".to_string(), ["light".to_string()]);
    let err =
        Registry::new(vec![theme.into(), themes.into()], RegistryOptions::default()).unwrap_err();
    assert!(matches!(err, StateError::NonUniqueKey { .. }), "{err}");
}

#[test]
fn setter_name_collision_fails_registration() {
    let a = PropertyConfig::new("x", 0u8, [0u8]);
    let b = PropertyConfig::new("y", 0u8, [0u8]).key_plural("setX");
    let err = Registry::new(vec![a.into(), b.into()], RegistryOptions::default()).unwrap_err();
    assert!(matches!(err, StateError::NonUniqueKey { ref name, .. } if name == "setX"));
}
