//! Server -> client round trip and the phase-2 delta

use appstate_core::{
    ContextControl, Environment, FailurePolicy, Property, PropertyConfig, Registry,
    RegistryOptions, ServerRequest, StateError,
};
use appstate_properties::{ThemeType, palette};
use appstate_types::ValueSet;
use serde_json::json;

use crate::common::{blank_browser, browser, envelope_for, hydrate};

#[tokio::test]
async fn injected_state_equals_server_state() {
    let config = || {
        PropertyConfig::new("counter", 0_i64, [0_i64, -7])
            .server_value(|_, _| async { Ok(i64::MAX) })
            .server_values(|| async { Ok(ValueSet::from([0_i64, -7, i64::MAX, i64::MIN])) })
    };
    let mut server = Property::new(config()).unwrap();
    let ctx = std::sync::Arc::new(appstate_core::ServerContext::from_request(ServerRequest::new()));
    server.initialize_state_server_side(ctx).await.unwrap();
    let wire = serde_json::to_string(&server.snapshot().unwrap()).unwrap();

    let mut client = Property::new(config()).unwrap();
    client.inject_dehydrated_state(&serde_json::from_str(&wire).unwrap()).unwrap();
    assert_eq!(client.value(), server.value());
    assert!(client.values().same_members(server.values()));
    assert_eq!(client.values().as_slice(), server.values().as_slice());
}

#[tokio::test]
async fn envelope_survives_json_transport() {
    let request = ServerRequest::new().with_cookie_header("lang=fi; theme-type=light");
    let envelope = envelope_for(request).await;
    let wire = serde_json::to_string(&envelope).unwrap();
    let (_, hydrated) = hydrate(&serde_json::from_str(&wire).unwrap());
    assert_eq!(hydrated.value("lang"), Some(&json!("fi")));
    assert_eq!(hydrated.values("languages").unwrap().len(), 3);
    assert_eq!(hydrated.value("themeType"), Some(&json!("light")));
    assert_eq!(hydrated.context("themeType"), Some(&palette(ThemeType::Light)));
    assert!(!hydrated.mounted);
}

#[tokio::test]
async fn phase2_without_client_hooks_is_a_no_op() {
    let defs = || vec![PropertyConfig::new("plain", 1_i64, [1_i64, 2]).into()];
    let mut server = Registry::new(defs(), RegistryOptions::default()).unwrap();
    let envelope = server
        .initialize_state_server_side(ServerRequest::new())
        .await
        .unwrap()
        .into_value();

    // Cookie consent has a client hook; with nothing stored it keeps the hydrated value.
    let mut client = Registry::new(defs(), RegistryOptions::default()).unwrap();
    let hydrated = client.initialize_state_client_side_phase1(&envelope).unwrap().into_value();
    let outcome = client
        .initialize_state_client_side_phase2(&hydrated, &blank_browser())
        .await
        .unwrap();
    assert!(outcome.is_clean());
    assert!(outcome.value.is_none());

    let again = client
        .initialize_state_client_side_phase2(&hydrated, &blank_browser())
        .await
        .unwrap();
    assert!(again.value.is_none());
}

#[tokio::test]
async fn phase2_picks_up_browser_preferences() {
    let envelope = envelope_for(ServerRequest::new()).await;
    let (mut client, hydrated) = hydrate(&envelope);
    assert_eq!(hydrated.value("themeType"), Some(&json!("auto")));

    let env: Environment = browser(&[("themeType", "dark")], &[], "", &["sv-SE", "en"]).into();
    let delta = client
        .initialize_state_client_side_phase2(&hydrated, &env)
        .await
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(delta.global_app_state.get("lang"), Some(&json!("sv")));
    assert_eq!(delta.global_app_state.get("themeType"), Some(&json!("dark")));
    assert!(!delta.global_app_state.contains_key("languages"));
    assert!(!delta.global_app_state.contains_key("cookieConsent"));
    assert_eq!(delta.contexts.get("themeType"), Some(&palette(ThemeType::Dark)));
}

#[tokio::test]
async fn phase2_on_the_server_is_isolated_per_property() {
    let envelope = envelope_for(ServerRequest::new()).await;
    let (mut client, hydrated) = hydrate(&envelope);
    let outcome = client
        .initialize_state_client_side_phase2(&hydrated, &Environment::Server)
        .await
        .unwrap();
    assert_eq!(outcome.failures.len(), 3);
    assert!(
        outcome
            .failures
            .iter()
            .all(|f| matches!(f.error, StateError::EnvironmentMismatch { .. }))
    );
    assert!(outcome.value.is_none());
}

#[tokio::test]
async fn fail_fast_stops_phase2_at_the_first_failure() {
    let options = RegistryOptions {
        failure_policy: FailurePolicy::FailFast,
    };
    let defs = || vec![PropertyConfig::new("plain", 1_i64, [1_i64]).into()];
    let mut client = Registry::new(defs(), options).unwrap();
    let mut server = Registry::new(defs(), options).unwrap();
    let envelope = server
        .initialize_state_server_side(ServerRequest::new())
        .await
        .unwrap()
        .into_value();
    let hydrated = client.initialize_state_client_side_phase1(&envelope).unwrap().into_value();
    let err = client
        .initialize_state_client_side_phase2(&hydrated, &Environment::Server)
        .await
        .unwrap_err();
    assert!(matches!(err, StateError::EnvironmentMismatch { .. }));
}

#[tokio::test]
async fn async_context_is_computed_after_hydration() {
    let defs = || {
        vec![
            PropertyConfig::new("greeting", "hi".to_string(), ["hi".to_string(), "hej".to_string()])
                .control_context(ContextControl::async_post_hydration(|g: String| async move {
                    Ok(json!({ "upper": g.to_uppercase() }))
                }))
                .into(),
        ]
    };
    let mut server = Registry::new(defs(), RegistryOptions::default()).unwrap();
    let envelope = server
        .initialize_state_server_side(ServerRequest::new())
        .await
        .unwrap()
        .into_value();
    assert_eq!(envelope.get("greeting").unwrap().serialized_context, None);

    let mut client = Registry::new(defs(), RegistryOptions::default()).unwrap();
    let hydrated = client.initialize_state_client_side_phase1(&envelope).unwrap().into_value();
    assert_eq!(hydrated.context("greeting"), None);
    let delta = client
        .initialize_state_client_side_phase2(&hydrated, &blank_browser())
        .await
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(delta.contexts.get("greeting"), Some(&json!({ "upper": "HI" })));
    assert!(delta.global_app_state.is_empty());
}
