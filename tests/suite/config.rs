//! Config file drives registry construction

use std::io::Write;

use appstate_config::AppStateConfig;
use appstate_core::{FailurePolicy, Registry, ServerRequest};
use appstate_properties::{lang, theme_type};
use serde_json::json;

#[tokio::test]
async fn config_defaults_flow_into_properties() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[lang]
default = "fi"
supported = ["en", "fi"]

[theme]
default = "dark"

[hydration]
failure_policy = "fail_fast"
"#
    )
    .unwrap();
    let config = AppStateConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.registry_options().failure_policy, FailurePolicy::FailFast);

    let mut registry = Registry::new(
        vec![lang(config.lang_options()).into(), theme_type(config.theme.default).into()],
        config.registry_options(),
    )
    .unwrap();
    let envelope = registry
        .initialize_state_server_side(ServerRequest::new().with_accept_language("de,sv;q=0.8"))
        .await
        .unwrap()
        .into_value();
    assert_eq!(envelope.get("lang").unwrap().value, json!("fi"));
    assert_eq!(envelope.get("lang").unwrap().values, [json!("en"), json!("fi")]);
    assert_eq!(envelope.get("themeType").unwrap().value, json!("dark"));
}

#[test]
fn invalid_config_is_reported_with_its_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[lang]\ndefault = \"sv\"\nsupported = [\"en\"]").unwrap();
    let err = AppStateConfig::load(Some(file.path())).unwrap_err();
    assert_eq!(err.path(), file.path());
}
