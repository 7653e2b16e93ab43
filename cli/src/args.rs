//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;

/// Runs one request through server rendering and two-phase client hydration.
#[derive(Parser, Debug, Default, PartialEq)]
#[command(name = "appstate")]
#[command(version)]
pub struct Args {
    /// Config file (defaults to $APPSTATE_CONFIG, then ./appstate.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// `Cookie` header sent with the request; also seeds the browser cookie jar
    #[arg(long)]
    pub cookie: Option<String>,

    /// `Accept-Language` header sent with the request
    #[arg(long)]
    pub accept_language: Option<String>,

    /// The browser's preferred languages, most preferred first (comma-separated)
    #[arg(long, value_delimiter = ',', value_parser = parse_language)]
    pub navigator_languages: Vec<String>,

    /// Setter call made after hydration, as SETTER=VALUE; repeatable
    #[arg(long = "set", value_name = "SETTER=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, Value)>,
}

fn parse_language(raw: &str) -> Result<String, String> {
    let lang = raw.trim();
    if lang.is_empty() {
        return Err("empty language tag".to_string());
    }
    Ok(lang.to_string())
}

/// `VALUE` is read as JSON when it parses, otherwise as a plain string.
fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let Some((setter, value)) = raw.split_once('=') else {
        return Err(format!("expected SETTER=VALUE, got `{raw}`"));
    };
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((setter.to_string(), value))
}
