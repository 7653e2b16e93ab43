//! appstate CLI - runs one request through the full hydration round trip.
//!
//! ```text
//! server registry  --initialize_state_server_side(request)-->  Envelope (JSON)
//! client registry  --phase1(envelope)-->  HydratedState
//!                  --phase2(hydrated, browser)-->  DeltaState
//! AppStateContext  --merge(delta), set(...)-->  final state + cookie directives
//! ```
//!
//! Each step is printed to stdout as JSON. Logs go to stderr.

mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use appstate_config::AppStateConfig;
use appstate_core::{
    AppStateContext, Browser, Environment, Outcome, PropertyDefinition, Registry, ServerRequest,
};
use appstate_properties::{lang, theme_type};
use appstate_utils::{CookieJar, MemoryStorage, StorageKind};

use args::Args;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn definitions(config: &AppStateConfig) -> Vec<PropertyDefinition> {
    vec![lang(config.lang_options()).into(), theme_type(config.theme.default).into()]
}

fn report<T>(step: &str, outcome: &Outcome<T>) {
    for failure in &outcome.failures {
        tracing::warn!(
            step,
            key = %failure.key,
            error = %failure.error,
            "property kept its previous state"
        );
    }
}

fn print_json(label: &str, value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {label}"))?;
    println!("# {label}\n{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = AppStateConfig::load(args.config.as_deref())?;

    let mut request = ServerRequest::new();
    if let Some(cookie) = &args.cookie {
        request = request.with_cookie_header(cookie.clone());
    }
    if let Some(header) = &args.accept_language {
        request = request.with_accept_language(header.clone());
    }

    let mut server = Registry::new(definitions(&config), config.registry_options())?;
    let outcome = server.initialize_state_server_side(request).await?;
    report("server", &outcome);
    let envelope = outcome.into_value();
    print_json("envelope", &envelope)?;

    let mut client = Registry::new(definitions(&config), config.registry_options())?;
    let outcome = client.initialize_state_client_side_phase1(&envelope)?;
    report("phase1", &outcome);
    let hydrated = outcome.into_value();
    print_json("phase 1", &hydrated)?;

    let max_age = config.cookies.max_age_seconds;
    let cookies = match &args.cookie {
        Some(header) => CookieJar::from_header(header, max_age),
        None => CookieJar::new(max_age),
    };
    let browser = Browser::new(
        Arc::new(MemoryStorage::new(StorageKind::Local)),
        Arc::new(MemoryStorage::new(StorageKind::Session)),
        Arc::new(cookies),
        args.navigator_languages.clone(),
    );
    let env = Environment::from(browser.clone());
    let outcome = client.initialize_state_client_side_phase2(&hydrated, &env).await?;
    report("phase2", &outcome);
    let delta = outcome.into_value();
    print_json("phase 2 delta", &delta)?;

    let context = AppStateContext::new(&client, hydrated, env);
    context.merge(delta);
    for (setter, value) in args.set {
        context
            .set(&setter, &value)
            .await
            .with_context(|| format!("{setter}({value}) failed"))?;
    }
    print_json("state", &context.snapshot())?;
    print_json("cookie directives", &browser.cookies().directives())?;

    Ok(())
}
