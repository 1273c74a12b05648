//! # SSO Settings Command Line
//!
//! Resolves provider settings and runs checks against the configured store,
//! printing JSON on stdout.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use ssosettings::{
    access::{ACTION_SETTINGS_READ, Requester},
    checks::{CheckRunner, CheckSpec, ListFormatValidation, SsoSettingCheck, ssosetting::CHECK_ID},
    config::ConfigLoader,
    context::RequestContext,
    db,
    repositories::SsoSettingsRepository,
    service::SsoSettingsService,
    telemetry,
};

#[derive(Debug, Parser)]
#[command(name = "ssosettings", version, about = "Inspect SSO provider settings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the effective settings of one provider
    Get { provider: String },
    /// List effective settings, optionally restricted to the given read scopes
    List {
        /// Granted scope, e.g. `settings:auth.github`; repeatable
        #[arg(long = "scope")]
        scopes: Vec<String>,
    },
    /// Run the settings checks
    Check {
        /// Only check this provider
        #[arg(long)]
        provider: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load()
        .context("Failed to load configuration")?;
    telemetry::init_tracing(&config)?;
    tracing::debug!(profile = %config.profile, "Loaded configuration");

    let db = db::init_pool(&config).await?;
    db::migrate(&db).await?;
    db::health_check(&db).await?;

    let store = Arc::new(SsoSettingsRepository::new(Arc::new(db)));
    let service = Arc::new(SsoSettingsService::from_config(&config, store));

    let ctx = RequestContext::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            canceller.cancel();
        }
    });

    match cli.command {
        Command::Get { provider } => {
            let record = service.get_for_provider(&ctx, &provider).await?;
            print_json(&record)?;
        }
        Command::List { scopes } => {
            let requester = if scopes.is_empty() {
                Requester::service()
            } else {
                scopes
                    .into_iter()
                    .fold(Requester::new("cli"), |requester, scope| {
                        requester.with_permission(ACTION_SETTINGS_READ, scope)
                    })
            };
            let records = service.list(&ctx, &requester).await?;
            print_json(&records)?;
        }
        Command::Check { provider } => {
            let check = SsoSettingCheck::new(
                service.clone(),
                ListFormatValidation::from_config(&config),
            );
            let runner = CheckRunner::new(vec![Arc::new(check)]);
            let spec = CheckSpec::new();

            match provider {
                Some(provider) => {
                    let report = runner.run_item(&ctx, &spec, CHECK_ID, &provider).await?;
                    print_json(&report)?;
                }
                None => {
                    let reports = runner.run(&ctx, &spec).await?;
                    print_json(&reports)?;
                }
            }
        }
    }

    Ok(())
}
