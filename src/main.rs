// src/main.rs

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use fxresolve::{
    CommandLineSettings, EnvironmentSettings, SettingsResolver, resolve_frameworks_for_app,
};
use tracing::info;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let command_line = CommandLineSettings::from_args(
        cli.fx_version.as_deref(),
        cli.roll_forward.as_deref(),
        cli.roll_forward_on_no_candidate_fx.as_deref(),
    )?;
    let environment = EnvironmentSettings::from_env()?;
    let settings = SettingsResolver::new(command_line, environment);

    let roots = cli.search_roots();
    info!(
        "Searching {}",
        roots
            .iter()
            .map(|root| root.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let resolution = resolve_frameworks_for_app(&cli.app_config, roots, &settings)
        .with_context(|| format!("Failed to resolve frameworks for {}", cli.app_config.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&resolution.to_json())?);
    } else {
        for framework in &resolution.frameworks {
            println!("{} {}", framework.name, framework.version);
        }
    }
    Ok(())
}
