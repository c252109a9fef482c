//! cabled - cable design validation daemon and CLI

use anyhow::{Context, Result};
use cable_common::{DesignFields, ValidationRequest};
use cabled::cli::{Cli, Commands};
use cabled::output::{render_designs, render_failure, render_outcome};
use cabled::{
    server, AppState, CabledConfig, ControllerPolicy, DesignStore, HttpReasoningEngine,
    OrchestrationController,
};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so --json output stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CabledConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => serve(config, bind).await,
        Commands::Validate {
            text,
            design_json,
            id,
            json,
        } => validate(config, text, design_json, id, json).await,
        Commands::Seed => seed(&config),
        Commands::List { skip, limit, json } => list(&config, skip, limit, json),
    }
}

async fn serve(mut config: CabledConfig, bind: Option<String>) -> Result<()> {
    info!("[BOOT] cabled v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(bind_addr) = bind {
        config.server.bind_addr = bind_addr;
    }
    let state = AppState::from_config(&config)?;
    server::run(state, &config.server).await
}

async fn validate(
    config: CabledConfig,
    text: Option<String>,
    design_json: Option<String>,
    id: Option<i64>,
    json: bool,
) -> Result<()> {
    let request = ValidationRequest {
        design: design_json
            .map(|raw| serde_json::from_str::<DesignFields>(&raw))
            .transpose()
            .context("--design-json is not a valid design object")?,
        free_text: text,
        design_id: id,
    };

    let store = DesignStore::open(&config.storage.db_path)?;
    let engine = HttpReasoningEngine::new(&config.engine)?;
    let controller = OrchestrationController::new(
        Arc::new(engine),
        Arc::new(store),
        ControllerPolicy::from_config(&config),
    );

    match controller.validate(request).await {
        Ok(outcome) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print!("{}", render_outcome(&outcome));
            }
            Ok(())
        }
        Err(failure) => {
            if json {
                let body = serde_json::json!({
                    "success": false,
                    "message": failure.error.to_string(),
                    "error_code": failure.code(),
                    "stage": failure.stage,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                eprintln!("{}", render_failure(&failure));
            }
            Err(failure.into())
        }
    }
}

fn seed(config: &CabledConfig) -> Result<()> {
    let store = DesignStore::open(&config.storage.db_path)?;
    let inserted = store.seed_samples()?;
    println!(
        "Seeded {} designs into {}",
        inserted,
        config.storage.db_path.display()
    );
    Ok(())
}

fn list(config: &CabledConfig, skip: usize, limit: usize, json: bool) -> Result<()> {
    let store = DesignStore::open(&config.storage.db_path)?;
    let records = store.list(skip, limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", render_designs(&records));
    }
    Ok(())
}
