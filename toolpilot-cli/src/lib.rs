//! Command line and HTTP front door for toolpilot.

pub mod answer;
pub mod cli;
pub mod server;

use clap::Parser;
use cli::{Cli, Command};
use serde_json::json;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use toolpilot_core::{Agent, AppConfig};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

/// Parse the command line and run the chosen command.
pub async fn run() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    debug!(command = ?cli.command, config = ?cli.config, "CLI arguments parsed");

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    info!(
        kind = %config.transport.kind,
        target = %config.transport.target,
        model = %config.model.model,
        max_iterations = config.agent.max_iterations,
        "Configuration loaded"
    );

    let agent = Arc::new(Agent::from_config(&config));
    match cli.command {
        Command::Serve { .. } => {
            let addr: SocketAddr = config.rest.addr.parse()?;
            info!(%addr, "Starting HTTP front door");
            server::serve(agent, addr).await?;
        }
        Command::Ask { query } => {
            let query = query.join(" ");
            let outcome = agent.process_query(query.trim()).await?;
            let output = json!({
                "status": outcome.status,
                "model_calls": outcome.model_calls,
                "answer": answer::extract_answer(outcome.answer()),
                "turns": outcome.turns,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    info!("toolpilot finished");
    Ok(())
}

pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
