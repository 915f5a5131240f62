use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toolpilot_core::config::{AppConfig, TransportKind};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "toolpilot",
    version,
    about = "Answer queries with a language model and MCP tools"
)]
pub struct Cli {
    /// Configuration file (defaults to config/client.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Transport kind: local-pipe, http-stream or event-stream
    #[arg(long, global = true)]
    pub mode: Option<TransportKind>,
    /// Tool server script path or URL
    #[arg(long, global = true)]
    pub target: Option<String>,
    #[arg(long, global = true)]
    pub max_iterations: Option<usize>,
    #[arg(long, global = true)]
    pub model: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP front door
    Serve {
        /// Bind address, overriding the configured one
        #[arg(long)]
        addr: Option<String>,
    },
    /// Answer one query and print the outcome as JSON
    Ask {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
}

impl Cli {
    /// Flags win over file and environment.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(kind) = self.mode {
            config.transport.kind = kind;
        }
        if let Some(target) = &self.target {
            config.transport.target = target.clone();
        }
        if let Some(max_iterations) = self.max_iterations {
            config.agent.max_iterations = max_iterations.max(1);
        }
        if let Some(model) = &self.model {
            config.model.model = model.clone();
        }
        if let Command::Serve { addr: Some(addr) } = &self.command {
            config.rest.addr = addr.clone();
        }
        debug!(
            kind = %config.transport.kind,
            target = %config.transport.target,
            model = %config.model.model,
            "Applied command line overrides"
        );
    }
}
