//! CLI - Command-line argument parsing
//!
//! Keeps argument parsing separate from execution logic in main.rs.

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

/// Cable design validation service
#[derive(Parser, Debug)]
#[command(name = "cabled")]
#[command(about = "Validate cable designs against IEC 60502-1 / IEC 60228", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to /etc/cabled/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Override server.bind_addr
        #[arg(long)]
        bind: Option<String>,
    },

    /// Validate one design and print the verdict
    #[command(group(ArgGroup::new("input").required(true).args(["text", "design_json", "id"])))]
    Validate {
        /// Free-text description of the cable
        #[arg(long)]
        text: Option<String>,

        /// Structured design as a JSON object
        #[arg(long)]
        design_json: Option<String>,

        /// Id of a stored design
        #[arg(long)]
        id: Option<i64>,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Insert the sample designs into an empty store
    Seed,

    /// List stored designs
    List {
        #[arg(long, default_value_t = 0)]
        skip: usize,

        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },
}
