//! Command line interface of the QA Sphere MCP server.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// QA Sphere MCP server - test management tools for LLM clients.
#[derive(Parser, Debug)]
#[command(name = "qasphere-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file. Environment variables override its values.
    #[arg(short, long, default_value = "qasphere.toml")]
    pub config: PathBuf,

    /// Verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Command to run. Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serves MCP over stdin/stdout.
    Serve,

    /// Lists the tools exposed to MCP clients.
    Tools,

    /// Checks the configuration and the connection to QA Sphere.
    Doctor,

    /// Shows the version.
    Version,
}

impl Cli {
    /// The command to run, `serve` when none was given.
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}
