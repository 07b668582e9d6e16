//! Command-line arguments.

use std::net::SocketAddr;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "paperlens")]
#[command(about = "Upload research papers, summarize them with a hosted model and compare them")]
#[command(version)]
pub struct Cli {
    /// Address for the web gateway (overrides PAPERLENS_BIND)
    #[arg(long, env = "PAPERLENS_BIND")]
    pub bind: Option<SocketAddr>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Validate configuration and exit without serving
    #[arg(long)]
    pub check: bool,
}
