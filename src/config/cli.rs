use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "port-ingest")]
#[command(about = "Load a ports JSON document into an in-memory store")]
pub struct CliConfig {
    /// Path to the ports JSON file [default: ports.json]
    #[arg(long)]
    pub file: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Port ID to print as JSON once ingestion finishes (repeatable)
    #[arg(long = "get", value_name = "ID")]
    pub lookups: Vec<String>,

    /// Seconds to wait for a cancelled run to stop [default: 5]
    #[arg(long)]
    pub shutdown_grace_secs: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log process CPU and memory usage")]
    pub monitor: bool,
}
