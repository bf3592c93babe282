use std::path::PathBuf;

use clap::Parser;

/// Roam LLM gateway
#[derive(Debug, Parser)]
#[command(name = "roam", about = "Ask the Roam travel assistant through the LLM gateway")]
pub struct Args {
    /// Path to configuration file; provider keys are read from the
    /// environment when it does not exist
    #[arg(short, long, default_value = "roam.toml", env = "ROAM_CONFIG")]
    pub config: PathBuf,

    /// Logical model to ask instead of the configured default
    #[arg(short, long, env = "ROAM_MODEL")]
    pub model: Option<String>,

    /// Replace the assistant persona
    #[arg(short, long)]
    pub system: Option<String>,

    /// Print the models that can currently serve requests and exit
    #[arg(long)]
    pub list_models: bool,

    /// Message to send; read from stdin when omitted
    pub prompt: Option<String>,
}
