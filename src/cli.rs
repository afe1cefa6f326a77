// cli.rs - Command-line interface configuration
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "hero-shapes")]
#[command(about = "Interactive floating shapes", long_about = None)]
pub struct Cli {
    /// Path to a JSON config file
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Disable UI elements and console output
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,

    /// Run without audio output
    #[arg(long = "mute", default_value = "false")]
    pub mute: bool,

    /// Seed the random draws for a reproducible session
    #[arg(long = "seed")]
    pub seed: Option<u64>,
}
