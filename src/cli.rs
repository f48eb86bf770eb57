use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "autosuggest")]
#[command(about = "Headless autocomplete widget for search endpoints")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query a search endpoint once and print the normalized options
    #[command(visible_alias = "s")]
    Search {
        /// Search endpoint, absolute or relative to --base-url
        option_url: String,

        /// Search term (empty resolves locally to no options)
        #[arg(default_value = "")]
        term: String,

        /// Base URL for a relative endpoint
        #[arg(long)]
        base_url: Option<String>,

        /// Security token sent as X-SecurityID
        #[arg(long, env = "AUTOSUGGEST_SECURITY_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mount a widget and drive it with scripted events
    Replay {
        /// Widget configuration file (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Script file with one step per line
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Steps to play after the script, e.g. "type Smi" "key enter"
        steps: Vec<String>,

        /// Print only the final hidden fields, as JSON
        #[arg(long)]
        json: bool,
    },
}
