use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use autosuggest::cli::{Cli, Commands};
use autosuggest::commands::{ReplayOptions, SearchOptions, cmd_replay, cmd_search};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Search {
            option_url,
            term,
            base_url,
            token,
            json,
        } => {
            cmd_search(SearchOptions {
                option_url: &option_url,
                term: &term,
                base_url: base_url.as_deref(),
                token: token.as_deref(),
                json,
            })
            .await
        }
        Commands::Replay {
            config,
            script,
            steps,
            json,
        } => {
            cmd_replay(ReplayOptions {
                config: &config,
                script: script.as_deref(),
                steps: &steps,
                json,
            })
            .await
        }
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
