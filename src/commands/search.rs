//! `autosuggest search`: one gateway lookup against a live endpoint

use owo_colors::OwoColorize;
use serde_json::json;

use crate::commands::print_json;
use crate::error::Result;
use crate::gateway::{FetchOutcome, SearchGateway};
use crate::source::HttpOptionSource;

/// Options for the search command
pub struct SearchOptions<'a> {
    pub option_url: &'a str,
    pub term: &'a str,
    pub base_url: Option<&'a str>,
    pub token: Option<&'a str>,
    pub json: bool,
}

/// Query the endpoint for `term` and print the normalized options
pub async fn cmd_search(options: SearchOptions<'_>) -> Result<()> {
    let mut source = HttpOptionSource::new(options.option_url)?;
    if let Some(base) = options.base_url {
        source = source.with_base_url(base);
    }
    if let Some(token) = options.token {
        source = source.with_security_token(token);
    }
    let url = source.search_url(options.term)?;

    let gateway = SearchGateway::new(source);
    let fetched = gateway.fetch(options.term).await;

    if options.json {
        return print_json(&json!({
            "url": url.as_str(),
            "term": fetched.term,
            "outcome": format!("{:?}", fetched.outcome).to_lowercase(),
            "options": fetched.options,
        }));
    }

    println!("{} {}", "GET".bold(), url);
    match fetched.outcome {
        FetchOutcome::Failed => {
            println!("{}", "Request failed (see the warning above)".red());
        }
        _ if fetched.options.is_empty() => println!("{}", "No matching options".dimmed()),
        _ => {
            for option in &fetched.options {
                println!("{:>8}  {}", option.value.to_string().cyan(), option.label);
            }
        }
    }
    Ok(())
}
