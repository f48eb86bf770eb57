mod replay;
mod search;

pub use replay::{ReplayOptions, Step, cmd_replay, format_view, parse_script};
pub use search::{SearchOptions, cmd_search};

use crate::error::Result;

/// Print a JSON value to stdout, pretty-printed
pub fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
