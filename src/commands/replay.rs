//! `autosuggest replay`: drive a mounted widget with scripted events.
//!
//! A script is one step per line (`#` starts a comment):
//!
//! ```text
//! focus
//! type Smi
//! key down
//! key enter
//! blur
//! wait 250
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use owo_colors::OwoColorize;

use crate::commands::print_json;
use crate::config::WidgetConfig;
use crate::error::{Result, SuggestError};
use crate::option::OptionValue;
use crate::source::HttpOptionSource;
use crate::widget::{Key, Row, WidgetAction, WidgetHandle, WidgetView};

/// Upper bound on how long a step may wait for its fetch to settle
const SETTLE_TIMEOUT: Duration = Duration::from_secs(35);

/// One scripted user event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Focus,
    Blur,
    Type(String),
    Key(Key),
    Press(usize),
    Hover(usize),
    Clear,
    Remove(OptionValue),
    Wait(Duration),
}

impl Step {
    /// The widget action for this step; `None` for a pause
    pub fn action(&self) -> Option<WidgetAction> {
        match self {
            Step::Focus => Some(WidgetAction::Focus),
            Step::Blur => Some(WidgetAction::Blur),
            Step::Type(term) => Some(WidgetAction::InputChanged(term.clone())),
            Step::Key(key) => Some(WidgetAction::KeyDown(*key)),
            Step::Press(index) => Some(WidgetAction::OptionPressed(*index)),
            Step::Hover(index) => Some(WidgetAction::OptionHovered(*index)),
            Step::Clear => Some(WidgetAction::Clear),
            Step::Remove(value) => Some(WidgetAction::RemovePill(value.clone())),
            Step::Wait(_) => None,
        }
    }
}

impl FromStr for Step {
    type Err = SuggestError;

    /// Accepts `verb arg` or `verb:arg`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (verb, arg) = match s.find([' ', ':']) {
            Some(idx) => (&s[..idx], &s[idx + 1..]),
            None => (s, ""),
        };

        let index = |arg: &str| {
            arg.trim()
                .parse::<usize>()
                .map_err(|_| SuggestError::Other(format!("'{}' expects a row index", verb)))
        };

        match verb.to_lowercase().as_str() {
            "focus" => Ok(Step::Focus),
            "blur" => Ok(Step::Blur),
            // The term is taken verbatim so that trailing spaces survive
            "type" => Ok(Step::Type(arg.to_string())),
            "key" => Ok(Step::Key(arg.trim().parse()?)),
            "press" => Ok(Step::Press(index(arg)?)),
            "hover" => Ok(Step::Hover(index(arg)?)),
            "clear" => Ok(Step::Clear),
            "remove" => Ok(Step::Remove(OptionValue::from(arg.trim()))),
            "wait" => {
                let millis = arg.trim().parse::<u64>().map_err(|_| {
                    SuggestError::Other("'wait' expects a duration in milliseconds".to_string())
                })?;
                Ok(Step::Wait(Duration::from_millis(millis)))
            }
            _ => Err(SuggestError::Other(format!("unknown step '{}'", s))),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Focus => write!(f, "focus"),
            Step::Blur => write!(f, "blur"),
            Step::Type(term) => write!(f, "type {:?}", term),
            Step::Key(key) => write!(f, "key {:?}", key),
            Step::Press(index) => write!(f, "press {}", index),
            Step::Hover(index) => write!(f, "hover {}", index),
            Step::Clear => write!(f, "clear"),
            Step::Remove(value) => write!(f, "remove {}", value),
            Step::Wait(delay) => write!(f, "wait {}ms", delay.as_millis()),
        }
    }
}

/// Parse a script, skipping blank lines and `#` comments
pub fn parse_script(content: &str) -> Result<Vec<Step>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| {
            line.parse()
                .map_err(|e| SuggestError::Other(format!("line {}: {}", n + 1, e)))
        })
        .collect()
}

/// Options for the replay command
pub struct ReplayOptions<'a> {
    pub config: &'a Path,
    pub script: Option<&'a Path>,
    pub steps: &'a [String],
    pub json: bool,
}

/// Mount a widget from `config`, play the steps and print each resulting view
pub async fn cmd_replay(options: ReplayOptions<'_>) -> Result<()> {
    let config = WidgetConfig::load(options.config)?;

    let mut steps = match options.script {
        Some(path) => parse_script(&fs::read_to_string(path)?)?,
        None => vec![],
    };
    for raw in options.steps {
        steps.push(raw.parse()?);
    }

    let source = HttpOptionSource::from_config(&config)?;
    let handle = WidgetHandle::mount(&config, source);

    if !options.json {
        println!("{}", "mount".bold());
        print!("{}", format_view(&handle.view()));
    }

    for step in &steps {
        let view = play(&handle, step).await?;
        if !options.json {
            println!("{}", step.to_string().bold());
            print!("{}", format_view(&view));
        }
    }

    let fields = handle.view().hidden_fields;
    handle.dispose().await;

    if options.json {
        print_json(&serde_json::to_value(&fields)?)?;
    }
    Ok(())
}

/// Play one step and return the view once any fetch it started has settled
async fn play(handle: &WidgetHandle, step: &Step) -> Result<WidgetView> {
    let Some(action) = step.action() else {
        if let Step::Wait(delay) = step {
            tokio::time::sleep(*delay).await;
        }
        return Ok(handle.view());
    };

    let view = handle.apply(action).await?;
    if view.loading_visible {
        handle
            .wait_until(SETTLE_TIMEOUT, |v| !v.loading_visible)
            .await
    } else {
        Ok(view)
    }
}

/// Colored rendering of a view for the terminal
pub fn format_view(view: &WidgetView) -> String {
    let mut out = String::new();

    let input = if view.input_value.is_empty() && !view.placeholder.is_empty() {
        view.placeholder.dimmed().to_string()
    } else {
        format!("{:?}", view.input_value)
    };
    let mut flags = vec![];
    if view.focused {
        flags.push("focused");
    }
    if view.disabled {
        flags.push("disabled");
    }
    if view.loading_visible {
        flags.push("loading");
    }
    if view.clear_visible {
        flags.push("[x]");
    }
    out.push_str(&format!("  [{}] {}\n", input, flags.join(" ").dimmed()));

    for pill in &view.pills {
        out.push_str(&format!("  {} {}\n", "●".magenta(), pill.label));
    }

    for row in &view.rows {
        match row {
            Row::Option(r) if r.highlighted => {
                out.push_str(&format!("  {} {}\n", ">".cyan(), r.option.label.cyan().bold()));
            }
            Row::Option(r) if r.exists => {
                out.push_str(&format!("    {} {}\n", r.option.label.dimmed(), "(selected)".dimmed()));
            }
            Row::Option(r) => out.push_str(&format!("    {}\n", r.option.label)),
            Row::Placeholder(p) => out.push_str(&format!("    {}\n", p.text().dimmed().italic())),
        }
    }

    for field in &view.hidden_fields {
        out.push_str(&format!("  {} {}\n", field.name.green(), field.value));
    }
    out
}
