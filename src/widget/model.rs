//! Widget model types for testable state management
//!
//! This module separates state (`WidgetState`) from view (`WidgetView`) so the
//! widget can be exercised without any host environment. The controller
//! drives `WidgetState` through `WidgetAction`s; hosts render `WidgetView`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::SuggestError;
use crate::gateway::{Fetched, PendingFetch};
use crate::option::OptionValue;
use crate::widget::list::{OptionList, Row};
use crate::widget::selection::{HiddenField, SelectionStore};

/// Selection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Single,
    Multi,
}

/// Keys the widget reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` name
    pub fn from_dom(name: &str) -> Option<Key> {
        match name {
            "ArrowDown" | "Down" => Some(Key::ArrowDown),
            "ArrowUp" | "Up" => Some(Key::ArrowUp),
            "Enter" => Some(Key::Enter),
            "Escape" | "Esc" => Some(Key::Escape),
            _ => None,
        }
    }

    /// Map a legacy `KeyboardEvent.keyCode`
    pub fn from_key_code(code: u32) -> Option<Key> {
        match code {
            40 => Some(Key::ArrowDown),
            38 => Some(Key::ArrowUp),
            13 => Some(Key::Enter),
            27 => Some(Key::Escape),
            _ => None,
        }
    }
}

impl FromStr for Key {
    type Err = SuggestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::from_dom(s)
            .or_else(|| s.parse::<u32>().ok().and_then(Key::from_key_code))
            .or_else(|| match s.to_lowercase().as_str() {
                "down" => Some(Key::ArrowDown),
                "up" => Some(Key::ArrowUp),
                "enter" | "return" => Some(Key::Enter),
                "escape" | "esc" => Some(Key::Escape),
                _ => None,
            })
            .ok_or_else(|| SuggestError::Other(format!("unknown key '{}'", s)))
    }
}

/// All events the widget handles
#[derive(Debug)]
pub enum WidgetAction {
    /// The input gained focus
    Focus,
    /// The input lost focus; the list closes after the blur delay
    Blur,
    /// The input text changed
    InputChanged(String),
    /// A key was pressed in the input
    KeyDown(Key),
    /// The clear button was pressed (single mode)
    Clear,
    /// Pointer press on the option row at this index
    OptionPressed(usize),
    /// Pointer moved over the option row at this index
    OptionHovered(usize),
    /// The removal control of the pill with this value was pressed (multi mode)
    RemovePill(OptionValue),
    /// An issued fetch settled
    FetchSettled(Fetched),
    /// A blur-close timer elapsed
    CloseTimerElapsed(u64),
}

/// Side effects requested by a transition; the host executes them
#[derive(Debug)]
pub enum Effect {
    /// Await this fetch and dispatch `FetchSettled` with its result
    Fetch(PendingFetch),
    /// Dispatch `CloseTimerElapsed(token)` after `delay`
    ScheduleClose { token: u64, delay: Duration },
    /// The committed selection changed; these are the new form fields
    Changed(Vec<HiddenField>),
}

/// Raw state that changes during user interaction
#[derive(Debug, Clone)]
pub struct WidgetState {
    pub mode: Mode,
    /// Current text of the input (the search term)
    pub term: String,
    pub placeholder: String,
    /// Whether the option list is open
    pub is_open: bool,
    /// Whether a search request is in flight
    pub is_loading: bool,
    pub is_focused: bool,
    pub disabled: bool,
    pub list: OptionList,
    pub selection: SelectionStore,
    /// Latest blur token; older close timers are ignored
    pub close_token: u64,
}

impl WidgetState {
    /// The list is shown only while open with at least one row
    pub fn list_visible(&self) -> bool {
        self.is_open && self.list.row_count() > 0
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn clear_visible(&self) -> bool {
        self.mode == Mode::Single && !self.disabled && !self.is_loading && !self.term.is_empty()
    }
}

/// ARIA attributes of the combobox input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AriaState {
    pub role: &'static str,
    pub autocomplete: &'static str,
    pub haspopup: &'static str,
    pub expanded: bool,
    /// Id of the listbox element
    pub controls: String,
    pub active_descendant: Option<String>,
}

/// A committed entry shown as a removable chip (multi mode)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pill {
    pub value: OptionValue,
    pub label: String,
}

/// Computed view model for rendering the widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetView {
    pub input_value: String,
    pub placeholder: String,
    pub focused: bool,
    pub disabled: bool,
    pub loading_visible: bool,
    pub clear_visible: bool,
    pub list_visible: bool,
    /// Rendered rows; empty while the list is hidden
    pub rows: Vec<Row>,
    pub pills: Vec<Pill>,
    pub hidden_fields: Vec<HiddenField>,
    pub aria: AriaState,
}

impl WidgetView {
    /// Index and row of the highlighted option, if any
    pub fn highlighted(&self) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| matches!(row, Row::Option(r) if r.highlighted))
    }

    /// Number of selectable option rows (placeholders excluded)
    pub fn option_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| matches!(row, Row::Option(_)))
            .count()
    }
}

/// Pure function: compute the view model from state
pub fn compute_view(state: &WidgetState) -> WidgetView {
    let list_visible = state.list_visible();
    let rows = if list_visible {
        state.list.rows(&state.selection)
    } else {
        vec![]
    };

    let pills = match state.mode {
        Mode::Multi => state
            .selection
            .entries()
            .iter()
            .filter_map(|entry| {
                entry.value.as_ref().map(|value| Pill {
                    value: value.clone(),
                    label: entry.label.clone(),
                })
            })
            .collect(),
        Mode::Single => vec![],
    };

    WidgetView {
        input_value: state.term.clone(),
        placeholder: state.placeholder.clone(),
        focused: state.is_focused,
        disabled: state.disabled,
        loading_visible: state.is_loading,
        clear_visible: state.clear_visible(),
        list_visible,
        rows,
        pills,
        hidden_fields: state.selection.hidden_fields(),
        aria: AriaState {
            role: "combobox",
            autocomplete: "list",
            haspopup: "listbox",
            expanded: list_visible,
            controls: state.list.listbox_id().to_string(),
            active_descendant: if list_visible {
                state.list.active_descendant()
            } else {
                None
            },
        },
    }
}

impl fmt::Display for WidgetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input {:?}", self.input_value)?;
        if self.input_value.is_empty() && !self.placeholder.is_empty() {
            write!(f, " placeholder={:?}", self.placeholder)?;
        }
        for (flag, label) in [
            (self.focused, "focused"),
            (self.disabled, "disabled"),
            (self.loading_visible, "loading"),
            (self.clear_visible, "clear"),
        ] {
            if flag {
                write!(f, " {}", label)?;
            }
        }
        writeln!(f)?;

        for row in &self.rows {
            match row {
                Row::Option(r) => {
                    let marker = if r.highlighted { ">" } else { " " };
                    write!(f, "{} {} [{}]", marker, r.option.label, r.option.value)?;
                    if r.exists {
                        write!(f, " (exists)")?;
                    }
                    writeln!(f)?;
                }
                Row::Placeholder(p) => writeln!(f, "~ {}", p.text())?,
            }
        }

        for pill in &self.pills {
            writeln!(f, "pill {} [{}]", pill.label, pill.value)?;
        }

        for field in &self.hidden_fields {
            writeln!(f, "field {}={}", field.name, field.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_dom_names() {
        assert_eq!(Key::from_dom("ArrowDown"), Some(Key::ArrowDown));
        assert_eq!(Key::from_dom("ArrowUp"), Some(Key::ArrowUp));
        assert_eq!(Key::from_dom("Enter"), Some(Key::Enter));
        assert_eq!(Key::from_dom("Escape"), Some(Key::Escape));
        assert_eq!(Key::from_dom("a"), None);
    }

    #[test]
    fn test_key_from_legacy_codes() {
        assert_eq!(Key::from_key_code(40), Some(Key::ArrowDown));
        assert_eq!(Key::from_key_code(38), Some(Key::ArrowUp));
        assert_eq!(Key::from_key_code(13), Some(Key::Enter));
        assert_eq!(Key::from_key_code(27), Some(Key::Escape));
        assert_eq!(Key::from_key_code(65), None);
    }

    #[test]
    fn test_key_from_str() {
        assert_eq!("down".parse::<Key>().unwrap(), Key::ArrowDown);
        assert_eq!("13".parse::<Key>().unwrap(), Key::Enter);
        assert_eq!("Esc".parse::<Key>().unwrap(), Key::Escape);
        assert!("tab".parse::<Key>().is_err());
    }

    fn state() -> WidgetState {
        WidgetState {
            mode: Mode::Single,
            term: String::new(),
            placeholder: "Search".to_string(),
            is_open: false,
            is_loading: false,
            is_focused: false,
            disabled: false,
            list: OptionList::new("lb"),
            selection: SelectionStore::single("F", None),
            close_token: 0,
        }
    }

    #[test]
    fn test_view_hides_rows_when_closed() {
        let mut state = state();
        state
            .list
            .render(vec![crate::option::SuggestOption::new("1", "Smith")], false);
        let view = compute_view(&state);
        assert!(!view.list_visible);
        assert!(view.rows.is_empty());
        assert!(!view.aria.expanded);
        assert!(view.aria.active_descendant.is_none());

        state.is_open = true;
        let view = compute_view(&state);
        assert!(view.list_visible);
        assert_eq!(view.highlighted(), Some(0));
        assert_eq!(view.aria.active_descendant.as_deref(), Some("lb-option-0"));
    }

    #[test]
    fn test_view_open_without_rows_is_hidden() {
        let mut state = state();
        state.is_open = true;
        assert!(!compute_view(&state).list_visible);
    }

    #[test]
    fn test_clear_button_visibility() {
        let mut state = state();
        assert!(!state.clear_visible());

        state.term = "Smith".to_string();
        assert!(state.clear_visible());

        state.is_loading = true;
        assert!(!state.clear_visible());

        state.is_loading = false;
        state.mode = Mode::Multi;
        assert!(!state.clear_visible());
    }

    #[test]
    fn test_view_display() {
        let state = state();
        insta::assert_snapshot!(compute_view(&state).to_string(), @r#"
        input "" placeholder="Search"
        field F={"label":"","value":null}
        "#);
    }
}
