//! Widget controller: applies `WidgetAction`s to `WidgetState`.
//!
//! All transitions are synchronous. The only asynchronous work, awaiting a
//! fetch or a blur timer, is handed back to the caller as an `Effect`, and
//! its completion comes back in as another action.

use std::time::Duration;

use uuid::Uuid;

use crate::config::WidgetConfig;
use crate::gateway::{Fetched, Lookup, SearchGateway};
use crate::option::OptionValue;
use crate::source::OptionSource;
use crate::widget::list::OptionList;
use crate::widget::model::{Effect, Key, Mode, WidgetAction, WidgetState, WidgetView, compute_view};
use crate::widget::selection::{CommitOutcome, SelectionStore};

/// A mounted autocomplete widget
pub struct AutocompleteWidget<S: OptionSource> {
    state: WidgetState,
    gateway: SearchGateway<S>,
    blur_close_delay: Duration,
}

impl<S: OptionSource> AutocompleteWidget<S> {
    pub fn new(config: &WidgetConfig, source: S) -> Self {
        Self::with_gateway(config, SearchGateway::new(source))
    }

    /// Mount with an existing gateway, seeding state from the configuration
    pub fn with_gateway(config: &WidgetConfig, gateway: SearchGateway<S>) -> Self {
        let mode = if config.multi { Mode::Multi } else { Mode::Single };
        let entries = config.initial_value.entries();

        let (selection, term) = match mode {
            Mode::Single => {
                let first = entries.into_iter().next();
                let term = first.as_ref().map(|e| e.label.clone()).unwrap_or_default();
                (SelectionStore::single(&config.field_name, first), term)
            }
            Mode::Multi => (SelectionStore::multi(&config.field_name, entries), String::new()),
        };

        let listbox_id = config
            .listbox_id
            .clone()
            .unwrap_or_else(|| format!("autosuggest-listbox-{}", Uuid::new_v4().simple()));

        Self {
            state: WidgetState {
                mode,
                term,
                placeholder: config.placeholder.clone(),
                is_open: false,
                is_loading: false,
                is_focused: false,
                disabled: config.disabled,
                list: OptionList::new(listbox_id),
                selection,
                close_token: 0,
            },
            gateway,
            blur_close_delay: config.blur_close_delay,
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn view(&self) -> WidgetView {
        compute_view(&self.state)
    }

    pub fn gateway(&self) -> &SearchGateway<S> {
        &self.gateway
    }

    /// Apply an action and return the effects the host must run
    pub fn dispatch(&mut self, action: WidgetAction) -> Vec<Effect> {
        if self.state.disabled && is_user_action(&action) {
            return vec![];
        }

        match action {
            WidgetAction::Focus => {
                self.state.is_focused = true;
                vec![]
            }
            WidgetAction::Blur => {
                self.state.is_focused = false;
                self.state.close_token += 1;
                vec![Effect::ScheduleClose {
                    token: self.state.close_token,
                    delay: self.blur_close_delay,
                }]
            }
            WidgetAction::CloseTimerElapsed(token) => {
                if token == self.state.close_token && !self.state.is_focused {
                    self.state.close();
                }
                vec![]
            }
            WidgetAction::InputChanged(term) => self.on_input_changed(term),
            WidgetAction::KeyDown(key) => self.on_key_down(key),
            WidgetAction::Clear => self.on_clear(),
            WidgetAction::OptionPressed(index) => {
                if !self.state.list_visible() {
                    return vec![];
                }
                self.activate(index)
            }
            WidgetAction::OptionHovered(index) => {
                if self.state.list_visible() {
                    self.state.list.highlight(index);
                }
                vec![]
            }
            WidgetAction::RemovePill(value) => self.on_remove_pill(&value),
            WidgetAction::FetchSettled(fetched) => {
                self.on_fetch_settled(fetched);
                vec![]
            }
        }
    }

    fn on_input_changed(&mut self, term: String) -> Vec<Effect> {
        self.state.term = term;
        let mut effects = vec![];

        match self.gateway.begin(&self.state.term) {
            Lookup::Ready(_) if self.state.term.is_empty() => {
                self.state.list.clear();
                self.state.close();
            }
            Lookup::Ready(options) => {
                self.state.list.render(options, false);
                self.state.is_open = true;
            }
            Lookup::Pending(pending) => {
                self.state.list.render(vec![], true);
                self.state.is_open = true;
                effects.push(Effect::Fetch(pending));
            }
        }

        self.state.is_loading = self.gateway.in_flight();
        effects
    }

    fn on_key_down(&mut self, key: Key) -> Vec<Effect> {
        if !self.state.list_visible() || !self.state.list.has_options() {
            return vec![];
        }

        match key {
            Key::ArrowDown => self.state.list.move_down(),
            Key::ArrowUp => self.state.list.move_up(),
            Key::Enter => {
                if let Some(index) = self.state.list.highlighted() {
                    return self.activate(index);
                }
            }
            Key::Escape => self.state.close(),
        }
        vec![]
    }

    /// Commit the option at `index` and close the list
    fn activate(&mut self, index: usize) -> Vec<Effect> {
        let Some(option) = self.state.list.option_at(index).cloned() else {
            return vec![];
        };

        let outcome = self.state.selection.commit(&option);
        self.state.close();

        match outcome {
            CommitOutcome::Replaced => {
                self.state.term = option.label;
            }
            CommitOutcome::Added => {
                self.state.term.clear();
            }
            CommitOutcome::Duplicate => {
                tracing::debug!("'{}' is already selected", option.value);
                return vec![];
            }
        }
        vec![Effect::Changed(self.state.selection.hidden_fields())]
    }

    fn on_clear(&mut self) -> Vec<Effect> {
        if !self.state.selection.clear() {
            tracing::debug!("clear ignored in multi mode");
            return vec![];
        }

        self.gateway.cancel();
        self.state.term.clear();
        self.state.list.clear();
        self.state.close();
        self.state.is_loading = false;
        self.state.is_focused = true;
        vec![Effect::Changed(self.state.selection.hidden_fields())]
    }

    fn on_remove_pill(&mut self, value: &OptionValue) -> Vec<Effect> {
        if self.state.selection.remove(value) {
            vec![Effect::Changed(self.state.selection.hidden_fields())]
        } else {
            vec![]
        }
    }

    fn on_fetch_settled(&mut self, fetched: Fetched) {
        if let Some(request) = fetched.request {
            if !self.gateway.is_current(request) {
                tracing::debug!("discarding stale result for '{}' ({request})", fetched.term);
                return;
            }
        }

        self.state.is_loading = self.gateway.in_flight();
        self.state.list.render(fetched.options, self.state.is_loading);
        // A list closed by blur stays closed until the input is used again.
        self.state.is_open = self.state.is_open || self.state.is_focused;
    }
}

impl<S: OptionSource> Drop for AutocompleteWidget<S> {
    fn drop(&mut self) {
        self.gateway.cancel();
    }
}

fn is_user_action(action: &WidgetAction) -> bool {
    !matches!(
        action,
        WidgetAction::FetchSettled(_) | WidgetAction::CloseTimerElapsed(_)
    )
}
