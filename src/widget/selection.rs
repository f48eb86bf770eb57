//! Selection store: the committed value(s) and their hidden form fields

use serde::Serialize;

use crate::option::{FieldValue, OptionValue, SuggestOption};

/// A hidden input the host form submits
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HiddenField {
    pub name: String,
    pub value: String,
}

/// Result of committing an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Single mode: the stored pair was replaced
    Replaced,
    /// Multi mode: a new entry was appended
    Added,
    /// Multi mode: the value was already selected; nothing changed
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    /// Always holds a pair; the tombstone when nothing is chosen
    Single(FieldValue),
    /// Insertion-ordered, unique by value
    Multi(Vec<FieldValue>),
}

/// Committed selection mirrored into the host form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionStore {
    field_name: String,
    selection: Selection,
}

impl SelectionStore {
    /// Single-mode store seeded with `initial` (tombstone when absent)
    pub fn single(field_name: impl Into<String>, initial: Option<FieldValue>) -> Self {
        Self {
            field_name: field_name.into(),
            selection: Selection::Single(initial.unwrap_or_else(FieldValue::tombstone)),
        }
    }

    /// Multi-mode store seeded with `initial`, dropping duplicate values
    pub fn multi(field_name: impl Into<String>, initial: Vec<FieldValue>) -> Self {
        let mut store = Self {
            field_name: field_name.into(),
            selection: Selection::Multi(Vec::with_capacity(initial.len())),
        };
        for entry in initial {
            store.push_unique(entry);
        }
        store
    }

    pub fn is_multi(&self) -> bool {
        matches!(self.selection, Selection::Multi(_))
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Commit an activated option
    pub fn commit(&mut self, option: &SuggestOption) -> CommitOutcome {
        let entry = FieldValue::from(option);
        match &mut self.selection {
            Selection::Single(current) => {
                *current = entry;
                CommitOutcome::Replaced
            }
            Selection::Multi(_) => {
                if self.push_unique(entry) {
                    CommitOutcome::Added
                } else {
                    CommitOutcome::Duplicate
                }
            }
        }
    }

    fn push_unique(&mut self, entry: FieldValue) -> bool {
        let Some(value) = entry.value.as_ref() else {
            return false;
        };
        if self.contains(value) {
            return false;
        }
        if let Selection::Multi(entries) = &mut self.selection {
            entries.push(entry);
            return true;
        }
        false
    }

    /// Whether `value` is already committed
    pub fn contains(&self, value: &OptionValue) -> bool {
        self.entries()
            .iter()
            .filter_map(|e| e.value.as_ref())
            .any(|v| v.same_as(value))
    }

    /// Write the tombstone. Single mode only; returns false in multi mode.
    pub fn clear(&mut self) -> bool {
        match &mut self.selection {
            Selection::Single(current) => {
                *current = FieldValue::tombstone();
                true
            }
            Selection::Multi(_) => false,
        }
    }

    /// Remove the multi-mode entry matching `value`
    pub fn remove(&mut self, value: &OptionValue) -> bool {
        match &mut self.selection {
            Selection::Multi(entries) => {
                let before = entries.len();
                entries.retain(|e| !e.value.as_ref().is_some_and(|v| v.same_as(value)));
                entries.len() != before
            }
            Selection::Single(_) => false,
        }
    }

    /// Committed pairs: one (possibly the tombstone) in single mode
    pub fn entries(&self) -> &[FieldValue] {
        match &self.selection {
            Selection::Single(current) => std::slice::from_ref(current),
            Selection::Multi(entries) => entries,
        }
    }

    /// The single-mode pair, if not the tombstone
    pub fn current(&self) -> Option<&FieldValue> {
        match &self.selection {
            Selection::Single(current) if !current.is_tombstone() => Some(current),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match &self.selection {
            Selection::Single(current) => usize::from(!current.is_tombstone()),
            Selection::Multi(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hidden inputs the host form submits, in selection order.
    ///
    /// Single mode always yields exactly one field (the tombstone when
    /// cleared); multi mode yields one field per entry, all sharing the name.
    pub fn hidden_fields(&self) -> Vec<HiddenField> {
        self.entries()
            .iter()
            .map(|entry| HiddenField {
                name: self.field_name.clone(),
                value: entry.to_field_json(),
            })
            .collect()
    }
}
