//! Option list renderer
//!
//! Holds the rendered result set and the highlight. Rows are computed on
//! demand so that "exists" markers always reflect the current selection.

use crate::option::SuggestOption;
use crate::widget::selection::SelectionStore;

pub const LOADING_TEXT: &str = "Loading...";
pub const NO_OPTIONS_TEXT: &str = "No matching options";

/// Non-selectable row shown instead of options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Loading,
    NoMatches,
}

impl Placeholder {
    pub fn text(&self) -> &'static str {
        match self {
            Placeholder::Loading => LOADING_TEXT,
            Placeholder::NoMatches => NO_OPTIONS_TEXT,
        }
    }
}

/// One rendered option row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRow {
    /// Element id used for `aria-activedescendant`
    pub id: String,
    pub option: SuggestOption,
    pub highlighted: bool,
    /// Multi mode: already selected, cannot be committed again
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Option(OptionRow),
    Placeholder(Placeholder),
}

/// The rendered list and its highlight index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionList {
    listbox_id: String,
    options: Vec<SuggestOption>,
    placeholder: Option<Placeholder>,
    highlighted: Option<usize>,
}

impl OptionList {
    pub fn new(listbox_id: impl Into<String>) -> Self {
        Self {
            listbox_id: listbox_id.into(),
            options: Vec::new(),
            placeholder: None,
            highlighted: None,
        }
    }

    pub fn listbox_id(&self) -> &str {
        &self.listbox_id
    }

    /// Replace the result set. An empty set renders a placeholder; a
    /// non-empty one highlights the first row.
    pub fn render(&mut self, options: Vec<SuggestOption>, loading: bool) {
        self.highlighted = if options.is_empty() { None } else { Some(0) };
        self.placeholder = match (options.is_empty(), loading) {
            (false, _) => None,
            (true, true) => Some(Placeholder::Loading),
            (true, false) => Some(Placeholder::NoMatches),
        };
        self.options = options;
    }

    /// Drop every row, placeholders included
    pub fn clear(&mut self) {
        self.options.clear();
        self.placeholder = None;
        self.highlighted = None;
    }

    pub fn option_id(&self, index: usize) -> String {
        format!("{}-option-{}", self.listbox_id, index)
    }

    pub fn options(&self) -> &[SuggestOption] {
        &self.options
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    /// Options plus placeholder rows
    pub fn row_count(&self) -> usize {
        self.options.len() + usize::from(self.placeholder.is_some())
    }

    pub fn placeholder(&self) -> Option<Placeholder> {
        self.placeholder
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn highlighted_option(&self) -> Option<&SuggestOption> {
        self.highlighted.and_then(|i| self.options.get(i))
    }

    pub fn option_at(&self, index: usize) -> Option<&SuggestOption> {
        self.options.get(index)
    }

    /// Id of the highlighted row, for `aria-activedescendant`
    pub fn active_descendant(&self) -> Option<String> {
        self.highlighted.map(|i| self.option_id(i))
    }

    /// Highlight a row directly (pointer hover); out-of-range is ignored
    pub fn highlight(&mut self, index: usize) {
        if index < self.options.len() {
            self.highlighted = Some(index);
        }
    }

    /// Move the highlight down, wrapping from the last row to the first
    pub fn move_down(&mut self) {
        let count = self.options.len();
        if count == 0 {
            self.highlighted = None;
            return;
        }
        self.highlighted = Some(match self.highlighted {
            Some(i) if i + 1 < count => i + 1,
            _ => 0,
        });
    }

    /// Move the highlight up, wrapping from the first row to the last
    pub fn move_up(&mut self) {
        let count = self.options.len();
        if count == 0 {
            self.highlighted = None;
            return;
        }
        self.highlighted = Some(match self.highlighted {
            Some(i) if i > 0 && i < count => i - 1,
            _ => count - 1,
        });
    }

    /// Rows as they should be displayed
    pub fn rows(&self, selection: &SelectionStore) -> Vec<Row> {
        if let Some(placeholder) = self.placeholder {
            return vec![Row::Placeholder(placeholder)];
        }
        let mark_existing = selection.is_multi();
        self.options
            .iter()
            .enumerate()
            .map(|(idx, option)| {
                Row::Option(OptionRow {
                    id: self.option_id(idx),
                    option: option.clone(),
                    highlighted: self.highlighted == Some(idx),
                    exists: mark_existing && selection.contains(&option.value),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::FieldValue;

    fn list_with(count: usize) -> OptionList {
        let mut list = OptionList::new("lb");
        let options = (0..count)
            .map(|i| SuggestOption::new(format!("{i}"), format!("Option {i}")))
            .collect();
        list.render(options, false);
        list
    }

    #[test]
    fn test_render_highlights_first_row() {
        let list = list_with(3);
        assert_eq!(list.highlighted(), Some(0));
        assert_eq!(list.active_descendant().as_deref(), Some("lb-option-0"));
        assert_eq!(list.row_count(), 3);
    }

    #[test]
    fn test_render_after_navigation_resets_highlight() {
        let mut list = list_with(3);
        list.move_down();
        list.move_down();
        assert_eq!(list.highlighted(), Some(2));

        list.render(vec![SuggestOption::new("a", "A"), SuggestOption::new("b", "B")], false);
        assert_eq!(list.highlighted(), Some(0));
    }

    #[test]
    fn test_move_up_wraps_to_last() {
        let mut list = list_with(4);
        list.move_up();
        assert_eq!(list.highlighted(), Some(3));
    }

    #[test]
    fn test_move_down_wraps_to_first() {
        let mut list = list_with(4);
        list.highlight(3);
        list.move_down();
        assert_eq!(list.highlighted(), Some(0));
    }

    #[test]
    fn test_single_row_wraps_onto_itself() {
        let mut list = list_with(1);
        list.move_down();
        assert_eq!(list.highlighted(), Some(0));
        list.move_up();
        assert_eq!(list.highlighted(), Some(0));
    }

    #[test]
    fn test_empty_list_has_no_highlight() {
        let mut list = OptionList::new("lb");
        list.move_down();
        list.move_up();
        assert_eq!(list.highlighted(), None);
        assert!(list.highlighted_option().is_none());
    }

    #[test]
    fn test_hover_out_of_range_is_ignored() {
        let mut list = list_with(2);
        list.highlight(1);
        list.highlight(9);
        assert_eq!(list.highlighted(), Some(1));
    }

    #[test]
    fn test_placeholders() {
        let store = SelectionStore::single("F", None);
        let mut list = OptionList::new("lb");

        list.render(vec![], true);
        assert_eq!(list.rows(&store), vec![Row::Placeholder(Placeholder::Loading)]);
        assert_eq!(list.row_count(), 1);
        assert!(list.active_descendant().is_none());

        list.render(vec![], false);
        assert_eq!(list.rows(&store), vec![Row::Placeholder(Placeholder::NoMatches)]);

        list.clear();
        assert_eq!(list.row_count(), 0);
        assert!(list.rows(&store).is_empty());
    }

    #[test]
    fn test_rows_mark_existing_in_multi_mode() {
        let store = SelectionStore::multi(
            "Tags[]",
            vec![FieldValue::from(&SuggestOption::new("1", "Option 1"))],
        );
        let list = list_with(3);
        let exists: Vec<bool> = list
            .rows(&store)
            .into_iter()
            .map(|row| match row {
                Row::Option(r) => r.exists,
                Row::Placeholder(_) => false,
            })
            .collect();
        assert_eq!(exists, vec![false, true, false]);
    }

    #[test]
    fn test_rows_never_mark_existing_in_single_mode() {
        let store = SelectionStore::single("F", Some(FieldValue::from(&SuggestOption::new("0", "Option 0"))));
        let list = list_with(2);
        assert!(list.rows(&store).iter().all(|row| matches!(row, Row::Option(r) if !r.exists)));
    }
}
