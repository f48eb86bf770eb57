//! The autocomplete widget: state machine, list, selection and runtime handle

pub mod controller;
pub mod driver;
pub mod list;
pub mod model;
pub mod selection;

pub use controller::AutocompleteWidget;
pub use driver::WidgetHandle;
pub use list::{OptionList, OptionRow, Placeholder, Row};
pub use model::{
    AriaState, Effect, Key, Mode, Pill, WidgetAction, WidgetState, WidgetView, compute_view,
};
pub use selection::{CommitOutcome, HiddenField, SelectionStore};
