pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod option;
pub mod source;
pub mod widget;

pub use config::{InitialValue, WidgetConfig};
pub use error::{Result, SuggestError};
pub use gateway::{FetchOutcome, Fetched, Lookup, PendingFetch, RequestId, SearchGateway};
pub use option::{FieldValue, OptionValue, SuggestOption, normalize_options};
pub use source::{HttpOptionSource, OptionSource};
pub use widget::{
    AutocompleteWidget, Effect, HiddenField, Key, Mode, WidgetAction, WidgetHandle, WidgetView,
};
