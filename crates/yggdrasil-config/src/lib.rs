//! Layered configuration for the Yggdrasil agent dispatcher.
//!
//! A [`Configuration`] is a string-keyed mapping of [`ConfigValue`]s. Layers
//! are combined with [`merge`] (later layers win on every leaf) and
//! command-line overrides of the form `KEY=VALUE` are turned into a nested
//! layer by [`parse_overrides`].

mod merge;
mod overrides;
mod value;

pub use merge::{deep_merge, merge, merge_layers};
pub use overrides::{
    coerce_value, flatten, flatten_pairs, parse_overrides, OverrideWarning, ParsedOverrides,
};
pub use value::{get_path, ConfigValue, Configuration};
