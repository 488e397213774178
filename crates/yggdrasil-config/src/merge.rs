//! Configuration merge logic
//!
//! Layers are applied left to right:
//! - Mappings on both sides: deep-merge by key
//! - Anything else: the later value replaces the earlier one wholesale,
//!   whichever side held the mapping

use crate::value::{ConfigValue, Configuration};

/// Deep merge `overlay` into `base`, consuming both.
pub fn deep_merge(mut base: Configuration, overlay: Configuration) -> Configuration {
    for (key, overlay_value) in overlay {
        let merged = match (base.remove(&key), overlay_value) {
            (Some(ConfigValue::Map(base_map)), ConfigValue::Map(overlay_map)) => {
                ConfigValue::Map(deep_merge(base_map, overlay_map))
            }
            (_, overlay_value) => overlay_value,
        };
        base.insert(key, merged);
    }
    base
}

/// Merge layers in order (first is base, last has highest precedence).
pub fn merge_layers<I>(layers: I) -> Configuration
where
    I: IntoIterator<Item = Configuration>,
{
    layers.into_iter().fold(Configuration::new(), deep_merge)
}

/// Merge `overrides` onto a copy of `base` without touching the inputs.
pub fn merge(base: &Configuration, overrides: &[&Configuration]) -> Configuration {
    overrides
        .iter()
        .fold(base.clone(), |acc, layer| deep_merge(acc, (*layer).clone()))
}
