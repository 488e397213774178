//! `KEY=VALUE` override parsing.
//!
//! Keys are dot-separated paths into a nested [`Configuration`]; values are
//! coerced to a [`ConfigValue`] by [`coerce_value`]. [`flatten`] is the
//! inverse used when re-invoking the dispatcher with a resolved
//! configuration.

use crate::value::{ConfigValue, Configuration};

/// A token that could not be applied. The rest of the batch still is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverrideWarning {
    #[error("invalid override '{token}': expected KEY=VALUE")]
    MissingEquals { token: String },

    #[error("cannot set '{key}': '{segment}' is not a mapping")]
    NotAMapping { key: String, segment: String },
}

/// Result of parsing one batch of override tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOverrides {
    pub config: Configuration,
    pub warnings: Vec<OverrideWarning>,
}

/// Parse override tokens into a nested configuration.
///
/// Every skipped token is logged at warn level and recorded in
/// [`ParsedOverrides::warnings`]. Later tokens win on an identical path.
pub fn parse_overrides<S: AsRef<str>>(tokens: &[S]) -> ParsedOverrides {
    let mut parsed = ParsedOverrides::default();

    for token in tokens {
        let token = token.as_ref();
        let Some((key, raw_value)) = token.split_once('=') else {
            let warning = OverrideWarning::MissingEquals {
                token: token.to_string(),
            };
            tracing::warn!("{}", warning);
            parsed.warnings.push(warning);
            continue;
        };

        let segments: Vec<&str> = key.split('.').collect();
        if let Err(segment) = assign(&mut parsed.config, &segments, coerce_value(raw_value)) {
            let warning = OverrideWarning::NotAMapping {
                key: key.to_string(),
                segment,
            };
            tracing::warn!("{}", warning);
            parsed.warnings.push(warning);
        }
    }

    parsed
}

/// Walk `segments` into `root`, creating intermediate mappings, and set the
/// leaf. Returns the blocking segment when an intermediate holds a scalar.
fn assign(root: &mut Configuration, segments: &[&str], value: ConfigValue) -> Result<(), String> {
    let Some((leaf, parents)) = segments.split_last() else {
        return Ok(());
    };

    let mut current = root;
    for segment in parents {
        let slot = current
            .entry((*segment).to_string())
            .or_insert_with(|| ConfigValue::Map(Configuration::new()));
        match slot {
            ConfigValue::Map(next) => current = next,
            _ => return Err((*segment).to_string()),
        }
    }

    current.insert((*leaf).to_string(), value);
    Ok(())
}

/// Coerce a raw override value.
///
/// Checked in order: `true`/`false` (any case), ASCII digits (integer),
/// ASCII digits with exactly one `.` (float), otherwise the string itself.
/// A digit run too large for `i64` stays a string.
pub fn coerce_value(raw: &str) -> ConfigValue {
    if raw.eq_ignore_ascii_case("true") {
        return ConfigValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return ConfigValue::Bool(false);
    }

    let digits = raw.bytes().filter(u8::is_ascii_digit).count();
    let dots = raw.bytes().filter(|b| *b == b'.').count();
    let only_digits_and_dots = digits + dots == raw.len();

    if digits > 0 && only_digits_and_dots {
        match dots {
            0 => {
                if let Ok(i) = raw.parse::<i64>() {
                    return ConfigValue::Int(i);
                }
            }
            1 => {
                if let Ok(f) = raw.parse::<f64>() {
                    return ConfigValue::Float(f);
                }
            }
            _ => {}
        }
    }

    ConfigValue::String(raw.to_string())
}

/// Flatten a configuration into `(dotted.key, leaf)` pairs, depth first in
/// key order. Empty nested mappings produce nothing.
pub fn flatten_pairs(config: &Configuration) -> Vec<(String, ConfigValue)> {
    let mut pairs = Vec::new();
    flatten_into(config, "", &mut pairs);
    pairs
}

fn flatten_into(config: &Configuration, prefix: &str, out: &mut Vec<(String, ConfigValue)>) {
    for (key, value) in config {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            ConfigValue::Map(nested) => flatten_into(nested, &path, out),
            leaf => out.push((path, leaf.clone())),
        }
    }
}

/// Flatten a configuration into `KEY=VALUE` tokens accepted by
/// [`parse_overrides`].
pub fn flatten(config: &Configuration) -> Vec<String> {
    flatten_pairs(config)
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect()
}
