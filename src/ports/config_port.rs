//! Configuration access port trait.

use crate::domain::error::VolgateError;
use std::str::FromStr;

pub trait ConfigPort {
    /// Trimmed value of `[section] key`, `None` when absent or blank.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}

/// Read `[section] key` as `T`, falling back to `default` only when the key is
/// absent. A present but malformed value is `ConfigInvalid`.
pub fn parse_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, VolgateError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| VolgateError::invalid(section, key, format!("cannot parse '{}'", raw))),
    }
}
