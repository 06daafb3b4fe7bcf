//! Platform-specific options.
//!
//! Options are passed to the icon builder as free-form `"<prefix>_<key>"`
//! pairs. Only pairs carrying the active backend's prefix are kept, with the
//! prefix stripped, so an application can pass options for several backends
//! at once.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// Options addressed to one backend, keyed without their prefix.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    values: HashMap<String, String>,
}

impl Options {
    /// Keeps the pairs whose key starts with `prefix` and strips it.
    pub fn from_prefixed<I, K, V>(prefix: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .filter_map(|(key, value)| {
                key.as_ref()
                    .strip_prefix(prefix)
                    .filter(|key| !key.is_empty())
                    .map(|key| (key.to_string(), value.into()))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parses the value stored under `key`, if any.
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse().map_err(|e: T::Err| Error::InvalidOption {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
