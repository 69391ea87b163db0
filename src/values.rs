//! Values supplied to the templates.
//! Values can come from the input document, from a JSON or YAML file, and
//! from `key=value` overrides given on the command line.

use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Read-only mapping from variable name to value, fixed for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValuesContext(IndexMap<String, serde_json::Value>);

impl ValuesContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a JSON document, falling back to YAML.
    pub fn parse(content: &str) -> Result<Self> {
        match serde_json::from_str(content) {
            Ok(values) => Ok(values),
            Err(_) => serde_yaml::from_str(content)
                .map_err(|e| Error::ValuesError(format!("invalid values document: {e}"))),
        }
    }

    /// Loads values from a JSON or YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading values from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| Error::filesystem(path, e))?;
        Self::parse(&content)
    }

    /// Overlays `other` on top of `self`, replacing values of matching keys.
    pub fn merge(&mut self, other: ValuesContext) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    /// Applies a `key=value` override.
    ///
    /// Dotted keys address nested mappings (`author.name=Jane`), intermediate
    /// mappings are created as needed. The value is read as a YAML scalar so
    /// `count=3` yields a number and `enabled=true` a boolean.
    pub fn set_pair(&mut self, pair: &str) -> Result<()> {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| Error::ValuesError(format!("expected KEY=VALUE, got '{pair}'")))?;
        let key = key.trim();
        if key.is_empty() || key.split('.').any(str::is_empty) {
            return Err(Error::ValuesError(format!("invalid key in '{pair}'")));
        }

        let value = if raw.is_empty() {
            serde_json::Value::String(String::new())
        } else {
            serde_yaml::from_str::<serde_json::Value>(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
        };

        match key.split_once('.') {
            None => {
                self.0.insert(key.to_string(), value);
            }
            Some((head, rest)) => {
                let entry = self.0.entry(head.to_string()).or_insert(serde_json::Value::Null);
                insert_nested(entry, rest, value);
            }
        }
        Ok(())
    }
}

fn insert_nested(slot: &mut serde_json::Value, key: &str, value: serde_json::Value) {
    if !slot.is_object() {
        *slot = serde_json::Value::Object(serde_json::Map::new());
    }
    let serde_json::Value::Object(map) = slot else {
        return;
    };
    match key.split_once('.') {
        None => {
            map.insert(key.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = map.entry(head.to_string()).or_insert(serde_json::Value::Null);
            insert_nested(entry, rest, value);
        }
    }
}
