// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration store for one automated routine.
//!
//! [`Config`] is a string-keyed map of JSON values, merge-patched
//! recursively and optionally backed by a JSON file.  The file is always
//! written with sorted keys and four-space indentation so that diffs between
//! runs stay small.
//!
//! ```rust
//! use automation_entities::config::Config;
//! use serde_json::json;
//!
//! let mut config = Config::with_defaults(
//!     json!({"browser": {"headless": true}}).as_object().unwrap().clone(),
//! );
//! config.patch(json!({"browser": {"width": 1600}}).as_object().unwrap());
//!
//! assert_eq!(config["browser"], json!({"headless": true, "width": 1600}));
//! ```

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::ops::Index;
use std::path::{Path, PathBuf};

/// The map type configuration data is stored in.  Keys iterate in sorted
/// order.
pub type ConfigMap = serde_json::Map<String, Value>;

/// Recursively merges `patch` into `original`.
///
/// A key missing from `original`, or whose new value is not an object, is
/// set outright.  When the new value is an object it is merged key by key
/// into the existing one; an existing non-object value is first replaced by
/// an empty object.
pub fn patch_map(original: &mut ConfigMap, patch: &ConfigMap) {
    for (key, value) in patch {
        match (original.get_mut(key), value) {
            (Some(existing), Value::Object(patch_obj)) => {
                if !existing.is_object() {
                    *existing = Value::Object(ConfigMap::new());
                }
                if let Value::Object(existing_obj) = existing {
                    patch_map(existing_obj, patch_obj);
                }
            }
            _ => {
                original.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Key-value configuration, optionally persisted to a JSON file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    filepath: Option<PathBuf>,
    defaults: Option<ConfigMap>,
    data: ConfigMap,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose initial contents are `defaults`.
    pub fn with_defaults(defaults: ConfigMap) -> Self {
        let mut config = Config {
            filepath: None,
            defaults: None,
            data: ConfigMap::new(),
        };
        config.patch(&defaults);
        config.defaults = Some(defaults);
        config
    }

    pub fn filepath(&self) -> Option<&Path> {
        self.filepath.as_deref()
    }

    pub fn defaults(&self) -> Option<&ConfigMap> {
        self.defaults.as_ref()
    }

    pub fn data(&self) -> &ConfigMap {
        &self.data
    }

    /// Merges `new_values` into the store with [`patch_map`].
    pub fn patch(&mut self, new_values: &ConfigMap) {
        patch_map(&mut self.data, new_values);
    }

    /// Sets the backing file and [`load`](Self::load)s it.
    pub fn set_filepath(&mut self, filepath: impl Into<PathBuf>) -> Result<()> {
        self.filepath = Some(filepath.into());
        self.load()
    }

    /// Merges the backing file's contents (if the file exists) on top of the
    /// current data, then persists the result.
    ///
    /// A missing file is treated as an empty object, so loading a fresh path
    /// creates the file.
    pub fn load(&mut self) -> Result<()> {
        let Some(filepath) = self.filepath.as_ref() else {
            return Err(Error::Usage("filepath must be set before calling load"));
        };
        if filepath.is_file() {
            let text = std::fs::read_to_string(filepath)?;
            let stored: ConfigMap = serde_json::from_str(&text)?;
            self.patch(&stored);
        }
        self.persist()
    }

    /// Overwrites the backing file with the current data.
    pub fn persist(&self) -> Result<()> {
        let Some(filepath) = self.filepath.as_ref() else {
            return Err(Error::Usage(
                "filepath must be set before calling persist",
            ));
        };
        std::fs::write(filepath, self.render()?)?;
        Ok(())
    }

    /// Renders the data the way [`persist`](Self::persist) writes it.
    pub fn to_json(&self) -> Result<String> {
        String::from_utf8(self.render()?).map_err(|e| {
            Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    fn render(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.data.serialize(&mut ser)?;
        Ok(buf)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.data.insert(key, value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.data.iter()
    }

    pub fn keys(&self) -> serde_json::map::Keys<'_> {
        self.data.keys()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Index<&str> for Config {
    type Output = Value;

    /// Panics if `key` is absent, like indexing a `serde_json::Map`.
    fn index(&self, key: &str) -> &Value {
        &self.data[key]
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl Extend<(String, Value)> for Config {
    fn extend<T: IntoIterator<Item = (String, Value)>>(&mut self, iter: T) {
        self.data.extend(iter);
    }
}
