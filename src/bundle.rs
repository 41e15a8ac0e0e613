//! Configuration bundle model
//!
//! Defines the fundamental data structures for resolved configuration:
//! - `FileKey`: the closed set of per-node configuration files
//! - `FileContent`: the content of one file (properties, lines, or scalar)
//! - `ConfigBundle`: the full set of file contents for one host
//!
//! `output_format` renders `FileContent` into the canonical on-disk text
//! form used by every deployed file.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::ConfigurationError;

/// The closed set of configuration files managed on every node.
///
/// Keeping this an enum (rather than a free-form string key) gives the
/// merge and validation logic exhaustiveness checking; a name outside the
/// set is rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileKey {
    /// `node.properties` - per-node identity and directory layout
    NodeProperties,
    /// `jvm.config` - ordered JVM flags, one per line
    JvmConfig,
    /// `config.properties` - server role and discovery settings
    ConfigProperties,
}

impl FileKey {
    /// Every file a node requires, in deployment order.
    pub const REQUIRED: [FileKey; 3] = [
        FileKey::NodeProperties,
        FileKey::JvmConfig,
        FileKey::ConfigProperties,
    ];

    /// The on-disk file name.
    pub fn file_name(&self) -> &'static str {
        match self {
            FileKey::NodeProperties => "node.properties",
            FileKey::JvmConfig => "jvm.config",
            FileKey::ConfigProperties => "config.properties",
        }
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl FromStr for FileKey {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node.properties" => Ok(FileKey::NodeProperties),
            "jvm.config" => Ok(FileKey::JvmConfig),
            "config.properties" => Ok(FileKey::ConfigProperties),
            other => Err(ConfigurationError::UnknownFile(other.to_string())),
        }
    }
}

/// Content of one configuration file.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum FileContent {
    /// `key=value` properties. Iterates in key order, so rendering is
    /// deterministic.
    Properties(BTreeMap<String, String>),
    /// Ordered list of lines. Order is significant and preserved verbatim.
    Lines(Vec<String>),
    /// A single verbatim value.
    Scalar(String),
}

impl FileContent {
    /// The properties map, when this content is mapping-typed.
    pub fn as_properties(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            FileContent::Properties(map) => Some(map),
            _ => None,
        }
    }

    /// Look up one property value.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.as_properties()
            .and_then(|map| map.get(key))
            .map(String::as_str)
    }
}

impl From<BTreeMap<String, String>> for FileContent {
    fn from(map: BTreeMap<String, String>) -> Self {
        FileContent::Properties(map)
    }
}

impl From<Vec<String>> for FileContent {
    fn from(lines: Vec<String>) -> Self {
        FileContent::Lines(lines)
    }
}

impl From<&str> for FileContent {
    fn from(value: &str) -> Self {
        FileContent::Scalar(value.to_string())
    }
}

/// Render file content into the canonical on-disk text format.
///
/// Properties become newline-joined `key=value` lines in iteration order,
/// line lists are newline-joined, and scalars pass through unchanged.
pub fn output_format(content: &FileContent) -> String {
    match content {
        FileContent::Properties(map) => map
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("\n"),
        FileContent::Lines(lines) => lines.join("\n"),
        FileContent::Scalar(value) => value.clone(),
    }
}

/// The full set of per-file configuration for one host.
///
/// Iterates in `FileKey` order, so every downstream consumer sees files
/// in a deterministic sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigBundle {
    files: BTreeMap<FileKey, FileContent>,
}

impl ConfigBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: FileKey, content: impl Into<FileContent>) {
        self.files.insert(key, content.into());
    }

    pub fn get(&self, key: FileKey) -> Option<&FileContent> {
        self.files.get(&key)
    }

    pub fn contains(&self, key: FileKey) -> bool {
        self.files.contains_key(&key)
    }

    pub fn remove(&mut self, key: FileKey) -> Option<FileContent> {
        self.files.remove(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FileKey, &FileContent)> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Layer `overrides` on top of this bundle.
    ///
    /// Properties files merge key-wise with the override winning per key
    /// and unmatched base keys surviving; any other content kind replaces
    /// the base wholesale. Files present only in the overrides are carried
    /// over unchanged.
    pub fn merge(mut self, overrides: ConfigBundle) -> ConfigBundle {
        for (key, content) in overrides.files {
            match (self.files.get_mut(&key), content) {
                (Some(FileContent::Properties(base)), FileContent::Properties(over)) => {
                    for (k, v) in over {
                        base.insert(k, v);
                    }
                }
                (_, content) => {
                    self.files.insert(key, content);
                }
            }
        }
        self
    }

    /// Check that every required file is present.
    pub fn require_all_files(&self) -> Result<(), ConfigurationError> {
        for key in FileKey::REQUIRED {
            if !self.contains(key) {
                return Err(ConfigurationError::MissingRequiredFile(key));
            }
        }
        Ok(())
    }
}

impl Serialize for ConfigBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.files.len()))?;
        for (key, content) in &self.files {
            map.serialize_entry(key.file_name(), content)?;
        }
        map.end()
    }
}
