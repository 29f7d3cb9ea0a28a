//! # Adapters
//!
//! An adapter is a storage backend for notes. Every backend implements the same six
//! operations ([`Adapter`]); which one is used is decided once, at startup, from the
//! `backend` option.
//!
//! ## Selecting a backend
//!
//! Backends are looked up by name in a [`BackendRegistry`]. Names are case-insensitive
//! (`T`, `t`). The built-in registry knows:
//!
//! - [`example::ExampleAdapter`] (`example`): canned replies, handy for trying things out.
//! - [`t::TAdapter`] (`t`): drives the `t.py` task manager.
//! - [`json::JsonAdapter`] (`json`): notes in a single JSON file.
//!
//! Other backends can be added with [`BackendRegistry::register`] before the adapter is
//! initialized. Asking for a name that is not registered fails right away with
//! [`WriteDownError::BackendNotFound`], before any note operation can run.
//!
//! ## Unsupported operations
//!
//! Backends are free to decline operations they cannot do (the `t` backend cannot
//! remove tasks, for instance). They must say so with [`WriteDownError::NotSupported`]
//! instead of silently doing nothing.

use crate::callable::{Callable, Dispatch};
use crate::error::{Result, WriteDownError};
use crate::input::{Substitution, TagSet};
use crate::model::CmdResult;
use std::collections::BTreeMap;

pub mod example;
pub mod json;
pub mod t;

/// Option naming the backend.
pub const BACKEND_KEY: &str = "backend";

/// Backend used when the options do not name one.
pub const DEFAULT_BACKEND: &str = "example";

/// Frozen key/value options for the selected backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(BTreeMap<String, String>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The configured backend name, or [`DEFAULT_BACKEND`].
    pub fn backend(&self) -> &str {
        self.get(BACKEND_KEY)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_BACKEND)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Options::new();
        for (k, v) in iter {
            options.set(k, v);
        }
        options
    }
}

/// Listing filters: filter key → values. Tag filters use the prefix as key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    filters: BTreeMap<String, Vec<String>>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.filters.insert(key.into(), values);
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.filters.get(key).map(Vec::as_slice)
    }

    /// Every filter value, flattened.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.filters.values().flatten().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.filters.values().all(Vec::is_empty)
    }
}

impl From<TagSet> for ListOptions {
    fn from(tags: TagSet) -> Self {
        let mut options = ListOptions::new();
        for (prefix, values) in tags.into_groups() {
            options.insert(prefix.to_string(), values);
        }
        options
    }
}

/// How to change a note: replace matches of `regex` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOptions {
    pub regex: String,
    pub replacement: String,
}

impl From<&Substitution> for EditOptions {
    fn from(s: &Substitution) -> Self {
        Self {
            regex: s.pattern.clone(),
            replacement: s.replacement.clone(),
        }
    }
}

/// The operations every backend provides.
///
/// Ids are opaque strings; each backend decides what they look like.
pub trait Adapter: Send + Sync {
    /// Registry name of the backend.
    fn name(&self) -> &'static str;

    /// Find notes matching a regular expression. Never changes anything.
    fn search(&self, pattern: &str) -> Result<CmdResult>;

    /// List notes matching every filter. `filter`, when given, is applied to each note's
    /// text through `dispatcher`; backends may refuse it with `NotSupported`.
    fn list(
        &self,
        options: &ListOptions,
        filter: Option<&Callable>,
        dispatcher: &dyn Dispatch,
    ) -> Result<CmdResult>;

    fn add(&self, content: &str) -> Result<CmdResult>;

    fn edit(&self, id: &str, options: &EditOptions) -> Result<CmdResult>;

    /// Archive a note. Archiving twice may fail.
    fn archive(&self, id: &str) -> Result<CmdResult>;

    /// Delete a note: to the trash when `trash` is set, for good otherwise.
    fn remove(&self, id: &str, trash: bool) -> Result<CmdResult>;
}

/// Builds a backend from its options.
pub type Constructor = fn(&Options) -> Result<Box<dyn Adapter>>;

/// Backend name → constructor.
#[derive(Clone)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Constructor>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl BackendRegistry {
    pub fn empty() -> Self {
        Self {
            backends: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("example", example::ExampleAdapter::create);
        registry.register("t", t::TAdapter::create);
        registry.register("json", json::JsonAdapter::create);
        registry
    }

    /// Adds (or replaces) a backend.
    pub fn register(&mut self, name: &str, constructor: Constructor) {
        self.backends
            .insert(name.trim().to_lowercase(), constructor);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(&name.trim().to_lowercase())
    }

    /// Constructs the backend named by `options`.
    pub fn create(&self, options: &Options) -> Result<Box<dyn Adapter>> {
        let name = options.backend().trim().to_lowercase();
        let constructor = self
            .backends
            .get(&name)
            .ok_or_else(|| WriteDownError::BackendNotFound(options.backend().to_string()))?;
        constructor(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_defaults_to_example() {
        assert_eq!(Options::new().backend(), "example");
        assert_eq!(Options::new().with("backend", " ").backend(), "example");
        assert_eq!(Options::new().with("backend", "T").backend(), "T");
    }

    #[test]
    fn test_registry_is_case_insensitive() {
        let registry = BackendRegistry::builtin();
        let adapter = registry
            .create(&Options::new().with("backend", "Example"))
            .unwrap();
        assert_eq!(adapter.name(), "example");
        assert!(registry.contains("JSON"));
    }

    #[test]
    fn test_unknown_backend() {
        let registry = BackendRegistry::builtin();
        let err = registry
            .create(&Options::new().with("backend", "evernote"))
            .err()
            .unwrap();
        assert!(matches!(err, WriteDownError::BackendNotFound(name) if name == "evernote"));
    }

    #[test]
    fn test_register_custom_backend() {
        let mut registry = BackendRegistry::empty();
        assert!(registry
            .create(&Options::new())
            .err()
            .is_some_and(|e| matches!(e, WriteDownError::BackendNotFound(_))));

        registry.register("Mine", example::ExampleAdapter::create);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["mine"]);
        assert!(registry
            .create(&Options::new().with("backend", "mine"))
            .is_ok());
    }

    #[test]
    fn test_list_options_from_tags() {
        let tags = TagSet::from_groups([('#', vec!["#a", "#b"]), ('@', vec!["@home"])]);
        let options = ListOptions::from(tags);
        assert_eq!(options.get("#").unwrap(), ["#a", "#b"]);
        assert_eq!(options.tags().collect::<Vec<_>>(), vec!["#a", "#b", "@home"]);
        assert!(!options.is_empty());
        assert!(ListOptions::new().is_empty());
    }

    #[test]
    fn test_edit_options_from_substitution() {
        let s = Substitution {
            pattern: "foo".into(),
            replacement: "bar".into(),
            selector: "3".into(),
        };
        assert_eq!(
            EditOptions::from(&s),
            EditOptions {
                regex: "foo".into(),
                replacement: "bar".into()
            }
        );
    }
}
