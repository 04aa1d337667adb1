// orka_flow/src/core/meta.rs

//! Opaque metadata attached to handlers and containers, and the hierarchy view
//! used by logging and debugging tools.

use std::collections::BTreeMap;

/// Key/value metadata attached at registration time. Never read by the engines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta(BTreeMap<String, String>);

impl Meta {
  pub fn new() -> Self {
    Self::default()
  }

  /// Metadata carrying only a `name` entry.
  pub fn named<S: Into<String>>(name: S) -> Self {
    Self::new().with("name", name)
  }

  pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
    self.0.insert(key.into(), value.into());
    self
  }

  pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> Option<String> {
    self.0.insert(key.into(), value.into())
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.0.get(key).map(String::as_str)
  }

  pub fn name(&self) -> Option<&str> {
    self.get("name")
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// Metadata of a handler and, for containers, of each of its entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaHierarchy {
  pub meta: Option<Meta>,
  /// `None` for plain function handlers, `Some` for containers (possibly empty).
  pub children: Option<Vec<MetaHierarchy>>,
}

impl MetaHierarchy {
  pub fn leaf(meta: Option<Meta>) -> Self {
    Self { meta, children: None }
  }

  pub fn node(meta: Option<Meta>, children: Vec<MetaHierarchy>) -> Self {
    Self {
      meta,
      children: Some(children),
    }
  }

  /// Fills in `meta` when the node has none of its own.
  pub(crate) fn or_meta(mut self, fallback: Option<&Meta>) -> Self {
    if self.meta.is_none() {
      self.meta = fallback.cloned();
    }
    self
  }

  /// Depth-first list of every `name` in the tree, for quick assertions and logs.
  pub fn names(&self) -> Vec<String> {
    let mut out = Vec::new();
    self.collect_names(&mut out);
    out
  }

  fn collect_names(&self, out: &mut Vec<String>) {
    if let Some(name) = self.meta.as_ref().and_then(Meta::name) {
      out.push(name.to_string());
    }
    for child in self.children.iter().flatten() {
      child.collect_names(out);
    }
  }
}
