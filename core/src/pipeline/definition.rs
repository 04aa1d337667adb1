// orka_flow/src/pipeline/definition.rs

//! Contains the `Pipeline<TData, Err>` struct definition and methods for its
//! construction and inspection.

use crate::core::handler::{Entry, Handler};
use crate::core::meta::{Meta, MetaHierarchy};
use crate::error::{ErrorValue, FlowError};
use std::sync::Arc;

/// The top-level container: an ordered list of handlers and chain-groups.
///
/// `TData` is the caller's context data type, shared with every handler through
/// `ContextData<TData>`. `Err` is the pending-error type (see `ErrorValue`).
///
/// Handlers are registered with the `use_*` methods (see `hooks.rs`) and run by
/// `process`/`run` (see `execution.rs`). A pipeline is itself a `Processor`, so
/// it can be nested inside another pipeline, and a `Middleware`, so it can sit in
/// a continuation `Stack`.
pub struct Pipeline<TData, Err = FlowError>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  /// Registration order is execution order. Shared with in-flight runs, so
  /// registering copies on write.
  pub(crate) entries: Arc<Vec<Entry<TData, Err>>>,
  pub(crate) meta: Option<Meta>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  /// Creates an empty pipeline.
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Vec::new()),
      meta: None,
    }
  }

  /// Creates a pipeline whose entries are `handlers`, each appended individually.
  pub fn from_handlers(handlers: Vec<Handler<TData, Err>>) -> Self {
    Self {
      entries: Arc::new(handlers.into_iter().map(Entry::new).collect()),
      meta: None,
    }
  }

  pub fn with_meta(mut self, meta: Meta) -> Self {
    self.meta = Some(meta);
    self
  }

  pub fn set_meta(&mut self, meta: Meta) {
    self.meta = Some(meta);
  }

  pub fn meta(&self) -> Option<&Meta> {
    self.meta.as_ref()
  }

  pub fn entries(&self) -> &[Entry<TData, Err>] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// This pipeline's metadata and, recursively, that of every entry.
  pub fn hierarchy(&self) -> MetaHierarchy {
    MetaHierarchy::node(self.meta.clone(), self.entries.iter().map(Entry::hierarchy).collect())
  }
}

impl<TData, Err> Default for Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<TData, Err> std::fmt::Debug for Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pipeline")
      .field("meta", &self.meta)
      .field("entries", &self.entries)
      .finish()
  }
}
