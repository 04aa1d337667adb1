// orka_flow/src/pipeline/group.rs

//! Chain-groups: handlers registered together as one bounded sub-chain.

use crate::core::context_data::ContextData;
use crate::core::control::Control;
use crate::core::handler::{Entry, Handler};
use crate::core::meta::{Meta, MetaHierarchy};
use crate::core::processor::Processor;
use crate::error::{ErrorValue, FlowError};
use crate::pipeline::execution::run_entries;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// A bounded sub-chain that the enclosing list treats as a single processor.
///
/// A `Control::Abort` from a non-last member only stops the group: the
/// enclosing list carries on with its next entry, with whatever error was
/// pending at that moment. An `Abort` from the last member is forwarded, so it
/// terminates the enclosing pipeline like any other terminal signal.
pub struct Group<TData, Err = FlowError>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  entries: Arc<Vec<Entry<TData, Err>>>,
  meta: Option<Meta>,
}

impl<TData, Err> Group<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Vec::new()),
      meta: None,
    }
  }

  pub fn from_handlers(handlers: Vec<Handler<TData, Err>>) -> Self {
    Self {
      entries: Arc::new(handlers.into_iter().map(Entry::new).collect()),
      meta: None,
    }
  }

  pub fn handler(mut self, handler: Handler<TData, Err>) -> Self {
    Arc::make_mut(&mut self.entries).push(Entry::new(handler));
    self
  }

  pub fn handler_with_meta(mut self, handler: Handler<TData, Err>, meta: Meta) -> Self {
    Arc::make_mut(&mut self.entries).push(Entry::with_meta(handler, meta));
    self
  }

  pub fn task<F, Fut>(self, handler_fn: F) -> Self
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Control, Err>> + Send + 'static,
  {
    self.handler(Handler::task(handler_fn))
  }

  pub fn error<F, Fut>(self, handler_fn: F) -> Self
  where
    F: Fn(ContextData<TData>, Err) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Control, Err>> + Send + 'static,
  {
    self.handler(Handler::error(handler_fn))
  }

  pub fn processor<P>(self, processor: P) -> Self
  where
    P: Processor<TData, Err> + 'static,
  {
    self.handler(Handler::processor(processor))
  }

  pub fn with_meta(mut self, meta: Meta) -> Self {
    self.meta = Some(meta);
    self
  }

  pub fn meta(&self) -> Option<&Meta> {
    self.meta.as_ref()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn hierarchy(&self) -> MetaHierarchy {
    MetaHierarchy::node(self.meta.clone(), self.entries.iter().map(Entry::hierarchy).collect())
  }
}

impl<TData, Err> Default for Group<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl<TData, Err> Processor<TData, Err> for Group<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  async fn process(&self, ctx: ContextData<TData>, err: Option<Err>) -> Result<Control, Err> {
    run_entries(ctx, err, Arc::clone(&self.entries), 0, false).await
  }

  fn meta(&self) -> Option<&Meta> {
    Group::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    Group::hierarchy(self)
  }
}
