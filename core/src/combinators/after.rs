// orka_flow/src/combinators/after.rs

use crate::core::context_data::ContextData;
use crate::core::control::Control;
use crate::core::meta::{Meta, MetaHierarchy};
use crate::core::processor::Processor;
use crate::error::{ErrorValue, FlowError};
use crate::middleware::bridge::{drive_detached, drive_in_chain};
use crate::middleware::next::Next;
use crate::middleware::stack::{Middleware, Stack};
use crate::pipeline::execution::Rest;
use async_trait::async_trait;
use tracing::{event, Level};

/// Runs the continuation first, then its children with a no-op tail.
///
/// If the continuation fails the children never run and the failure
/// propagates.
pub struct After<TData, Err = FlowError>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  children: Stack<TData, Err>,
  meta: Option<Meta>,
}

impl<TData, Err> After<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  pub fn new(children: Stack<TData, Err>) -> Self {
    Self { children, meta: None }
  }

  pub fn with_meta(mut self, meta: Meta) -> Self {
    self.meta = Some(meta);
    self
  }

  pub fn stack(&self) -> &Stack<TData, Err> {
    &self.children
  }

  pub fn stack_mut(&mut self) -> &mut Stack<TData, Err> {
    &mut self.children
  }

  pub fn meta(&self) -> Option<&Meta> {
    self.meta.as_ref()
  }

  pub fn hierarchy(&self) -> MetaHierarchy {
    MetaHierarchy::node(self.meta.clone(), self.children.child_hierarchies())
  }

  pub async fn process(&self, ctx: ContextData<TData>, next: Next<Err>) -> Result<(), Err> {
    next.run().await?;
    event!(Level::TRACE, children = self.children.len(), "Continuation finished; running trailing children.");
    self.children.process(ctx, Next::noop()).await
  }
}

impl<TData, Err> Default for After<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn default() -> Self {
    Self::new(Stack::new())
  }
}

#[async_trait]
impl<TData, Err> Middleware<TData, Err> for After<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  async fn process(&self, ctx: ContextData<TData>, next: Next<Err>) -> Result<(), Err> {
    After::process(self, ctx, next).await
  }

  fn meta(&self) -> Option<&Meta> {
    After::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    After::hierarchy(self)
  }
}

#[async_trait]
impl<TData, Err> Processor<TData, Err> for After<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  async fn process(&self, ctx: ContextData<TData>, err: Option<Err>) -> Result<Control, Err> {
    drive_detached(self, ctx, err).await
  }

  async fn process_in_chain(&self, ctx: ContextData<TData>, rest: Rest<TData, Err>) -> Result<Control, Err> {
    drive_in_chain(self, ctx, rest).await
  }

  fn meta(&self) -> Option<&Meta> {
    After::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    After::hierarchy(self)
  }
}
