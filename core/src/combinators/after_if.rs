// orka_flow/src/combinators/after_if.rs

use crate::combinators::{predicate, Predicate};
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
use std::future::Future;
use tracing::{event, Level};

/// Runs the continuation, then evaluates the predicate against the resulting
/// context and runs its children (with a no-op tail) only if it holds.
///
/// A failing continuation skips the predicate entirely; a failing predicate
/// propagates and the children never run.
pub struct AfterIf<TData, Err = FlowError>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  predicate: Predicate<TData, Err>,
  children: Stack<TData, Err>,
  meta: Option<Meta>,
}

impl<TData, Err> AfterIf<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  pub fn new<F, Fut>(predicate_fn: F, children: Stack<TData, Err>) -> Self
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, Err>> + Send + 'static,
  {
    Self {
      predicate: predicate(predicate_fn),
      children,
      meta: None,
    }
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
    if (self.predicate)(ctx.clone()).await? {
      event!(Level::TRACE, "AfterIf predicate held; running trailing children.");
      self.children.process(ctx, Next::noop()).await
    } else {
      event!(Level::TRACE, "AfterIf predicate did not hold.");
      Ok(())
    }
  }
}

#[async_trait]
impl<TData, Err> Middleware<TData, Err> for AfterIf<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  async fn process(&self, ctx: ContextData<TData>, next: Next<Err>) -> Result<(), Err> {
    AfterIf::process(self, ctx, next).await
  }

  fn meta(&self) -> Option<&Meta> {
    AfterIf::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    AfterIf::hierarchy(self)
  }
}

#[async_trait]
impl<TData, Err> Processor<TData, Err> for AfterIf<TData, Err>
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
    AfterIf::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    AfterIf::hierarchy(self)
  }
}
