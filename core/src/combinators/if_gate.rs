// orka_flow/src/combinators/if_gate.rs

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

/// Guards a child stack with a predicate.
///
/// The predicate is evaluated first; if it fails, the error propagates and
/// neither the children nor the continuation run. When it holds, the children
/// run with the continuation as their tail, or with a no-op tail when the gate
/// is terminating. When it does not hold, the children are skipped and the
/// continuation is called directly.
pub struct If<TData, Err = FlowError>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  predicate: Predicate<TData, Err>,
  children: Stack<TData, Err>,
  terminate: bool,
  meta: Option<Meta>,
}

impl<TData, Err> If<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  /// Predicate plus children; not terminating.
  pub fn new<F, Fut>(predicate_fn: F, children: Stack<TData, Err>) -> Self
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, Err>> + Send + 'static,
  {
    Self::with_terminate(predicate_fn, children, false)
  }

  /// Predicate plus terminate flag, with no children yet (see `stack_mut`).
  pub fn terminating<F, Fut>(predicate_fn: F, terminate: bool) -> Self
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, Err>> + Send + 'static,
  {
    Self::with_terminate(predicate_fn, Stack::new(), terminate)
  }

  pub fn with_terminate<F, Fut>(predicate_fn: F, children: Stack<TData, Err>, terminate: bool) -> Self
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, Err>> + Send + 'static,
  {
    Self {
      predicate: predicate(predicate_fn),
      children,
      terminate,
      meta: None,
    }
  }

  pub fn with_meta(mut self, meta: Meta) -> Self {
    self.meta = Some(meta);
    self
  }

  pub fn is_terminating(&self) -> bool {
    self.terminate
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
    if (self.predicate)(ctx.clone()).await? {
      event!(Level::TRACE, terminate = self.terminate, "If predicate held; running children.");
      let tail = if self.terminate { Next::noop() } else { next };
      self.children.process(ctx, tail).await
    } else {
      event!(Level::TRACE, "If predicate did not hold; skipping children.");
      next.run().await
    }
  }
}

#[async_trait]
impl<TData, Err> Middleware<TData, Err> for If<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  async fn process(&self, ctx: ContextData<TData>, next: Next<Err>) -> Result<(), Err> {
    If::process(self, ctx, next).await
  }

  fn meta(&self) -> Option<&Meta> {
    If::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    If::hierarchy(self)
  }
}

#[async_trait]
impl<TData, Err> Processor<TData, Err> for If<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  async fn process(&self, ctx: ContextData<TData>, err: Option<Err>) -> Result<Control, Err> {
    drive_detached(self, ctx, err).await
  }

  /// A terminating gate whose predicate holds never reaches the rest of the
  /// list, which surfaces as `Control::Abort` at its position.
  async fn process_in_chain(&self, ctx: ContextData<TData>, rest: Rest<TData, Err>) -> Result<Control, Err> {
    drive_in_chain(self, ctx, rest).await
  }

  fn meta(&self) -> Option<&Meta> {
    If::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    If::hierarchy(self)
  }
}
