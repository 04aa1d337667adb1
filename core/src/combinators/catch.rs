// orka_flow/src/combinators/catch.rs

use crate::core::context_data::ContextData;
use crate::core::control::Control;
use crate::core::handler::BoxFuture;
use crate::core::meta::{Meta, MetaHierarchy};
use crate::core::processor::Processor;
use crate::error::{ErrorValue, FlowError};
use crate::middleware::bridge::{continue_with, settle};
use crate::middleware::next::Next;
use crate::middleware::stack::{Middleware, Stack};
use crate::pipeline::execution::Rest;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::{event, Level};

/// Receives a caught error and the context. Returning `Ok` swallows the error;
/// returning `Err` rethrows (possibly a different error).
pub type OnError<TData, Err> =
  Arc<dyn Fn(Err, ContextData<TData>) -> BoxFuture<'static, Result<(), Err>> + Send + Sync>;

/// Failure boundary around its children and the continuation.
///
/// The children run with the continuation as their tail, so a failure anywhere
/// downstream is routed to the callback as well.
pub struct Catch<TData, Err = FlowError>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  on_error: OnError<TData, Err>,
  children: Stack<TData, Err>,
  meta: Option<Meta>,
}

impl<TData, Err> Catch<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  pub fn new<F, Fut>(on_error: F, children: Stack<TData, Err>) -> Self
  where
    F: Fn(Err, ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Err>> + Send + 'static,
  {
    Self {
      on_error: Arc::new(
        move |err: Err, ctx: ContextData<TData>| -> BoxFuture<'static, Result<(), Err>> { Box::pin(on_error(err, ctx)) },
      ),
      children,
      meta: None,
    }
  }

  /// A boundary with no children of its own; only the continuation is guarded.
  pub fn around<F, Fut>(on_error: F) -> Self
  where
    F: Fn(Err, ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Err>> + Send + 'static,
  {
    Self::new(on_error, Stack::new())
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
    match self.children.process(ctx.clone(), next).await {
      Ok(()) => Ok(()),
      Err(err) => self.deliver(err, ctx).await,
    }
  }

  async fn deliver(&self, err: Err, ctx: ContextData<TData>) -> Result<(), Err> {
    event!(Level::DEBUG, error = ?err, "Error caught; invoking callback.");
    let outcome = (self.on_error)(err, ctx).await;
    match &outcome {
      Ok(()) => event!(Level::TRACE, "Caught error swallowed."),
      Err(rethrown) => event!(Level::DEBUG, error = ?rethrown, "Callback rethrew."),
    }
    outcome
  }
}

#[async_trait]
impl<TData, Err> Middleware<TData, Err> for Catch<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  async fn process(&self, ctx: ContextData<TData>, next: Next<Err>) -> Result<(), Err> {
    Catch::process(self, ctx, next).await
  }

  fn meta(&self) -> Option<&Meta> {
    Catch::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    Catch::hierarchy(self)
  }
}

#[async_trait]
impl<TData, Err> Processor<TData, Err> for Catch<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  /// On its own: a pending error goes to the callback and swallowing it clears
  /// it. Without one the children run and their failure goes to the callback.
  async fn process(&self, ctx: ContextData<TData>, err: Option<Err>) -> Result<Control, Err> {
    if let Some(err) = err {
      self.deliver(err, ctx).await?;
      return Ok(Control::Clear);
    }
    let rest = Rest::detached(ctx.clone(), None);
    self.process_in_chain(ctx, rest).await
  }

  /// In a chain the boundary first sees the error pending from earlier entries.
  /// Then the children run with the rest of the list as their tail, so failures
  /// left pending at the end of the list are caught too. A swallowed failure
  /// from the children themselves lets the list carry on after this position.
  async fn process_in_chain(&self, ctx: ContextData<TData>, rest: Rest<TData, Err>) -> Result<Control, Err> {
    if let Some(err) = rest.pending().cloned() {
      return match self.deliver(err, ctx).await {
        Ok(()) => rest.resume(Ok(Control::Clear)).await,
        Err(rethrown) => rest.resume(Err(rethrown)).await,
      };
    }

    let (next, reached) = continue_with(&rest);
    let processed = self.children.process(ctx.clone(), next).await;
    let outcome = reached.lock().take();
    match processed {
      Ok(()) => settle(Ok(()), outcome, rest).await,
      Err(err) => match self.deliver(err, ctx).await {
        Ok(()) => match outcome {
          Some(Ok(control)) => Ok(control),
          Some(Err(_)) => Ok(Control::Continue),
          None => rest.resume(Ok(Control::Continue)).await,
        },
        Err(rethrown) => settle(Err(rethrown), outcome, rest).await,
      },
    }
  }

  fn meta(&self) -> Option<&Meta> {
    Catch::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    Catch::hierarchy(self)
  }
}
