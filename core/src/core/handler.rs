// orka_flow/src/core/handler.rs

//! Defines the `Handler<TData, Err>` tagged union for chain handlers and the
//! `Entry` that pairs a handler with its registration metadata.

use crate::core::context_data::ContextData;
use crate::core::control::Control;
use crate::core::meta::{Meta, MetaHierarchy};
use crate::core::processor::Processor;
use crate::error::ErrorValue;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A handler that only looks at the context. Runs when no error is pending.
pub type TaskFn<TData, Err> =
  Arc<dyn Fn(ContextData<TData>) -> BoxFuture<'static, Result<Control, Err>> + Send + Sync>;

/// A handler that receives the pending error. Runs only when an error is pending.
pub type ErrorFn<TData, Err> =
  Arc<dyn Fn(ContextData<TData>, Err) -> BoxFuture<'static, Result<Control, Err>> + Send + Sync>;

/// Shape of a handler, fixed when the handler is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
  Task,
  Error,
  Processor,
}

/// One unit of work in a chain.
///
/// Handlers are asynchronous and receive a clone of the shared `ContextData`.
/// They must drop any lock guard before their next `.await`, and return one of:
/// - `Ok(Control::Continue)` to carry on,
/// - `Ok(Control::Abort)` to terminate,
/// - `Ok(Control::Clear)` to clear the pending error,
/// - `Err(e)` to make `e` the pending error.
pub enum Handler<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  Task(TaskFn<TData, Err>),
  Error(ErrorFn<TData, Err>),
  Processor(Arc<dyn Processor<TData, Err>>),
}

impl<TData, Err> Handler<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  pub fn task<F, Fut>(handler_fn: F) -> Self
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Control, Err>> + Send + 'static,
  {
    Handler::Task(Arc::new(
      move |ctx: ContextData<TData>| -> BoxFuture<'static, Result<Control, Err>> { Box::pin(handler_fn(ctx)) },
    ))
  }

  pub fn error<F, Fut>(handler_fn: F) -> Self
  where
    F: Fn(ContextData<TData>, Err) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Control, Err>> + Send + 'static,
  {
    Handler::Error(Arc::new(
      move |ctx: ContextData<TData>, err: Err| -> BoxFuture<'static, Result<Control, Err>> {
        Box::pin(handler_fn(ctx, err))
      },
    ))
  }

  pub fn processor<P>(processor: P) -> Self
  where
    P: Processor<TData, Err> + 'static,
  {
    Handler::Processor(Arc::new(processor))
  }

  /// A processor that is also used elsewhere, e.g. one pipeline nested in two parents.
  pub fn shared(processor: Arc<dyn Processor<TData, Err>>) -> Self {
    Handler::Processor(processor)
  }

  pub fn kind(&self) -> HandlerKind {
    match self {
      Handler::Task(_) => HandlerKind::Task,
      Handler::Error(_) => HandlerKind::Error,
      Handler::Processor(_) => HandlerKind::Processor,
    }
  }
}

impl<TData, Err> Clone for Handler<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn clone(&self) -> Self {
    match self {
      Handler::Task(f) => Handler::Task(Arc::clone(f)),
      Handler::Error(f) => Handler::Error(Arc::clone(f)),
      Handler::Processor(p) => Handler::Processor(Arc::clone(p)),
    }
  }
}

impl<TData, Err> fmt::Debug for Handler<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Handler").field(&self.kind()).finish()
  }
}

/// A registered handler together with the metadata supplied at registration.
pub struct Entry<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  pub(crate) handler: Handler<TData, Err>,
  pub(crate) meta: Option<Meta>,
}

impl<TData, Err> Entry<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  pub fn new(handler: Handler<TData, Err>) -> Self {
    Self { handler, meta: None }
  }

  pub fn with_meta(handler: Handler<TData, Err>, meta: Meta) -> Self {
    Self {
      handler,
      meta: Some(meta),
    }
  }

  pub fn handler(&self) -> &Handler<TData, Err> {
    &self.handler
  }

  pub fn kind(&self) -> HandlerKind {
    self.handler.kind()
  }

  pub fn meta(&self) -> Option<&Meta> {
    self.meta.as_ref()
  }

  /// A processor's own metadata takes precedence; registration metadata fills in.
  pub fn hierarchy(&self) -> MetaHierarchy {
    match &self.handler {
      Handler::Processor(processor) => processor.hierarchy().or_meta(self.meta.as_ref()),
      Handler::Task(_) | Handler::Error(_) => MetaHierarchy::leaf(self.meta.clone()),
    }
  }
}

impl<TData, Err> Clone for Entry<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn clone(&self) -> Self {
    Self {
      handler: self.handler.clone(),
      meta: self.meta.clone(),
    }
  }
}

impl<TData, Err> From<Handler<TData, Err>> for Entry<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn from(handler: Handler<TData, Err>) -> Self {
    Entry::new(handler)
  }
}

impl<TData, Err> fmt::Debug for Entry<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Entry")
      .field("kind", &self.kind())
      .field("meta", &self.meta)
      .finish()
  }
}
