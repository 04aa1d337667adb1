// orka_flow/src/pipeline/hooks.rs

//! Contains the `use_*` registration methods of `Pipeline<TData, Err>`.
//!
//! Handler shape is decided here, once: closures taking only the context become
//! task handlers, closures also taking the error become error handlers, and
//! anything implementing `Processor` is registered as a processor.

use crate::core::context_data::ContextData;
use crate::core::control::Control;
use crate::core::handler::{Entry, Handler};
use crate::core::meta::Meta;
use crate::core::processor::Processor;
use crate::error::ErrorValue;
use crate::pipeline::definition::Pipeline;
use crate::pipeline::group::Group;
use std::future::Future;
use std::sync::Arc;
use tracing::{event, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  /// Appends an already classified handler.
  pub fn use_handler(&mut self, handler: Handler<TData, Err>) -> &mut Self {
    event!(Level::TRACE, kind = ?handler.kind(), position = self.entries.len(), "Handler registered.");
    Arc::make_mut(&mut self.entries).push(Entry::new(handler));
    self
  }

  /// Appends a handler with metadata for introspection. A processor that carries
  /// its own metadata keeps it; `meta` only fills in when it has none.
  pub fn use_handler_with_meta(&mut self, handler: Handler<TData, Err>, meta: Meta) -> &mut Self {
    event!(Level::TRACE, kind = ?handler.kind(), position = self.entries.len(), name = ?meta.name(), "Handler registered.");
    Arc::make_mut(&mut self.entries).push(Entry::with_meta(handler, meta));
    self
  }

  /// Registers a task handler. It runs only while no error is pending.
  pub fn use_task<F, Fut>(&mut self, handler_fn: F) -> &mut Self
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Control, Err>> + Send + 'static,
  {
    self.use_handler(Handler::task(handler_fn))
  }

  /// Registers an error handler. It runs only while an error is pending and
  /// receives a clone of it.
  pub fn use_error<F, Fut>(&mut self, handler_fn: F) -> &mut Self
  where
    F: Fn(ContextData<TData>, Err) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Control, Err>> + Send + 'static,
  {
    self.use_handler(Handler::error(handler_fn))
  }

  /// Registers a nested processor (another pipeline, a group, a combinator, ...).
  pub fn use_processor<P>(&mut self, processor: P) -> &mut Self
  where
    P: Processor<TData, Err> + 'static,
  {
    self.use_handler(Handler::processor(processor))
  }

  pub fn use_shared(&mut self, processor: Arc<dyn Processor<TData, Err>>) -> &mut Self {
    self.use_handler(Handler::shared(processor))
  }

  pub fn use_group(&mut self, group: Group<TData, Err>) -> &mut Self {
    self.use_processor(group)
  }

  /// Registers several handlers in one call. A single handler is appended as-is;
  /// two or more are wrapped into one `Group` with group-local termination.
  pub fn use_chain(&mut self, mut handlers: Vec<Handler<TData, Err>>) -> &mut Self {
    match handlers.len() {
      0 => self,
      1 => match handlers.pop() {
        Some(handler) => self.use_handler(handler),
        None => self,
      },
      _ => self.use_group(Group::from_handlers(handlers)),
    }
  }
}
