// orka_flow/src/core/processor.rs

//! Defines the `Processor<TData, Err>` trait: anything that can take part in a
//! chain as a nested unit, receiving the ambient pending error.

use crate::core::context_data::ContextData;
use crate::core::control::Control;
use crate::core::meta::{Meta, MetaHierarchy};
use crate::error::ErrorValue;
use crate::pipeline::execution::Rest;
use async_trait::async_trait;

/// A nested unit of a chain. `Pipeline`, `Group`, `Stack` and the combinators
/// implement it; user types may too.
///
/// Processors are invoked for every position they occupy, whether or not an error
/// is pending, and decide for themselves how to react to `err`.
#[async_trait]
pub trait Processor<TData, Err>: Send + Sync
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  /// Runs the processor. The returned value is interpreted by the enclosing list
  /// exactly like a handler result.
  async fn process(&self, ctx: ContextData<TData>, err: Option<Err>) -> Result<Control, Err>;

  /// Runs the processor at its position in an enclosing list and returns the
  /// result of that whole list.
  ///
  /// The default runs `process` and hands its result to `rest`. Processors that
  /// have to wrap whatever follows them (the combinators) override this and use
  /// `rest` as their continuation.
  async fn process_in_chain(&self, ctx: ContextData<TData>, rest: Rest<TData, Err>) -> Result<Control, Err> {
    let step = self.process(ctx, rest.pending().cloned()).await;
    rest.resume(step).await
  }

  fn meta(&self) -> Option<&Meta> {
    None
  }

  fn hierarchy(&self) -> MetaHierarchy {
    MetaHierarchy::leaf(self.meta().cloned())
  }
}
