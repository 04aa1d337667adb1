// orka_flow/src/combinators/mod.rs

//! Pre-built middleware containers with fixed pre/post/conditional behaviour.
//!
//! Every combinator owns a child `Stack`. It works as `Middleware` inside a
//! stack and as a `Processor` inside a pipeline, where its continuation is the
//! rest of the enclosing list.

pub mod after;
pub mod after_if;
pub mod catch;
pub mod if_gate;

pub use after::After;
pub use after_if::AfterIf;
pub use catch::Catch;
pub use if_gate::If;

use crate::core::context_data::ContextData;
use crate::core::handler::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Asynchronous, fallible condition evaluated against the context.
pub type Predicate<TData, Err> =
  Arc<dyn Fn(ContextData<TData>) -> BoxFuture<'static, Result<bool, Err>> + Send + Sync>;

pub(crate) fn predicate<TData, Err, F, Fut>(predicate_fn: F) -> Predicate<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: Send + 'static,
  F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<bool, Err>> + Send + 'static,
{
  Arc::new(move |ctx: ContextData<TData>| -> BoxFuture<'static, Result<bool, Err>> { Box::pin(predicate_fn(ctx)) })
}
