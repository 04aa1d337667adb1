// orka_flow/src/middleware/bridge.rs

//! Lets the two execution models nest inside each other.
//!
//! - A `Pipeline` inside a `Stack` runs with no pending error and calls the
//!   continuation unless it aborted.
//! - A `Stack` (or any combinator) inside a `Pipeline` is skipped while an error
//!   is pending. Otherwise its continuation is the rest of the enclosing list,
//!   and not reaching it means `Control::Abort` at its position.

use crate::core::context_data::ContextData;
use crate::core::control::Control;
use crate::core::meta::{Meta, MetaHierarchy};
use crate::core::processor::Processor;
use crate::error::ErrorValue;
use crate::middleware::next::Next;
use crate::middleware::stack::{Middleware, Stack};
use crate::pipeline::definition::Pipeline;
use crate::pipeline::execution::{run_entries, Rest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{event, Level};

/// What the rest of the list returned, if the continuation was run.
pub(crate) type Reached<Err> = Arc<Mutex<Option<Result<Control, Err>>>>;

/// Runs `middleware` at its position in a list, with the rest of that list as
/// its continuation.
///
/// With an error pending the middleware is skipped and the list resumes with
/// the error still pending.
pub(crate) async fn drive_in_chain<TData, Err, M>(
  middleware: &M,
  ctx: ContextData<TData>,
  rest: Rest<TData, Err>,
) -> Result<Control, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
  M: Middleware<TData, Err> + ?Sized,
{
  if rest.pending().is_some() {
    event!(Level::TRACE, "Error pending; middleware skipped.");
    return rest.resume(Ok(Control::Continue)).await;
  }

  let (next, reached) = continue_with(&rest);
  let processed = middleware.process(ctx, next).await;
  let outcome = reached.lock().take();
  settle(processed, outcome, rest).await
}

/// Runs `middleware` on its own: the continuation is the end of an empty list,
/// so reaching it gives `Control::Continue` and not reaching it `Control::Abort`.
pub(crate) async fn drive_detached<TData, Err, M>(
  middleware: &M,
  ctx: ContextData<TData>,
  err: Option<Err>,
) -> Result<Control, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
  M: Middleware<TData, Err> + ?Sized,
{
  if err.is_some() {
    event!(Level::TRACE, "Error pending; middleware skipped.");
    return Ok(Control::Continue);
  }
  let rest = Rest::detached(ctx.clone(), None);
  drive_in_chain(middleware, ctx, rest).await
}

/// A continuation that resumes `rest` and records what the list returned.
pub(crate) fn continue_with<TData, Err>(rest: &Rest<TData, Err>) -> (Next<Err>, Reached<Err>)
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  let reached: Reached<Err> = Arc::new(Mutex::new(None));
  let slot = Arc::clone(&reached);
  let downstream = rest.clone();
  let next = Next::new(move || async move {
    let result = downstream.resume(Ok(Control::Continue)).await;
    let forwarded = match &result {
      Ok(_) => Ok(()),
      Err(err) => Err(err.clone()),
    };
    *slot.lock() = Some(result);
    forwarded
  });
  (next, reached)
}

/// Maps a middleware's own result, and the list's result if it got that far,
/// to the result of the whole list.
pub(crate) async fn settle<TData, Err>(
  processed: Result<(), Err>,
  outcome: Option<Result<Control, Err>>,
  rest: Rest<TData, Err>,
) -> Result<Control, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  match (processed, outcome) {
    (Ok(()), Some(Ok(control))) => Ok(control),
    (Ok(()), Some(Err(err))) => {
      event!(Level::TRACE, error = ?err, "Downstream failure handled by middleware.");
      Ok(Control::Continue)
    }
    (Ok(()), None) => {
      event!(Level::DEBUG, "Middleware did not reach its continuation; reporting abort.");
      rest.resume(Ok(Control::Abort)).await
    }
    // The rest of the list already ran; nothing is left to resume.
    (Err(err), Some(_)) => Err(err),
    (Err(err), None) => rest.resume(Err(err)).await,
  }
}

#[async_trait]
impl<TData, Err> Processor<TData, Err> for Stack<TData, Err>
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
    Stack::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    Stack::hierarchy(self)
  }
}

#[async_trait]
impl<TData, Err> Middleware<TData, Err> for Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  async fn process(&self, ctx: ContextData<TData>, next: Next<Err>) -> Result<(), Err> {
    match run_entries(ctx, None, Arc::clone(&self.entries), 0, true).await? {
      Control::Abort => {
        event!(Level::DEBUG, "Nested pipeline aborted; continuation not called.");
        Ok(())
      }
      Control::Continue | Control::Clear => next.run().await,
    }
  }

  fn meta(&self) -> Option<&Meta> {
    Pipeline::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    Pipeline::hierarchy(self)
  }
}
