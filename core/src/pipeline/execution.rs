// orka_flow/src/pipeline/execution.rs

//! The execution engine (`execute`) and the `Pipeline` entry points built on it.

use crate::core::context_data::ContextData;
use crate::core::control::{Control, PipelineResult};
use crate::core::handler::{BoxFuture, Entry, Handler};
use crate::core::meta::{Meta, MetaHierarchy};
use crate::core::processor::Processor;
use crate::error::ErrorValue;
use crate::pipeline::definition::Pipeline;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{event, instrument, span, Instrument, Level};

/// Runs `entries` left to right against `ctx`, carrying a pending error.
///
/// Before each entry, and once more after the last one, the done marker is
/// checked; once set, the run returns `Control::Abort` and nothing else in this
/// list is invoked. Processors always run and receive the pending error (and the
/// rest of the list, see `Rest`). Error handlers run only while an error is
/// pending, task handlers only while none is. Their results:
///
/// - `Err(e)` makes `e` the pending error (replacing any previous one).
/// - `Control::Clear` drops the pending error.
/// - `Control::Continue` changes nothing.
/// - `Control::Abort` from the last entry, or from any entry when `terminate` is
///   set, returns `Control::Abort`. From a non-last entry with `terminate` unset
///   (a chain-group) it only stops this list: the pending error is handed back as
///   `Err`, or `Control::Continue` when there is none.
///
/// When the list is exhausted an error that is still pending is returned as
/// `Err`; otherwise the result is `Control::Continue`.
pub async fn execute<TData, Err>(
  ctx: ContextData<TData>,
  err: Option<Err>,
  entries: &[Entry<TData, Err>],
  terminate: bool,
) -> Result<Control, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  run_entries(ctx, err, Arc::new(entries.to_vec()), 0, terminate).await
}

pub(crate) fn run_entries<TData, Err>(
  ctx: ContextData<TData>,
  err: Option<Err>,
  entries: Arc<Vec<Entry<TData, Err>>>,
  start: usize,
  terminate: bool,
) -> BoxFuture<'static, Result<Control, Err>>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  Box::pin(async move {
    let mut pending = err;
    let last_index = entries.len().saturating_sub(1);

    for index in start..entries.len() {
      if ctx.is_done() {
        return Ok(stop_on_done(index, pending));
      }

      let entry = &entries[index];
      let handler_span = span!(
        Level::TRACE,
        "chain_handler",
        index = index,
        kind = ?entry.kind(),
        error_pending = pending.is_some()
      );

      let step = match (&entry.handler, &pending) {
        (Handler::Processor(processor), _) => {
          // The processor owns the rest of this list from here on.
          let processor = Arc::clone(processor);
          let rest = Rest {
            ctx: ctx.clone(),
            entries: Arc::clone(&entries),
            index,
            pending: pending.clone(),
            terminate,
          };
          return processor.process_in_chain(ctx, rest).instrument(handler_span).await;
        }
        (Handler::Error(handler_fn), Some(err)) => handler_fn(ctx.clone(), err.clone()).instrument(handler_span).await,
        (Handler::Task(handler_fn), None) => handler_fn(ctx.clone()).instrument(handler_span).await,
        (Handler::Error(_), None) | (Handler::Task(_), Some(_)) => {
          event!(Level::TRACE, index = index, kind = ?entry.kind(), "Handler not eligible for current error state; skipped.");
          continue;
        }
      };

      if let Some(result) = interpret(step, &mut pending, index, last_index, terminate) {
        return result;
      }
    }

    if ctx.is_done() {
      return Ok(stop_on_done(entries.len(), pending));
    }
    match pending {
      Some(err) => Err(err),
      None => Ok(Control::Continue),
    }
  })
}

fn stop_on_done<Err: ErrorValue>(index: usize, pending: Option<Err>) -> Control {
  match pending {
    Some(err) => event!(Level::WARN, index = index, error = ?err, "Done marker set; discarding pending error."),
    None => event!(Level::DEBUG, index = index, "Done marker set; skipping remaining handlers."),
  }
  Control::Abort
}

/// Applies one entry's result to the pending error. `Some` means the list stops
/// here with that result.
fn interpret<Err: ErrorValue>(
  step: Result<Control, Err>,
  pending: &mut Option<Err>,
  index: usize,
  last_index: usize,
  terminate: bool,
) -> Option<Result<Control, Err>> {
  match step {
    Ok(Control::Continue) => None,
    Ok(Control::Clear) => {
      if pending.take().is_some() {
        event!(Level::TRACE, index = index, "Pending error cleared.");
      }
      None
    }
    Ok(Control::Abort) => {
      if terminate || index == last_index {
        event!(Level::DEBUG, index = index, "Abort signalled; terminating.");
        return Some(Ok(Control::Abort));
      }
      event!(Level::DEBUG, index = index, "Abort signalled inside group; resuming enclosing list.");
      Some(match pending.take() {
        Some(err) => Err(err),
        None => Ok(Control::Continue),
      })
    }
    Err(err) => {
      event!(Level::TRACE, index = index, error = ?err, "Handler failed; error is now pending.");
      *pending = Some(err);
      None
    }
  }
}

/// The remainder of a list, handed to the processor occupying one of its
/// positions.
///
/// `resume` interprets the processor's result exactly as the engine would for
/// any entry and then runs the entries after it under the same rules. The
/// result of `resume` is the result of the whole list.
pub struct Rest<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  ctx: ContextData<TData>,
  entries: Arc<Vec<Entry<TData, Err>>>,
  index: usize,
  pending: Option<Err>,
  terminate: bool,
}

impl<TData, Err> Rest<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  /// A position with nothing after it, for a processor run on its own.
  pub fn detached(ctx: ContextData<TData>, err: Option<Err>) -> Self {
    Self {
      ctx,
      entries: Arc::new(Vec::new()),
      index: 0,
      pending: err,
      terminate: true,
    }
  }

  /// The error pending when the enclosing list reached this position.
  pub fn pending(&self) -> Option<&Err> {
    self.pending.as_ref()
  }

  /// Number of entries after this position.
  pub fn remaining(&self) -> usize {
    self.entries.len().saturating_sub(self.index + 1)
  }

  pub async fn resume(self, step: Result<Control, Err>) -> Result<Control, Err> {
    let Rest {
      ctx,
      entries,
      index,
      mut pending,
      terminate,
    } = self;
    let last_index = entries.len().saturating_sub(1);
    if let Some(result) = interpret(step, &mut pending, index, last_index, terminate) {
      return result;
    }
    run_entries(ctx, pending, entries, index + 1, terminate).await
  }
}

// Manual impl: a derive would demand `TData: Clone`.
impl<TData, Err> Clone for Rest<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn clone(&self) -> Self {
    Self {
      ctx: self.ctx.clone(),
      entries: Arc::clone(&self.entries),
      index: self.index,
      pending: self.pending.clone(),
      terminate: self.terminate,
    }
  }
}

impl<TData, Err> fmt::Debug for Rest<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Rest")
      .field("index", &self.index)
      .field("remaining", &self.remaining())
      .field("pending", &self.pending)
      .field("terminate", &self.terminate)
      .finish()
  }
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  /// Runs the pipeline. An `Abort` anywhere in this pipeline's own list
  /// terminates the whole list.
  ///
  /// `err` seeds the pending error, as when the pipeline is nested and an error
  /// is already pending in the parent.
  pub async fn process(&self, ctx: ContextData<TData>, err: Option<Err>) -> Result<Control, Err> {
    run_entries(ctx, err, Arc::clone(&self.entries), 0, true).await
  }

  /// Runs the pipeline against the given shared context `ctx_data`.
  ///
  /// Returns `PipelineResult::Stopped` when the run was aborted (or the done
  /// marker was set), `PipelineResult::Completed` otherwise, and `Err` when an
  /// error was still pending after the last handler.
  #[instrument(
        name = "Pipeline::run",
        skip_all,
        fields(
            pipeline_context_data_type = %std::any::type_name::<TData>(),
            pipeline_error_type = %std::any::type_name::<Err>(),
            num_entries = self.entries.len(),
        ),
        err(Debug)
    )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");
    let control = run_entries(ctx_data, None, Arc::clone(&self.entries), 0, true).await?;
    let result = PipelineResult::from(control);
    event!(Level::DEBUG, result = ?result, "Pipeline execution finished.");
    Ok(result)
  }

  /// Like `run`, but starts with `err` already pending.
  #[instrument(
        name = "Pipeline::run_with_error",
        skip_all,
        fields(
            pipeline_context_data_type = %std::any::type_name::<TData>(),
            num_entries = self.entries.len(),
            incoming_error = ?err,
        ),
        err(Debug)
    )]
  pub async fn run_with_error(&self, ctx_data: ContextData<TData>, err: Err) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting with a pending error.");
    let control = run_entries(ctx_data, Some(err), Arc::clone(&self.entries), 0, true).await?;
    let result = PipelineResult::from(control);
    event!(Level::DEBUG, result = ?result, "Pipeline execution finished.");
    Ok(result)
  }
}

#[async_trait]
impl<TData, Err> Processor<TData, Err> for Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  async fn process(&self, ctx: ContextData<TData>, err: Option<Err>) -> Result<Control, Err> {
    Pipeline::process(self, ctx, err).await
  }

  fn meta(&self) -> Option<&Meta> {
    Pipeline::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    Pipeline::hierarchy(self)
  }
}
