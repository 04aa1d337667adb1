// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use orka_flow::{ContextData, Control, Handler, Layer};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Common Context Structs ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
  pub errors_seen: Vec<String>,
  pub flag: bool,
}

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)] // Clone for the pending error, Eq for assertions
pub enum TestError {
  #[error("Test handler failed: {0}")]
  Handler(String),

  #[error("Test predicate failed: {0}")]
  Predicate(String),

  #[error("Test middleware failed: {0}")]
  Middleware(String),
}

impl TestError {
  pub fn message(&self) -> &str {
    match self {
      TestError::Handler(m) | TestError::Predicate(m) | TestError::Middleware(m) => m,
    }
  }
}

pub fn new_ctx() -> ContextData<TestContext> {
  ContextData::new(TestContext::default())
}

pub fn steps(ctx: &ContextData<TestContext>) -> Vec<String> {
  ctx.read().steps_executed.clone()
}

pub fn record(ctx: &ContextData<TestContext>, step_name: &str) {
  let mut guard = ctx.write();
  guard.counter += 1;
  guard.steps_executed.push(step_name.to_string());
  tracing::debug!(target: "test_handlers", step = %step_name, "executed, counter: {}", guard.counter);
}

// --- Common Handler Creators ---

/// Records its name; aborts when `should_stop_at` names it.
pub fn step_handler(step_name: &'static str) -> Handler<TestContext, TestError> {
  Handler::task(move |ctx: ContextData<TestContext>| async move {
    record(&ctx, step_name);
    let stop_here = ctx.read().should_stop_at.as_deref() == Some(step_name);
    if stop_here {
      Ok::<Control, TestError>(Control::Abort)
    } else {
      Ok(Control::Continue)
    }
  })
}

pub fn abort_handler(step_name: &'static str) -> Handler<TestContext, TestError> {
  Handler::task(move |ctx: ContextData<TestContext>| async move {
    record(&ctx, step_name);
    Ok::<Control, TestError>(Control::Abort)
  })
}

pub fn failing_handler(step_name: &'static str, error_message: &'static str) -> Handler<TestContext, TestError> {
  Handler::task(move |ctx: ContextData<TestContext>| async move {
    record(&ctx, step_name);
    tracing::warn!(target: "test_handlers", step = %step_name, "failing with: '{}'", error_message);
    Err::<Control, TestError>(TestError::Handler(error_message.to_string()))
  })
}

/// Records its name and sets the done marker.
pub fn done_handler(step_name: &'static str) -> Handler<TestContext, TestError> {
  Handler::task(move |ctx: ContextData<TestContext>| async move {
    record(&ctx, step_name);
    ctx.mark_done();
    Ok::<Control, TestError>(Control::Continue)
  })
}

/// Error handler that records the error and clears it.
pub fn clearing_error_handler(step_name: &'static str) -> Handler<TestContext, TestError> {
  Handler::error(move |ctx: ContextData<TestContext>, err: TestError| async move {
    record(&ctx, step_name);
    ctx.write().errors_seen.push(err.message().to_string());
    Ok::<Control, TestError>(Control::Clear)
  })
}

/// Error handler that records the error and leaves it pending.
pub fn observing_error_handler(step_name: &'static str) -> Handler<TestContext, TestError> {
  Handler::error(move |ctx: ContextData<TestContext>, err: TestError| async move {
    record(&ctx, step_name);
    ctx.write().errors_seen.push(err.message().to_string());
    Ok::<Control, TestError>(Control::Continue)
  })
}

/// Error handler that replaces the pending error with a new one.
pub fn replacing_error_handler(step_name: &'static str, error_message: &'static str) -> Handler<TestContext, TestError> {
  Handler::error(move |ctx: ContextData<TestContext>, err: TestError| async move {
    record(&ctx, step_name);
    ctx.write().errors_seen.push(err.message().to_string());
    Err::<Control, TestError>(TestError::Handler(error_message.to_string()))
  })
}

// --- Common Layer Creators ---

/// Auto layer: records its name, continuation runs afterwards.
pub fn step_layer(step_name: &'static str) -> Layer<TestContext, TestError> {
  Layer::auto(move |ctx: ContextData<TestContext>| async move {
    record(&ctx, step_name);
    Ok::<(), TestError>(())
  })
}

pub fn failing_layer(step_name: &'static str, error_message: &'static str) -> Layer<TestContext, TestError> {
  Layer::auto(move |ctx: ContextData<TestContext>| async move {
    record(&ctx, step_name);
    Err::<(), TestError>(TestError::Middleware(error_message.to_string()))
  })
}

/// Manual layer that never calls its continuation.
pub fn halting_layer(step_name: &'static str) -> Layer<TestContext, TestError> {
  Layer::manual(move |ctx: ContextData<TestContext>, _next| async move {
    record(&ctx, step_name);
    Ok::<(), TestError>(())
  })
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counters for checking execution counts ---
pub static HANDLER_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));
pub static PREDICATE_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  HANDLER_EXEC_COUNTER.store(0, Ordering::SeqCst);
  PREDICATE_EXEC_COUNTER.store(0, Ordering::SeqCst);
}
