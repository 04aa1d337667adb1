// orka_flow/src/middleware/next.rs

use crate::core::handler::BoxFuture;
use std::fmt;
use std::future::Future;

/// One-shot continuation handed to every middleware.
///
/// Running it executes the rest of the stack (and finally the caller's tail).
/// Dropping it without running short-circuits everything after the current
/// middleware.
pub struct Next<Err> {
  continuation: Box<dyn FnOnce() -> BoxFuture<'static, Result<(), Err>> + Send>,
}

impl<Err> Next<Err>
where
  Err: Send + 'static,
{
  pub fn new<F, Fut>(f: F) -> Self
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), Err>> + Send + 'static,
  {
    Self {
      continuation: Box::new(move || -> BoxFuture<'static, Result<(), Err>> { Box::pin(f()) }),
    }
  }

  /// A continuation that resolves immediately.
  pub fn noop() -> Self {
    Self::new(|| async { Ok(()) })
  }

  pub async fn run(self) -> Result<(), Err> {
    (self.continuation)().await
  }
}

impl<Err> fmt::Debug for Next<Err> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Next")
  }
}
