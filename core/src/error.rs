// orka_flow/src/error.rs
use anyhow::Error as AnyhowError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Bound for values that can travel through a chain as the pending error.
///
/// Pending errors are handed to every error handler and nested processor that
/// observes them while remaining pending for the rest of the list, so they must
/// be cheaply `Clone`. Any `Clone + Debug + Send + Sync + 'static` type qualifies,
/// including plain strings.
pub trait ErrorValue: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> ErrorValue for T where T: Clone + fmt::Debug + Send + Sync + 'static {}

/// Default error type for pipelines and stacks.
#[derive(Debug, Clone, Error)]
pub enum FlowError {
  #[error("Handler failed: {message}")]
  Handler { message: String },

  #[error("Error in user-provided handler or external operation. Source: {source}")]
  External {
    #[source]
    source: Arc<dyn std::error::Error + Send + Sync + 'static>,
  },
}

impl FlowError {
  /// Shorthand for a `FlowError::Handler` with the given message.
  pub fn handler<S: Into<String>>(message: S) -> Self {
    FlowError::Handler {
      message: message.into(),
    }
  }
}

// The key conversion for handlers written against anyhow.
impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    // Avoid External(FlowError(..)) when the anyhow error already wraps one of ours.
    match err.downcast::<FlowError>() {
      Ok(flow_err) => flow_err,
      Err(other) => {
        let boxed: Box<dyn std::error::Error + Send + Sync + 'static> = other.into();
        FlowError::External { source: Arc::from(boxed) }
      }
    }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
