// orka_flow/src/core/control.rs

//! Defines signals for controlling chain flow and the outcome of a pipeline run.

/// Signal returned by a handler (alongside `Err(e)` for failures).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
  /// No-op. A pending error, if any, stays pending.
  Continue,
  /// Terminal signal. Stops the current list; how far it travels outward follows
  /// the last-position rule of the engine.
  Abort,
  /// Clears the pending error so task handlers become eligible again.
  Clear,
}

/// Outcome of a full pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// The handler list was exhausted without an unresolved error.
  Completed,
  /// The run was cut short by `Control::Abort` or the done marker.
  Stopped,
}

impl From<Control> for PipelineResult {
  fn from(control: Control) -> Self {
    match control {
      Control::Abort => PipelineResult::Stopped,
      Control::Continue | Control::Clear => PipelineResult::Completed,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_abort_stops_a_run() {
    assert_eq!(PipelineResult::from(Control::Abort), PipelineResult::Stopped);
    assert_eq!(PipelineResult::from(Control::Continue), PipelineResult::Completed);
    assert_eq!(PipelineResult::from(Control::Clear), PipelineResult::Completed);
  }
}
