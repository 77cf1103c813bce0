// flow/src/core/control.rs

//! Signals returned by handlers and the outcome of a whole run.

/// Returned by every handler to tell the pipeline what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  /// Keep going with the remaining handlers and steps.
  Continue,
  /// Halt the run. No further handler of this or any later step executes.
  Stop,
}

/// Outcome of a pipeline run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every step that was not skipped ran to completion.
  Completed,
  /// A handler returned [`PipelineControl::Stop`].
  Stopped,
}
