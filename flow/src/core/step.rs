// flow/src/core/step.rs

use super::context_data::ContextData;
use std::sync::Arc;

/// Predicate evaluated before a step runs. Returning `true` skips the step.
pub type SkipCondition<TData> = Arc<dyn Fn(ContextData<TData>) -> bool + Send + Sync + 'static>;

/// A named step of a pipeline.
#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  /// An optional step without handlers is skipped instead of failing the run.
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
