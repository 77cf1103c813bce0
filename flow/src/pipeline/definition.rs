// flow/src/pipeline/definition.rs

//! `Pipeline<TData, Err>` and its structural methods.

use crate::core::context::Handler;
use crate::core::step::{SkipCondition, StepDef};
use crate::error::FlowError;
use std::collections::HashMap;

/// An ordered set of named steps operating on `ContextData<TData>`.
///
/// `Err` is the error type returned by handlers and by [`Pipeline::run`]. It
/// must be convertible from [`FlowError`] so engine failures (a required step
/// without handlers, a hook registered for an unknown step) surface through
/// the same type.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData>>,

  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,

  // Hooks registered against names that are not steps; reported on run.
  pub(crate) unknown_steps: Vec<String>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(name, optional, skip_if)` triples, in run order.
  pub fn new(step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional, skip_if)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
      unknown_steps: Vec::new(),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn has_step(&self, step_name: &str) -> bool {
    self.steps.iter().any(|s| s.name == step_name)
  }

  pub fn set_optional(&mut self, step_name: &str, optional: bool) {
    match self.steps.iter_mut().find(|s| s.name == step_name) {
      Some(step) => step.optional = optional,
      None => self.note_unknown_step(step_name),
    }
  }

  pub fn set_skip_condition(&mut self, step_name: &str, skip_if: Option<SkipCondition<TData>>) {
    match self.steps.iter_mut().find(|s| s.name == step_name) {
      Some(step) => step.skip_if = skip_if,
      None => self.note_unknown_step(step_name),
    }
  }

  pub(crate) fn note_unknown_step(&mut self, step_name: &str) {
    tracing::warn!(step_name, "Hook registered for a step the pipeline does not define.");
    if !self.unknown_steps.iter().any(|s| s == step_name) {
      self.unknown_steps.push(step_name.to_string());
    }
  }
}

impl<TData, Err> std::fmt::Debug for Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pipeline")
      .field("steps", &self.steps)
      .field("unknown_steps", &self.unknown_steps)
      .finish()
  }
}
