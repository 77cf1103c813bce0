// flow/src/pipeline/execution.rs

//! `Pipeline::run`: walks the steps and drives their handlers.

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, info_span, instrument, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// For each step the skip condition is checked first, then the `before`,
  /// `on` and `after` handlers run in registration order. The first handler
  /// error aborts the run and is returned unchanged; a `Stop` ends the run
  /// with [`PipelineResult::Stopped`].
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    if let Some(step_name) = self.unknown_steps.first() {
      event!(Level::ERROR, step_name = %step_name, "Pipeline has hooks for an undefined step.");
      return Err(Err::from(FlowError::StepNotFound {
        step_name: step_name.clone(),
      }));
    }

    for (step_index, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(ctx_data.clone()) {
          event!(Level::DEBUG, step_name, "Step skipped by its condition.");
          continue;
        }
      }

      let phases = [
        ("before", self.before.get(step_name)),
        ("on", self.on.get(step_name)),
        ("after", self.after.get(step_name)),
      ];
      let has_handlers = phases.iter().any(|(_, handlers)| handlers.is_some_and(|v| !v.is_empty()));

      if !has_handlers {
        if step_def.optional {
          event!(Level::DEBUG, step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, step_name, "Non-optional step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      let step_span = info_span!("pipeline_step", step_name, step_index, optional = step_def.optional);
      for (phase, handlers) in phases {
        let Some(handlers) = handlers else { continue };
        let control = run_phase(phase, handlers, &ctx_data)
          .instrument(step_span.clone())
          .await?;
        if control == PipelineControl::Stop {
          event!(Level::INFO, step_name, phase, "Pipeline stopped by a handler.");
          return Ok(PipelineResult::Stopped);
        }
      }
    }

    event!(Level::DEBUG, "Pipeline completed.");
    Ok(PipelineResult::Completed)
  }
}

async fn run_phase<TData, Err>(
  phase: &'static str,
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
) -> Result<PipelineControl, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for (handler_index, handler_fn) in handlers.iter().enumerate() {
    match handler_fn(ctx_data.clone()).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => return Ok(PipelineControl::Stop),
      Err(e) => {
        event!(Level::WARN, phase, handler_index, error = %e, "Handler failed.");
        return Err(e);
      }
    }
  }
  Ok(PipelineControl::Continue)
}
