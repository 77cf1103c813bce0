// flow/src/registry.rs

//! `Flow<E>`: a registry holding one pipeline per context type.
//!
//! Callers build a `ContextData<TData>` and hand it to [`Flow::run`]; the
//! registry finds the pipeline registered for `TData` and returns its result
//! mapped into the application error `E`.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineResult;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait ErasedRunner<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  /// `ctx_obj` must hold a `ContextData<TData>` for the runner's `TData`.
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr>;
}

struct TypedRunner<TData, HandlerErr, AppErr>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Pipeline<TData, HandlerErr>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, HandlerErr, AppErr> ErasedRunner<AppErr> for TypedRunner<TData, HandlerErr, AppErr>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr> {
    let ctx_data = match ctx_obj.downcast::<ContextData<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected_type = std::any::type_name::<ContextData<TData>>().to_string();
        event!(Level::ERROR, expected = %expected_type, "Context object type mismatch.");
        return Err(AppErr::from(FlowError::TypeMismatch { expected_type }));
      }
    };
    self.pipeline.run(ctx_data).await.map_err(AppErr::from)
  }
}

/// Pipeline registry. `AppErr` is the error type [`Flow::run`] returns.
pub struct Flow<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  registry: RwLock<HashMap<TypeId, Arc<dyn ErasedRunner<AppErr>>>>,
}

impl<AppErr> Flow<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      registry: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` for its context type, replacing any earlier one.
  pub fn register_pipeline<TData, HandlerErr>(&self, pipeline: Pipeline<TData, HandlerErr>)
  where
    TData: 'static + Send + Sync,
    HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<HandlerErr>,
  {
    event!(Level::DEBUG, context_type = %std::any::type_name::<TData>(), "Registering pipeline.");
    let runner = TypedRunner::<TData, HandlerErr, AppErr> {
      pipeline,
      _app_err: PhantomData,
    };
    self.registry.write().insert(TypeId::of::<TData>(), Arc::new(runner));
  }

  pub fn is_registered<TData: 'static + Send + Sync>(&self) -> bool {
    self.registry.read().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the pipeline registered for `TData`.
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self
      .registry
      .read()
      .get(&TypeId::of::<TData>())
      .cloned()
      .ok_or_else(|| {
        let type_name = std::any::type_name::<TData>();
        event!(Level::ERROR, context_type = %type_name, "No pipeline registered.");
        AppErr::from(FlowError::Configuration {
          message: format!("No pipeline registered for context type {}", type_name),
        })
      })?;

    runner.run_erased(Box::new(ctx_data)).await
  }
}

impl<AppErr> Default for Flow<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> std::fmt::Debug for Flow<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Flow")
      .field("registered_pipelines", &self.registry.read().len())
      .finish()
  }
}
