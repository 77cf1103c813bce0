// flow/src/core/context.rs

//! The boxed handler type stored by pipelines.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A step handler: takes a clone of the run's [`ContextData`] and resolves to
/// a [`PipelineControl`] or the pipeline's error type.
///
/// Handlers must release their lock guards before any `.await`.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
