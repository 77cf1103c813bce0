// flow/src/lib.rs

//! Flow: asynchronous step pipelines for request and event handlers.
//!
//! A pipeline is an ordered list of named steps. Each step may carry
//! `before`, `on` and `after` handlers that receive a shared
//! [`ContextData`] and decide whether execution continues or stops.
//! Steps can be optional and can be skipped by a condition evaluated
//! against the context. A [`Flow`] registry keeps one pipeline per context
//! type so callers only need the context to dispatch work.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::Flow;
