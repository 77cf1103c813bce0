// storefront/src/pipelines/mod.rs

//! Defines and registers the pipelines the service runs through `flow`.

use crate::errors::AppError;
use flow::Flow;

pub mod contexts;

pub mod cart_pipeline;
pub mod catalog_batch_pipeline;
pub mod import_pipeline;

/// Registers every pipeline with `flows`. Called once at startup.
pub fn register_all_pipelines(flows: &Flow<AppError>) {
  tracing::info!("Registering pipelines...");

  cart_pipeline::register_upsert_cart_item_pipeline(flows);
  import_pipeline::register_import_file_pipeline(flows);
  catalog_batch_pipeline::register_catalog_write_pipeline(flows);

  tracing::info!("All application pipelines registered.");
}
