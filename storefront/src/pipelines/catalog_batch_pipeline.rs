// storefront/src/pipelines/catalog_batch_pipeline.rs

use crate::errors::AppError;
use crate::models::{ImportBatchMessage, ProductNotification};
use crate::pipelines::contexts::CatalogWriteCtxData;
use crate::services::catalog_service::validate_import_message;
use flow::{ContextData, Flow, Pipeline, PipelineControl};
use tracing::{info, warn};

/// One queue message in, one atomic Product+Stock write out.
pub fn register_catalog_write_pipeline(flows: &Flow<AppError>) {
  let mut p = Pipeline::<CatalogWriteCtxData, AppError>::new(&[
    ("validate_message", false, None),
    ("write_product_and_stock", false, None),
    ("publish_notification", false, None),
  ]);

  p.on_root("validate_message", |ctx_data: ContextData<CatalogWriteCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let message: ImportBatchMessage = serde_json::from_str(&guard.body)
        .map_err(|e| AppError::Validation(format!("Undecodable catalog message: {}", e)))?;
      validate_import_message(&message)?;
      guard.message = Some(message);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("write_product_and_stock", |ctx_data: ContextData<CatalogWriteCtxData>| {
    Box::pin(async move {
      let (catalog, message, message_id) = {
        let guard = ctx_data.read();
        (guard.app_state.catalog.clone(), guard.message.clone(), guard.message_id)
      };
      let message = message.ok_or_else(|| AppError::Internal("Catalog message not decoded".to_string()))?;

      let (product, stock) = message.split();
      catalog.put_product_with_stock(&product, stock).await?;
      info!(%message_id, product_id = %product.id, count = stock.count, "Catalog Pipeline: Product and stock written.");
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // The write is committed; a failed publish must not turn into a redelivery.
  p.on_root("publish_notification", |ctx_data: ContextData<CatalogWriteCtxData>| {
    Box::pin(async move {
      let (notifier, message) = {
        let guard = ctx_data.read();
        (guard.app_state.notifier.clone(), guard.message.clone())
      };
      let Some(message) = message else {
        return Ok(PipelineControl::Continue);
      };

      let notification = ProductNotification::created(&message);
      match notifier.publish(&notification).await {
        Ok(()) => ctx_data.write().notified = true,
        Err(e) => warn!(product_id = %message.id, error = %e, "Catalog Pipeline: Notification failed."),
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register_pipeline(p);
}
