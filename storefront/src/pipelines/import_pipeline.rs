// storefront/src/pipelines/import_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::ImportFileCtxData;
use crate::services::import_service::{parse_catalog_csv, processed_key_for};
use flow::{ContextData, Flow, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub fn register_import_file_pipeline(flows: &Flow<AppError>) {
  let mut p = Pipeline::<ImportFileCtxData, AppError>::new(&[
    ("fetch_object", false, None),
    ("parse_rows", false, None),
    ("enqueue_rows", false, None),
    ("relocate_object", false, None),
    ("restore_placeholder", false, None),
  ]);

  p.on_root("fetch_object", |ctx_data: ContextData<ImportFileCtxData>| {
    Box::pin(async move {
      let (objects, ledger, key) = {
        let guard = ctx_data.read();
        (
          guard.app_state.objects.clone(),
          guard.app_state.import_ledger.clone(),
          guard.key.clone(),
        )
      };

      match objects.get(&key).await {
        Ok(body) => {
          debug!(key = %key, bytes = body.len(), "Import Pipeline: Object fetched.");
          ctx_data.write().body = body;
          Ok(PipelineControl::Continue)
        }
        // A redelivered event for an object that was already relocated.
        Err(AppError::NotFound(_)) => {
          info!(key = %key, "Import Pipeline: Object is gone; nothing to import.");
          ledger.forget(&key);
          Ok(PipelineControl::Stop)
        }
        Err(e) => Err(e),
      }
    })
  });

  p.on_root("parse_rows", |ctx_data: ContextData<ImportFileCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let body = std::mem::take(&mut guard.body);
      let (messages, row_errors) = parse_catalog_csv(&guard.key, &body);
      for row_error in &row_errors {
        warn!(key = %guard.key, row = row_error.row, reason = %row_error.reason, "Import Pipeline: Skipping malformed row.");
      }
      info!(key = %guard.key, parsed = messages.len(), skipped = row_errors.len(), "Import Pipeline: CSV parsed.");
      let already_enqueued = guard.app_state.import_ledger.already_enqueued(&guard.key, &messages);
      guard.already_enqueued = already_enqueued;
      guard.messages = messages;
      guard.row_errors = row_errors;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Rows of a file that is only waiting for relocation are not sent again.
  p.set_skip_condition(
    "enqueue_rows",
    Some(Arc::new(|ctx_data: ContextData<ImportFileCtxData>| {
      let guard = ctx_data.read();
      if guard.already_enqueued {
        info!(key = %guard.key, "Import Pipeline: Rows already enqueued; retrying relocation only.");
      }
      guard.already_enqueued
    })),
  );

  // A send failure aborts before relocation, so the object stays in the
  // incoming prefix and the whole file is retried.
  p.on_root("enqueue_rows", |ctx_data: ContextData<ImportFileCtxData>| {
    Box::pin(async move {
      let (queue, ledger, key, messages) = {
        let guard = ctx_data.read();
        (
          guard.app_state.queue.clone(),
          guard.app_state.import_ledger.clone(),
          guard.key.clone(),
          guard.messages.clone(),
        )
      };

      for message in &messages {
        let body = serde_json::to_string(message)
          .map_err(|e| AppError::Internal(format!("Failed to encode queue message: {}", e)))?;
        queue.send(body).await?;
        ctx_data.write().enqueued += 1;
      }
      debug!(enqueued = messages.len(), "Import Pipeline: Rows enqueued.");
      ledger.mark_enqueued(&key, messages);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("relocate_object", |ctx_data: ContextData<ImportFileCtxData>| {
    Box::pin(async move {
      let (objects, ledger, key, processed_key) = {
        let guard = ctx_data.read();
        (
          guard.app_state.objects.clone(),
          guard.app_state.import_ledger.clone(),
          guard.key.clone(),
          processed_key_for(&guard.app_state.config.import, &guard.key),
        )
      };

      let relocated = match objects.copy(&key, &processed_key).await {
        Ok(()) => objects.delete(&key).await,
        Err(e) => Err(e),
      };
      if let Err(e) = relocated {
        let failures = ledger.record_relocation_failure(&key);
        warn!(key = %key, failures, error = %e, "Import Pipeline: Relocation failed; rows stay enqueued.");
        return Err(e);
      }
      ledger.forget(&key);
      info!(from = %key, to = %processed_key, "Import Pipeline: Object relocated.");
      ctx_data.write().processed_key = Some(processed_key);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // The incoming prefix must never disappear. The import already succeeded
  // at this point, so a failure here is only logged.
  p.on_root("restore_placeholder", |ctx_data: ContextData<ImportFileCtxData>| {
    Box::pin(async move {
      let (objects, placeholder) = {
        let guard = ctx_data.read();
        (
          guard.app_state.objects.clone(),
          guard.app_state.config.import.placeholder_key(),
        )
      };

      let restored = match objects.exists(&placeholder).await {
        Ok(true) => false,
        Ok(false) => match objects.put(&placeholder, Vec::new()).await {
          Ok(()) => true,
          Err(e) => {
            warn!(placeholder = %placeholder, error = %e, "Import Pipeline: Could not restore placeholder.");
            false
          }
        },
        Err(e) => {
          warn!(placeholder = %placeholder, error = %e, "Import Pipeline: Could not check placeholder.");
          false
        }
      };
      if restored {
        debug!(placeholder = %placeholder, "Import Pipeline: Placeholder restored.");
      }
      ctx_data.write().placeholder_restored = restored;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register_pipeline(p);
}
