// storefront/src/services/batch_consumer.rs

//! Drains the catalog queue in batches. Every message runs the catalog write
//! pipeline on its own; one failure never affects its siblings.

use crate::errors::Result;
use crate::pipelines::contexts::CatalogWriteCtxData;
use crate::services::queue::QueueMessage;
use crate::state::AppState;
use flow::ContextData;
use futures_util::future::join_all;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// What became of each message in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
  /// Written (and acknowledged).
  pub succeeded: Vec<Uuid>,
  /// Written, but the notification could not be published. Also in `succeeded`.
  pub unnotified: Vec<Uuid>,
  /// Failed with a retryable error; to be released for redelivery.
  pub failed: Vec<Uuid>,
  /// Undecodable or invalid; acknowledged without a write.
  pub dropped: Vec<Uuid>,
}

impl BatchReport {
  pub fn is_empty(&self) -> bool {
    self.succeeded.is_empty() && self.failed.is_empty() && self.dropped.is_empty()
  }
}

/// Processes `messages` concurrently and classifies the outcome of each one.
/// Does not touch the queue.
#[instrument(name = "batch_consumer::consume_batch", skip_all, fields(batch_size = messages.len()))]
pub async fn consume_batch(state: &AppState, messages: Vec<QueueMessage>) -> BatchReport {
  let runs = messages.into_iter().map(|message| async move {
    let ctx = ContextData::new(CatalogWriteCtxData::new(state.clone(), message.id, message.body));
    let outcome = state.flows.run(ctx.clone()).await;
    let notified = ctx.read().notified;
    (message.id, outcome, notified)
  });

  let mut report = BatchReport::default();
  for (message_id, outcome, notified) in join_all(runs).await {
    match outcome {
      Ok(_) => {
        report.succeeded.push(message_id);
        if !notified {
          report.unnotified.push(message_id);
        }
      }
      Err(e) if e.is_retryable() => {
        warn!(message_id = %message_id, error = %e, "Catalog write failed; message will be redelivered.");
        report.failed.push(message_id);
      }
      Err(e) => {
        warn!(message_id = %message_id, error = %e, "Dropping message that cannot succeed.");
        report.dropped.push(message_id);
      }
    }
  }

  info!(
    succeeded = report.succeeded.len(),
    unnotified = report.unnotified.len(),
    failed = report.failed.len(),
    dropped = report.dropped.len(),
    "Batch processed."
  );
  report
}

/// Receives one batch, processes it and settles every message with the queue:
/// acknowledged when succeeded or dropped, released when failed.
#[instrument(name = "batch_consumer::poll_once", skip(state))]
pub async fn poll_once(state: &AppState) -> Result<BatchReport> {
  let messages = state.queue.receive(state.config.queue.batch_size).await?;
  if messages.is_empty() {
    return Ok(BatchReport::default());
  }

  let report = consume_batch(state, messages).await;

  for id in report.succeeded.iter().chain(report.dropped.iter()) {
    if let Err(e) = state.queue.ack(*id).await {
      error!(message_id = %id, error = %e, "Failed to acknowledge message.");
    }
  }
  for id in &report.failed {
    if let Err(e) = state.queue.release(*id).await {
      error!(message_id = %id, error = %e, "Failed to release message.");
    }
  }
  Ok(report)
}
