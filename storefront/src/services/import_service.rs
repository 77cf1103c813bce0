// storefront/src/services/import_service.rs

//! Catalog file import: object-created events, the incoming-prefix scan and
//! CSV decoding.

use crate::config::ImportConfig;
use crate::errors::Result;
use crate::models::ImportBatchMessage;
use crate::pipelines::contexts::ImportFileCtxData;
use crate::state::AppState;
use csv::{ReaderBuilder, Trim};
use flow::{ContextData, PipelineResult};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// A CSV row that could not become an [`ImportBatchMessage`]. Logged and
/// skipped; the rest of the file still imports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row}: {reason}")]
pub struct RowError {
  /// 1-based position among the data rows (the header is not counted).
  pub row: usize,
  pub reason: String,
}

/// An object landed in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCreatedEvent {
  pub key: String,
}

impl ObjectCreatedEvent {
  pub fn new(key: impl Into<String>) -> Self {
    Self { key: key.into() }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
  /// The key is not an importable upload (placeholder, directory marker or
  /// outside the incoming prefix).
  Ignored,
  /// The object was already gone, usually relocated by an earlier delivery.
  Missing,
  Imported(ImportSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
  pub key: String,
  pub processed_key: String,
  /// Zero when an earlier attempt already enqueued the same rows.
  pub rows_enqueued: usize,
  pub rows_skipped: usize,
  pub placeholder_restored: bool,
}

/// Files whose rows reached the queue but which are still waiting to be
/// relocated.
///
/// A later trigger for such a key that parses to the same rows only retries
/// the relocation, so a relocation that keeps failing does not flood the
/// queue with copies of the file.
#[derive(Debug, Default)]
pub struct ImportLedger {
  pending: Mutex<HashMap<String, PendingRelocation>>,
}

#[derive(Debug)]
struct PendingRelocation {
  messages: Vec<ImportBatchMessage>,
  failed_relocations: u32,
}

impl ImportLedger {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn mark_enqueued(&self, key: &str, messages: Vec<ImportBatchMessage>) {
    self.pending.lock().insert(
      key.to_string(),
      PendingRelocation {
        messages,
        failed_relocations: 0,
      },
    );
  }

  /// Whether `messages` for `key` are exactly the rows already on the queue.
  pub fn already_enqueued(&self, key: &str, messages: &[ImportBatchMessage]) -> bool {
    self
      .pending
      .lock()
      .get(key)
      .is_some_and(|pending| pending.messages == messages)
  }

  /// Counts a failed relocation of `key`; returns the failures so far.
  pub fn record_relocation_failure(&self, key: &str) -> u32 {
    match self.pending.lock().get_mut(key) {
      Some(pending) => {
        pending.failed_relocations += 1;
        pending.failed_relocations
      }
      None => 0,
    }
  }

  pub fn forget(&self, key: &str) {
    self.pending.lock().remove(key);
  }

  pub fn pending_len(&self) -> usize {
    self.pending.lock().len()
  }
}

/// Whether an object key should trigger an import.
pub fn is_importable(config: &ImportConfig, key: &str) -> bool {
  key.starts_with(&config.incoming_prefix)
    && key.len() > config.incoming_prefix.len()
    && !key.ends_with('/')
    && key != config.placeholder_key()
}

/// Destination of `key` once parsed: the incoming prefix swapped for the processed one.
pub fn processed_key_for(config: &ImportConfig, key: &str) -> String {
  let rest = key.strip_prefix(&config.incoming_prefix).unwrap_or(key);
  format!("{}{}", config.processed_prefix, rest)
}

/// Runs the import pipeline for one object-created event.
#[instrument(name = "import_service::handle_object_created", skip(state, event), fields(key = %event.key), err(Display))]
pub async fn handle_object_created(state: &AppState, event: ObjectCreatedEvent) -> Result<ImportOutcome> {
  if !is_importable(&state.config.import, &event.key) {
    debug!("Ignoring object event.");
    return Ok(ImportOutcome::Ignored);
  }

  let ctx = ContextData::new(ImportFileCtxData::new(state.clone(), event.key));
  let result = state.flows.run(ctx.clone()).await?;

  let guard = ctx.read();
  if result == PipelineResult::Stopped || guard.processed_key.is_none() {
    return Ok(ImportOutcome::Missing);
  }
  let summary = ImportSummary {
    key: guard.key.clone(),
    processed_key: guard.processed_key.clone().unwrap_or_default(),
    rows_enqueued: guard.enqueued,
    rows_skipped: guard.row_errors.len(),
    placeholder_restored: guard.placeholder_restored,
  };
  info!(
    rows_enqueued = summary.rows_enqueued,
    rows_skipped = summary.rows_skipped,
    "Catalog file imported."
  );
  Ok(ImportOutcome::Imported(summary))
}

/// Imports every pending upload under the incoming prefix. A failing object
/// is logged and left in place for the next scan.
#[instrument(name = "import_service::scan_incoming", skip(state))]
pub async fn scan_incoming(state: &AppState) -> Result<Vec<ImportOutcome>> {
  let keys = state.objects.list(&state.config.import.incoming_prefix).await?;
  let mut outcomes = Vec::new();
  for key in keys {
    if !is_importable(&state.config.import, &key) {
      continue;
    }
    match handle_object_created(state, ObjectCreatedEvent::new(key.clone())).await {
      Ok(outcome) => outcomes.push(outcome),
      Err(e) => warn!(key = %key, error = %e, "Import failed; object stays in the incoming prefix."),
    }
  }
  Ok(outcomes)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
  #[serde(default)]
  id: Option<String>,
  #[serde(default)]
  title: Option<String>,
  #[serde(default)]
  description: Option<String>,
  #[serde(default)]
  price: Option<String>,
  #[serde(default)]
  count: Option<String>,
}

/// Decodes a catalog CSV (header row `id,title,description,price,count`, any
/// column order, `id` and `description` optional).
///
/// Rows without an id get a UUID v5 derived from `key` and the row number, so
/// parsing the same file twice yields the same ids.
pub fn parse_catalog_csv(key: &str, body: &[u8]) -> (Vec<ImportBatchMessage>, Vec<RowError>) {
  let mut reader = ReaderBuilder::new()
    .trim(Trim::All)
    .flexible(true)
    .from_reader(body);

  let mut messages = Vec::new();
  let mut errors = Vec::new();
  for (index, record) in reader.deserialize::<CsvRow>().enumerate() {
    let row = index + 1;
    let decoded = record
      .map_err(|e| e.to_string())
      .and_then(|raw| row_to_message(key, row, raw));
    match decoded {
      Ok(message) => messages.push(message),
      Err(reason) => errors.push(RowError { row, reason }),
    }
  }
  (messages, errors)
}

fn row_to_message(key: &str, row: usize, raw: CsvRow) -> std::result::Result<ImportBatchMessage, String> {
  let title = non_empty(raw.title).ok_or("missing title")?;
  let price = non_empty(raw.price)
    .ok_or("missing price")?
    .parse::<f64>()
    .map_err(|e| format!("invalid price: {}", e))?;
  if !price.is_finite() || price < 0.0 {
    return Err(format!("invalid price: {}", price));
  }
  let count = non_empty(raw.count)
    .ok_or("missing count")?
    .parse::<i32>()
    .map_err(|e| format!("invalid count: {}", e))?;
  if count < 0 {
    return Err(format!("invalid count: {}", count));
  }
  let id = non_empty(raw.id)
    .unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{}#{}", key, row).as_bytes()).to_string());

  Ok(ImportBatchMessage {
    id,
    title,
    description: raw.description.unwrap_or_default(),
    price,
    count,
  })
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.is_empty())
}
