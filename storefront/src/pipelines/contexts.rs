// storefront/src/pipelines/contexts.rs

//! Data structs the pipelines operate on. Handlers receive them wrapped in
//! `flow::ContextData`; each starts with the `AppState` the steps need.

use crate::models::{Cart, ImportBatchMessage, ItemChange, ProductSnapshot};
use crate::services::import_service::RowError;
use crate::state::AppState;
use uuid::Uuid;

#[derive(Clone)]
pub struct UpsertCartItemCtxData {
  pub app_state: AppState,
  pub user_id: String,
  pub product: ProductSnapshot,
  pub count: i32,
  pub cart_id: Option<Uuid>,
  pub change: Option<ItemChange>,
  pub cart: Option<Cart>,
}

impl UpsertCartItemCtxData {
  pub fn new(app_state: AppState, user_id: &str, product: ProductSnapshot, count: i32) -> Self {
    Self {
      app_state,
      user_id: user_id.to_string(),
      product,
      count,
      cart_id: None,
      change: None,
      cart: None,
    }
  }
}

#[derive(Clone)]
pub struct ImportFileCtxData {
  pub app_state: AppState,
  pub key: String,
  pub body: Vec<u8>,
  pub messages: Vec<ImportBatchMessage>,
  pub row_errors: Vec<RowError>,
  /// The same rows were enqueued by an earlier attempt whose relocation failed.
  pub already_enqueued: bool,
  pub enqueued: usize,
  pub processed_key: Option<String>,
  pub placeholder_restored: bool,
}

impl ImportFileCtxData {
  pub fn new(app_state: AppState, key: String) -> Self {
    Self {
      app_state,
      key,
      body: Vec::new(),
      messages: Vec::new(),
      row_errors: Vec::new(),
      already_enqueued: false,
      enqueued: 0,
      processed_key: None,
      placeholder_restored: false,
    }
  }
}

#[derive(Clone)]
pub struct CatalogWriteCtxData {
  pub app_state: AppState,
  pub message_id: Uuid,
  pub body: String,
  pub message: Option<ImportBatchMessage>,
  pub notified: bool,
}

impl CatalogWriteCtxData {
  pub fn new(app_state: AppState, message_id: Uuid, body: String) -> Self {
    Self {
      app_state,
      message_id,
      body,
      message: None,
      notified: false,
    }
  }
}
