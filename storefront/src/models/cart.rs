// storefront/src/models/cart.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type as SqlxType;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "cart_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartStatus {
  Open,
  CheckedOut,
}

/// Product details copied into the cart when the item is added. Later catalog
/// edits do not change it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
  pub id: Uuid,
  #[serde(skip_serializing)]
  pub cart_id: Uuid,
  pub product: ProductSnapshot,
  pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
  pub id: Uuid,
  pub user_id: String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at: DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub updated_at: DateTime<Utc>,
  pub status: CartStatus,
  pub items: Vec<CartItem>,
}

impl Cart {
  pub fn new_open(user_id: &str) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      user_id: user_id.to_string(),
      created_at: now,
      updated_at: now,
      status: CartStatus::Open,
      items: Vec::new(),
    }
  }

  pub fn item_for(&self, product_id: &str) -> Option<&CartItem> {
    self.items.iter().find(|item| item.product.id == product_id)
  }
}

/// What an upsert did to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemChange {
  Removed { item_id: Uuid },
  Updated { item_id: Uuid, count: i32 },
  Inserted { item_id: Uuid, count: i32 },
  Unchanged,
}

impl ItemChange {
  /// Decides the change for a requested `count` given the existing item for
  /// the product, if any. A count of zero removes; a positive count replaces.
  ///
  /// `new_item_id` is only used when an item has to be inserted.
  pub fn plan(existing_item: Option<Uuid>, count: i32, new_item_id: Uuid) -> Self {
    match (existing_item, count) {
      (Some(item_id), 0) => ItemChange::Removed { item_id },
      (Some(item_id), count) => ItemChange::Updated { item_id, count },
      (None, 0) => ItemChange::Unchanged,
      (None, count) => ItemChange::Inserted {
        item_id: new_item_id,
        count,
      },
    }
  }

  pub fn is_mutation(&self) -> bool {
    !matches!(self, ItemChange::Unchanged)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plan_covers_the_four_cases() {
    let existing = Uuid::new_v4();
    let fresh = Uuid::new_v4();

    assert_eq!(ItemChange::plan(Some(existing), 0, fresh), ItemChange::Removed { item_id: existing });
    assert_eq!(
      ItemChange::plan(Some(existing), 3, fresh),
      ItemChange::Updated {
        item_id: existing,
        count: 3
      }
    );
    assert_eq!(
      ItemChange::plan(None, 2, fresh),
      ItemChange::Inserted { item_id: fresh, count: 2 }
    );
    assert_eq!(ItemChange::plan(None, 0, fresh), ItemChange::Unchanged);
    assert!(!ItemChange::Unchanged.is_mutation());
  }

  #[test]
  fn cart_serializes_timestamps_as_millis() {
    let cart = Cart::new_open("alice");
    let json = serde_json::to_value(&cart).unwrap();
    assert_eq!(json["status"], "OPEN");
    assert!(json["created_at"].is_i64());
    assert_eq!(json["items"], serde_json::json!([]));
  }
}
