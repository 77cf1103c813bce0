// storefront/src/stores/mod.rs

//! Persistence seams for carts and the catalog.
//!
//! Both traits have a Postgres implementation for production and an
//! in-memory one used by the `memory` backend and the test suite.

pub mod memory;
pub mod postgres;

use crate::errors::Result;
use crate::models::{Cart, ItemChange, Product, ProductSnapshot, ProductWithStock, Stock};
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::{MemoryCartStore, MemoryCatalogStore};
pub use postgres::{PgCartStore, PgCatalogStore};

#[async_trait]
pub trait CartStore: Send + Sync {
  /// The user's OPEN cart with its items.
  async fn find_open_cart(&self, user_id: &str) -> Result<Option<Cart>>;

  /// Creates an empty OPEN cart for the user, or returns the one that already
  /// exists. Never leaves two OPEN carts for one user.
  async fn create_open_cart(&self, user_id: &str) -> Result<Cart>;

  async fn load_cart(&self, cart_id: Uuid) -> Result<Option<Cart>>;

  /// Applies the change planned by [`ItemChange::plan`] for `product` as one
  /// read-modify-write; concurrent upserts to the same cart are serialized.
  async fn apply_item_change(&self, cart_id: Uuid, product: &ProductSnapshot, count: i32) -> Result<ItemChange>;

  /// Deletes the cart and, by cascade, its items. Returns whether a cart was deleted.
  async fn delete_cart(&self, cart_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
  async fn list_products(&self) -> Result<Vec<ProductWithStock>>;

  async fn get_product(&self, id: &str) -> Result<Option<ProductWithStock>>;

  /// Upserts the product alone.
  async fn put_product(&self, product: &Product) -> Result<()>;

  /// Upserts the product and its stock in one transaction. On failure
  /// neither record changes and the error is `AppError::AtomicWrite`.
  async fn put_product_with_stock(&self, product: &Product, stock: Stock) -> Result<()>;
}
