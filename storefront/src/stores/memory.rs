// storefront/src/stores/memory.rs

//! In-process stores. State lives behind a `parking_lot::Mutex`, so every
//! method body is one critical section and never awaits while holding it.

use super::{CartStore, CatalogStore};
use crate::errors::{AppError, Result};
use crate::models::{Cart, CartItem, CartStatus, ItemChange, Product, ProductSnapshot, ProductWithStock, Stock};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryCartStore {
  carts: Mutex<HashMap<Uuid, Cart>>,
  unavailable: Mutex<bool>,
}

impl MemoryCartStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes every following call fail with `StoreUnavailable` until reset.
  pub fn set_unavailable(&self, unavailable: bool) {
    *self.unavailable.lock() = unavailable;
  }

  pub fn cart_count(&self) -> usize {
    self.carts.lock().len()
  }

  fn check_available(&self) -> Result<()> {
    if *self.unavailable.lock() {
      return Err(AppError::StoreUnavailable("cart store is unavailable".to_string()));
    }
    Ok(())
  }
}

#[async_trait]
impl CartStore for MemoryCartStore {
  async fn find_open_cart(&self, user_id: &str) -> Result<Option<Cart>> {
    self.check_available()?;
    let carts = self.carts.lock();
    Ok(
      carts
        .values()
        .find(|c| c.user_id == user_id && c.status == CartStatus::Open)
        .cloned(),
    )
  }

  async fn create_open_cart(&self, user_id: &str) -> Result<Cart> {
    self.check_available()?;
    let mut carts = self.carts.lock();
    if let Some(existing) = carts
      .values()
      .find(|c| c.user_id == user_id && c.status == CartStatus::Open)
    {
      return Ok(existing.clone());
    }
    let cart = Cart::new_open(user_id);
    carts.insert(cart.id, cart.clone());
    Ok(cart)
  }

  async fn load_cart(&self, cart_id: Uuid) -> Result<Option<Cart>> {
    self.check_available()?;
    Ok(self.carts.lock().get(&cart_id).cloned())
  }

  async fn apply_item_change(&self, cart_id: Uuid, product: &ProductSnapshot, count: i32) -> Result<ItemChange> {
    self.check_available()?;
    let mut carts = self.carts.lock();
    let cart = carts
      .get_mut(&cart_id)
      .ok_or_else(|| AppError::NotFound(format!("Cart {} not found", cart_id)))?;

    let existing = cart.item_for(&product.id).map(|item| item.id);
    let change = ItemChange::plan(existing, count, Uuid::new_v4());
    match change {
      ItemChange::Removed { item_id } => cart.items.retain(|item| item.id != item_id),
      ItemChange::Updated { item_id, count } => {
        if let Some(item) = cart.items.iter_mut().find(|item| item.id == item_id) {
          item.count = count;
        }
      }
      ItemChange::Inserted { item_id, count } => cart.items.push(CartItem {
        id: item_id,
        cart_id,
        product: product.clone(),
        count,
      }),
      ItemChange::Unchanged => {}
    }
    if change.is_mutation() {
      cart.updated_at = Utc::now();
    }
    Ok(change)
  }

  async fn delete_cart(&self, cart_id: Uuid) -> Result<bool> {
    self.check_available()?;
    Ok(self.carts.lock().remove(&cart_id).is_some())
  }
}

#[derive(Debug, Default)]
struct CatalogTables {
  products: BTreeMap<String, Product>,
  stocks: HashMap<String, Stock>,
}

#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
  tables: Mutex<CatalogTables>,
  failing_product_ids: Mutex<HashSet<String>>,
}

impl MemoryCatalogStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Rejects every atomic write for `product_id` until cleared.
  pub fn fail_writes_for(&self, product_id: &str) {
    self.failing_product_ids.lock().insert(product_id.to_string());
  }

  pub fn clear_failures(&self) {
    self.failing_product_ids.lock().clear();
  }

  pub fn product_count(&self) -> usize {
    self.tables.lock().products.len()
  }

  pub fn stock_count(&self) -> usize {
    self.tables.lock().stocks.len()
  }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
  async fn list_products(&self) -> Result<Vec<ProductWithStock>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .products
        .values()
        .map(|p| ProductWithStock::join(p.clone(), tables.stocks.get(&p.id).copied()))
        .collect(),
    )
  }

  async fn get_product(&self, id: &str) -> Result<Option<ProductWithStock>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .products
        .get(id)
        .map(|p| ProductWithStock::join(p.clone(), tables.stocks.get(id).copied())),
    )
  }

  async fn put_product(&self, product: &Product) -> Result<()> {
    self
      .tables
      .lock()
      .products
      .insert(product.id.clone(), product.clone());
    Ok(())
  }

  async fn put_product_with_stock(&self, product: &Product, stock: Stock) -> Result<()> {
    if self.failing_product_ids.lock().contains(&product.id) {
      return Err(AppError::AtomicWrite(format!(
        "transaction for product {} was rejected",
        product.id
      )));
    }
    let mut tables = self.tables.lock();
    tables.products.insert(product.id.clone(), product.clone());
    tables.stocks.insert(product.id.clone(), stock);
    Ok(())
  }
}
