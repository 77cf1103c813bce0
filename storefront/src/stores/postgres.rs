// storefront/src/stores/postgres.rs

use super::{CartStore, CatalogStore};
use crate::errors::{AppError, Result};
use crate::models::{Cart, CartItem, CartStatus, ItemChange, Product, ProductSnapshot, ProductWithStock, Stock};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct CartRow {
  id: Uuid,
  user_id: String,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
  status: CartStatus,
}

#[derive(Debug, FromRow)]
struct CartItemRow {
  id: Uuid,
  cart_id: Uuid,
  product: Json<ProductSnapshot>,
  count: i32,
}

impl From<CartItemRow> for CartItem {
  fn from(row: CartItemRow) -> Self {
    CartItem {
      id: row.id,
      cart_id: row.cart_id,
      product: row.product.0,
      count: row.count,
    }
  }
}

/// Cart store backed by the `carts` and `cart_items` tables.
#[derive(Debug, Clone)]
pub struct PgCartStore {
  pool: PgPool,
}

impl PgCartStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn with_items(&self, row: CartRow) -> Result<Cart> {
    let items: Vec<CartItemRow> =
      sqlx::query_as("SELECT id, cart_id, product, count FROM cart_items WHERE cart_id = $1 ORDER BY id")
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

    Ok(Cart {
      id: row.id,
      user_id: row.user_id,
      created_at: row.created_at,
      updated_at: row.updated_at,
      status: row.status,
      items: items.into_iter().map(CartItem::from).collect(),
    })
  }
}

#[async_trait]
impl CartStore for PgCartStore {
  #[instrument(name = "PgCartStore::find_open_cart", skip(self))]
  async fn find_open_cart(&self, user_id: &str) -> Result<Option<Cart>> {
    let row: Option<CartRow> = sqlx::query_as(
      "SELECT id, user_id, created_at, updated_at, status FROM carts WHERE user_id = $1 AND status = 'OPEN'",
    )
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;

    match row {
      Some(row) => Ok(Some(self.with_items(row).await?)),
      None => Ok(None),
    }
  }

  #[instrument(name = "PgCartStore::create_open_cart", skip(self))]
  async fn create_open_cart(&self, user_id: &str) -> Result<Cart> {
    // The partial unique index turns a concurrent second insert into a no-op.
    let inserted = sqlx::query(
      "INSERT INTO carts (id, user_id, status) VALUES ($1, $2, 'OPEN') \
       ON CONFLICT (user_id) WHERE status = 'OPEN' DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .execute(&self.pool)
    .await?
    .rows_affected();
    debug!(inserted, "Ensured open cart.");

    self
      .find_open_cart(user_id)
      .await?
      .ok_or_else(|| AppError::Internal(format!("Open cart for user {} vanished after insert", user_id)))
  }

  #[instrument(name = "PgCartStore::load_cart", skip(self))]
  async fn load_cart(&self, cart_id: Uuid) -> Result<Option<Cart>> {
    let row: Option<CartRow> =
      sqlx::query_as("SELECT id, user_id, created_at, updated_at, status FROM carts WHERE id = $1")
        .bind(cart_id)
        .fetch_optional(&self.pool)
        .await?;

    match row {
      Some(row) => Ok(Some(self.with_items(row).await?)),
      None => Ok(None),
    }
  }

  #[instrument(name = "PgCartStore::apply_item_change", skip(self, product), fields(product_id = %product.id))]
  async fn apply_item_change(&self, cart_id: Uuid, product: &ProductSnapshot, count: i32) -> Result<ItemChange> {
    let mut tx: Transaction<'_, Postgres> = self.pool.begin().await?;

    let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
      .bind(cart_id)
      .fetch_optional(&mut *tx)
      .await?;
    if locked.is_none() {
      return Err(AppError::NotFound(format!("Cart {} not found", cart_id)));
    }

    let existing: Option<(Uuid,)> =
      sqlx::query_as("SELECT id FROM cart_items WHERE cart_id = $1 AND product->>'id' = $2")
        .bind(cart_id)
        .bind(&product.id)
        .fetch_optional(&mut *tx)
        .await?;

    let change = ItemChange::plan(existing.map(|(id,)| id), count, Uuid::new_v4());
    match change {
      ItemChange::Removed { item_id } => {
        sqlx::query("DELETE FROM cart_items WHERE id = $1")
          .bind(item_id)
          .execute(&mut *tx)
          .await?;
      }
      ItemChange::Updated { item_id, count } => {
        sqlx::query("UPDATE cart_items SET count = $2 WHERE id = $1")
          .bind(item_id)
          .bind(count)
          .execute(&mut *tx)
          .await?;
      }
      ItemChange::Inserted { item_id, count } => {
        sqlx::query("INSERT INTO cart_items (id, cart_id, product, count) VALUES ($1, $2, $3, $4)")
          .bind(item_id)
          .bind(cart_id)
          .bind(Json(product))
          .bind(count)
          .execute(&mut *tx)
          .await?;
      }
      ItemChange::Unchanged => {}
    }

    if change.is_mutation() {
      sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
        .bind(cart_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(change)
  }

  #[instrument(name = "PgCartStore::delete_cart", skip(self))]
  async fn delete_cart(&self, cart_id: Uuid) -> Result<bool> {
    let deleted = sqlx::query("DELETE FROM carts WHERE id = $1")
      .bind(cart_id)
      .execute(&self.pool)
      .await?
      .rows_affected();
    Ok(deleted > 0)
  }
}

/// Catalog store backed by the `products` and `stocks` tables.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
  pool: PgPool,
}

impl PgCatalogStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn write_both(&self, product: &Product, stock: Stock) -> std::result::Result<(), sqlx::Error> {
    let mut tx = self.pool.begin().await?;

    upsert_product(&mut tx, product).await?;
    sqlx::query(
      "INSERT INTO stocks (product_id, count) VALUES ($1, $2) \
       ON CONFLICT (product_id) DO UPDATE SET count = EXCLUDED.count",
    )
    .bind(&product.id)
    .bind(stock.count)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
  }
}

async fn upsert_product(tx: &mut Transaction<'_, Postgres>, product: &Product) -> std::result::Result<(), sqlx::Error> {
  sqlx::query(
    "INSERT INTO products (id, title, description, price) VALUES ($1, $2, $3, $4) \
     ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title, description = EXCLUDED.description, price = EXCLUDED.price",
  )
  .bind(&product.id)
  .bind(&product.title)
  .bind(&product.description)
  .bind(product.price)
  .execute(&mut **tx)
  .await?;
  Ok(())
}

const PRODUCT_WITH_STOCK: &str = "SELECT p.id, p.title, p.description, p.price, COALESCE(s.count, 0) AS count \
   FROM products p LEFT JOIN stocks s ON s.product_id = p.id";

#[async_trait]
impl CatalogStore for PgCatalogStore {
  #[instrument(name = "PgCatalogStore::list_products", skip(self))]
  async fn list_products(&self) -> Result<Vec<ProductWithStock>> {
    let rows = sqlx::query_as::<_, ProductWithStock>(&format!("{} ORDER BY p.id", PRODUCT_WITH_STOCK))
      .fetch_all(&self.pool)
      .await?;
    Ok(rows)
  }

  #[instrument(name = "PgCatalogStore::get_product", skip(self))]
  async fn get_product(&self, id: &str) -> Result<Option<ProductWithStock>> {
    let row = sqlx::query_as::<_, ProductWithStock>(&format!("{} WHERE p.id = $1", PRODUCT_WITH_STOCK))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row)
  }

  #[instrument(name = "PgCatalogStore::put_product", skip(self, product), fields(product_id = %product.id))]
  async fn put_product(&self, product: &Product) -> Result<()> {
    let mut tx = self.pool.begin().await?;
    upsert_product(&mut tx, product).await?;
    tx.commit().await?;
    Ok(())
  }

  #[instrument(name = "PgCatalogStore::put_product_with_stock", skip(self, product), fields(product_id = %product.id))]
  async fn put_product_with_stock(&self, product: &Product, stock: Stock) -> Result<()> {
    // Dropping an uncommitted transaction rolls it back, so an error here leaves both tables untouched.
    self.write_both(product, stock).await.map_err(|e| {
      warn!(error = %e, "Product+stock transaction failed.");
      AppError::AtomicWrite(format!("product {}: {}", product.id, e))
    })
  }
}
