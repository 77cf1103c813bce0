// storefront/src/services/cart_service.rs

//! Cart manager: one OPEN cart per user, items keyed by product id.

use crate::errors::{AppError, Result};
use crate::models::{Cart, ProductSnapshot};
use crate::pipelines::contexts::UpsertCartItemCtxData;
use crate::state::AppState;
use crate::stores::CartStore;
use flow::ContextData;
use tracing::{debug, info, instrument};

/// The user's OPEN cart, created empty on first access.
///
/// Safe to call concurrently: the store turns a racing second create into a
/// lookup of the cart the first one made.
#[instrument(name = "cart_service::get_or_create_cart", skip(store), err(Display))]
pub async fn get_or_create_cart(store: &dyn CartStore, user_id: &str) -> Result<Cart> {
  if let Some(cart) = store.find_open_cart(user_id).await? {
    return Ok(cart);
  }
  debug!("No open cart; creating one.");
  store.create_open_cart(user_id).await
}

/// Sets the item count for `product` in the user's cart and returns the cart
/// as stored afterwards.
///
/// # Arguments
/// * `count`: `0` removes the item; a positive value replaces its count or
///   inserts it with `product` as the snapshot.
#[instrument(name = "cart_service::upsert_item", skip(state, product), fields(product_id = %product.id), err(Display))]
pub async fn upsert_item(state: &AppState, user_id: &str, product: ProductSnapshot, count: i32) -> Result<Cart> {
  let ctx = ContextData::new(UpsertCartItemCtxData::new(state.clone(), user_id, product, count));
  state.flows.run(ctx.clone()).await?;

  let mut guard = ctx.write();
  debug!(change = ?guard.change, "Cart item upserted.");
  guard
    .cart
    .take()
    .ok_or_else(|| AppError::Internal("Cart pipeline finished without a cart".to_string()))
}

/// Deletes the user's OPEN cart with its items; a no-op when there is none.
#[instrument(name = "cart_service::remove_cart", skip(store), err(Display))]
pub async fn remove_cart(store: &dyn CartStore, user_id: &str) -> Result<()> {
  match store.find_open_cart(user_id).await? {
    Some(cart) => {
      store.delete_cart(cart.id).await?;
      info!(cart_id = %cart.id, "Cart removed.");
    }
    None => debug!("No open cart to remove."),
  }
  Ok(())
}

/// Rejects malformed snapshots and negative counts before anything is written.
pub fn validate_item_input(product: &ProductSnapshot, count: i32) -> Result<()> {
  if product.id.trim().is_empty() {
    return Err(AppError::Validation("Product id is required".to_string()));
  }
  if !product.price.is_finite() || product.price < 0.0 {
    return Err(AppError::Validation("Product price must be a non-negative number".to_string()));
  }
  if count < 0 {
    return Err(AppError::Validation("Count must not be negative".to_string()));
  }
  Ok(())
}
