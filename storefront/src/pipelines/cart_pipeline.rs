// storefront/src/pipelines/cart_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::UpsertCartItemCtxData;
use crate::services::cart_service;
use flow::{ContextData, Flow, Pipeline, PipelineControl};
use tracing::{debug, info, warn};

pub fn register_upsert_cart_item_pipeline(flows: &Flow<AppError>) {
  let mut p = Pipeline::<UpsertCartItemCtxData, AppError>::new(&[
    ("validate_cart_input", false, None),
    ("resolve_open_cart", false, None),
    ("apply_item_change", false, None),
    ("reload_cart", false, None),
  ]);

  // Step 1: nothing is written for a bad snapshot or count.
  p.on_root("validate_cart_input", |ctx_data: ContextData<UpsertCartItemCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      if let Err(e) = cart_service::validate_item_input(&guard.product, guard.count) {
        warn!(user_id = %guard.user_id, error = %e, "Cart Pipeline: Rejected item input.");
        return Err(e);
      }
      Ok(PipelineControl::Continue)
    })
  });

  // Step 2: the cart the item belongs to, created on first use.
  p.on_root("resolve_open_cart", |ctx_data: ContextData<UpsertCartItemCtxData>| {
    Box::pin(async move {
      let (store, user_id) = {
        let guard = ctx_data.read();
        (guard.app_state.carts.clone(), guard.user_id.clone())
      };

      let cart = cart_service::get_or_create_cart(store.as_ref(), &user_id).await?;
      debug!(cart_id = %cart.id, "Cart Pipeline: Open cart resolved.");
      ctx_data.write().cart_id = Some(cart.id);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 3: remove, replace or insert under the store's cart lock.
  p.on_root("apply_item_change", |ctx_data: ContextData<UpsertCartItemCtxData>| {
    Box::pin(async move {
      let (store, cart_id, product, count) = {
        let guard = ctx_data.read();
        (
          guard.app_state.carts.clone(),
          guard.cart_id,
          guard.product.clone(),
          guard.count,
        )
      };
      let cart_id = cart_id.ok_or_else(|| AppError::Internal("Cart id not resolved".to_string()))?;

      let change = store.apply_item_change(cart_id, &product, count).await?;
      info!(cart_id = %cart_id, product_id = %product.id, ?change, "Cart Pipeline: Item change applied.");
      ctx_data.write().change = Some(change);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 4: respond with what the store holds now, not with local state.
  p.on_root("reload_cart", |ctx_data: ContextData<UpsertCartItemCtxData>| {
    Box::pin(async move {
      let (store, cart_id) = {
        let guard = ctx_data.read();
        (guard.app_state.carts.clone(), guard.cart_id)
      };
      let cart_id = cart_id.ok_or_else(|| AppError::Internal("Cart id not resolved".to_string()))?;

      let cart = store
        .load_cart(cart_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cart {} not found", cart_id)))?;
      ctx_data.write().cart = Some(cart);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register_pipeline(p);
}
