// storefront/tests/cart_tests.rs
mod common;

use common::*;
use futures_util::future::join_all;
use storefront::errors::AppError;
use storefront::models::CartStatus;
use storefront::services::cart_service;

#[tokio::test]
async fn get_or_create_returns_the_same_cart() {
  let app = test_app();
  let first = cart_service::get_or_create_cart(app.state.carts.as_ref(), "alice").await.unwrap();
  let second = cart_service::get_or_create_cart(app.state.carts.as_ref(), "alice").await.unwrap();

  assert_eq!(first.id, second.id);
  assert_eq!(first.status, CartStatus::Open);
  assert!(first.items.is_empty());
  assert_eq!(app.carts.cart_count(), 1);
}

#[tokio::test]
async fn concurrent_first_access_creates_one_cart() {
  let app = test_app();
  let carts = app.state.carts.clone();
  let lookups = (0..10).map(|_| {
    let carts = carts.clone();
    async move { cart_service::get_or_create_cart(carts.as_ref(), "alice").await.unwrap() }
  });
  let results = join_all(lookups).await;

  assert!(results.iter().all(|cart| cart.id == results[0].id));
  assert_eq!(app.carts.cart_count(), 1);
}

#[tokio::test]
async fn upsert_replaces_the_count_of_an_existing_item() {
  let app = test_app();
  let pen = snapshot("p1", "Pen", 1.5);

  cart_service::upsert_item(&app.state, "alice", pen.clone(), 5).await.unwrap();
  let cart = cart_service::upsert_item(&app.state, "alice", pen, 3).await.unwrap();

  assert_eq!(cart.items.len(), 1);
  assert_eq!(cart.items[0].product.id, "p1");
  assert_eq!(cart.items[0].count, 3);
}

#[tokio::test]
async fn zero_count_removes_and_repeating_is_a_no_op() {
  let app = test_app();
  let pen = snapshot("p1", "Pen", 1.5);
  let cup = snapshot("p2", "Cup", 4.0);

  cart_service::upsert_item(&app.state, "alice", pen.clone(), 2).await.unwrap();
  cart_service::upsert_item(&app.state, "alice", cup, 1).await.unwrap();

  let cart = cart_service::upsert_item(&app.state, "alice", pen.clone(), 0).await.unwrap();
  assert_eq!(cart.items.len(), 1);
  assert_eq!(cart.items[0].product.id, "p2");

  let again = cart_service::upsert_item(&app.state, "alice", pen, 0).await.unwrap();
  assert_eq!(again.id, cart.id);
  assert_eq!(again.items, cart.items);
  assert_eq!(again.updated_at, cart.updated_at);
}

#[tokio::test]
async fn snapshot_is_kept_from_the_first_add() {
  let app = test_app();
  cart_service::upsert_item(&app.state, "alice", snapshot("p1", "Old title", 1.0), 1)
    .await
    .unwrap();
  let cart = cart_service::upsert_item(&app.state, "alice", snapshot("p1", "New title", 2.0), 4)
    .await
    .unwrap();

  assert_eq!(cart.items[0].product.title, "Old title");
  assert_eq!(cart.items[0].count, 4);
}

#[tokio::test]
async fn concurrent_upserts_to_one_cart_are_all_applied() {
  let app = test_app();
  let upserts = (0..8).map(|i| {
    let state = app.state.clone();
    async move {
      cart_service::upsert_item(&state, "alice", snapshot(&format!("p{}", i), "Item", 1.0), i + 1)
        .await
        .unwrap()
    }
  });
  join_all(upserts).await;

  let cart = cart_service::get_or_create_cart(app.state.carts.as_ref(), "alice").await.unwrap();
  assert_eq!(cart.items.len(), 8);
  assert_eq!(app.carts.cart_count(), 1);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_write() {
  let app = test_app();

  let negative = cart_service::upsert_item(&app.state, "alice", snapshot("p1", "Pen", 1.0), -1).await;
  assert!(matches!(negative, Err(AppError::Validation(_))));

  let no_id = cart_service::upsert_item(&app.state, "alice", snapshot("", "Pen", 1.0), 1).await;
  assert!(matches!(no_id, Err(AppError::Validation(_))));

  assert_eq!(app.carts.cart_count(), 0);
}

#[tokio::test]
async fn remove_cart_deletes_it_and_is_idempotent() {
  let app = test_app();
  let cart = cart_service::upsert_item(&app.state, "alice", snapshot("p1", "Pen", 1.0), 1)
    .await
    .unwrap();

  cart_service::remove_cart(app.state.carts.as_ref(), "alice").await.unwrap();
  assert_eq!(app.carts.cart_count(), 0);
  cart_service::remove_cart(app.state.carts.as_ref(), "alice").await.unwrap();

  let fresh = cart_service::get_or_create_cart(app.state.carts.as_ref(), "alice").await.unwrap();
  assert_ne!(fresh.id, cart.id);
  assert!(fresh.items.is_empty());
}

#[tokio::test]
async fn carts_are_per_user() {
  let app = test_app();
  cart_service::upsert_item(&app.state, "alice", snapshot("p1", "Pen", 1.0), 1)
    .await
    .unwrap();
  let bob = cart_service::get_or_create_cart(app.state.carts.as_ref(), "bob").await.unwrap();

  assert!(bob.items.is_empty());
  assert_eq!(app.carts.cart_count(), 2);
}

#[tokio::test]
async fn unavailable_store_is_a_retryable_failure() {
  let app = test_app();
  app.carts.set_unavailable(true);

  let err = cart_service::get_or_create_cart(app.state.carts.as_ref(), "alice")
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::StoreUnavailable(_)));
  assert!(err.is_retryable());

  app.carts.set_unavailable(false);
  assert!(cart_service::get_or_create_cart(app.state.carts.as_ref(), "alice").await.is_ok());
}
