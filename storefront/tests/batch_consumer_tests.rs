// storefront/tests/batch_consumer_tests.rs
mod common;

use common::*;
use storefront::services::batch_consumer;
use storefront::services::catalog_service;
use storefront::services::queue::MessageQueue;

#[tokio::test]
async fn one_failed_write_does_not_affect_its_siblings() {
  let app = test_app();
  for id in ["p1", "p2", "p3"] {
    app.queue.send(batch_message(id, 5)).await.unwrap();
  }
  app.catalog.fail_writes_for("p2");

  let report = batch_consumer::poll_once(&app.state).await.unwrap();

  assert_eq!(report.succeeded.len(), 2);
  assert_eq!(report.failed.len(), 1);
  assert!(report.dropped.is_empty());
  assert!(catalog_service::get_product(app.state.catalog.as_ref(), "p1").await.is_ok());
  assert!(catalog_service::get_product(app.state.catalog.as_ref(), "p3").await.is_ok());
  assert!(catalog_service::get_product(app.state.catalog.as_ref(), "p2").await.is_err());
  assert_eq!(app.queue.ready_len(), 1);
  assert_eq!(app.queue.in_flight_len(), 0);

  app.catalog.clear_failures();
  let retry = batch_consumer::poll_once(&app.state).await.unwrap();
  assert_eq!(retry.succeeded.len(), 1);
  assert_eq!(app.catalog.product_count(), 3);
}

#[tokio::test]
async fn undecodable_and_invalid_messages_are_dropped() {
  let app = test_app();
  app.queue.send("not json".to_string()).await.unwrap();
  app.queue.send(batch_message("p1", -4)).await.unwrap();
  app.queue.send(batch_message("p2", 1)).await.unwrap();

  let report = batch_consumer::poll_once(&app.state).await.unwrap();

  assert_eq!(report.dropped.len(), 2);
  assert_eq!(report.succeeded.len(), 1);
  assert_eq!(app.queue.ready_len(), 0);
  assert_eq!(app.queue.in_flight_len(), 0);
  assert_eq!(app.catalog.product_count(), 1);
}

#[tokio::test]
async fn notification_failure_keeps_the_write() {
  let app = test_app();
  app.notifier.set_failing(true);
  app.queue.send(batch_message("p1", 2)).await.unwrap();

  let report = batch_consumer::poll_once(&app.state).await.unwrap();

  assert_eq!(report.succeeded.len(), 1);
  assert_eq!(report.unnotified, report.succeeded);
  let stored = catalog_service::get_product(app.state.catalog.as_ref(), "p1").await.unwrap();
  assert_eq!(stored.count, 2);
  assert!(app.notifier.published().is_empty());
}

#[tokio::test]
async fn successful_write_publishes_product_with_count() {
  let app = test_app();
  app.queue.send(batch_message("p9", 6)).await.unwrap();

  let report = batch_consumer::poll_once(&app.state).await.unwrap();
  assert!(report.unnotified.is_empty());

  let published = app.notifier.published();
  assert_eq!(published.len(), 1);
  assert_eq!(published[0].product.id, "p9");
  assert_eq!(published[0].product.count, 6);
}

#[tokio::test]
async fn persistent_failure_ends_in_dead_letters() {
  let app = test_app();
  app.catalog.fail_writes_for("p1");
  app.queue.send(batch_message("p1", 1)).await.unwrap();

  for _ in 0..MAX_RECEIVES {
    let report = batch_consumer::poll_once(&app.state).await.unwrap();
    assert_eq!(report.failed.len(), 1);
  }

  assert_eq!(app.queue.ready_len(), 0);
  assert_eq!(app.queue.dead_letters().len(), 1);
  assert_eq!(app.queue.dead_letters()[0].receive_count, MAX_RECEIVES);
}

#[tokio::test]
async fn batches_are_capped_at_the_configured_size() {
  let app = test_app();
  for i in 0..7 {
    app.queue.send(batch_message(&format!("p{}", i), 1)).await.unwrap();
  }

  let first = batch_consumer::poll_once(&app.state).await.unwrap();
  let second = batch_consumer::poll_once(&app.state).await.unwrap();
  let idle = batch_consumer::poll_once(&app.state).await.unwrap();

  assert_eq!(first.succeeded.len(), app.state.config.queue.batch_size);
  assert_eq!(second.succeeded.len(), 2);
  assert!(idle.is_empty());
  assert_eq!(app.catalog.product_count(), 7);
}
