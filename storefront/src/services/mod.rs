// storefront/src/services/mod.rs

pub mod auth_service;
pub mod batch_consumer;
pub mod cart_service;
pub mod catalog_service;
pub mod import_service;
pub mod notifier;
pub mod object_store;
pub mod queue;
