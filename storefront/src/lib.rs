// storefront/src/lib.rs

//! Storefront backend: product catalog, per-user carts behind Basic auth,
//! and the CSV catalog import path (object storage → queue → catalog).

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod stores;
pub mod web;
pub mod workers;

pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use state::{AppState, Backends};
