// storefront/src/models/mod.rs

//! Records stored by the cart and catalog stores, and the messages that
//! travel through the import path.

pub mod cart;
pub mod import;
pub mod product;

pub use cart::{Cart, CartItem, CartStatus, ItemChange, ProductSnapshot};
pub use import::{ImportBatchMessage, ProductNotification};
pub use product::{Product, ProductWithStock, Stock};
