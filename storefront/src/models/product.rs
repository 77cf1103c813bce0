// storefront/src/models/product.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
  pub id: String,
  pub title: String,
  pub description: String,
  pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Stock {
  // product_id is the key; carried alongside the Product it belongs to.
  pub count: i32,
}

/// A product joined with its stock count, as returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProductWithStock {
  pub id: String,
  pub title: String,
  pub description: String,
  pub price: f64,
  pub count: i32,
}

impl ProductWithStock {
  /// Joins a product with its stock; a missing stock row reads as zero.
  pub fn join(product: Product, stock: Option<Stock>) -> Self {
    Self {
      id: product.id,
      title: product.title,
      description: product.description,
      price: product.price,
      count: stock.map_or(0, |s| s.count),
    }
  }
}
