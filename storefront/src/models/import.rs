// storefront/src/models/import.rs

use serde::{Deserialize, Serialize};

use super::product::{Product, ProductWithStock, Stock};

/// One catalog row on its way from a CSV file to the catalog store.
/// Serialized as the body of a queue message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatchMessage {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  pub price: f64,
  pub count: i32,
}

impl ImportBatchMessage {
  pub fn split(&self) -> (Product, Stock) {
    (
      Product {
        id: self.id.clone(),
        title: self.title.clone(),
        description: self.description.clone(),
        price: self.price,
      },
      Stock { count: self.count },
    )
  }
}

/// Published after a catalog row was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductNotification {
  pub message: String,
  pub product: ProductWithStock,
}

impl ProductNotification {
  pub fn created(message: &ImportBatchMessage) -> Self {
    let (product, stock) = message.split();
    Self {
      message: format!("Product '{}' was added to the catalog", product.title),
      product: ProductWithStock::join(product, Some(stock)),
    }
  }
}
