// storefront/src/services/catalog_service.rs

use crate::errors::{AppError, Result};
use crate::models::{ImportBatchMessage, Product, ProductWithStock, Stock};
use crate::stores::CatalogStore;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

/// `POST /products` body as sent by clients. `price` and `count` may be JSON
/// numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProductRequest {
  pub title: Option<Value>,
  pub description: Option<String>,
  pub price: Option<Value>,
  pub count: Option<Value>,
}

/// A validated product to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
  pub title: String,
  pub description: String,
  pub price: f64,
  pub count: Option<i32>,
}

impl CreateProductRequest {
  pub fn validate(self) -> Result<NewProduct> {
    let title = match self.title {
      Some(Value::String(t)) if !t.trim().is_empty() => t.trim().to_string(),
      _ => return Err(AppError::Validation("Product title is required".to_string())),
    };

    let price = self
      .price
      .as_ref()
      .and_then(numeric)
      .filter(|p| p.is_finite() && *p >= 0.0)
      .ok_or_else(|| AppError::Validation("Valid product price is required".to_string()))?;

    let count = match self.count {
      None | Some(Value::Null) => None,
      Some(raw) => Some(
        numeric(&raw)
          .filter(|c| c.fract() == 0.0 && *c >= 0.0 && *c <= f64::from(i32::MAX))
          .map(|c| c as i32)
          .ok_or_else(|| AppError::Validation("Stock count must be a non-negative integer".to_string()))?,
      ),
    };

    Ok(NewProduct {
      title,
      description: self.description.unwrap_or_default(),
      price,
      count,
    })
  }
}

fn numeric(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  }
}

#[instrument(name = "catalog_service::list_products", skip(store), err(Display))]
pub async fn list_products(store: &dyn CatalogStore) -> Result<Vec<ProductWithStock>> {
  store.list_products().await
}

#[instrument(name = "catalog_service::get_product", skip(store), err(Display))]
pub async fn get_product(store: &dyn CatalogStore, id: &str) -> Result<ProductWithStock> {
  if id.trim().is_empty() {
    return Err(AppError::Validation("Product ID is required".to_string()));
  }
  store
    .get_product(id)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Creates a product with a server-generated id. With a count, product and
/// stock are written atomically; without one only the product is written and
/// the response reports a count of zero.
#[instrument(name = "catalog_service::create_product", skip(store, new_product), fields(title = %new_product.title), err(Display))]
pub async fn create_product(store: &dyn CatalogStore, new_product: NewProduct) -> Result<ProductWithStock> {
  let product = Product {
    id: Uuid::new_v4().to_string(),
    title: new_product.title,
    description: new_product.description,
    price: new_product.price,
  };

  let stock = match new_product.count {
    Some(count) => {
      let stock = Stock { count };
      store.put_product_with_stock(&product, stock).await?;
      Some(stock)
    }
    None => {
      store.put_product(&product).await?;
      None
    }
  };

  info!(product_id = %product.id, "Product created.");
  Ok(ProductWithStock::join(product, stock))
}

/// Field checks for a catalog row arriving from the queue.
pub fn validate_import_message(message: &ImportBatchMessage) -> Result<()> {
  if message.id.trim().is_empty() {
    return Err(AppError::Validation("Product id is required".to_string()));
  }
  if message.title.trim().is_empty() {
    return Err(AppError::Validation("Product title is required".to_string()));
  }
  if !message.price.is_finite() || message.price < 0.0 {
    return Err(AppError::Validation(format!("Invalid price {}", message.price)));
  }
  if message.count < 0 {
    return Err(AppError::Validation(format!("Invalid stock count {}", message.count)));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn request(body: Value) -> CreateProductRequest {
    serde_json::from_value(body).unwrap()
  }

  #[test]
  fn accepts_numeric_strings() {
    let new_product = request(json!({"title": "Widget", "price": "9.99", "count": "10"}))
      .validate()
      .unwrap();
    assert_eq!(new_product.price, 9.99);
    assert_eq!(new_product.count, Some(10));
    assert_eq!(new_product.description, "");
  }

  #[test]
  fn rejects_missing_title_and_bad_price() {
    assert!(matches!(
      request(json!({"price": 1})).validate(),
      Err(AppError::Validation(m)) if m.contains("title")
    ));
    assert!(matches!(
      request(json!({"title": "X", "price": "cheap"})).validate(),
      Err(AppError::Validation(m)) if m.contains("price")
    ));
    assert!(request(json!({"title": "X", "price": 1, "count": 1.5})).validate().is_err());
  }

  #[test]
  fn import_message_checks() {
    let mut message = ImportBatchMessage {
      id: "p1".into(),
      title: "Pen".into(),
      description: String::new(),
      price: 1.0,
      count: 3,
    };
    assert!(validate_import_message(&message).is_ok());
    message.count = -1;
    assert!(validate_import_message(&message).is_err());
  }
}
