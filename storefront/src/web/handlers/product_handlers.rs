// storefront/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::catalog_service::{self, CreateProductRequest};
use crate::state::AppState;

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products = catalog_service::list_products(app_state.catalog.as_ref()).await?;
  info!("Successfully fetched {} products.", products.len());
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_str()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let product = catalog_service::get_product(app_state.catalog.as_ref(), &product_id).await?;
  Ok(HttpResponse::Ok().json(product))
}

/// `GET /products/` carries no id; answered with the same 400 as a blank one.
pub async fn missing_product_id_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let product = catalog_service::get_product(app_state.catalog.as_ref(), "").await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::create_product", skip(app_state, payload))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
  let new_product = payload.into_inner().validate()?;
  let created = catalog_service::create_product(app_state.catalog.as_ref(), new_product).await?;
  Ok(HttpResponse::Created().json(created))
}
