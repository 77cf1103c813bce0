// storefront/src/web/routes.rs

use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{cart_handlers, product_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Result<HttpResponse, AppError> {
  Err(AppError::NotFound("Resource not found".to_string()))
}

async fn method_not_allowed_handler() -> HttpResponse {
  HttpResponse::MethodNotAllowed().json(serde_json::json!({ "message": "Method not allowed" }))
}

/// Malformed or mistyped JSON bodies become 400 `{message}` responses.
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid request body: {}", err)).into()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .route("/health", web::get().to(health_check_handler))
    .service(
      web::scope("/products")
        .route("", web::get().to(product_handlers::list_products_handler))
        .route("", web::post().to(product_handlers::create_product_handler))
        .route("/", web::get().to(product_handlers::missing_product_id_handler))
        .route("/{product_id}", web::get().to(product_handlers::get_product_handler)),
    )
    .service(
      web::resource("/cart")
        .route(web::get().to(cart_handlers::get_cart_handler))
        .route(web::put().to(cart_handlers::put_cart_handler))
        .route(web::delete().to(cart_handlers::delete_cart_handler))
        .default_service(web::to(method_not_allowed_handler)),
    )
    .default_service(web::to(not_found_handler));
}
