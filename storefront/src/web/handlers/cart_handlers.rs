// storefront/src/web/handlers/cart_handlers.rs

use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use futures_util::future::{ready, Ready};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::ProductSnapshot;
use crate::services::{auth_service, cart_service};
use crate::state::AppState;

/// The caller behind a valid `Authorization: Basic` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: String,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let Some(app_state) = req.app_data::<web::Data<AppState>>() else {
      return ready(Err(AppError::Internal("Application state is not configured".to_string())));
    };

    let header_value = match req.headers().get(AUTHORIZATION).map(|v| v.to_str()) {
      None => None,
      Some(Ok(value)) => Some(value),
      Some(Err(_)) => return ready(Err(AppError::Forbidden("Malformed authorization header".to_string()))),
    };

    ready(
      auth_service::authorize(app_state.credentials.as_ref(), header_value).map(|user_id| AuthenticatedUser { user_id }),
    )
  }
}

#[derive(Deserialize, Debug)]
pub struct PutCartPayload {
  pub product: ProductSnapshot,
  pub count: i32,
}

#[instrument(name = "handler::get_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let cart = cart_service::get_or_create_cart(app_state.carts.as_ref(), &auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(cart))
}

#[instrument(
  name = "handler::put_cart",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, product_id = %payload.product.id, count = payload.count)
)]
pub async fn put_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<PutCartPayload>,
) -> Result<HttpResponse, AppError> {
  let PutCartPayload { product, count } = payload.into_inner();
  let cart = cart_service::upsert_item(app_state.get_ref(), &auth_user.user_id, product, count).await?;
  info!(items = cart.items.len(), "Cart updated.");
  Ok(HttpResponse::Ok().json(cart))
}

#[instrument(name = "handler::delete_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  cart_service::remove_cart(app_state.carts.as_ref(), &auth_user.user_id).await?;
  Ok(HttpResponse::NoContent().finish())
}
