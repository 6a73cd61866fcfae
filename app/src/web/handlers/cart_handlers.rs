// voyage_app/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extract::AuthenticatedUser;
use voyage::model::NewCartItem;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TravelerCountPayload {
  pub traveler_count: u32,
}

/// The active cart with the items that still count towards it.
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let carts = &app_state.voyage.carts;
  let cart = carts.get_or_create_cart(&auth_user.user_id).await?;
  let items = carts.live_items(&cart).await;
  Ok(HttpResponse::Ok().json(json!({ "cart": cart, "items": items })))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id, package_id = %req_payload.package_id, travelers = req_payload.traveler_count)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<NewCartItem>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let item = app_state
    .voyage
    .carts
    .add_item_to_cart(&auth_user.user_id, req_payload.into_inner())
    .await?;
  info!(item_id = %item.id, "Item added to cart.");
  Ok(HttpResponse::Created().json(json!({
    "message": "Item added to cart successfully.",
    "cartItem": item,
  })))
}

pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  item_id: web::Path<String>,
  req_payload: web::Json<TravelerCountPayload>,
) -> Result<HttpResponse, AppError> {
  let item = app_state
    .voyage
    .carts
    .update_traveler_count(&auth_user.user_id, &item_id, req_payload.traveler_count)
    .await?;
  Ok(HttpResponse::Ok().json(item))
}

pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  item_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let cart = app_state
    .voyage
    .carts
    .remove_item_from_cart(&auth_user.user_id, &item_id)
    .await?;
  Ok(HttpResponse::Ok().json(cart))
}

pub async fn clear_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let cart = app_state.voyage.carts.clear_cart(&auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "cart": cart })))
}
