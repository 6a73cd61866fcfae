// voyage_app/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{
  activity_handlers, admin_handlers, auth_handlers, cart_handlers, checkout_handlers, notification_handlers,
  package_handlers, webhook_handlers,
};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route("/signup", web::post().to(auth_handlers::signup_handler))
          .route("/signin", web::post().to(auth_handlers::signin_handler))
          .route("/signout", web::post().to(auth_handlers::signout_handler))
          .route("/me", web::get().to(auth_handlers::me_handler))
          .route("/password", web::post().to(auth_handlers::change_password_handler))
          .route("/push-token", web::put().to(auth_handlers::register_push_token_handler)),
      )
      .service(
        web::scope("/packages")
          .route("", web::get().to(package_handlers::list_packages_handler))
          .route("/{package_id}", web::get().to(package_handlers::get_package_handler)),
      )
      .service(
        web::scope("/me")
          .route("/{list}", web::get().to(activity_handlers::list_activity_handler))
          .route("/{list}", web::delete().to(activity_handlers::clear_activity_handler))
          .route("/{list}/{package_id}", web::put().to(activity_handlers::add_activity_handler))
          .route("/{list}/{package_id}", web::delete().to(activity_handlers::remove_activity_handler)),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("", web::delete().to(cart_handlers::clear_cart_handler))
          .route("/items", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/items/{item_id}", web::patch().to(cart_handlers::update_cart_item_handler))
          .route("/items/{item_id}", web::delete().to(cart_handlers::remove_cart_item_handler)),
      )
      .route("/checkout", web::post().to(checkout_handlers::start_checkout_handler))
      .service(
        web::scope("/bookings")
          .route("", web::get().to(checkout_handlers::list_bookings_handler))
          .route("/{booking_id}", web::get().to(checkout_handlers::get_booking_handler))
          .route("/{booking_id}/cancel", web::post().to(checkout_handlers::cancel_booking_handler)),
      )
      .service(
        web::scope("/notifications")
          .route("", web::get().to(notification_handlers::list_notifications_handler))
          .route("/incoming", web::post().to(notification_handlers::incoming_push_handler))
          .route("/read-all", web::post().to(notification_handlers::mark_all_read_handler))
          .route("/{notification_id}/read", web::post().to(notification_handlers::mark_read_handler))
          .route("/{notification_id}", web::delete().to(notification_handlers::delete_notification_handler)),
      )
      .service(
        web::scope("/admin")
          .route("/dashboard", web::get().to(admin_handlers::dashboard_handler))
          .route("/users", web::get().to(admin_handlers::list_users_handler))
          .route("/bookings", web::get().to(admin_handlers::list_all_bookings_handler))
          .route("/bookings/complete", web::post().to(admin_handlers::completion_sweep_handler))
          .route(
            "/bookings/{booking_id}/status",
            web::put().to(admin_handlers::override_booking_status_handler),
          )
          .route("/packages", web::post().to(admin_handlers::create_package_handler))
          .route("/packages/{package_id}", web::delete().to(admin_handlers::delete_package_handler))
          .route(
            "/packages/{package_id}/departures",
            web::post().to(admin_handlers::add_departure_handler),
          )
          .route("/packages/{package_id}/trips", web::post().to(admin_handlers::add_trip_handler))
          .route("/packages/{package_id}/images", web::post().to(admin_handlers::add_image_handler))
          .route("/scheduled", web::get().to(admin_handlers::list_scheduled_handler))
          .route("/scheduled", web::post().to(admin_handlers::schedule_notification_handler))
          .route(
            "/scheduled/{scheduled_id}",
            web::delete().to(admin_handlers::cancel_scheduled_handler),
          ),
      )
      .route("/webhooks/payments", web::post().to(webhook_handlers::payment_webhook_handler)),
  );
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AppConfig;
  use crate::db::seed;
  use crate::state::AppState;
  use actix_web::http::StatusCode;
  use actix_web::{test, App};
  use serde_json::{json, Value};
  use std::sync::Arc;
  use voyage::{MemoryStore, ObservedStore};

  fn test_config() -> AppConfig {
    AppConfig {
      server_host: "127.0.0.1".to_string(),
      server_port: 0,
      database_url: None,
      tax_rate_bps: 0,
      cart_item_ttl_hours: 24 * 7,
      activity_list_cap: 20,
      completion_sweep_secs: 0,
      mock_payment_account_id: "test_acct".to_string(),
      seed_db: true,
      seed_admin_password: None,
    }
  }

  async fn seeded_state() -> AppState {
    let state = AppState::build(Arc::new(test_config()), Arc::new(ObservedStore::new(MemoryStore::new())));
    seed::seed_catalog(&state.voyage).await.unwrap();
    state
  }

  macro_rules! app {
    ($state:expr) => {
      test::init_service(
        App::new()
          .app_data(web::Data::new($state.clone()))
          .configure(configure_app_routes),
      )
      .await
    };
  }

  fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
  }

  #[actix_web::test]
  async fn health_is_public() {
    let state = seeded_state().await;
    let app = app!(state);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[actix_web::test]
  async fn signup_then_me_with_the_issued_token() {
    let state = seeded_state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
      .uri("/api/v1/auth/signup")
      .set_json(json!({"name": "Ada", "email": "Ada@Example.com", "password": "secret123"}))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
      .uri("/api/v1/auth/me")
      .insert_header(bearer(&token))
      .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["email"], "ada@example.com");
    assert_eq!(me["userType"], "CUSTOMER");
  }

  #[actix_web::test]
  async fn invalid_signup_reports_field_errors() {
    let state = seeded_state().await;
    let app = app!(state);
    let req = test::TestRequest::post()
      .uri("/api/v1/auth/signup")
      .set_json(json!({"name": "", "email": "nope", "password": "1"}))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]["email"].is_string());
  }

  #[actix_web::test]
  async fn cart_requires_a_session() {
    let state = seeded_state().await;
    let app = app!(state);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/cart").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[actix_web::test]
  async fn customers_cannot_reach_admin_routes() {
    let state = seeded_state().await;
    let app = app!(state);
    let signed_in = state
      .voyage
      .accounts
      .sign_up(voyage::auth::SignUpRequest {
        name: "Bo".into(),
        email: "bo@example.com".into(),
        password: "secret123".into(),
        phone: String::new(),
      })
      .await
      .unwrap();
    let req = test::TestRequest::get()
      .uri("/api/v1/admin/dashboard")
      .insert_header(bearer(&signed_in.token))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[actix_web::test]
  async fn add_to_cart_then_checkout() {
    let state = seeded_state().await;
    let app = app!(state);
    let voyage = &state.voyage;
    let signed_in = voyage
      .accounts
      .sign_up(voyage::auth::SignUpRequest {
        name: "Cy".into(),
        email: "cy@example.com".into(),
        password: "secret123".into(),
        phone: String::new(),
      })
      .await
      .unwrap();
    let package = voyage.packages.all_packages().await.unwrap().remove(0);
    let departure = voyage.packages.departures_for_package(&package.id).await.unwrap().remove(0);

    let req = test::TestRequest::post()
      .uri("/api/v1/cart/items")
      .insert_header(bearer(&signed_in.token))
      .set_json(json!({"packageId": package.id, "departureId": departure.id, "travelerCount": 2}))
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
      .uri("/api/v1/checkout")
      .insert_header(bearer(&signed_in.token))
      .set_json(json!({"method": "CARD"}))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let receipt: Value = test::read_body_json(resp).await;
    assert_eq!(receipt["bookings"][0]["status"], "CONFIRMED");

    let req = test::TestRequest::get()
      .uri("/api/v1/bookings")
      .insert_header(bearer(&signed_in.token))
      .to_request();
    let bookings: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(bookings.as_array().map(Vec::len), Some(1));
  }

  #[actix_web::test]
  async fn unknown_transaction_webhook_is_acknowledged() {
    let state = seeded_state().await;
    let app = app!(state);
    let req = test::TestRequest::post()
      .uri("/api/v1/webhooks/payments")
      .set_json(json!({"transactionId": "nope", "outcome": "SUCCEEDED"}))
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
  }
}
