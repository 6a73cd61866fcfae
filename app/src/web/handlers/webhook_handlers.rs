// voyage_app/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use voyage::model::GatewayOutcome;
use voyage::VoyageError;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallbackPayload {
  pub transaction_id: String,
  pub outcome: GatewayOutcome,
}

/// Final verdict of the payment gateway for one transaction. Replays are acknowledged.
#[instrument(
  name = "handler::payment_webhook",
  skip(app_state, req_payload),
  fields(transaction_id = %req_payload.transaction_id, outcome = ?req_payload.outcome)
)]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PaymentCallbackPayload>,
) -> Result<HttpResponse, AppError> {
  match app_state
    .voyage
    .payments
    .apply_gateway_callback(&req_payload.transaction_id, req_payload.outcome)
    .await
  {
    Ok(payment) => {
      info!(payment_id = %payment.id, status = payment.status.as_str(), "Payment webhook applied.");
      Ok(HttpResponse::Ok().json(json!({ "status": "received", "paymentStatus": payment.status })))
    }
    // Unknown transactions are acknowledged so the gateway stops retrying.
    Err(VoyageError::MissingDocument { .. }) => {
      info!("Payment webhook for an unknown transaction ignored.");
      Ok(HttpResponse::Ok().json(json!({ "status": "ignored" })))
    }
    Err(e) => {
      error!(error = %e, "Payment webhook failed.");
      Err(e.into())
    }
  }
}
