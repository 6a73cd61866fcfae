// voyage/examples/booking_flow.rs

//! End-to-end walk through the booking core on the in-memory store:
//! catalog, sign-up, cart, checkout and the gateway's confirmation.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use voyage::auth::{MemoryAuthProvider, SignUpRequest};
use voyage::messaging::{LogNotifier, RecordingPushTransport};
use voyage::model::{DepartureAndEndTime, GatewayOutcome, NewCartItem, PackageStatus, PaymentMethod, TravelPackage};
use voyage::services::Collaborators;
use voyage::{
  MemoryStore, ObservedStore, PaymentGateway, PaymentRequest, SystemClock, Voyage, VoyageResult, VoyageSettings,
};

/// Accepts every request and names the transaction after the payment.
struct ApprovingGateway;

#[async_trait]
impl PaymentGateway for ApprovingGateway {
  async fn initiate(&self, request: &PaymentRequest) -> VoyageResult<String> {
    Ok(format!("demo_txn_{}", request.payment_id))
  }

  async fn void(&self, transaction_id: &str) -> VoyageResult<()> {
    info!(transaction_id, "transaction voided");
    Ok(())
  }
}

#[tokio::main]
async fn main() -> VoyageResult<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let voyage = Voyage::new(
    Arc::new(ObservedStore::new(MemoryStore::new())),
    Arc::new(SystemClock),
    VoyageSettings::default(),
    Collaborators {
      auth: Arc::new(MemoryAuthProvider::new()),
      gateway: Arc::new(ApprovingGateway),
      push: Arc::new(RecordingPushTransport::new()),
      notifier: Arc::new(LogNotifier),
    },
  );

  let now = Utc::now();
  let package_id = voyage
    .packages
    .create_package(&TravelPackage {
      id: String::new(),
      name: "Fjord Explorer".into(),
      description: "Five days along the western fjords.".into(),
      location: "Bergen".into(),
      pricing: BTreeMap::from([("adult".to_string(), 89_900)]),
      duration_days: 5,
      trip_ids: Vec::new(),
      status: PackageStatus::Available,
      created_at: now,
    })
    .await?;
  let departure_id = voyage
    .packages
    .add_departure(&DepartureAndEndTime {
      id: String::new(),
      package_id: package_id.clone(),
      start_date: now + Duration::weeks(6),
      end_date: now + Duration::weeks(6) + Duration::days(5),
      capacity: 12,
      booked_count: 0,
    })
    .await?;

  let signed_in = voyage
    .accounts
    .sign_up(SignUpRequest {
      name: "Demo Traveler".into(),
      email: "demo@example.com".into(),
      password: "demo-pass-1".into(),
      phone: String::new(),
    })
    .await?;
  let user_id = signed_in.user.id;

  voyage
    .carts
    .add_item_to_cart(&user_id, NewCartItem::new(&package_id, &departure_id, 2))
    .await?;
  if let Some(cart) = voyage.carts.active_cart(&user_id).await? {
    info!(total_cents = cart.total_cents, items = cart.item_ids.len(), "cart ready");
  }

  let receipt = voyage.checkout.checkout(&user_id, PaymentMethod::Card).await?;
  info!(
    transaction = %receipt.transaction_id,
    amount_cents = receipt.payment.amount_cents,
    bookings = receipt.bookings.len(),
    "checkout accepted"
  );

  let payment = voyage
    .payments
    .apply_gateway_callback(&receipt.transaction_id, GatewayOutcome::Succeeded)
    .await?;
  info!(status = payment.status.as_str(), "gateway confirmed payment");

  let stats = voyage.dashboard.stats().await?;
  info!(?stats, "dashboard");
  Ok(())
}
