// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::Level;
use voyage::auth::MemoryAuthProvider;
use voyage::messaging::{PushMessage, PushTransport, RecordingNotifier, RecordingPushTransport};
use voyage::model::{DepartureAndEndTime, PackageStatus, TravelPackage, User, UserType};
use voyage::services::Collaborators;
use voyage::store::{collections, ChangeEvent, Document};
use voyage::{
  Clock, DocumentStore, ManualClock, MemoryStore, ObservedStore, PaymentGateway, PaymentRequest, Query, Voyage, VoyageError,
  StoreError, VoyageResult, VoyageSettings,
};

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn start_time() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

/// Gateway double: hands out sequential transaction ids, or fails on demand.
#[derive(Debug, Default)]
pub struct StubGateway {
  pub fail: AtomicBool,
  pub fail_void: AtomicBool,
  pub calls: AtomicUsize,
  pub voided: Mutex<Vec<String>>,
  /// When set, every cart in this store is deleted right after a transaction
  /// opens, so checkout fails after the gateway has been charged.
  pub drop_carts_in: Mutex<Option<Arc<ObservedStore<MemoryStore>>>>,
}

#[async_trait]
impl PaymentGateway for StubGateway {
  async fn initiate(&self, request: &PaymentRequest) -> VoyageResult<String> {
    let n = self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail.load(Ordering::SeqCst) {
      return Err(VoyageError::Payment(format!("card declined for {}", request.payment_id)));
    }
    let drop_carts = self.drop_carts_in.lock().clone();
    if let Some(store) = drop_carts {
      for doc in store.query(collections::CARTS, &Query::all()).await? {
        store.delete(collections::CARTS, &doc.id).await?;
      }
    }
    Ok(format!("txn_{}", n + 1))
  }

  async fn void(&self, transaction_id: &str) -> VoyageResult<()> {
    if self.fail_void.load(Ordering::SeqCst) {
      return Err(VoyageError::Payment(format!("cannot void {}", transaction_id)));
    }
    self.voided.lock().push(transaction_id.to_string());
    Ok(())
  }
}

/// Memory store whose booking updates can be made to fail on their own.
pub struct BookingWriteSwitch {
  inner: Arc<ObservedStore<MemoryStore>>,
  failing: Arc<AtomicBool>,
}

#[async_trait]
impl DocumentStore for BookingWriteSwitch {
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
    self.inner.get(collection, id).await
  }

  async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
    self.inner.set(collection, id, data).await
  }

  async fn update(&self, collection: &str, id: &str, patch: Map<String, Value>) -> Result<bool, StoreError> {
    if collection == collections::BOOKINGS && self.failing.load(Ordering::SeqCst) {
      return Err(StoreError::Unavailable("booking writes switched off".to_string()));
    }
    self.inner.update(collection, id, patch).await
  }

  async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
    self.inner.delete(collection, id).await
  }

  async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
    self.inner.query(collection, query).await
  }

  fn changes(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
    self.inner.changes()
  }
}

/// A push transport that always fails.
#[derive(Debug, Default)]
pub struct BrokenPush;

#[async_trait]
impl PushTransport for BrokenPush {
  async fn send_to_token(&self, _token: &str, _message: &PushMessage) -> VoyageResult<()> {
    Err(VoyageError::Delivery("transport offline".to_string()))
  }
}

pub struct TestWorld {
  pub voyage: Voyage,
  pub memory: Arc<ObservedStore<MemoryStore>>,
  pub clock: Arc<ManualClock>,
  pub gateway: Arc<StubGateway>,
  pub push: Arc<RecordingPushTransport>,
  pub notifier: Arc<RecordingNotifier>,
  pub booking_writes_fail: Arc<AtomicBool>,
}

pub fn world() -> TestWorld {
  world_with(VoyageSettings::default(), None)
}

pub fn world_with(settings: VoyageSettings, push_override: Option<Arc<dyn PushTransport>>) -> TestWorld {
  setup_tracing();
  let memory = Arc::new(ObservedStore::new(MemoryStore::new()));
  let booking_writes_fail = Arc::new(AtomicBool::new(false));
  let store: Arc<dyn DocumentStore> = Arc::new(BookingWriteSwitch {
    inner: memory.clone(),
    failing: booking_writes_fail.clone(),
  });
  let clock = Arc::new(ManualClock::new(start_time()));
  let gateway = Arc::new(StubGateway::default());
  let push = Arc::new(RecordingPushTransport::new());
  let notifier = Arc::new(RecordingNotifier::new());

  let collaborators = Collaborators {
    auth: Arc::new(MemoryAuthProvider::new()),
    gateway: gateway.clone(),
    push: push_override.unwrap_or_else(|| push.clone() as Arc<dyn PushTransport>),
    notifier: notifier.clone(),
  };
  let voyage = Voyage::new(store, clock.clone(), settings, collaborators);
  TestWorld {
    voyage,
    memory,
    clock,
    gateway,
    push,
    notifier,
    booking_writes_fail,
  }
}

impl TestWorld {
  /// A package with one adult price and one departure 30 days out.
  pub async fn seed_package(&self, name: &str, adult_price: i64, capacity: u32) -> (String, String) {
    let package = TravelPackage {
      id: String::new(),
      name: name.to_string(),
      description: format!("{} package", name),
      location: "Somewhere".to_string(),
      pricing: BTreeMap::from([("adult".to_string(), adult_price), ("child".to_string(), adult_price / 2)]),
      duration_days: 5,
      trip_ids: vec![],
      status: PackageStatus::Available,
      created_at: self.clock.now(),
    };
    let package_id = self.voyage.packages.create_package(&package).await.unwrap();
    let departure_id = self.seed_departure(&package_id, 30, capacity).await;
    (package_id, departure_id)
  }

  pub async fn seed_departure(&self, package_id: &str, days_out: i64, capacity: u32) -> String {
    let start = self.clock.now() + Duration::days(days_out);
    let departure = DepartureAndEndTime {
      id: String::new(),
      package_id: package_id.to_string(),
      start_date: start,
      end_date: start + Duration::days(5),
      capacity,
      booked_count: 0,
    };
    self.voyage.packages.add_departure(&departure).await.unwrap()
  }

  pub async fn seed_user(&self, id: &str, user_type: UserType, push_token: Option<&str>) -> User {
    let user = User {
      id: id.to_string(),
      name: format!("User {}", id),
      email: format!("{}@example.com", id),
      phone: "5550100".to_string(),
      user_type,
      push_token: push_token.map(str::to_string),
      created_at: self.clock.now(),
    };
    self.voyage.users.create_user(&user).await.unwrap();
    user
  }
}

/// Polls `check` until it holds, failing the test after ~2 seconds.
pub async fn eventually<F, Fut>(mut check: F)
where
  F: FnMut() -> Fut,
  Fut: Future<Output = bool>,
{
  for _ in 0..200 {
    if check().await {
      return;
    }
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
  }
  panic!("condition was not reached in time");
}

impl TestWorld {
  pub fn clock_now(&self) -> DateTime<Utc> {
    self.clock.now()
  }
}
