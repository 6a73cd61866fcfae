// voyage/src/services.rs

//! Wiring of every repository and service over one store.

use crate::auth::{AccountService, AuthProvider, AuthSession};
use crate::booking::{CheckoutService, PaymentGateway};
use crate::clock::Clock;
use crate::messaging::{LocalNotifier, MessagingService, PushTransport};
use crate::repository::{
  ActivityList, ActivityRepository, BookingRepository, CartRepository, DashboardRepository, NotificationRepository,
  PackageRepository, PaymentRepository, TripRepository, UserRepository,
};
use crate::scheduler::NotificationScheduler;
use crate::settings::VoyageSettings;
use crate::store::DocumentStore;
use std::sync::Arc;

/// External collaborators the core depends on.
pub struct Collaborators {
  pub auth: Arc<dyn AuthProvider>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub push: Arc<dyn PushTransport>,
  pub notifier: Arc<dyn LocalNotifier>,
}

/// Every repository and service, sharing one store, clock and settings.
/// Cheap to clone.
#[derive(Clone)]
pub struct Voyage {
  pub store: Arc<dyn DocumentStore>,
  pub clock: Arc<dyn Clock>,
  pub settings: VoyageSettings,
  pub users: UserRepository,
  pub packages: PackageRepository,
  pub trips: TripRepository,
  pub carts: CartRepository,
  pub bookings: BookingRepository,
  pub payments: PaymentRepository,
  pub notifications: NotificationRepository,
  pub recently_viewed: ActivityRepository,
  pub wishlist: ActivityRepository,
  pub dashboard: DashboardRepository,
  pub checkout: CheckoutService,
  pub accounts: AccountService,
  pub messaging: MessagingService,
  pub scheduler: NotificationScheduler,
}

impl Voyage {
  pub fn new(
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    settings: VoyageSettings,
    collaborators: Collaborators,
  ) -> Self {
    let users = UserRepository::new(store.clone());
    let packages = PackageRepository::new(store.clone());
    let trips = TripRepository::new(store.clone());
    let carts = CartRepository::new(store.clone(), clock.clone(), packages.clone(), settings.clone());
    let bookings = BookingRepository::new(store.clone(), clock.clone(), packages.clone());
    let payments = PaymentRepository::new(store.clone(), clock.clone(), bookings.clone());
    let notifications = NotificationRepository::new(store.clone());
    let cap = settings.activity_list_cap;
    let recently_viewed = ActivityRepository::new(store.clone(), clock.clone(), ActivityList::RecentlyViewed, cap);
    let wishlist = ActivityRepository::new(store.clone(), clock.clone(), ActivityList::Wishlist, cap);
    let dashboard = DashboardRepository::new(users.clone(), packages.clone(), bookings.clone(), payments.clone());
    let checkout = CheckoutService::new(
      carts.clone(),
      packages.clone(),
      bookings.clone(),
      payments.clone(),
      notifications.clone(),
      collaborators.gateway,
      clock.clone(),
      settings.clone(),
    );
    let accounts = AccountService::new(
      collaborators.auth,
      users.clone(),
      Arc::new(AuthSession::new()),
      clock.clone(),
    );
    let messaging = MessagingService::new(
      users.clone(),
      notifications.clone(),
      collaborators.notifier.clone(),
      clock.clone(),
    );
    let scheduler = NotificationScheduler::new(
      notifications.clone(),
      users.clone(),
      collaborators.push,
      collaborators.notifier,
      clock.clone(),
    );

    Self {
      store,
      clock,
      settings,
      users,
      packages,
      trips,
      carts,
      bookings,
      payments,
      notifications,
      recently_viewed,
      wishlist,
      dashboard,
      checkout,
      accounts,
      messaging,
      scheduler,
    }
  }

  pub fn activity(&self, list: ActivityList) -> &ActivityRepository {
    match list {
      ActivityList::RecentlyViewed => &self.recently_viewed,
      ActivityList::Wishlist => &self.wishlist,
    }
  }
}
