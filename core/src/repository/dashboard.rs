// voyage/src/repository/dashboard.rs

//! Admin dashboard figures, gathered concurrently.

use super::{BookingRepository, PackageRepository, PaymentRepository, UserRepository};
use crate::booking::status::BookingStatus;
use crate::error::VoyageResult;
use crate::model::{Cents, UserType};
use futures_util::future::try_join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
  pub user_count: u64,
  pub customer_count: u64,
  pub package_count: u64,
  pub booking_count: u64,
  pub revenue_cents: Cents,
  /// Keyed by status name.
  pub bookings_by_status: BTreeMap<String, u64>,
}

#[derive(Clone)]
pub struct DashboardRepository {
  users: UserRepository,
  packages: PackageRepository,
  bookings: BookingRepository,
  payments: PaymentRepository,
}

impl DashboardRepository {
  pub fn new(
    users: UserRepository,
    packages: PackageRepository,
    bookings: BookingRepository,
    payments: PaymentRepository,
  ) -> Self {
    Self {
      users,
      packages,
      bookings,
      payments,
    }
  }

  #[instrument(name = "DashboardRepository::stats", skip(self), err(Display))]
  pub async fn stats(&self) -> VoyageResult<DashboardStats> {
    let per_status = try_join_all(BookingStatus::ALL.into_iter().map(|status| {
      let bookings = self.bookings.clone();
      async move { Ok::<_, crate::error::VoyageError>((status, bookings.count_with_status(status).await?)) }
    }));

    let (user_count, customers, packages, booking_count, revenue_cents, per_status) = tokio::try_join!(
      self.users.count(),
      self.users.list_by_type(UserType::Customer),
      self.packages.all_packages(),
      self.bookings.count(),
      self.payments.revenue_cents(),
      per_status,
    )?;

    Ok(DashboardStats {
      user_count,
      customer_count: customers.len() as u64,
      package_count: packages.len() as u64,
      booking_count,
      revenue_cents,
      bookings_by_status: per_status
        .into_iter()
        .map(|(status, count)| (status.as_str().to_string(), count))
        .collect(),
    })
  }
}
