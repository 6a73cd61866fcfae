// voyage/src/repository/packages.rs

//! Catalog: packages, their images and dated departures with seat counts.

use super::{load, load_all, load_required, save};
use crate::error::{FieldErrors, VoyageError, VoyageResult};
use crate::model::{DepartureAndEndTime, PackageImage, PackageStatus, PackageWithImages, TravelPackage};
use crate::store::collections::{DEPARTURES, PACKAGES, PACKAGE_IMAGES};
use crate::store::{patch, Direction, DocumentStore, Query};
use futures_util::future::try_join_all;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct PackageRepository {
  store: Arc<dyn DocumentStore>,
  /// Serializes read-modify-write of departure seat counts within this process.
  seat_lock: Arc<Mutex<()>>,
}

impl PackageRepository {
  pub fn new(store: Arc<dyn DocumentStore>) -> Self {
    Self {
      store,
      seat_lock: Arc::new(Mutex::new(())),
    }
  }

  #[instrument(name = "PackageRepository::create_package", skip_all, fields(name = %package.name), err(Display))]
  pub async fn create_package(&self, package: &TravelPackage) -> VoyageResult<String> {
    validate_package(package)?;
    let id = save(self.store.as_ref(), PACKAGES, &package.id, package).await?;
    info!(package_id = %id, "package created");
    Ok(id)
  }

  pub async fn get_package(&self, id: &str) -> VoyageResult<Option<TravelPackage>> {
    load(self.store.as_ref(), PACKAGES, id).await
  }

  #[instrument(name = "PackageRepository::update_package", skip_all, fields(package_id = %package.id), err(Display))]
  pub async fn update_package(&self, package: &TravelPackage) -> VoyageResult<()> {
    validate_package(package)?;
    if self.store.get(PACKAGES, &package.id).await?.is_none() {
      return Err(VoyageError::missing(PACKAGES, &package.id));
    }
    save(self.store.as_ref(), PACKAGES, &package.id, package).await?;
    Ok(())
  }

  /// Deletes the package together with its images.
  #[instrument(name = "PackageRepository::delete_package", skip(self), err(Display))]
  pub async fn delete_package(&self, id: &str) -> VoyageResult<bool> {
    for image in self.images_for_package(id).await? {
      self.store.delete(PACKAGE_IMAGES, &image.id).await?;
    }
    Ok(self.store.delete(PACKAGES, id).await?)
  }

  /// Every package, newest first.
  pub async fn all_packages(&self) -> VoyageResult<Vec<TravelPackage>> {
    let query = Query::all().order_by("createdAt", Direction::Descending);
    load_all(self.store.as_ref(), PACKAGES, &query).await
  }

  pub async fn available_packages(&self) -> VoyageResult<Vec<TravelPackage>> {
    let query = Query::all()
      .where_eq("status", PackageStatus::Available.as_str())
      .order_by("createdAt", Direction::Descending);
    load_all(self.store.as_ref(), PACKAGES, &query).await
  }

  pub async fn add_image(&self, image: &PackageImage) -> VoyageResult<String> {
    if image.url.trim().is_empty() {
      return Err(VoyageError::invalid("url", "Image URL is required."));
    }
    save(self.store.as_ref(), PACKAGE_IMAGES, &image.id, image).await
  }

  /// Images of one package ordered by position.
  pub async fn images_for_package(&self, package_id: &str) -> VoyageResult<Vec<PackageImage>> {
    let query = Query::all()
      .where_eq("packageId", package_id)
      .order_by("position", Direction::Ascending);
    load_all(self.store.as_ref(), PACKAGE_IMAGES, &query).await
  }

  pub async fn package_with_images(&self, id: &str) -> VoyageResult<Option<PackageWithImages>> {
    let Some(package) = self.get_package(id).await? else {
      return Ok(None);
    };
    let images = self.images_for_package(id).await?;
    Ok(Some(PackageWithImages { package, images }))
  }

  /// Available packages joined with their images; image lookups run concurrently.
  #[instrument(name = "PackageRepository::packages_with_images", skip(self), err(Display))]
  pub async fn packages_with_images(&self) -> VoyageResult<Vec<PackageWithImages>> {
    let packages = self.available_packages().await?;
    let images = try_join_all(packages.iter().map(|p| self.images_for_package(&p.id))).await?;
    Ok(
      packages
        .into_iter()
        .zip(images)
        .map(|(package, images)| PackageWithImages { package, images })
        .collect(),
    )
  }

  #[instrument(name = "PackageRepository::add_departure", skip_all, fields(package_id = %departure.package_id), err(Display))]
  pub async fn add_departure(&self, departure: &DepartureAndEndTime) -> VoyageResult<String> {
    let mut errors = FieldErrors::new();
    if departure.end_date <= departure.start_date {
      errors.add("endDate", "End date must be after the start date.");
    }
    if departure.capacity == 0 {
      errors.add("capacity", "Capacity must be at least 1.");
    }
    if departure.booked_count > departure.capacity {
      errors.add("bookedCount", "Booked seats cannot exceed capacity.");
    }
    errors.into_result()?;
    load_required::<TravelPackage>(self.store.as_ref(), PACKAGES, &departure.package_id).await?;

    let id = save(self.store.as_ref(), DEPARTURES, &departure.id, departure).await?;
    self.refresh_availability(&departure.package_id).await?;
    Ok(id)
  }

  pub async fn get_departure(&self, id: &str) -> VoyageResult<Option<DepartureAndEndTime>> {
    load(self.store.as_ref(), DEPARTURES, id).await
  }

  /// Departures of one package, earliest first.
  pub async fn departures_for_package(&self, package_id: &str) -> VoyageResult<Vec<DepartureAndEndTime>> {
    let query = Query::all()
      .where_eq("packageId", package_id)
      .order_by("startDate", Direction::Ascending);
    load_all(self.store.as_ref(), DEPARTURES, &query).await
  }

  /// Takes `seats` on a departure. Fails with `CapacityExceeded` instead of overbooking.
  #[instrument(name = "PackageRepository::reserve_seats", skip(self), err(Display))]
  pub async fn reserve_seats(&self, departure_id: &str, seats: u32) -> VoyageResult<DepartureAndEndTime> {
    let _guard = self.seat_lock.lock().await;
    let mut departure: DepartureAndEndTime = load_required(self.store.as_ref(), DEPARTURES, departure_id).await?;
    if seats > departure.seats_left() {
      return Err(VoyageError::CapacityExceeded {
        departure_id: departure_id.to_string(),
        available: departure.seats_left(),
        requested: seats,
      });
    }
    departure.booked_count += seats;
    self.write_booked_count(&departure).await?;
    debug!(booked = departure.booked_count, capacity = departure.capacity, "seats reserved");
    if departure.is_full() {
      self.refresh_availability(&departure.package_id).await?;
    }
    Ok(departure)
  }

  /// Gives `seats` back; the count never drops below zero.
  #[instrument(name = "PackageRepository::release_seats", skip(self), err(Display))]
  pub async fn release_seats(&self, departure_id: &str, seats: u32) -> VoyageResult<DepartureAndEndTime> {
    let _guard = self.seat_lock.lock().await;
    let mut departure: DepartureAndEndTime = load_required(self.store.as_ref(), DEPARTURES, departure_id).await?;
    let was_full = departure.is_full();
    departure.booked_count = departure.booked_count.saturating_sub(seats);
    self.write_booked_count(&departure).await?;
    if was_full {
      self.refresh_availability(&departure.package_id).await?;
    }
    Ok(departure)
  }

  async fn write_booked_count(&self, departure: &DepartureAndEndTime) -> VoyageResult<()> {
    let updated = self
      .store
      .update(DEPARTURES, &departure.id, patch([("bookedCount", json!(departure.booked_count))]))
      .await?;
    if updated {
      Ok(())
    } else {
      Err(VoyageError::missing(DEPARTURES, &departure.id))
    }
  }

  /// SOLD_OUT when every departure is full, AVAILABLE otherwise.
  async fn refresh_availability(&self, package_id: &str) -> VoyageResult<PackageStatus> {
    let departures = self.departures_for_package(package_id).await?;
    let status = if !departures.is_empty() && departures.iter().all(DepartureAndEndTime::is_full) {
      PackageStatus::SoldOut
    } else {
      PackageStatus::Available
    };
    let changed = match self.get_package(package_id).await? {
      Some(package) => package.status != status,
      None => false,
    };
    if changed {
      self
        .store
        .update(PACKAGES, package_id, patch([("status", json!(status))]))
        .await?;
      info!(package_id, status = status.as_str(), "package availability changed");
    }
    Ok(status)
  }
}

fn validate_package(package: &TravelPackage) -> VoyageResult<()> {
  let mut errors = FieldErrors::new();
  if package.name.trim().is_empty() {
    errors.add("name", "Package name is required.");
  }
  if package.pricing.is_empty() {
    errors.add("pricing", "At least one traveler price is required.");
  } else if package.pricing.values().any(|price| *price < 0) {
    errors.add("pricing", "Prices cannot be negative.");
  }
  if package.duration_days == 0 {
    errors.add("durationDays", "Duration must be at least one day.");
  }
  errors.into_result()
}
