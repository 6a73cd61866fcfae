// voyage/src/model/package.rs

use super::Cents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageStatus {
  Available,
  SoldOut,
}

impl PackageStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      PackageStatus::Available => "AVAILABLE",
      PackageStatus::SoldOut => "SOLD_OUT",
    }
  }
}

/// A sellable travel package. `trip_ids` is the itinerary, resolved by `TripRepository`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelPackage {
  #[serde(default)]
  pub id: String,
  pub name: String,
  pub description: String,
  pub location: String,
  /// Traveler type (e.g. "adult", "child") to per-traveler price.
  pub pricing: BTreeMap<String, Cents>,
  pub duration_days: u32,
  #[serde(default)]
  pub trip_ids: Vec<String>,
  pub status: PackageStatus,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at: DateTime<Utc>,
}

impl TravelPackage {
  pub fn price_for(&self, traveler_type: &str) -> Option<Cents> {
    self.pricing.get(traveler_type).copied()
  }

  /// Lowest listed price, used as the "from" price in listings.
  pub fn starting_price(&self) -> Option<Cents> {
    self.pricing.values().copied().min()
  }

  pub fn is_available(&self) -> bool {
    self.status == PackageStatus::Available
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageImage {
  #[serde(default)]
  pub id: String,
  pub package_id: String,
  pub url: String,
  pub is_primary: bool,
  pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageWithImages {
  pub package: TravelPackage,
  pub images: Vec<PackageImage>,
}

impl PackageWithImages {
  pub fn primary_image(&self) -> Option<&PackageImage> {
    self.images.iter().find(|i| i.is_primary).or_else(|| self.images.first())
  }
}

/// One itinerary activity of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
  #[serde(default)]
  pub id: String,
  pub package_id: String,
  pub day: u32,
  pub title: String,
  pub description: String,
  pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItineraryDay {
  pub day: u32,
  pub trips: Vec<Trip>,
}

/// A dated departure of a package with its own capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureAndEndTime {
  #[serde(default)]
  pub id: String,
  pub package_id: String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub start_date: DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub end_date: DateTime<Utc>,
  pub capacity: u32,
  /// Never above `capacity`.
  pub booked_count: u32,
}

impl DepartureAndEndTime {
  pub fn seats_left(&self) -> u32 {
    self.capacity.saturating_sub(self.booked_count)
  }

  pub fn is_full(&self) -> bool {
    self.booked_count >= self.capacity
  }
}
