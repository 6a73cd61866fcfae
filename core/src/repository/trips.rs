// voyage/src/repository/trips.rs

use super::{load, load_all, load_required, save};
use crate::error::{VoyageError, VoyageResult};
use crate::model::{ItineraryDay, TravelPackage, Trip};
use crate::store::collections::{PACKAGES, TRIPS};
use crate::store::{DocumentStore, Query};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{instrument, warn};

#[derive(Clone)]
pub struct TripRepository {
  store: Arc<dyn DocumentStore>,
}

impl TripRepository {
  pub fn new(store: Arc<dyn DocumentStore>) -> Self {
    Self { store }
  }

  pub async fn create_trip(&self, trip: &Trip) -> VoyageResult<String> {
    if trip.title.trim().is_empty() {
      return Err(VoyageError::invalid("title", "Trip title is required."));
    }
    if trip.day == 0 {
      return Err(VoyageError::invalid("day", "Days are numbered from 1."));
    }
    save(self.store.as_ref(), TRIPS, &trip.id, trip).await
  }

  pub async fn get_trip(&self, id: &str) -> VoyageResult<Option<Trip>> {
    load(self.store.as_ref(), TRIPS, id).await
  }

  pub async fn trips_for_package(&self, package_id: &str) -> VoyageResult<Vec<Trip>> {
    load_all(self.store.as_ref(), TRIPS, &Query::all().where_eq("packageId", package_id)).await
  }

  /// Resolves the package's trip ids into days, ordered by day. Within a day,
  /// trips keep the order of the package's list. Unknown ids are dropped.
  #[instrument(name = "TripRepository::itinerary", skip(self), err(Display))]
  pub async fn itinerary(&self, package_id: &str) -> VoyageResult<Vec<ItineraryDay>> {
    let package: TravelPackage = load_required(self.store.as_ref(), PACKAGES, package_id).await?;
    let fetched = join_all(package.trip_ids.iter().map(|id| self.get_trip(id))).await;

    let mut days: BTreeMap<u32, Vec<Trip>> = BTreeMap::new();
    for (id, result) in package.trip_ids.iter().zip(fetched) {
      match result {
        Ok(Some(trip)) => days.entry(trip.day).or_default().push(trip),
        Ok(None) => warn!(trip_id = %id, "itinerary references a missing trip"),
        Err(e) => warn!(trip_id = %id, error = %e, "itinerary trip could not be read"),
      }
    }
    Ok(days.into_iter().map(|(day, trips)| ItineraryDay { day, trips }).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::PackageStatus;
  use crate::store::MemoryStore;
  use chrono::Utc;

  #[tokio::test]
  async fn itinerary_groups_by_day_and_drops_unknown_ids() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let trips = TripRepository::new(store.clone());
    let mut ids = Vec::new();
    for (day, title) in [(2, "Sintra"), (1, "Belem"), (1, "Alfama")] {
      let trip = Trip {
        id: String::new(),
        package_id: "p1".into(),
        day,
        title: title.into(),
        description: String::new(),
        location: "Lisbon".into(),
      };
      ids.push(trips.create_trip(&trip).await.unwrap());
    }
    ids.push("gone".into());

    let package = TravelPackage {
      id: "p1".into(),
      name: "Lisbon".into(),
      description: String::new(),
      location: "Lisbon".into(),
      pricing: [("adult".to_string(), 1)].into(),
      duration_days: 2,
      trip_ids: ids,
      status: PackageStatus::Available,
      created_at: Utc::now(),
    };
    save(store.as_ref(), PACKAGES, "p1", &package).await.unwrap();

    let days = trips.itinerary("p1").await.unwrap();
    assert_eq!(days.iter().map(|d| d.day).collect::<Vec<_>>(), vec![1, 2]);
    let day_one: Vec<&str> = days[0].trips.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(day_one, vec!["Belem", "Alfama"]);
  }

  #[tokio::test]
  async fn itinerary_of_unknown_package_is_missing() {
    let trips = TripRepository::new(Arc::new(MemoryStore::new()));
    assert!(matches!(
      trips.itinerary("nope").await,
      Err(VoyageError::MissingDocument { .. })
    ));
  }
}
