// voyage_app/src/db/seed.rs

//! Demo catalog written on startup when `SEED_DB=true`.

use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use tracing::{info, instrument};
use voyage::auth::SignUpRequest;
use voyage::model::{DepartureAndEndTime, PackageImage, PackageStatus, TravelPackage, Trip, UserType};
use voyage::{Voyage, VoyageResult};

pub const ADMIN_EMAIL: &str = "admin@voyage.local";

struct SeedPackage {
  name: &'static str,
  location: &'static str,
  adult: i64,
  child: i64,
  days: u32,
  trips: &'static [(u32, &'static str)],
}

const CATALOG: &[SeedPackage] = &[
  SeedPackage {
    name: "Lisbon Old Town",
    location: "Lisbon, Portugal",
    adult: 89_900,
    child: 45_000,
    days: 5,
    trips: &[(1, "Alfama walking tour"), (2, "Belem and the river"), (3, "Sintra day trip")],
  },
  SeedPackage {
    name: "Rome Classics",
    location: "Rome, Italy",
    adult: 115_000,
    child: 60_000,
    days: 6,
    trips: &[(1, "Colosseum and Forum"), (2, "Vatican Museums"), (4, "Trastevere food walk")],
  },
  SeedPackage {
    name: "Azores Nature",
    location: "Sao Miguel, Azores",
    adult: 132_500,
    child: 70_000,
    days: 7,
    trips: &[(1, "Sete Cidades crater lakes"), (3, "Whale watching"), (5, "Furnas hot springs")],
  },
];

/// Writes the demo catalog unless packages already exist. Returns how many packages were created.
#[instrument(name = "seed::seed_catalog", skip(voyage), err(Display))]
pub async fn seed_catalog(voyage: &Voyage) -> VoyageResult<usize> {
  if !voyage.packages.all_packages().await?.is_empty() {
    info!("Catalog already present, skipping seed.");
    return Ok(0);
  }

  let now = Utc::now();
  for entry in CATALOG {
    let mut package = TravelPackage {
      id: String::new(),
      name: entry.name.to_string(),
      description: format!("{} days in {}", entry.days, entry.location),
      location: entry.location.to_string(),
      pricing: BTreeMap::from([("adult".to_string(), entry.adult), ("child".to_string(), entry.child)]),
      duration_days: entry.days,
      trip_ids: Vec::new(),
      status: PackageStatus::Available,
      created_at: now,
    };
    package.id = voyage.packages.create_package(&package).await?;

    for (day, title) in entry.trips {
      let trip = Trip {
        id: String::new(),
        package_id: package.id.clone(),
        day: *day,
        title: title.to_string(),
        description: String::new(),
        location: entry.location.to_string(),
      };
      package.trip_ids.push(voyage.trips.create_trip(&trip).await?);
    }
    voyage.packages.update_package(&package).await?;

    voyage
      .packages
      .add_image(&PackageImage {
        id: String::new(),
        package_id: package.id.clone(),
        url: format!("/static/packages/{}.jpg", package.id),
        is_primary: true,
        position: 0,
      })
      .await?;

    for weeks_out in [4, 8, 12] {
      let start = now + Duration::weeks(weeks_out);
      voyage
        .packages
        .add_departure(&DepartureAndEndTime {
          id: String::new(),
          package_id: package.id.clone(),
          start_date: start,
          end_date: start + Duration::days(i64::from(entry.days)),
          capacity: 20,
          booked_count: 0,
        })
        .await?;
    }
  }
  info!(packages = CATALOG.len(), "Demo catalog seeded.");
  Ok(CATALOG.len())
}

/// Creates the admin account when it does not exist yet.
#[instrument(name = "seed::seed_admin", skip_all, err(Display))]
pub async fn seed_admin(voyage: &Voyage, password: &str) -> VoyageResult<()> {
  if voyage.users.find_by_email(ADMIN_EMAIL).await?.is_some() {
    return Ok(());
  }
  let signed_in = voyage
    .accounts
    .sign_up(SignUpRequest {
      name: "Administrator".to_string(),
      email: ADMIN_EMAIL.to_string(),
      password: password.to_string(),
      phone: String::new(),
    })
    .await?;
  let mut admin = signed_in.user;
  admin.user_type = UserType::Admin;
  voyage.users.update_user(&admin).await?;
  voyage.accounts.sign_out(&signed_in.token).await?;
  info!(user_id = %admin.id, "Admin account seeded.");
  Ok(())
}
