// voyage_app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use voyage::booking::pricing::TaxPolicy;
use voyage::VoyageSettings;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Postgres document store. Absent means the in-memory store.
  pub database_url: Option<String>,

  pub tax_rate_bps: u32,
  pub cart_item_ttl_hours: i64,
  pub activity_list_cap: usize,
  /// Interval of the PAID -> COMPLETED sweep. Zero disables it.
  pub completion_sweep_secs: u64,

  pub mock_payment_account_id: String,

  pub seed_db: bool,
  /// Password of the seeded admin account. No admin is seeded without it.
  pub seed_admin_password: Option<String>,
}

fn optional_env(var_name: &str) -> Option<String> {
  env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T>(var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match optional_env(var_name) {
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e))),
    None => Ok(default),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let server_host = optional_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parsed_env("SERVER_PORT", 8080u16)?;
    let database_url = optional_env("DATABASE_URL");

    let tax_rate_bps = parsed_env("TAX_RATE_BPS", 0u32)?;
    let cart_item_ttl_hours = parsed_env("CART_ITEM_TTL_HOURS", 24 * 7i64)?;
    if cart_item_ttl_hours <= 0 {
      return Err(AppError::Config("CART_ITEM_TTL_HOURS must be positive".to_string()));
    }
    let activity_list_cap = parsed_env("ACTIVITY_LIST_CAP", 20usize)?;
    if activity_list_cap == 0 {
      return Err(AppError::Config("ACTIVITY_LIST_CAP must be at least 1".to_string()));
    }
    let completion_sweep_secs = parsed_env("COMPLETION_SWEEP_SECS", 3_600u64)?;

    let mock_payment_account_id =
      optional_env("MOCK_PAYMENT_ACCOUNT_ID").unwrap_or_else(|| "mock_main_acct".to_string());
    let seed_db = parsed_env("SEED_DB", false)?;
    let seed_admin_password = optional_env("SEED_ADMIN_PASSWORD");

    tracing::info!(
      store = if database_url.is_some() { "postgres" } else { "memory" },
      "Application configuration loaded."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      tax_rate_bps,
      cart_item_ttl_hours,
      activity_list_cap,
      completion_sweep_secs,
      mock_payment_account_id,
      seed_db,
      seed_admin_password,
    })
  }

  pub fn voyage_settings(&self) -> VoyageSettings {
    VoyageSettings {
      tax: TaxPolicy::new(self.tax_rate_bps),
      cart_item_ttl: chrono::Duration::hours(self.cart_item_ttl_hours),
      activity_list_cap: self.activity_list_cap,
      ..VoyageSettings::default()
    }
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
