// voyage_app/src/main.rs

mod config;
mod db;
mod errors;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::db::PgDocumentStore;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;
use voyage::{DocumentStore, MemoryStore, ObservedStore};

async fn open_store(app_config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
  match &app_config.database_url {
    Some(url) => {
      let store = PgDocumentStore::connect(url).await?;
      store.ensure_schema().await?;
      tracing::info!("Connected to the Postgres document store.");
      Ok(Arc::new(ObservedStore::new(store)))
    }
    None => {
      tracing::warn!("DATABASE_URL not set; using the in-memory document store.");
      Ok(Arc::new(ObservedStore::new(MemoryStore::new())))
    }
  }
}

/// Periodically moves PAID bookings whose trip has ended to COMPLETED.
fn spawn_completion_sweep(app_state: &AppState) {
  let secs = app_state.config.completion_sweep_secs;
  if secs == 0 {
    tracing::info!("Completion sweep disabled.");
    return;
  }
  let voyage = app_state.voyage.clone();
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    loop {
      ticker.tick().await;
      match voyage.bookings.complete_past_bookings(voyage.clock.now()).await {
        Ok(done) if !done.is_empty() => tracing::info!(completed = done.len(), "Completion sweep finished."),
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Completion sweep failed."),
      }
    }
  });
}

async fn seed(app_state: &AppState) {
  let voyage = &app_state.voyage;
  match voyage.packages.all_packages().await {
    Ok(existing) if !existing.is_empty() => {
      tracing::info!(packages = existing.len(), "Catalog already present; skipping seed.");
    }
    Ok(_) => {
      if let Err(e) = db::seed::seed_catalog(voyage).await {
        tracing::error!(error = %e, "Failed to seed the catalog.");
      }
    }
    Err(e) => tracing::error!(error = %e, "Could not inspect the catalog before seeding."),
  }
  if let Some(password) = &app_state.config.seed_admin_password {
    if let Err(e) = db::seed::seed_admin(voyage, password).await {
      tracing::error!(error = %e, "Failed to seed the administrator account.");
    }
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting Voyage booking server...");

  let app_config = Arc::new(AppConfig::from_env().map_err(|e| anyhow::anyhow!("configuration error: {}", e))?);
  let store = open_store(&app_config).await?;
  let app_state = AppState::build(app_config.clone(), store);

  if app_config.seed_db {
    seed(&app_state).await;
  }

  match app_state.voyage.scheduler.recover_pending().await {
    Ok(report) => tracing::info!(
      dispatched = report.dispatched,
      requeued = report.requeued,
      "Scheduled notifications recovered."
    ),
    Err(e) => tracing::error!(error = %e, "Failed to recover scheduled notifications."),
  }

  spawn_completion_sweep(&app_state);

  let server_address = app_config.server_address();
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;
  Ok(())
}
