// storefront/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use storefront::config::{AppConfig, LogFormat};
use storefront::state::{AppState, Backends};
use storefront::{web, workers};
use tokio::sync::watch;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      eprintln!("Configuration error: {}", e);
      std::process::exit(1);
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!(backend = ?app_config.store_backend, "Starting storefront server...");

  let backends = match Backends::from_config(&app_config).await {
    Ok(backends) => backends,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialize backends.");
      std::process::exit(1);
    }
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  let app_state = AppState::new(app_config, backends);

  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let watcher = workers::spawn_import_watcher(app_state.clone(), shutdown_rx.clone());
  let consumer = workers::spawn_batch_consumer(app_state.clone(), shutdown_rx);

  tracing::info!("Attempting to bind server to {}...", server_address);
  let server_state = app_state.clone();
  let served = HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(server_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await;

  let _ = shutdown_tx.send(true);
  for worker in [watcher, consumer] {
    if let Err(e) = worker.await {
      tracing::error!(error = %e, "Background worker ended abnormally.");
    }
  }
  tracing::info!("Storefront server stopped.");
  served
}
