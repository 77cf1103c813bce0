// storefront/src/workers.rs

//! Background loops for the import path: the incoming-prefix scanner and the
//! catalog batch consumer. Both stop when the shutdown signal flips to `true`.

use crate::services::{batch_consumer, import_service};
use crate::state::AppState;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub fn spawn_import_watcher(state: AppState, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
  tokio::spawn(async move {
    let interval = state.config.import.poll_interval;
    info!(?interval, "Import watcher started.");
    loop {
      if let Err(e) = import_service::scan_incoming(&state).await {
        error!(error = %e, "Incoming scan failed.");
      }
      tokio::select! {
        _ = tokio::time::sleep(interval) => {}
        changed = shutdown.changed() => {
          if changed.is_err() {
            break;
          }
        }
      }
      if *shutdown.borrow() {
        break;
      }
    }
    info!("Import watcher stopped.");
  })
}

/// Polls the queue; sleeps only when a poll came back empty or failed.
pub fn spawn_batch_consumer(state: AppState, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
  tokio::spawn(async move {
    let idle = state.config.queue.poll_interval;
    info!(batch_size = state.config.queue.batch_size, "Catalog batch consumer started.");
    loop {
      let busy = match batch_consumer::poll_once(&state).await {
        Ok(report) => !report.is_empty(),
        Err(e) => {
          error!(error = %e, "Queue poll failed.");
          false
        }
      };
      if !busy {
        tokio::select! {
          _ = tokio::time::sleep(idle) => {}
          changed = shutdown.changed() => {
            if changed.is_err() {
              break;
            }
          }
        }
      }
      if *shutdown.borrow() {
        break;
      }
    }
    info!("Catalog batch consumer stopped.");
  })
}
