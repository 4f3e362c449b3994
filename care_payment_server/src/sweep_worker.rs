use care_payment_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

use crate::config::SweepConfig;

/// Starts the cancellation-window opener. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_cancellation_worker(db: SqliteDatabase, config: SweepConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(config.cancellation_interval);
        let api = OrderFlowApi::new(db, EventProducers::default());
        info!("🕰️ Cancellation-window worker started");
        loop {
            timer.tick().await;
            match api.open_cancellation_windows().await {
                Ok(opened) if opened.is_empty() => trace!("🕰️ No cancellation windows due"),
                Ok(opened) => {
                    let ids = opened.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ");
                    info!("🕰️ Opened {} cancellation window(s): {ids}", opened.len());
                },
                Err(e) => error!("🕰️ Error running cancellation-window job: {e}"),
            }
        }
    })
}

/// Starts the archival sweep. One page per tick; a backlog larger than the page size drains over
/// successive runs.
pub fn start_archive_worker(db: SqliteDatabase, config: SweepConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(config.archive_interval);
        let api = OrderFlowApi::new(db, EventProducers::default());
        info!("🕰️ Archival worker started (retention {} days)", config.retention.num_days());
        loop {
            timer.tick().await;
            match api.archive_stale_orders(config.retention, config.archive_page_size).await {
                Ok(result) if result.count() == 0 => trace!("🕰️ Nothing to archive"),
                Ok(result) => info!("🕰️ Archived {} order(s)", result.count()),
                Err(e) => error!("🕰️ Error running archival job: {e}"),
            }
        }
    })
}
