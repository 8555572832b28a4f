use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::error::CatalogError;
use super::loader::{Catalog, LoadReport};

/// Reload the TLE folder and regenerate every track from now.
///
/// The replacement is built on a blocking thread; the write lock is held
/// only for the swap.
pub async fn refresh_once(
    catalog: &RwLock<Catalog>,
    track_minutes: u32,
) -> Result<LoadReport, CatalogError> {
    let mut staged = catalog.read().await.staging_copy();
    let (staged, report) = tokio::task::spawn_blocking(move || {
        let report = staged.load_all()?;
        staged.refresh_tracks(Utc::now(), track_minutes);
        Ok::<_, CatalogError>((staged, report))
    })
    .await??;

    *catalog.write().await = staged;
    Ok(report)
}

struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Background task keeping the catalog's tracks current.
pub struct RefreshWorker {
    worker: Option<WorkerHandle>,
}

impl RefreshWorker {
    /// Refresh immediately, then once per `interval`.
    pub fn start(catalog: Arc<RwLock<Catalog>>, interval: Duration, track_minutes: u32) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_refresh_loop(catalog, interval, track_minutes, stop_rx));
        Self {
            worker: Some(WorkerHandle { stop_tx, join }),
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.join.is_finished())
    }

    pub async fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
            log::info!("Catalog refresh worker stopped");
        }
    }
}

async fn run_refresh_loop(
    catalog: Arc<RwLock<Catalog>>,
    interval: Duration,
    track_minutes: u32,
    mut stop_rx: oneshot::Receiver<()>,
) {
    log::info!(
        "Catalog refresh worker started (every {})",
        humantime::format_duration(interval)
    );
    loop {
        let next = Instant::now() + interval;

        match refresh_once(&catalog, track_minutes).await {
            Ok(report) => log::info!(
                "Catalog refreshed: {} loaded, {} rejected",
                report.loaded,
                report.rejected.len()
            ),
            Err(e) => log::warn!("Catalog refresh failed: {}", e),
        }

        let should_stop = tokio::select! {
            _ = sleep_until(next) => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::fixtures::ISS_TLE;

    #[tokio::test]
    async fn refresh_once_builds_tracks() {
        let mut catalog = Catalog::in_memory();
        catalog.ingest("iss.tle", ISS_TLE);
        let catalog = RwLock::new(catalog);

        let report = refresh_once(&catalog, 10).await.unwrap();
        assert_eq!(report.loaded, 0);

        let locked = catalog.read().await;
        assert_eq!(locked.track(25544).unwrap().track.len(), 11);
    }

    #[tokio::test]
    async fn failed_reload_leaves_catalog_untouched() {
        let mut catalog = Catalog::new(std::path::PathBuf::from("/nonexistent/groundtrack/tle"));
        catalog.ingest("iss.tle", ISS_TLE);
        let catalog = RwLock::new(catalog);

        let err = refresh_once(&catalog, 10).await.unwrap_err();
        assert!(matches!(err, CatalogError::DirectoryNotFound(_)));
        assert!(catalog.read().await.get(25544).is_some());
    }

    #[tokio::test]
    async fn readers_are_not_blocked_while_tracks_build() {
        let mut catalog = Catalog::in_memory();
        catalog.ingest("iss.tle", ISS_TLE);
        let catalog = Arc::new(RwLock::new(catalog));

        let refresh = tokio::spawn({
            let catalog = catalog.clone();
            async move { refresh_once(&catalog, 1440).await }
        });
        // a read during the rebuild sees the old catalog, never a cleared one
        while !refresh.is_finished() {
            assert_eq!(catalog.read().await.len(), 1);
            tokio::task::yield_now().await;
        }
        refresh.await.unwrap().unwrap();
        assert_eq!(catalog.read().await.track(25544).unwrap().track.len(), 1441);
    }

    #[tokio::test]
    async fn worker_refreshes_then_stops() {
        let mut catalog = Catalog::in_memory();
        catalog.ingest("iss.tle", ISS_TLE);
        let catalog = Arc::new(RwLock::new(catalog));

        let mut worker =
            RefreshWorker::start(catalog.clone(), Duration::from_secs(3600), 5);

        let mut tracked = false;
        for _ in 0..50 {
            if catalog.read().await.track(25544).is_some() {
                tracked = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(tracked);
        assert!(worker.is_running());

        worker.stop().await;
        assert!(!worker.is_running());
    }
}
