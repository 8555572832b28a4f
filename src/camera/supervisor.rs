use std::fs;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::error::CameraError;
use super::process::{self, FeedProcess};
use super::types::{CameraConfig, FeedState, FeedStatus, FeedSummary, PLAYLIST_NAME};

struct ActiveFeed {
    id: u32,
    name: String,
    started_at: DateTime<Utc>,
    process: FeedProcess,
}

/// Runs at most one ffmpeg conversion at a time, always into the same
/// playlist.
pub struct FeedSupervisor {
    config: CameraConfig,
    active: Option<ActiveFeed>,
}

impl FeedSupervisor {
    pub fn new(config: CameraConfig) -> Result<Self, CameraError> {
        fs::create_dir_all(&config.hls_folder)?;
        Ok(Self {
            config,
            active: None,
        })
    }

    pub fn feeds(&self) -> Vec<FeedSummary> {
        self.config.feeds.iter().map(FeedSummary::from).collect()
    }

    pub fn switch(&mut self, id: u32) -> Result<FeedStatus, CameraError> {
        let feed = self
            .config
            .feed(id)
            .cloned()
            .ok_or(CameraError::UnknownFeed(id))?;

        self.stop();
        let removed = process::clean_hls_output(&self.config.hls_folder)?;
        log::debug!("Removed {} stale HLS files", removed);

        let process = process::spawn(&self.config, &feed)?;
        self.active = Some(ActiveFeed {
            id: feed.id,
            name: feed.name,
            started_at: Utc::now(),
            process,
        });
        log::info!("Switched camera to feed {}", id);
        Ok(self.status())
    }

    /// Returns whether a conversion was running.
    pub fn stop(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                let was_running = active.process.kill();
                if was_running {
                    log::info!("Camera feed {} stopped", active.id);
                }
                was_running
            }
            None => false,
        }
    }

    pub fn status(&self) -> FeedStatus {
        let state = match &self.active {
            None => FeedState::Idle,
            Some(active) if active.process.is_running() => FeedState::Running,
            Some(_) => FeedState::Exited,
        };
        FeedStatus {
            state,
            running: state == FeedState::Running,
            feed_id: self.active.as_ref().map(|a| a.id),
            feed_name: self.active.as_ref().map(|a| a.name.clone()),
            started_at: self.active.as_ref().map(|a| a.started_at),
            playlist: format!("/hls/{}", PLAYLIST_NAME),
        }
    }

    /// Run `f` against the shared supervisor on a blocking thread. Killing,
    /// reaping and spawning ffmpeg all block.
    pub async fn run_blocking<T, F>(shared: &Arc<Mutex<Self>>, f: F) -> Result<T, CameraError>
    where
        F: FnOnce(&mut Self) -> T + Send + 'static,
        T: Send + 'static,
    {
        let shared = shared.clone();
        Ok(tokio::task::spawn_blocking(move || f(&mut shared.blocking_lock())).await?)
    }
}

impl Drop for FeedSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::types::CameraFeed;
    use std::path::PathBuf;

    fn config(name: &str, ffmpeg: &str) -> CameraConfig {
        let folder: PathBuf = std::env::temp_dir().join(format!(
            "groundtrack-camera-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&folder);
        CameraConfig {
            hls_folder: folder,
            ffmpeg: ffmpeg.into(),
            segment_seconds: 2,
            playlist_size: 5,
            feeds: vec![CameraFeed {
                id: 1,
                name: "Dish".into(),
                rtsp_url: "rtsp://127.0.0.1:554/one".into(),
            }],
        }
    }

    #[test]
    fn creates_folder_and_starts_idle() {
        let config = config("idle", "ffmpeg");
        let folder = config.hls_folder.clone();
        let mut supervisor = FeedSupervisor::new(config).unwrap();

        assert!(folder.is_dir());
        let status = supervisor.status();
        assert_eq!(status.state, FeedState::Idle);
        assert!(!status.running);
        assert_eq!(status.playlist, "/hls/index.m3u8");
        assert!(!supervisor.stop());
        assert_eq!(supervisor.feeds().len(), 1);

        let _ = fs::remove_dir_all(&folder);
    }

    #[test]
    fn unknown_feed_is_rejected() {
        let config = config("unknown", "ffmpeg");
        let folder = config.hls_folder.clone();
        let mut supervisor = FeedSupervisor::new(config).unwrap();

        assert!(matches!(
            supervisor.switch(9),
            Err(CameraError::UnknownFeed(9))
        ));
        assert_eq!(supervisor.status().state, FeedState::Idle);

        let _ = fs::remove_dir_all(&folder);
    }

    #[test]
    fn missing_converter_is_an_io_error() {
        let config = config("missing", "/nonexistent/groundtrack-ffmpeg");
        let folder = config.hls_folder.clone();
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("index.m3u8"), b"#EXTM3U").unwrap();
        let mut supervisor = FeedSupervisor::new(config).unwrap();

        assert!(matches!(supervisor.switch(1), Err(CameraError::Io(_))));
        // stale playlist is cleared before the spawn attempt
        assert!(!folder.join("index.m3u8").exists());
        assert_eq!(supervisor.status().state, FeedState::Idle);

        let _ = fs::remove_dir_all(&folder);
    }

    #[tokio::test]
    async fn shared_supervisor_switches_off_the_runtime() {
        let config = config("shared", "/nonexistent/groundtrack-ffmpeg");
        let folder = config.hls_folder.clone();
        let shared = Arc::new(Mutex::new(FeedSupervisor::new(config).unwrap()));

        let result = FeedSupervisor::run_blocking(&shared, |s| s.switch(1)).await.unwrap();
        assert!(matches!(result, Err(CameraError::Io(_))));

        let stopped = FeedSupervisor::run_blocking(&shared, |s| s.stop()).await.unwrap();
        assert!(!stopped);
        assert_eq!(shared.lock().await.status().state, FeedState::Idle);

        drop(shared);
        let _ = fs::remove_dir_all(&folder);
    }

    #[test]
    fn state_names() {
        assert_eq!(FeedState::Running.to_string(), "running");
        assert_eq!(FeedState::Exited.to_string(), "exited");
    }
}
