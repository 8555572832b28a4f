use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const PLAYLIST_NAME: &str = "index.m3u8";

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    pub hls_folder: PathBuf,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_segment_seconds")]
    pub segment_seconds: u32,
    #[serde(default = "default_playlist_size")]
    pub playlist_size: u32,
    #[serde(default)]
    pub feeds: Vec<CameraFeed>,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_segment_seconds() -> u32 {
    2
}

fn default_playlist_size() -> u32 {
    5
}

impl CameraConfig {
    pub fn feed(&self, id: u32) -> Option<&CameraFeed> {
        self.feeds.iter().find(|f| f.id == id)
    }

    pub fn playlist_path(&self) -> PathBuf {
        self.hls_folder.join(PLAYLIST_NAME)
    }
}

/// An RTSP source. The URL usually embeds credentials and is never logged
/// or serialized.
#[derive(Clone, Deserialize)]
pub struct CameraFeed {
    pub id: u32,
    pub name: String,
    pub rtsp_url: String,
}

impl std::fmt::Debug for CameraFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFeed")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeedState {
    Idle,
    Running,
    Exited,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeedStatus {
    pub state: FeedState,
    pub running: bool,
    pub feed_id: Option<u32>,
    pub feed_name: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    /// Playlist path relative to the HLS mount.
    pub playlist: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeedSummary {
    pub id: u32,
    pub name: String,
}

impl From<&CameraFeed> for FeedSummary {
    fn from(feed: &CameraFeed) -> Self {
        Self {
            id: feed.id,
            name: feed.name.clone(),
        }
    }
}
