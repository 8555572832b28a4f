use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("unknown camera id {0}")]
    UnknownFeed(u32),
    #[error("camera process error: {0}")]
    Io(#[from] std::io::Error),
    #[error("camera task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
