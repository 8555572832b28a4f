mod error;
pub mod process;
mod supervisor;
mod types;

pub use error::CameraError;
pub use supervisor::FeedSupervisor;
pub use types::{CameraConfig, FeedState, FeedStatus, FeedSummary};
