pub mod camera;
pub mod error;
pub mod satellites;
pub mod stations;
pub mod tracks;
