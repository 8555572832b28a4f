mod error;
mod loader;
mod refresh;

pub use error::CatalogError;
pub use loader::{Catalog, LoadReport, RejectedEntry, SatelliteInfo};
pub use refresh::{refresh_once, RefreshWorker};
