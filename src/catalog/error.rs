use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TLE directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Catalog refresh task failed: {0}")]
    RefreshTask(#[from] tokio::task::JoinError),
}
