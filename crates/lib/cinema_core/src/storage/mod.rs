//! Object storage for uploaded files.

pub mod s3;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to connect to storage: {0}")]
    Connection(String),

    #[error("Failed to upload to storage: {0}")]
    Upload(String),
}

/// Stores files under flat keys and resolves their public URLs.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn upload_file(&self, file_name: &str, data: Vec<u8>) -> Result<(), StorageError>;

    fn get_file_url(&self, file_name: &str) -> String;
}
