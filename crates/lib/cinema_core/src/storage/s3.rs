//! S3-compatible object storage (AWS S3, MinIO).

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, error, info};

use super::{FileStorage, StorageError};

/// Connection settings for an S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// e.g. `http://localhost:9000`
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: "cinema-storage".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

/// [`FileStorage`] backed by an S3 bucket with path-style addressing.
#[derive(Clone)]
pub struct S3FileStorage {
    client: Arc<Client>,
    endpoint: String,
    bucket: String,
}

impl S3FileStorage {
    pub async fn new(config: S3Config) -> Self {
        info!(bucket = %config.bucket, endpoint = %config.endpoint, "Initializing S3 storage");

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "cinema",
        );
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = S3ConfigBuilder::from(&aws_config)
            .endpoint_url(&config.endpoint)
            .force_path_style(true)
            .build();

        Self {
            client: Arc::new(Client::from_conf(s3_config)),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            bucket: config.bucket,
        }
    }
}

#[async_trait]
impl FileStorage for S3FileStorage {
    async fn upload_file(&self, file_name: &str, data: Vec<u8>) -> Result<(), StorageError> {
        debug!(key = file_name, size = data.len(), "Uploading object");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(file_name)
            .body(ByteStream::from(data))
            .content_type("application/octet-stream")
            .send()
            .await
            .map_err(|e| {
                error!(key = file_name, error = %e, "S3 upload failed");
                match e {
                    SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
                        StorageError::Connection(e.to_string())
                    }
                    other => StorageError::Upload(other.to_string()),
                }
            })?;

        Ok(())
    }

    fn get_file_url(&self, file_name: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, file_name)
    }
}
