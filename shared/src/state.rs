use std::sync::Arc;

use truckspy_atoms::dynamo::DynamoStore;
use truckspy_atoms::s3::S3BlobStore;
use truckspy_atoms::{BlobStore, LabelStore};

use super::config::Config;

/// Everything a request handler needs, built once per Lambda container.
pub struct AppState {
    pub store: Arc<dyn LabelStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn LabelStore>, blobs: Arc<dyn BlobStore>, config: Config) -> Arc<Self> {
        Arc::new(Self {
            store,
            blobs,
            config,
        })
    }

    /// DynamoDB + S3 clients from the ambient AWS configuration.
    pub async fn from_env() -> Arc<Self> {
        let config = Config::load();
        let aws_config = aws_config::load_from_env().await;

        let store = DynamoStore::new(
            aws_sdk_dynamodb::Client::new(&aws_config),
            config.table_name.clone(),
        );
        let blobs = S3BlobStore::new(aws_sdk_s3::Client::new(&aws_config));
        tracing::info!("Using DynamoDB table {}", store.table_name());

        Self::new(Arc::new(store), Arc::new(blobs), config)
    }
}
