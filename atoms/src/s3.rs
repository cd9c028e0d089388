use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;

use crate::error::{backend, StoreResult};
use crate::media::Blob;
use crate::store::BlobStore;

#[derive(Clone)]
pub struct S3BlobStore {
    client: S3Client,
}

impl S3BlobStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn get_blob(&self, bucket: &str, key: &str) -> StoreResult<Option<Blob>> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                tracing::info!("S3 object s3://{}/{} not found", bucket, key);
                return Ok(None);
            }
            Err(e) => return Err(backend("S3 get_object", e)),
        };

        let content_type = output.content_type().map(|s| s.to_string());
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| backend("S3 body read", e))?
            .into_bytes()
            .to_vec();

        Ok(Some(Blob { data, content_type }))
    }

    async fn delete_blob(&self, bucket: &str, key: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| backend("S3 delete_object", e))?;

        Ok(())
    }
}
