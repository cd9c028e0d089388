use lambda_http::{http::StatusCode, Body, Error, Response};
use truckspy_atoms::media::ImageRef;
use truckspy_atoms::{BlobStore, LabelStore};

use crate::responses;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// GET /api/snapshots/{bucket}/{image} - raw image bytes, or `{}` if absent
pub async fn snapshot_handler(
    store: &dyn LabelStore,
    blobs: &dyn BlobStore,
    bucket: &str,
    image_id: &str,
) -> Result<Response<Body>, Error> {
    let key = match store.get_image(&ImageRef::new(bucket, image_id)).await {
        Ok(Some(doc)) => doc.blob_key(),
        Ok(None) => image_id.to_string(),
        Err(e) => {
            tracing::error!("❌ snapshot_handler lookup failed: {}/{}: {}", bucket, image_id, e);
            return responses::store_error(&e);
        }
    };

    match blobs.get_blob(bucket, &key).await {
        Ok(Some(blob)) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header(
                "Content-Type",
                blob.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE),
            )
            .body(Body::Binary(blob.data))
            .map_err(Box::new)?),
        Ok(None) => responses::empty_object(),
        Err(e) => {
            tracing::error!("❌ snapshot_handler download failed: {}/{}: {}", bucket, key, e);
            responses::store_error(&e)
        }
    }
}
