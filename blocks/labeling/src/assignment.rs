//! Hands out the next image to label.
//!
//! This is an at-least-once work queue: a claim is only a timestamp, and a
//! claim older than the abandonment window is up for grabs again. Two
//! callers racing on the same stale claim can both receive it; there is no
//! owner token to detect that.

use chrono::{DateTime, Duration, Utc};
use lambda_http::{http::StatusCode, Body, Error, Response};
use truckspy_atoms::media::{ImageDocument, ImageRef};
use truckspy_atoms::{LabelStore, StoreError, StoreResult};

use crate::responses;

pub const DEFAULT_ABANDON_WINDOW_SECS: u32 = 30;

/// Longest accepted abandonment window: one day.
pub const MAX_ABANDON_WINDOW_SECS: u32 = 24 * 60 * 60;

/// Fresh queries after a candidate vanished before it could be claimed.
const MAX_PICK_ATTEMPTS: usize = 3;

/// Claims the next unlabeled image, or `None` when there is no work.
///
/// Unseen images come first; otherwise a claim older than `window` is
/// reclaimed. The returned image is left with `seen = true` and
/// `last_seen = now`.
pub async fn pick_next_ref(
    store: &dyn LabelStore,
    now: DateTime<Utc>,
    window: Duration,
) -> StoreResult<Option<ImageRef>> {
    for _ in 0..MAX_PICK_ATTEMPTS {
        let candidate = match store.find_unseen_image().await? {
            Some(image) => image,
            None => match store.find_stale_claim(now - window).await? {
                Some(image) => {
                    tracing::info!("Reclaiming abandoned image {}", image);
                    image
                }
                None => return Ok(None),
            },
        };

        match store.claim_image(&candidate, now).await {
            Ok(()) => {
                tracing::info!("Assigned image {}", candidate);
                return Ok(Some(candidate));
            }
            Err(StoreError::NotFound { .. }) => {
                tracing::warn!("Image {} disappeared before it could be claimed", candidate);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(None)
}

pub async fn load_metadata(
    store: &dyn LabelStore,
    image: &ImageRef,
) -> StoreResult<Option<ImageDocument>> {
    store.get_image(image).await
}

/// GET /api/images/ - assign the next image and return its document, or `{}`
pub async fn next_image_handler(
    store: &dyn LabelStore,
    window: Duration,
) -> Result<Response<Body>, Error> {
    let picked = match pick_next_ref(store, Utc::now(), window).await {
        Ok(picked) => picked,
        Err(e) => {
            tracing::error!("❌ next_image_handler failed to pick: {}", e);
            return responses::store_error(&e);
        }
    };

    let Some(image) = picked else {
        tracing::info!("No unlabeled images available");
        return responses::empty_object();
    };

    image_document_response(store, &image).await
}

/// GET /api/images/{bucket}/{image} - full label document, or `{}`
pub async fn get_image_handler(
    store: &dyn LabelStore,
    bucket: &str,
    image_id: &str,
) -> Result<Response<Body>, Error> {
    image_document_response(store, &ImageRef::new(bucket, image_id)).await
}

async fn image_document_response(
    store: &dyn LabelStore,
    image: &ImageRef,
) -> Result<Response<Body>, Error> {
    match load_metadata(store, image).await {
        Ok(Some(doc)) => responses::json(StatusCode::OK, &doc),
        Ok(None) => responses::empty_object(),
        Err(e) => {
            tracing::error!("❌ failed to load image {}: {}", image, e);
            responses::store_error(&e)
        }
    }
}
