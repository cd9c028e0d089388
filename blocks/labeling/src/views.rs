use base64::{engine::general_purpose::STANDARD, Engine as _};
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;
use truckspy_atoms::views::ViewSummary;
use truckspy_atoms::{BlobStore, LabelStore, StoreResult};

use crate::responses;

/// Latest snapshot of a view, base64-encoded. Both fields are empty when
/// the view has no snapshot yet.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct LiveView {
    pub data: String,
    pub time: String,
}

pub async fn get_live_view(
    store: &dyn LabelStore,
    blobs: &dyn BlobStore,
    view_id: &str,
) -> StoreResult<LiveView> {
    let Some(view) = store.get_last_view(view_id).await? else {
        tracing::info!("No last-view pointer for {}", view_id);
        return Ok(LiveView::default());
    };

    if view.filename.is_empty() {
        return Ok(LiveView::default());
    }

    // The view id names the bucket its snapshots land in
    match blobs.get_blob(view_id, &view.filename).await? {
        Some(blob) => Ok(LiveView {
            data: STANDARD.encode(&blob.data),
            time: view.time_updated,
        }),
        None => {
            tracing::warn!(
                "Last view {} points at missing blob {}",
                view_id,
                view.filename
            );
            Ok(LiveView::default())
        }
    }
}

/// GET /api/views/{view}
pub async fn live_view_handler(
    store: &dyn LabelStore,
    blobs: &dyn BlobStore,
    view_id: &str,
) -> Result<Response<Body>, Error> {
    match get_live_view(store, blobs, view_id).await {
        Ok(view) => responses::json(StatusCode::OK, &view),
        Err(e) => {
            tracing::error!("❌ live_view_handler failed: view={}, error={}", view_id, e);
            responses::store_error(&e)
        }
    }
}

/// GET /api/views
pub async fn list_views_handler(store: &dyn LabelStore) -> Result<Response<Body>, Error> {
    match store.list_views().await {
        Ok(views) => {
            let summaries: Vec<ViewSummary> = views.iter().map(ViewSummary::from).collect();
            responses::json(StatusCode::OK, &summaries)
        }
        Err(e) => {
            tracing::error!("❌ list_views_handler failed: {}", e);
            responses::store_error(&e)
        }
    }
}
