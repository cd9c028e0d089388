use lambda_http::{http::StatusCode, Body, Error, Response};
use truckspy_atoms::LabelStore;

use crate::responses;

/// GET /api/labels - all label-group definitions
pub async fn list_label_groups_handler(store: &dyn LabelStore) -> Result<Response<Body>, Error> {
    match store.list_label_groups().await {
        Ok(groups) => responses::json(StatusCode::OK, &groups),
        Err(e) => {
            tracing::error!("❌ list_label_groups_handler failed: {}", e);
            responses::store_error(&e)
        }
    }
}
