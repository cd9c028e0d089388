use labeling_block::{assignment, export, groups, reconcile, snapshots, views};
use lambda_http::http::header::{HeaderValue, VARY};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use std::sync::Arc;
use truckspy_shared::AppState;

fn with_cors_headers(mut resp: Response<Body>, cors_origin: &str) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(cors_origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,PUT,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

fn finalize_response(
    resp: Result<Response<Body>, Error>,
    cors_origin: &str,
) -> Result<Response<Body>, Error> {
    resp.map(|r| with_cors_headers(r, cors_origin))
}

/// Main Lambda handler - routes /api/* requests to the labeling block
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    let cors_origin = state.config.cors_origin.as_str();
    tracing::info!("🚀 API Lambda invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if *method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, cors_origin));
    }

    let store = state.store.as_ref();
    let blobs = state.blobs.as_ref();
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let resp = match (method, parts.as_slice()) {
        // --- VIEWS ---
        // GET /api/views - list views
        (&Method::GET, ["api", "views"]) => views::list_views_handler(store).await,
        // GET /api/views/{view} - latest snapshot, base64
        (&Method::GET, ["api", "views", view_id]) => {
            views::live_view_handler(store, blobs, view_id).await
        }

        // --- IMAGES ---
        // GET /api/images/ - assign next unlabeled image
        (&Method::GET, ["api", "images"]) => {
            assignment::next_image_handler(store, state.config.abandon_window()).await
        }
        // GET /api/images/{bucket}/{image} - label document
        (&Method::GET, ["api", "images", bucket, image_id]) => {
            assignment::get_image_handler(store, bucket, image_id).await
        }
        // PUT /api/images/{bucket}/{image} - submit labels
        (&Method::PUT, ["api", "images", bucket, image_id]) => {
            reconcile::put_labels_handler(store, bucket, image_id, body).await
        }

        // --- SNAPSHOTS ---
        // GET /api/snapshots/{bucket}/{image} - raw image bytes
        (&Method::GET, ["api", "snapshots", bucket, image_id]) => {
            snapshots::snapshot_handler(store, blobs, bucket, image_id).await
        }

        // --- LABEL GROUPS ---
        // GET /api/labels - label-group definitions
        (&Method::GET, ["api", "labels"]) => groups::list_label_groups_handler(store).await,

        // --- EXPORT ---
        // GET /api/classified?label={group_id} - CSV
        (&Method::GET, ["api", "classified"]) => {
            let label = event
                .query_string_parameters_ref()
                .and_then(|params| params.first("label"));
            export::classified_csv_handler(store, label, &state.config.export_urls()).await
        }

        _ => {
            tracing::warn!("⚠️ No route matched - Method: {} Path: {}", method, path);
            not_found()
        }
    };

    finalize_response(resp, cors_origin)
}

fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use truckspy_atoms::media::ImageDocument;
    use truckspy_atoms::memory::{MemoryBlobStore, MemoryStore};
    use truckspy_shared::Config;

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "CORS_ORIGIN" => Some("https://labels.example.com".to_string()),
            _ => None,
        })
    }

    async fn state_with(images: Vec<ImageDocument>) -> Arc<AppState> {
        let store = MemoryStore::new();
        for image in images {
            store.insert_image(image).await;
        }
        AppState::new(Arc::new(store), Arc::new(MemoryBlobStore::new()), config())
    }

    fn request(method: &str, uri: &str, body: Body) -> Request {
        lambda_http::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(body)
            .unwrap()
    }

    fn json_body(resp: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    #[tokio::test]
    async fn assign_label_and_export_round() {
        let state = state_with(vec![ImageDocument::ingested("b1", "img1", "img1.png")]).await;

        let resp = function_handler(request("GET", "/api/images/", Body::Empty), state.clone())
            .await
            .unwrap();
        let picked = json_body(&resp);
        assert_eq!(picked["bucket"], "b1");
        assert_eq!(picked["id"], "img1");
        assert_eq!(picked["seen"], true);
        assert!(picked["lastSeen"].is_string());

        let submission = r#"[{"groupId": "num-waiting", "value": 7}]"#;
        let resp = function_handler(
            request("PUT", "/api/images/b1/img1", Body::from(submission)),
            state.clone(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(&resp), serde_json::json!({}));

        let resp = function_handler(request("GET", "/api/images/b1/img1", Body::Empty), state.clone())
            .await
            .unwrap();
        let doc = json_body(&resp);
        assert_eq!(doc["valid"], true);
        assert_eq!(doc["lastSeen"], serde_json::Value::Null);
        assert_eq!(
            doc["labels"],
            serde_json::json!([{"group": "num-waiting", "values": 7}])
        );

        let export = request("GET", "/api/classified?label=num-waiting", Body::Empty)
            .with_query_string_parameters(HashMap::from([(
                "label".to_string(),
                "num-waiting".to_string(),
            )]));
        let resp = function_handler(export, state.clone()).await.unwrap();
        assert_eq!(
            std::str::from_utf8(resp.body()).unwrap(),
            "\"gs://b1/img1.png\",\"https://food-truck-spy.appspot.com/api/snapshots/b1/img1\",7\r\n"
        );
    }

    #[tokio::test]
    async fn unknown_image_reads_as_empty_object() {
        let state = state_with(vec![]).await;

        let resp = function_handler(request("GET", "/api/images/b1/nope", Body::Empty), state)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(&resp), serde_json::json!({}));
    }

    #[tokio::test]
    async fn responses_carry_configured_cors_origin() {
        let state = state_with(vec![]).await;

        let resp = function_handler(request("GET", "/api/labels", Body::Empty), state.clone())
            .await
            .unwrap();
        assert_eq!(
            resp.headers()["Access-Control-Allow-Origin"],
            "https://labels.example.com"
        );
        assert_eq!(json_body(&resp), serde_json::json!([]));

        let preflight = function_handler(request("OPTIONS", "/api/images/b1/img1", Body::Empty), state)
            .await
            .unwrap();
        assert_eq!(preflight.status(), StatusCode::OK);
        assert_eq!(preflight.headers()["Access-Control-Allow-Methods"], "GET,PUT,OPTIONS");
    }

    #[tokio::test]
    async fn unmatched_route_is_not_found() {
        let state = state_with(vec![]).await;

        let resp = function_handler(request("DELETE", "/api/images/b1/img1", Body::Empty), state)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.headers().contains_key("Access-Control-Allow-Origin"));
    }
}
