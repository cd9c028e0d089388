//! Scheduled sweep of seen images that are not valid: rejected
//! submissions plus any claim still awaiting labels.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use truckspy_shared::AppState;

#[derive(Debug, Default, Deserialize)]
struct SweepRequest {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SweepResponse {
    removed: Vec<String>,
}

/// Scheduler payloads carry no `limit`; anything unparseable falls back to
/// the configured limit.
fn requested_limit(payload: &Value, default: usize) -> usize {
    serde_json::from_value::<SweepRequest>(payload.clone())
        .ok()
        .and_then(|req| req.limit)
        .unwrap_or(default)
}

async fn function_handler(
    event: LambdaEvent<Value>,
    state: Arc<AppState>,
) -> Result<SweepResponse, Error> {
    let limit = requested_limit(&event.payload, state.config.sweep_limit);
    tracing::info!("🧹 Cleanup sweep started, limit={}", limit);

    let removed = labeling_block::cleanup::sweep_invalid(
        state.store.as_ref(),
        state.blobs.as_ref(),
        limit,
    )
    .await?;

    tracing::info!("🧹 Cleanup sweep removed {} image(s)", removed.len());
    Ok(SweepResponse {
        removed: removed.iter().map(|image| image.to_string()).collect(),
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .init();

    let state = AppState::from_env().await;

    run(service_fn(move |event: LambdaEvent<Value>| {
        let state = state.clone();
        async move { function_handler(event, state).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use truckspy_atoms::media::ImageDocument;
    use truckspy_atoms::memory::{MemoryBlobStore, MemoryStore};
    use truckspy_shared::Config;

    #[test]
    fn limit_comes_from_payload_or_config() {
        assert_eq!(requested_limit(&json!({"limit": 25}), 1), 25);
        assert_eq!(requested_limit(&json!({"source": "aws.events"}), 3), 3);
        assert_eq!(requested_limit(&json!("tick"), 2), 2);
    }

    #[tokio::test]
    async fn sweep_reports_removed_images() {
        let store = MemoryStore::new();
        let mut rejected = ImageDocument::ingested("b1", "img1", "img1.png");
        rejected.seen = true;
        store.insert_image(rejected).await;
        let state = AppState::new(
            Arc::new(store),
            Arc::new(MemoryBlobStore::new()),
            Config::from_lookup(|_| None),
        );

        let event = LambdaEvent::new(json!({}), lambda_runtime::Context::default());
        let response = function_handler(event, state).await.unwrap();
        assert_eq!(response.removed, vec!["b1/img1".to_string()]);
    }
}
