//! Applies an annotator's label submission to an image document.
//!
//! The merged label set, the validity flag and the claim resolution are
//! committed in a single conditional write keyed on the document revision,
//! so a submission lands whole or not at all.

use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;
use std::collections::hash_map::{Entry, HashMap};
use truckspy_atoms::groups::LabelGroup;
use truckspy_atoms::media::{ImageRef, LabelCommit, LabelSet, LabelValue};
use truckspy_atoms::{LabelStore, StoreError, StoreResult};

use crate::responses;

const MAX_COMMIT_ATTEMPTS: usize = 3;

/// One `{groupId, value}` element of a PUT body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSubmission {
    pub group_id: String,
    pub value: LabelValue,
}

impl LabelSubmission {
    pub fn new(group_id: impl Into<String>, value: LabelValue) -> Self {
        Self {
            group_id: group_id.into(),
            value,
        }
    }
}

/// Replaces the entry of every submitted group; other groups are untouched.
/// A group submitted twice keeps its last value.
pub fn merge_submission(current: &LabelSet, submitted: &[LabelSubmission]) -> LabelSet {
    let mut merged = current.clone();
    for submission in submitted {
        merged.set(submission.group_id.clone(), submission.value.clone());
    }
    merged
}

/// Rejects values whose shape contradicts a known group's declared type.
/// Groups without a definition are accepted as-is. Each distinct group is
/// looked up once.
async fn validate_submission(
    store: &dyn LabelStore,
    submitted: &[LabelSubmission],
) -> StoreResult<()> {
    let mut groups: HashMap<&str, Option<LabelGroup>> = HashMap::new();

    for submission in submitted {
        let group = match groups.entry(submission.group_id.as_str()) {
            Entry::Occupied(known) => known.into_mut(),
            Entry::Vacant(slot) => {
                let group = store.get_label_group(&submission.group_id).await?;
                slot.insert(group)
            }
        };

        if let Some(group) = group {
            if !group.group_type.accepts(&submission.value) {
                return Err(StoreError::InvalidLabel(format!(
                    "group {} expects a {} value",
                    group.id,
                    group.group_type.as_str()
                )));
            }
        }
    }

    Ok(())
}

/// Records `submitted` on the image and resolves its claim.
///
/// An empty submission marks the image as not labelable (`valid = false`)
/// and leaves existing labels in place. A missing document is `NotFound`.
pub async fn apply_labels(
    store: &dyn LabelStore,
    image: &ImageRef,
    submitted: &[LabelSubmission],
) -> StoreResult<()> {
    validate_submission(store, submitted).await?;

    for attempt in 1..=MAX_COMMIT_ATTEMPTS {
        let current = store
            .get_image(image)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("Image {}", image)))?;

        let commit = LabelCommit {
            expected_revision: current.revision,
            labels: merge_submission(&current.labels, submitted),
            valid: !submitted.is_empty(),
        };

        match store.commit_labels(image, &commit).await {
            Ok(()) => {
                tracing::info!(
                    "Labeled image {}: groups={}, valid={}",
                    image,
                    submitted.len(),
                    commit.valid
                );
                return Ok(());
            }
            Err(StoreError::Conflict { .. }) => {
                tracing::warn!(
                    "Label commit on {} raced a concurrent write (attempt {}/{})",
                    image,
                    attempt,
                    MAX_COMMIT_ATTEMPTS
                );
            }
            Err(e) => return Err(e),
        }
    }

    Err(StoreError::conflict(format!("Image {}", image)))
}

/// PUT /api/images/{bucket}/{image} - body: [{groupId, value}]
pub async fn put_labels_handler(
    store: &dyn LabelStore,
    bucket: &str,
    image_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    tracing::info!(
        "📥 put_labels_handler: bucket={}, image={}, raw_body={}",
        bucket,
        image_id,
        String::from_utf8_lossy(body),
    );

    let submitted: Vec<LabelSubmission> = match serde_json::from_slice(body) {
        Ok(submitted) => submitted,
        Err(e) => {
            tracing::warn!("Malformed label submission for {}/{}: {}", bucket, image_id, e);
            return responses::error(StatusCode::BAD_REQUEST, &format!("Malformed payload: {}", e));
        }
    };

    match apply_labels(store, &ImageRef::new(bucket, image_id), &submitted).await {
        Ok(()) => responses::empty_object(),
        Err(e) => {
            tracing::error!(
                "❌ put_labels_handler failed: bucket={}, image={}, error={}",
                bucket,
                image_id,
                e
            );
            responses::store_error(&e)
        }
    }
}
