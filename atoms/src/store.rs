//! Seams over the document store and the object store.
//!
//! The labeling workflow only talks to these traits; production wires in
//! [`crate::dynamo::DynamoStore`] and [`crate::s3::S3BlobStore`], tests and
//! local runs use [`crate::memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::groups::LabelGroup;
use crate::media::{Blob, ImageDocument, ImageRef, LabelCommit};
use crate::views::LastView;

#[async_trait]
pub trait LabelStore: Send + Sync {
    /// Any image with `seen == false`.
    async fn find_unseen_image(&self) -> StoreResult<Option<ImageRef>>;

    /// Any image whose `last_seen` is set and older than `cutoff`.
    async fn find_stale_claim(&self, cutoff: DateTime<Utc>) -> StoreResult<Option<ImageRef>>;

    /// Sets `seen = true` and `last_seen = at`. `NotFound` if the image is gone.
    async fn claim_image(&self, image: &ImageRef, at: DateTime<Utc>) -> StoreResult<()>;

    async fn get_image(&self, image: &ImageRef) -> StoreResult<Option<ImageDocument>>;

    /// Replaces labels and validity, sets `seen = true`, clears `last_seen`,
    /// and bumps the revision, only if the stored revision still equals
    /// `commit.expected_revision`. Otherwise `Conflict`.
    async fn commit_labels(&self, image: &ImageRef, commit: &LabelCommit) -> StoreResult<()>;

    /// `valid && seen` images that carry a label for `group_id`.
    async fn list_classified(&self, group_id: &str) -> StoreResult<Vec<ImageDocument>>;

    /// Up to `limit` images with `valid == false && seen == true`.
    async fn list_invalid_seen(&self, limit: usize) -> StoreResult<Vec<ImageDocument>>;

    async fn delete_image(&self, image: &ImageRef) -> StoreResult<()>;

    async fn list_label_groups(&self) -> StoreResult<Vec<LabelGroup>>;

    async fn get_label_group(&self, group_id: &str) -> StoreResult<Option<LabelGroup>>;

    async fn get_last_view(&self, view_id: &str) -> StoreResult<Option<LastView>>;

    async fn list_views(&self) -> StoreResult<Vec<LastView>>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// `None` when the blob does not exist.
    async fn get_blob(&self, bucket: &str, key: &str) -> StoreResult<Option<Blob>>;

    /// Deleting a missing blob is not an error.
    async fn delete_blob(&self, bucket: &str, key: &str) -> StoreResult<()>;
}
