//! In-process stores with the same filter semantics as the DynamoDB and S3
//! implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::groups::LabelGroup;
use crate::media::{Blob, ImageDocument, ImageRef, LabelCommit};
use crate::store::{BlobStore, LabelStore};
use crate::views::LastView;

#[derive(Default)]
struct Tables {
    images: BTreeMap<ImageRef, ImageDocument>,
    groups: BTreeMap<String, LabelGroup>,
    views: BTreeMap<String, LastView>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_image(&self, image: ImageDocument) {
        let mut tables = self.tables.write().await;
        tables.images.insert(image.image_ref(), image);
    }

    pub async fn insert_label_group(&self, group: LabelGroup) {
        let mut tables = self.tables.write().await;
        tables.groups.insert(group.id.clone(), group);
    }

    pub async fn insert_view(&self, view: LastView) {
        let mut tables = self.tables.write().await;
        tables.views.insert(view.id.clone(), view);
    }

    pub async fn image_count(&self) -> usize {
        self.tables.read().await.images.len()
    }
}

#[async_trait]
impl LabelStore for MemoryStore {
    async fn find_unseen_image(&self) -> StoreResult<Option<ImageRef>> {
        let tables = self.tables.read().await;
        Ok(tables
            .images
            .values()
            .find(|image| !image.seen)
            .map(ImageDocument::image_ref))
    }

    async fn find_stale_claim(&self, cutoff: DateTime<Utc>) -> StoreResult<Option<ImageRef>> {
        let tables = self.tables.read().await;
        Ok(tables
            .images
            .values()
            .find(|image| image.claim_expired(cutoff))
            .map(ImageDocument::image_ref))
    }

    async fn claim_image(&self, image: &ImageRef, at: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let doc = tables
            .images
            .get_mut(image)
            .ok_or_else(|| StoreError::not_found(format!("Image {}", image)))?;

        doc.seen = true;
        doc.last_seen = Some(at);
        Ok(())
    }

    async fn get_image(&self, image: &ImageRef) -> StoreResult<Option<ImageDocument>> {
        Ok(self.tables.read().await.images.get(image).cloned())
    }

    async fn commit_labels(&self, image: &ImageRef, commit: &LabelCommit) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let doc = match tables.images.get_mut(image) {
            Some(doc) if doc.revision == commit.expected_revision => doc,
            _ => return Err(StoreError::conflict(format!("Image {}", image))),
        };

        doc.labels = commit.labels.clone();
        doc.valid = commit.valid;
        doc.seen = true;
        doc.last_seen = None;
        doc.revision += 1;
        Ok(())
    }

    async fn list_classified(&self, group_id: &str) -> StoreResult<Vec<ImageDocument>> {
        let tables = self.tables.read().await;
        Ok(tables
            .images
            .values()
            .filter(|image| image.valid && image.seen && image.labels.contains(group_id))
            .cloned()
            .collect())
    }

    async fn list_invalid_seen(&self, limit: usize) -> StoreResult<Vec<ImageDocument>> {
        let tables = self.tables.read().await;
        Ok(tables
            .images
            .values()
            .filter(|image| !image.valid && image.seen)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete_image(&self, image: &ImageRef) -> StoreResult<()> {
        self.tables.write().await.images.remove(image);
        Ok(())
    }

    async fn list_label_groups(&self) -> StoreResult<Vec<LabelGroup>> {
        Ok(self.tables.read().await.groups.values().cloned().collect())
    }

    async fn get_label_group(&self, group_id: &str) -> StoreResult<Option<LabelGroup>> {
        Ok(self.tables.read().await.groups.get(group_id).cloned())
    }

    async fn get_last_view(&self, view_id: &str) -> StoreResult<Option<LastView>> {
        Ok(self.tables.read().await.views.get(view_id).cloned())
    }

    async fn list_views(&self) -> StoreResult<Vec<LastView>> {
        Ok(self.tables.read().await.views.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<(String, String), Blob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_blob(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Vec<u8>>,
        content_type: Option<&str>,
    ) {
        let blob = Blob {
            data: data.into(),
            content_type: content_type.map(|s| s.to_string()),
        };
        self.blobs
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), blob);
    }

    pub async fn contains(&self, bucket: &str, key: &str) -> bool {
        self.blobs
            .read()
            .await
            .contains_key(&(bucket.to_string(), key.to_string()))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get_blob(&self, bucket: &str, key: &str) -> StoreResult<Option<Blob>> {
        Ok(self
            .blobs
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }

    async fn delete_blob(&self, bucket: &str, key: &str) -> StoreResult<()> {
        self.blobs
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{LabelSet, LabelValue};
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[tokio::test]
    async fn stale_claim_respects_cutoff() {
        let store = MemoryStore::new();
        let mut fresh = ImageDocument::ingested("b1", "fresh", "fresh.png");
        fresh.seen = true;
        fresh.last_seen = Some(at(50));
        let mut resolved = ImageDocument::ingested("b1", "resolved", "resolved.png");
        resolved.seen = true;
        store.insert_image(fresh).await;
        store.insert_image(resolved).await;

        assert_eq!(store.find_stale_claim(at(50)).await.unwrap(), None);
        assert_eq!(
            store.find_stale_claim(at(51)).await.unwrap(),
            Some(ImageRef::new("b1", "fresh"))
        );
    }

    #[tokio::test]
    async fn commit_requires_matching_revision() {
        let store = MemoryStore::new();
        let image = ImageDocument::ingested("b1", "img1", "img1.png");
        let image_ref = image.image_ref();
        store.insert_image(image).await;

        let mut labels = LabelSet::new();
        labels.set("color", LabelValue::Single("red".to_string()));
        let commit = LabelCommit {
            expected_revision: 0,
            labels,
            valid: true,
        };

        store.commit_labels(&image_ref, &commit).await.unwrap();
        let stale = store.commit_labels(&image_ref, &commit).await;
        assert!(matches!(stale, Err(StoreError::Conflict { .. })));

        let stored = store.get_image(&image_ref).await.unwrap().unwrap();
        assert_eq!(stored.revision, 1);
        assert!(stored.valid && stored.seen);
    }

    #[tokio::test]
    async fn claim_of_missing_image_is_not_found() {
        let store = MemoryStore::new();
        let result = store.claim_image(&ImageRef::new("b1", "ghost"), at(0)).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn blob_delete_is_idempotent() {
        let blobs = MemoryBlobStore::new();
        blobs.put_blob("b1", "img1.png", b"png".to_vec(), Some("image/png")).await;

        blobs.delete_blob("b1", "img1.png").await.unwrap();
        blobs.delete_blob("b1", "img1.png").await.unwrap();
        assert!(!blobs.contains("b1", "img1.png").await);
    }
}
