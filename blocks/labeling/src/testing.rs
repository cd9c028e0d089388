//! `MemoryStore` wrapper that injects vanishing claims and conflicting
//! commits, and counts the calls the workflows make.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use truckspy_atoms::groups::LabelGroup;
use truckspy_atoms::media::{ImageDocument, ImageRef, LabelCommit};
use truckspy_atoms::memory::MemoryStore;
use truckspy_atoms::views::LastView;
use truckspy_atoms::{LabelStore, StoreError, StoreResult};

pub(crate) struct FaultyStore {
    pub(crate) inner: MemoryStore,
    vanishing_claims: AtomicUsize,
    conflicting_commits: AtomicUsize,
    claim_calls: AtomicUsize,
    commit_calls: AtomicUsize,
    group_lookups: AtomicUsize,
}

impl FaultyStore {
    pub(crate) fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            vanishing_claims: AtomicUsize::new(0),
            conflicting_commits: AtomicUsize::new(0),
            claim_calls: AtomicUsize::new(0),
            commit_calls: AtomicUsize::new(0),
            group_lookups: AtomicUsize::new(0),
        }
    }

    /// The next `count` claims delete their target first, then fail as `NotFound`.
    pub(crate) fn vanish_on_claim(self, count: usize) -> Self {
        self.vanishing_claims.store(count, Ordering::SeqCst);
        self
    }

    /// The next `count` commits fail as `Conflict` without writing.
    pub(crate) fn conflict_on_commit(self, count: usize) -> Self {
        self.conflicting_commits.store(count, Ordering::SeqCst);
        self
    }

    pub(crate) fn claim_calls(&self) -> usize {
        self.claim_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn commit_calls(&self) -> usize {
        self.commit_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn group_lookups(&self) -> usize {
        self.group_lookups.load(Ordering::SeqCst)
    }
}

fn take_one(remaining: &AtomicUsize) -> bool {
    remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl LabelStore for FaultyStore {
    async fn find_unseen_image(&self) -> StoreResult<Option<ImageRef>> {
        self.inner.find_unseen_image().await
    }

    async fn find_stale_claim(&self, cutoff: DateTime<Utc>) -> StoreResult<Option<ImageRef>> {
        self.inner.find_stale_claim(cutoff).await
    }

    async fn claim_image(&self, image: &ImageRef, at: DateTime<Utc>) -> StoreResult<()> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.vanishing_claims) {
            self.inner.delete_image(image).await?;
            return Err(StoreError::not_found(format!("Image {}", image)));
        }
        self.inner.claim_image(image, at).await
    }

    async fn get_image(&self, image: &ImageRef) -> StoreResult<Option<ImageDocument>> {
        self.inner.get_image(image).await
    }

    async fn commit_labels(&self, image: &ImageRef, commit: &LabelCommit) -> StoreResult<()> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.conflicting_commits) {
            return Err(StoreError::conflict(format!("Image {}", image)));
        }
        self.inner.commit_labels(image, commit).await
    }

    async fn list_classified(&self, group_id: &str) -> StoreResult<Vec<ImageDocument>> {
        self.inner.list_classified(group_id).await
    }

    async fn list_invalid_seen(&self, limit: usize) -> StoreResult<Vec<ImageDocument>> {
        self.inner.list_invalid_seen(limit).await
    }

    async fn delete_image(&self, image: &ImageRef) -> StoreResult<()> {
        self.inner.delete_image(image).await
    }

    async fn list_label_groups(&self) -> StoreResult<Vec<LabelGroup>> {
        self.inner.list_label_groups().await
    }

    async fn get_label_group(&self, group_id: &str) -> StoreResult<Option<LabelGroup>> {
        self.group_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_label_group(group_id).await
    }

    async fn get_last_view(&self, view_id: &str) -> StoreResult<Option<LastView>> {
        self.inner.get_last_view(view_id).await
    }

    async fn list_views(&self) -> StoreResult<Vec<LastView>> {
        self.inner.list_views().await
    }
}
