use truckspy_atoms::media::ImageRef;
use truckspy_atoms::{BlobStore, LabelStore, StoreResult};

/// Removes up to `limit` images with `valid == false && seen == true`.
///
/// That covers images submitted as not labelable, and also claims that
/// are still open or were abandoned (`last_seen` set), since a claim marks
/// the image seen before any label arrives.
///
/// The blob is deleted before its document; a run that fails in between
/// leaves the document for the next sweep.
pub async fn sweep_invalid(
    store: &dyn LabelStore,
    blobs: &dyn BlobStore,
    limit: usize,
) -> StoreResult<Vec<ImageRef>> {
    let candidates = store.list_invalid_seen(limit).await?;
    let mut removed = Vec::with_capacity(candidates.len());

    for image in candidates {
        let image_ref = image.image_ref();
        blobs.delete_blob(&image.bucket, &image.blob_key()).await?;
        store.delete_image(&image_ref).await?;
        tracing::info!("🧹 Removed unlabelable image {}", image_ref);
        removed.push(image_ref);
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use truckspy_atoms::media::ImageDocument;
    use truckspy_atoms::memory::{MemoryBlobStore, MemoryStore};

    fn doc(id: &str, valid: bool, seen: bool) -> ImageDocument {
        let mut doc = ImageDocument::ingested("b1", id, format!("{}.png", id));
        doc.valid = valid;
        doc.seen = seen;
        doc
    }

    #[tokio::test]
    async fn removes_only_invalid_seen_images_and_their_blobs() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        for (id, valid, seen) in [
            ("rejected", false, true),
            ("pending", false, false),
            ("labeled", true, true),
        ] {
            store.insert_image(doc(id, valid, seen)).await;
            blobs.put_blob("b1", &format!("{}.png", id), b"png".to_vec(), None).await;
        }

        let removed = sweep_invalid(&store, &blobs, 10).await.unwrap();

        assert_eq!(removed, vec![ImageRef::new("b1", "rejected")]);
        assert_eq!(store.image_count().await, 2);
        assert!(!blobs.contains("b1", "rejected.png").await);
        assert!(blobs.contains("b1", "pending.png").await);
        assert!(blobs.contains("b1", "labeled.png").await);
    }

    #[tokio::test]
    async fn honours_limit_and_tolerates_missing_blob() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        store.insert_image(doc("a", false, true)).await;
        store.insert_image(doc("b", false, true)).await;

        let removed = sweep_invalid(&store, &blobs, 1).await.unwrap();

        assert_eq!(removed.len(), 1);
        assert_eq!(store.image_count().await, 1);
    }

    #[tokio::test]
    async fn open_claims_are_swept_too() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let mut claimed = doc("claimed", false, true);
        claimed.last_seen = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        store.insert_image(claimed).await;

        let removed = sweep_invalid(&store, &blobs, 10).await.unwrap();

        assert_eq!(removed, vec![ImageRef::new("b1", "claimed")]);
        assert_eq!(store.image_count().await, 0);
    }
}
