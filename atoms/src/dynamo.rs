use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::groups::{self, LabelGroup};
use crate::media::{self, ImageDocument, ImageRef, LabelCommit};
use crate::store::LabelStore;
use crate::views::{self, LastView};

/// Single-table DynamoDB document store.
#[derive(Clone)]
pub struct DynamoStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl LabelStore for DynamoStore {
    async fn find_unseen_image(&self) -> StoreResult<Option<ImageRef>> {
        media::service::find_unseen_image(&self.client, &self.table_name).await
    }

    async fn find_stale_claim(&self, cutoff: DateTime<Utc>) -> StoreResult<Option<ImageRef>> {
        media::service::find_stale_claim(&self.client, &self.table_name, cutoff).await
    }

    async fn claim_image(&self, image: &ImageRef, at: DateTime<Utc>) -> StoreResult<()> {
        media::service::claim_image(&self.client, &self.table_name, image, at).await
    }

    async fn get_image(&self, image: &ImageRef) -> StoreResult<Option<ImageDocument>> {
        media::service::get_image(&self.client, &self.table_name, image).await
    }

    async fn commit_labels(&self, image: &ImageRef, commit: &LabelCommit) -> StoreResult<()> {
        media::service::commit_labels(&self.client, &self.table_name, image, commit).await
    }

    async fn list_classified(&self, group_id: &str) -> StoreResult<Vec<ImageDocument>> {
        media::service::list_classified(&self.client, &self.table_name, group_id).await
    }

    async fn list_invalid_seen(&self, limit: usize) -> StoreResult<Vec<ImageDocument>> {
        media::service::list_invalid_seen(&self.client, &self.table_name, limit).await
    }

    async fn delete_image(&self, image: &ImageRef) -> StoreResult<()> {
        media::service::delete_image(&self.client, &self.table_name, image).await
    }

    async fn list_label_groups(&self) -> StoreResult<Vec<LabelGroup>> {
        groups::service::list_label_groups(&self.client, &self.table_name).await
    }

    async fn get_label_group(&self, group_id: &str) -> StoreResult<Option<LabelGroup>> {
        groups::service::get_label_group(&self.client, &self.table_name, group_id).await
    }

    async fn get_last_view(&self, view_id: &str) -> StoreResult<Option<LastView>> {
        views::service::get_last_view(&self.client, &self.table_name, view_id).await
    }

    async fn list_views(&self) -> StoreResult<Vec<LastView>> {
        views::service::list_views(&self.client, &self.table_name).await
    }
}
