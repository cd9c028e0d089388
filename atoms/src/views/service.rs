use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::LastView;
use crate::error::{backend, StoreResult};

const VIEW_PK: &str = "VIEW";
const VIEW_PREFIX: &str = "VIEW#";

fn view_from_item(item: &HashMap<String, AttributeValue>) -> Option<LastView> {
    let id = item
        .get("SK")
        .and_then(|v| v.as_s().ok())
        .and_then(|sk| sk.strip_prefix(VIEW_PREFIX))?;

    let text = |field: &str| {
        item.get(field)
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default()
    };

    Some(LastView {
        id: id.to_string(),
        filename: text("filename"),
        display_name: text("display_name"),
        time_updated: text("time_updated"),
    })
}

pub async fn get_last_view(
    client: &DynamoClient,
    table_name: &str,
    view_id: &str,
) -> StoreResult<Option<LastView>> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(VIEW_PK.to_string()))
        .key("SK", AttributeValue::S(format!("{}{}", VIEW_PREFIX, view_id)))
        .send()
        .await
        .map_err(|e| backend("DynamoDB get_item", e))?;

    Ok(result.item().and_then(view_from_item))
}

/// All last-view pointers, ordered by view id.
pub async fn list_views(client: &DynamoClient, table_name: &str) -> StoreResult<Vec<LastView>> {
    let mut views = Vec::new();
    let mut start_key = None;

    loop {
        let result = client
            .query()
            .table_name(table_name)
            .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
            .expression_attribute_values(":pk", AttributeValue::S(VIEW_PK.to_string()))
            .expression_attribute_values(":sk_prefix", AttributeValue::S(VIEW_PREFIX.to_string()))
            .set_exclusive_start_key(start_key.take())
            .send()
            .await
            .map_err(|e| backend("DynamoDB query", e))?;

        views.extend(result.items().iter().filter_map(view_from_item));

        match result.last_evaluated_key() {
            Some(key) => start_key = Some(key.clone()),
            None => break,
        }
    }

    views.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(views)
}
