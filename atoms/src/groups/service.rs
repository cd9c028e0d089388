use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{GroupType, LabelGroup};
use crate::error::{backend, StoreResult};

const GROUP_PK: &str = "LABEL_GROUP";
const GROUP_PREFIX: &str = "GROUP#";

fn group_from_item(item: &HashMap<String, AttributeValue>) -> Option<LabelGroup> {
    let id = item
        .get("SK")
        .and_then(|v| v.as_s().ok())
        .and_then(|sk| sk.strip_prefix(GROUP_PREFIX))?;

    let raw_type = item
        .get("group_type")
        .and_then(|v| v.as_s().ok())
        .map(|s| s.as_str())
        .unwrap_or_default();
    let Some(group_type) = GroupType::parse(raw_type) else {
        tracing::warn!("Label group {} has unknown group_type {:?}", id, raw_type);
        return None;
    };

    Some(LabelGroup {
        id: id.to_string(),
        group_type,
        display: item
            .get("display")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| id.to_string()),
        options: item
            .get("options")
            .and_then(|v| v.as_l().ok())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_s().ok())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default(),
    })
}

/// All label-group definitions, ordered by id.
pub async fn list_label_groups(
    client: &DynamoClient,
    table_name: &str,
) -> StoreResult<Vec<LabelGroup>> {
    let mut groups = Vec::new();
    let mut start_key = None;

    loop {
        let result = client
            .query()
            .table_name(table_name)
            .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
            .expression_attribute_values(":pk", AttributeValue::S(GROUP_PK.to_string()))
            .expression_attribute_values(":sk_prefix", AttributeValue::S(GROUP_PREFIX.to_string()))
            .set_exclusive_start_key(start_key.take())
            .send()
            .await
            .map_err(|e| backend("DynamoDB query", e))?;

        groups.extend(result.items().iter().filter_map(group_from_item));

        match result.last_evaluated_key() {
            Some(key) => start_key = Some(key.clone()),
            None => break,
        }
    }

    groups.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(groups)
}

pub async fn get_label_group(
    client: &DynamoClient,
    table_name: &str,
    group_id: &str,
) -> StoreResult<Option<LabelGroup>> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(GROUP_PK.to_string()))
        .key("SK", AttributeValue::S(format!("{}{}", GROUP_PREFIX, group_id)))
        .send()
        .await
        .map_err(|e| backend("DynamoDB get_item", e))?;

    Ok(result.item().and_then(group_from_item))
}
