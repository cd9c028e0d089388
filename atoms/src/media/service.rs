use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::model::{
    format_timestamp, parse_timestamp, ImageDocument, ImageRef, LabelCommit, LabelSet, LabelValue,
};
use crate::error::{backend, StoreError, StoreResult};

type Item = HashMap<String, AttributeValue>;

const IMAGE_PREFIX: &str = "IMAGE#";

/// PK = "BUCKET#{bucket}", SK = "IMAGE#{image_id}"
fn image_key(image: &ImageRef) -> (String, String) {
    (
        format!("BUCKET#{}", image.bucket),
        format!("{}{}", IMAGE_PREFIX, image.image_id),
    )
}

pub(crate) fn label_value_to_attribute(value: &LabelValue) -> AttributeValue {
    match value {
        LabelValue::Number(n) => AttributeValue::N(n.to_string()),
        LabelValue::Single(s) => AttributeValue::S(s.clone()),
        LabelValue::Multiple(values) => {
            AttributeValue::L(values.iter().cloned().map(AttributeValue::S).collect())
        }
    }
}

pub(crate) fn label_value_from_attribute(attr: &AttributeValue) -> Option<LabelValue> {
    match attr {
        AttributeValue::N(n) => serde_json::from_str(n).ok().map(LabelValue::Number),
        AttributeValue::S(s) => Some(LabelValue::Single(s.clone())),
        AttributeValue::L(values) => Some(LabelValue::Multiple(
            values
                .iter()
                .filter_map(|v| v.as_s().ok())
                .cloned()
                .collect(),
        )),
        _ => None,
    }
}

fn labels_to_attribute(labels: &LabelSet) -> AttributeValue {
    AttributeValue::M(
        labels
            .iter()
            .map(|(group, value)| (group.clone(), label_value_to_attribute(value)))
            .collect(),
    )
}

fn labels_from_item(item: &Item) -> LabelSet {
    let Some(map) = item.get("labels").and_then(|v| v.as_m().ok()) else {
        return LabelSet::new();
    };

    map.iter()
        .filter_map(|(group, attr)| match label_value_from_attribute(attr) {
            Some(value) => Some((group.clone(), value)),
            None => {
                tracing::warn!("Skipping label {} with unsupported value {:?}", group, attr);
                None
            }
        })
        .collect()
}

/// Builds an image document from a raw item; `None` if the keys are missing.
pub(crate) fn image_from_item(item: &Item) -> Option<ImageDocument> {
    let image_id = item
        .get("SK")
        .and_then(|v| v.as_s().ok())
        .and_then(|sk| sk.strip_prefix(IMAGE_PREFIX))?
        .to_string();
    let bucket = item
        .get("bucket")
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .or_else(|| {
            item.get("PK")
                .and_then(|v| v.as_s().ok())
                .and_then(|pk| pk.strip_prefix("BUCKET#"))
                .map(|s| s.to_string())
        })?;

    Some(ImageDocument {
        bucket,
        image_id,
        filename: item
            .get("filename")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        valid: item
            .get("valid")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
        seen: item
            .get("seen")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
        last_seen: item
            .get("last_seen")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| parse_timestamp(s)),
        labels: labels_from_item(item),
        revision: item
            .get("revision")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0),
    })
}

/// Scans image items matching `filter`, following pagination.
///
/// DynamoDB applies `Limit` before the filter, so the scan keeps paging
/// until `limit` matches are collected or the table is exhausted.
async fn scan_images(
    client: &DynamoClient,
    table_name: &str,
    filter: &str,
    names: &[(&str, &str)],
    mut values: HashMap<String, AttributeValue>,
    limit: Option<usize>,
) -> StoreResult<Vec<ImageDocument>> {
    values.insert(
        ":image_prefix".to_string(),
        AttributeValue::S(IMAGE_PREFIX.to_string()),
    );
    let filter = format!("begins_with(SK, :image_prefix) AND ({})", filter);

    let mut images = Vec::new();
    let mut start_key: Option<Item> = None;

    loop {
        let mut builder = client
            .scan()
            .table_name(table_name)
            .filter_expression(filter.clone())
            .set_expression_attribute_values(Some(values.clone()))
            .set_exclusive_start_key(start_key.take());

        for (k, v) in names {
            builder = builder.expression_attribute_names(*k, *v);
        }

        let result = builder
            .send()
            .await
            .map_err(|e| backend("DynamoDB scan", e))?;

        for item in result.items() {
            match image_from_item(item) {
                Some(image) => images.push(image),
                None => tracing::warn!("Skipping malformed image item in {}", table_name),
            }
            if limit.is_some_and(|limit| images.len() >= limit) {
                return Ok(images);
            }
        }

        match result.last_evaluated_key() {
            Some(key) => start_key = Some(key.clone()),
            None => return Ok(images),
        }
    }
}

/// First image never claimed.
pub async fn find_unseen_image(
    client: &DynamoClient,
    table_name: &str,
) -> StoreResult<Option<ImageRef>> {
    let values = HashMap::from([(":unseen".to_string(), AttributeValue::Bool(false))]);
    let images = scan_images(
        client,
        table_name,
        "#seen = :unseen",
        &[("#seen", "seen")],
        values,
        Some(1),
    )
    .await?;

    Ok(images.first().map(ImageDocument::image_ref))
}

/// First image whose claim is older than `cutoff` and still unresolved.
pub async fn find_stale_claim(
    client: &DynamoClient,
    table_name: &str,
    cutoff: DateTime<Utc>,
) -> StoreResult<Option<ImageRef>> {
    let values = HashMap::from([
        (":string".to_string(), AttributeValue::S("S".to_string())),
        (
            ":cutoff".to_string(),
            AttributeValue::S(format_timestamp(cutoff)),
        ),
    ]);
    let images = scan_images(
        client,
        table_name,
        "attribute_type(#last_seen, :string) AND #last_seen < :cutoff",
        &[("#last_seen", "last_seen")],
        values,
        Some(1),
    )
    .await?;

    Ok(images.first().map(ImageDocument::image_ref))
}

/// Marks an image as claimed at `at`.
pub async fn claim_image(
    client: &DynamoClient,
    table_name: &str,
    image: &ImageRef,
    at: DateTime<Utc>,
) -> StoreResult<()> {
    let (pk, sk) = image_key(image);

    let result = client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk))
        .key("SK", AttributeValue::S(sk))
        .update_expression("SET #seen = :seen, #last_seen = :now")
        .condition_expression("attribute_exists(PK)")
        .expression_attribute_names("#seen", "seen")
        .expression_attribute_names("#last_seen", "last_seen")
        .expression_attribute_values(":seen", AttributeValue::Bool(true))
        .expression_attribute_values(":now", AttributeValue::S(format_timestamp(at)))
        .send()
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(e)
            if e.as_service_error()
                .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
        {
            Err(StoreError::not_found(format!("Image {}", image)))
        }
        Err(e) => Err(backend("DynamoDB update_item", e)),
    }
}

pub async fn get_image(
    client: &DynamoClient,
    table_name: &str,
    image: &ImageRef,
) -> StoreResult<Option<ImageDocument>> {
    let (pk, sk) = image_key(image);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk))
        .key("SK", AttributeValue::S(sk))
        .consistent_read(true)
        .send()
        .await
        .map_err(|e| backend("DynamoDB get_item", e))?;

    match result.item() {
        Some(item) => image_from_item(item)
            .map(Some)
            .ok_or_else(|| StoreError::Malformed(format!("image item {}", image))),
        None => Ok(None),
    }
}

/// Writes labels, validity and claim resolution in one conditional update.
///
/// Fails with `Conflict` when the stored revision moved on or the item is
/// gone; the caller reloads to tell the two apart.
pub async fn commit_labels(
    client: &DynamoClient,
    table_name: &str,
    image: &ImageRef,
    commit: &LabelCommit,
) -> StoreResult<()> {
    let (pk, sk) = image_key(image);

    let result = client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk))
        .key("SK", AttributeValue::S(sk))
        .update_expression(
            "SET #labels = :labels, #valid = :valid, #seen = :seen, #last_seen = :null, #revision = :next",
        )
        .condition_expression(
            "attribute_exists(PK) AND (attribute_not_exists(#revision) OR #revision = :expected)",
        )
        .expression_attribute_names("#labels", "labels")
        .expression_attribute_names("#valid", "valid")
        .expression_attribute_names("#seen", "seen")
        .expression_attribute_names("#last_seen", "last_seen")
        .expression_attribute_names("#revision", "revision")
        .expression_attribute_values(":labels", labels_to_attribute(&commit.labels))
        .expression_attribute_values(":valid", AttributeValue::Bool(commit.valid))
        .expression_attribute_values(":seen", AttributeValue::Bool(true))
        .expression_attribute_values(":null", AttributeValue::Null(true))
        .expression_attribute_values(
            ":expected",
            AttributeValue::N(commit.expected_revision.to_string()),
        )
        .expression_attribute_values(
            ":next",
            AttributeValue::N((commit.expected_revision + 1).to_string()),
        )
        .send()
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(e)
            if e.as_service_error()
                .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
        {
            Err(StoreError::conflict(format!("Image {}", image)))
        }
        Err(e) => Err(backend("DynamoDB update_item", e)),
    }
}

/// Valid, resolved images carrying a label for `group_id`.
pub async fn list_classified(
    client: &DynamoClient,
    table_name: &str,
    group_id: &str,
) -> StoreResult<Vec<ImageDocument>> {
    let values = HashMap::from([(":yes".to_string(), AttributeValue::Bool(true))]);

    scan_images(
        client,
        table_name,
        "#valid = :yes AND #seen = :yes AND attribute_exists(#labels.#group)",
        &[
            ("#valid", "valid"),
            ("#seen", "seen"),
            ("#labels", "labels"),
            ("#group", group_id),
        ],
        values,
        None,
    )
    .await
}

/// Images explicitly marked not labelable: `valid == false AND seen == true`.
pub async fn list_invalid_seen(
    client: &DynamoClient,
    table_name: &str,
    limit: usize,
) -> StoreResult<Vec<ImageDocument>> {
    let values = HashMap::from([
        (":no".to_string(), AttributeValue::Bool(false)),
        (":yes".to_string(), AttributeValue::Bool(true)),
    ]);

    scan_images(
        client,
        table_name,
        "#valid = :no AND #seen = :yes",
        &[("#valid", "valid"), ("#seen", "seen")],
        values,
        Some(limit),
    )
    .await
}

pub async fn delete_image(
    client: &DynamoClient,
    table_name: &str,
    image: &ImageRef,
) -> StoreResult<()> {
    let (pk, sk) = image_key(image);

    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| backend("DynamoDB delete_item", e))?;

    Ok(())
}
