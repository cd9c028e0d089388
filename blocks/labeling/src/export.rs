//! CSV export of validated labels for one group.

use lambda_http::{http::StatusCode, Body, Error, Response};
use truckspy_atoms::media::{ImageDocument, LabelValue};
use truckspy_atoms::{LabelStore, StoreResult};

use crate::responses;

/// Prefixes used to build the two URL columns of every row.
#[derive(Debug, Clone)]
pub struct ExportUrls {
    /// e.g. `gs://`, followed by `{bucket}/{filename}`
    pub storage_prefix: String,
    /// e.g. `https://food-truck-spy.appspot.com`, followed by `/api/snapshots/...`
    pub snapshot_base: String,
}

impl ExportUrls {
    pub fn storage_url(&self, image: &ImageDocument) -> String {
        format!("{}{}/{}", self.storage_prefix, image.bucket, image.blob_key())
    }

    pub fn snapshot_url(&self, image: &ImageDocument) -> String {
        format!(
            "{}/api/snapshots/{}/{}",
            self.snapshot_base.trim_end_matches('/'),
            image.bucket,
            image.image_id
        )
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Numbers are written bare, text is always quoted.
fn value_field(value: &LabelValue) -> String {
    match value {
        LabelValue::Number(n) => n.to_string(),
        LabelValue::Single(s) => quote(s),
        LabelValue::Multiple(values) => quote(&values.join(";")),
    }
}

/// Lazy rows over one point-in-time query result. Not restartable.
pub struct ClassifiedRows<'a> {
    images: std::vec::IntoIter<ImageDocument>,
    group_id: String,
    urls: &'a ExportUrls,
}

impl Iterator for ClassifiedRows<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let image = self.images.next()?;
            if !(image.valid && image.seen) {
                continue;
            }
            if let Some(value) = image.labels.get(&self.group_id) {
                return Some(format!(
                    "{},{},{}",
                    quote(&self.urls.storage_url(&image)),
                    quote(&self.urls.snapshot_url(&image)),
                    value_field(value)
                ));
            }
        }
    }
}

pub async fn classified_rows<'a>(
    store: &dyn LabelStore,
    group_id: &str,
    urls: &'a ExportUrls,
) -> StoreResult<ClassifiedRows<'a>> {
    let images = store.list_classified(group_id).await?;

    Ok(ClassifiedRows {
        images: images.into_iter(),
        group_id: group_id.to_string(),
        urls,
    })
}

/// GET /api/classified?label={group_id}
pub async fn classified_csv_handler(
    store: &dyn LabelStore,
    group_id: Option<&str>,
    urls: &ExportUrls,
) -> Result<Response<Body>, Error> {
    let body = match group_id {
        Some(group_id) => match classified_rows(store, group_id, urls).await {
            Ok(rows) => rows.map(|row| row + "\r\n").collect::<String>(),
            Err(e) => {
                tracing::error!("❌ classified_csv_handler failed: label={}, error={}", group_id, e);
                return responses::store_error(&e);
            }
        },
        None => {
            tracing::warn!("classified export requested without a label");
            String::new()
        }
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/csv")
        .body(body.into())
        .map_err(Box::new)?)
}
