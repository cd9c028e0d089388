use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Identity of an image document: the storage bucket plus the image id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    pub bucket: String,
    #[serde(rename = "id")]
    pub image_id: String,
}

impl ImageRef {
    pub fn new(bucket: impl Into<String>, image_id: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            image_id: image_id.into(),
        }
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.image_id)
    }
}

/// Value recorded for one label group.
///
/// Shape follows the group's type: a single choice is a string, a multiple
/// choice is a list of strings, a numeric group holds a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelValue {
    Number(serde_json::Number),
    Single(String),
    Multiple(Vec<String>),
}

/// One entry of the wire-level label list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub group: String,
    pub values: LabelValue,
}

#[derive(Serialize)]
struct LabelEntryRef<'a> {
    group: &'a str,
    values: &'a LabelValue,
}

/// Labels of an image keyed by group id, at most one value per group.
///
/// Serialized as the ordered list `[{group, values}]`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<LabelEntry>")]
pub struct LabelSet(BTreeMap<String, LabelValue>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, group: &str) -> Option<&LabelValue> {
        self.0.get(group)
    }

    /// Inserts or replaces the value for `group`.
    pub fn set(&mut self, group: impl Into<String>, value: LabelValue) -> Option<LabelValue> {
        self.0.insert(group.into(), value)
    }

    pub fn contains(&self, group: &str) -> bool {
        self.0.contains_key(group)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LabelValue)> {
        self.0.iter()
    }
}

impl From<Vec<LabelEntry>> for LabelSet {
    fn from(entries: Vec<LabelEntry>) -> Self {
        entries
            .into_iter()
            .map(|entry| (entry.group, entry.values))
            .collect()
    }
}

impl FromIterator<(String, LabelValue)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (String, LabelValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for LabelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.0
                .iter()
                .map(|(group, values)| LabelEntryRef { group, values }),
        )
    }
}

/// Image document: one per captured image, keyed by bucket + image id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDocument {
    pub bucket: String,
    #[serde(rename = "id")]
    pub image_id: String,
    pub filename: String,
    pub valid: bool,
    pub seen: bool,
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: LabelSet,
    /// Bumped on every label commit; guards the compare-and-swap.
    #[serde(skip)]
    pub revision: u64,
}

impl ImageDocument {
    /// A freshly ingested image: unseen, not valid, no labels.
    pub fn ingested(
        bucket: impl Into<String>,
        image_id: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            image_id: image_id.into(),
            filename: filename.into(),
            valid: false,
            seen: false,
            last_seen: None,
            labels: LabelSet::new(),
            revision: 0,
        }
    }

    pub fn image_ref(&self) -> ImageRef {
        ImageRef::new(self.bucket.clone(), self.image_id.clone())
    }

    /// Blob key of the raw image, falling back to `{id}.png`.
    pub fn blob_key(&self) -> String {
        if self.filename.is_empty() {
            format!("{}.png", self.image_id)
        } else {
            self.filename.clone()
        }
    }

    /// Claimed and not yet resolved, with the claim older than `cutoff`.
    pub fn claim_expired(&self, cutoff: DateTime<Utc>) -> bool {
        matches!(self.last_seen, Some(at) if at < cutoff)
    }
}

/// Everything a label commit writes in one conditional update.
///
/// Committing always resolves the claim: `seen = true`, `last_seen = null`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelCommit {
    pub expected_revision: u64,
    pub labels: LabelSet,
    pub valid: bool,
}

/// Raw bytes of a stored blob plus its content type.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

/// Timestamps are stored as fixed-width RFC3339 so they compare as strings.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}
