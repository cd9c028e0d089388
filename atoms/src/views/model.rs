use serde::{Deserialize, Serialize};

/// Cached pointer to the most recent snapshot of a view.
///
/// Written by the ingestion process; the view id doubles as the bucket name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastView {
    pub id: String,
    pub filename: String,
    pub display_name: String,
    pub time_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSummary {
    pub id: String,
    pub display: String,
}

impl From<&LastView> for ViewSummary {
    fn from(view: &LastView) -> Self {
        Self {
            id: view.id.clone(),
            display: view.display_name.clone(),
        }
    }
}
