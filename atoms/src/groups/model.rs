use serde::{Deserialize, Serialize};

use crate::media::LabelValue;

/// Declared value shape of a label group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    Single,
    Multiple,
    Numeric,
}

impl GroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Single => "single",
            GroupType::Multiple => "multiple",
            GroupType::Numeric => "numeric",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "single" => Some(GroupType::Single),
            "multiple" => Some(GroupType::Multiple),
            "numeric" => Some(GroupType::Numeric),
            _ => None,
        }
    }

    /// Whether `value` has the shape this group type declares.
    pub fn accepts(&self, value: &LabelValue) -> bool {
        matches!(
            (self, value),
            (GroupType::Single, LabelValue::Single(_))
                | (GroupType::Multiple, LabelValue::Multiple(_))
                | (GroupType::Numeric, LabelValue::Number(_))
        )
    }
}

/// A category of annotation, e.g. "color" or "num-waiting".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelGroup {
    pub id: String,
    pub group_type: GroupType,
    pub display: String,
    /// Choices offered for single/multiple groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn group_type_accepts_matching_shapes_only() {
        let single = LabelValue::Single("red".to_string());
        let multiple = LabelValue::Multiple(vec!["a".to_string()]);
        let number = LabelValue::Number(3.into());

        assert!(GroupType::Single.accepts(&single));
        assert!(!GroupType::Single.accepts(&multiple));
        assert!(GroupType::Multiple.accepts(&multiple));
        assert!(!GroupType::Multiple.accepts(&number));
        assert!(GroupType::Numeric.accepts(&number));
        assert!(!GroupType::Numeric.accepts(&single));
    }

    #[test]
    fn group_type_parse_matches_serde_names() {
        for ty in [GroupType::Single, GroupType::Multiple, GroupType::Numeric] {
            assert_eq!(GroupType::parse(ty.as_str()), Some(ty));
            assert_eq!(serde_json::to_value(ty).unwrap(), json!(ty.as_str()));
        }
        assert_eq!(GroupType::parse("slider"), None);
    }

    #[test]
    fn label_group_wire_shape() {
        let group = LabelGroup {
            id: "color".to_string(),
            group_type: GroupType::Single,
            display: "Truck color".to_string(),
            options: vec!["red".to_string(), "blue".to_string()],
        };

        assert_eq!(
            serde_json::to_value(&group).unwrap(),
            json!({
                "id": "color",
                "groupType": "single",
                "display": "Truck color",
                "options": ["red", "blue"]
            })
        );
    }
}
