//! Dual-shape label values and their accessors.
//!
//! Label annotations reach the metadata store from two producers with
//! incompatible field naming: the API writes `{name, confidence}` and the
//! recognition pipeline writes `{Name, Confidence}`. Records keep whichever
//! shape they were written in; readers resolve the duality through
//! [`LabelValue::name`] and [`LabelValue::confidence`] instead of matching
//! on fields themselves.

use serde::{Deserialize, Serialize};

/// A label annotation in canonical form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    /// Detection confidence in percent (0..=100).
    pub confidence: f64,
}

/// A stored label annotation in whichever shape its producer wrote.
///
/// The variant order matters: untagged deserialization tries `Raw` first,
/// so an object carrying `Name`/`Confidence` resolves to the pipeline shape
/// and everything else falls through to the canonical shape. A value is
/// always exactly one of the two.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelValue {
    /// Recognition-pipeline shape (`Name`/`Confidence`).
    Raw {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Confidence")]
        confidence: f64,
    },
    /// Canonical shape (`name`/`confidence`).
    Canonical { name: String, confidence: f64 },
}

impl LabelValue {
    /// The label name, regardless of shape.
    pub fn name(&self) -> &str {
        match self {
            Self::Raw { name, .. } | Self::Canonical { name, .. } => name,
        }
    }

    /// The detection confidence, regardless of shape.
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Raw { confidence, .. } | Self::Canonical { confidence, .. } => *confidence,
        }
    }

    /// True when the value carries the pipeline's capitalized fields.
    ///
    /// The shape decision is made once, at deserialization, by the same
    /// variant tag the accessors read. There is no separate check to drift
    /// out of sync.
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw { .. })
    }

    /// Collapse to the canonical pair.
    pub fn to_canonical(&self) -> Label {
        Label {
            name: self.name().to_string(),
            confidence: self.confidence(),
        }
    }
}

impl From<Label> for LabelValue {
    fn from(label: Label) -> Self {
        Self::Canonical {
            name: label.name,
            confidence: label.confidence,
        }
    }
}

/// Per-label usage statistics, computed fresh per query.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelStats {
    pub name: String,
    /// Number of images carrying the label.
    pub count: u64,
    pub average_confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessors_agree_across_shapes() {
        let canonical = LabelValue::Canonical {
            name: "Car".to_string(),
            confidence: 95.0,
        };
        let raw = LabelValue::Raw {
            name: "Car".to_string(),
            confidence: 95.0,
        };

        assert_eq!(canonical.name(), raw.name());
        assert_eq!(canonical.confidence(), raw.confidence());
        assert!(!canonical.is_raw());
        assert!(raw.is_raw());
    }

    #[test]
    fn deserializes_pipeline_shape() {
        let value: LabelValue =
            serde_json::from_value(json!({"Name": "Tree", "Confidence": 88.5})).unwrap();
        assert!(value.is_raw());
        assert_eq!(value.name(), "Tree");
        assert_eq!(value.confidence(), 88.5);
    }

    #[test]
    fn deserializes_canonical_shape() {
        let value: LabelValue =
            serde_json::from_value(json!({"name": "Tree", "confidence": 88.5})).unwrap();
        assert!(!value.is_raw());
        assert_eq!(value.name(), "Tree");
    }

    #[test]
    fn serialization_preserves_shape() {
        let raw = LabelValue::Raw {
            name: "Dog".to_string(),
            confidence: 99.0,
        };
        let json = serde_json::to_value(&raw).unwrap();
        assert_eq!(json, json!({"Name": "Dog", "Confidence": 99.0}));

        let canonical = LabelValue::Canonical {
            name: "Dog".to_string(),
            confidence: 99.0,
        };
        let json = serde_json::to_value(&canonical).unwrap();
        assert_eq!(json, json!({"name": "Dog", "confidence": 99.0}));
    }

    #[test]
    fn to_canonical_collapses_raw() {
        let raw = LabelValue::Raw {
            name: "Cat".to_string(),
            confidence: 91.2,
        };
        let label = raw.to_canonical();
        assert_eq!(label.name, "Cat");
        assert_eq!(label.confidence, 91.2);
    }
}
