use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::constants::{IMPORT_SHAPE_ERROR, IMPORT_TAG_ERROR};

/// How a player feels about one item of the tracker.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PreferenceTag {
    Favorite,
    Like,
    Maybe,
    No,
}

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("{}: {}", IMPORT_SHAPE_ERROR, .0)]
    Shape(String),
    #[error("{}: {} for '{}'", IMPORT_TAG_ERROR, .value, .item)]
    UnknownTag { item: String, value: String },
    #[error("failed to parse import: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct PreferenceExport {
    preferences: BTreeMap<String, PreferenceTag>,
    exported_at: DateTime<Utc>,
}

/// Item id -> chosen tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceSheet {
    entries: BTreeMap<String, PreferenceTag>,
}

impl PreferenceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, item_id: impl Into<String>, tag: PreferenceTag) {
        self.entries.insert(item_id.into(), tag);
    }

    pub fn clear(&mut self, item_id: &str) -> Option<PreferenceTag> {
        self.entries.remove(item_id)
    }

    pub fn get(&self, item_id: &str) -> Option<PreferenceTag> {
        self.entries.get(item_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PreferenceTag)> {
        self.entries.iter().map(|(id, tag)| (id.as_str(), *tag))
    }

    pub fn to_json(&self) -> Result<String, PreferenceError> {
        let export = PreferenceExport {
            preferences: self.entries.clone(),
            exported_at: Utc::now(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Parses an export. The top level must be an object holding a `preferences`
    /// object whose values are known tags; anything else is rejected whole.
    pub fn from_json(text: &str) -> Result<Self, PreferenceError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let root = value
            .as_object()
            .ok_or_else(|| PreferenceError::Shape("top level is not an object".to_string()))?;
        let preferences = root
            .get("preferences")
            .and_then(|p| p.as_object())
            .ok_or_else(|| PreferenceError::Shape("missing 'preferences' mapping".to_string()))?;

        let mut entries = BTreeMap::new();
        for (item, raw) in preferences {
            let tag = raw
                .as_str()
                .and_then(|s| s.parse::<PreferenceTag>().ok())
                .ok_or_else(|| PreferenceError::UnknownTag {
                    item: item.clone(),
                    value: raw.to_string(),
                })?;
            entries.insert(item.clone(), tag);
        }
        Ok(Self { entries })
    }

    /// Replaces this sheet with the imported one. On error nothing changes.
    pub fn import_json(&mut self, text: &str) -> Result<usize, PreferenceError> {
        let imported = Self::from_json(text)?;
        *self = imported;
        log::info!("Imported {} preferences", self.len());
        Ok(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_export_import_keeps_marks() {
        let mut sheet = PreferenceSheet::new();
        sheet.mark("blindfold", PreferenceTag::Favorite);
        sheet.mark("ice cube", PreferenceTag::No);

        let json = sheet.to_json().unwrap();
        assert!(json.contains("\"exported_at\""));
        let imported = PreferenceSheet::from_json(&json).unwrap();
        assert_eq!(imported, sheet);
    }

    #[test]
    fn test_rejects_wrong_shape_without_mutation() {
        let mut sheet = PreferenceSheet::new();
        sheet.mark("feather", PreferenceTag::Like);

        for bad in ["[]", r#"{"prefs": {}}"#, r#"{"preferences": []}"#, "not json"] {
            assert!(sheet.import_json(bad).is_err(), "accepted {}", bad);
            assert_eq!(sheet.get("feather"), Some(PreferenceTag::Like));
            assert_eq!(sheet.len(), 1);
        }
    }

    #[test]
    fn test_rejects_unknown_tag_as_a_whole() {
        let mut sheet = PreferenceSheet::new();
        sheet.mark("feather", PreferenceTag::Like);
        let err = sheet
            .import_json(r#"{"preferences": {"a": "like", "b": "sometimes"}}"#)
            .unwrap_err();
        assert!(matches!(err, PreferenceError::UnknownTag { ref item, .. } if item == "b"));
        assert_eq!(sheet.get("a"), None);
        assert_eq!(sheet.get("feather"), Some(PreferenceTag::Like));
    }

    #[test]
    fn test_import_without_timestamp_and_mixed_case() {
        let mut sheet = PreferenceSheet::new();
        let count = sheet.import_json(r#"{"preferences": {"scarf": "Maybe"}}"#).unwrap();
        assert_eq!(count, 1);
        assert_eq!(sheet.get("scarf"), Some(PreferenceTag::Maybe));
    }

    #[test]
    fn test_tag_strings() {
        for tag in PreferenceTag::iter() {
            assert_eq!(tag.to_string().parse::<PreferenceTag>().unwrap(), tag);
        }
        assert_eq!(PreferenceTag::Favorite.to_string(), "favorite");
    }
}
