use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::constants::{FALLBACK_CATEGORY, FALLBACK_ITEM_TEXT, FALLBACK_SEQUENCE, FALLBACK_STAGE_TITLE};

/// A single piece of game content: a bare phrase, or a card with a title and body.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ContentItem {
    Text(String),
    Card {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        title: String,
        content: String,
    },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn card(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Card { id: None, title: title.into(), content: content.into() }
    }

    /// Identifier used by the preference tracker. Falls back to the title (or the text itself).
    pub fn id(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Card { id: Some(id), .. } => id,
            Self::Card { title, .. } => title,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Card { title, .. } => title,
        }
    }
}

impl fmt::Display for ContentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Card { title, content, .. } => write!(f, "{}: {}", title, content),
        }
    }
}

/// Ordered, immutable content for one category. Clones share the same storage.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(from = "Vec<ContentItem>", into = "Vec<ContentItem>")]
pub struct Pool {
    items: Arc<[ContentItem]>,
}

impl Pool {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items: items.into() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ContentItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }
}

impl From<Vec<ContentItem>> for Pool {
    fn from(items: Vec<ContentItem>) -> Self {
        Self::new(items)
    }
}

impl From<Pool> for Vec<ContentItem> {
    fn from(pool: Pool) -> Self {
        pool.items.to_vec()
    }
}

/// Category id -> pool.
pub type ContentPool = BTreeMap<String, Pool>;

/// One step of a guided selection; options are drawn from the pool named by `category`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StageDefinition {
    pub title: String,
    pub category: String,
}

impl StageDefinition {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self { title: title.into(), category: category.into() }
    }
}

/// The static JSON resource the games are built from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ContentDocument {
    #[serde(default)]
    pub pools: ContentPool,
    #[serde(default)]
    pub sequences: BTreeMap<String, Vec<StageDefinition>>,
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read content: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse content: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ContentDocument {
    pub fn from_json(text: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Minimal document substituted when the real content cannot be loaded:
    /// one placeholder item and a single-stage sequence over it.
    pub fn fallback() -> Self {
        let mut pools = ContentPool::new();
        pools.insert(
            FALLBACK_CATEGORY.to_string(),
            Pool::new(vec![ContentItem::text(FALLBACK_ITEM_TEXT)]),
        );

        let mut sequences = BTreeMap::new();
        sequences.insert(
            FALLBACK_SEQUENCE.to_string(),
            vec![StageDefinition::new(FALLBACK_STAGE_TITLE, FALLBACK_CATEGORY)],
        );

        Self { pools, sequences }
    }

    pub fn pool(&self, category: &str) -> Option<&Pool> {
        self.pools.get(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_items() {
        let doc = ContentDocument::from_json(r#"{
            "pools": {
                "truth": ["Biggest fear?", {"title": "Secret", "content": "Tell one"}],
                "dare": [{"id": "d1", "title": "Sing", "content": "Sing a chorus"}]
            },
            "sequences": {
                "pachinko": [{"title": "Pick a zone", "category": "truth"}]
            }
        }"#).unwrap();

        let truth = doc.pool("truth").unwrap();
        assert_eq!(truth.len(), 2);
        assert_eq!(truth.get(0), Some(&ContentItem::text("Biggest fear?")));
        assert_eq!(truth.get(1).unwrap().id(), "Secret");
        assert_eq!(doc.pool("dare").unwrap().get(0).unwrap().id(), "d1");
        assert_eq!(doc.sequences["pachinko"][0].category, "truth");
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let doc = ContentDocument::from_json("{}").unwrap();
        assert!(doc.pools.is_empty());
        assert!(doc.sequences.is_empty());
    }

    #[test]
    fn test_fallback_is_never_empty() {
        let doc = ContentDocument::fallback();
        let pool = doc.pool(FALLBACK_CATEGORY).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(doc.sequences[FALLBACK_SEQUENCE].len(), 1);
    }

    #[test]
    fn test_card_display() {
        let item = ContentItem::card("Dare", "Do ten push-ups");
        assert_eq!(item.to_string(), "Dare: Do ten push-ups");
    }
}
