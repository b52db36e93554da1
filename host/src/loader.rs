use party_shared::content::{ContentDocument, ContentError};
use party_shared::validation::sanitize_document;
use std::path::Path;
use tracing::{info, warn};

pub async fn read_document(path: &Path) -> Result<ContentDocument, ContentError> {
    let text = tokio::fs::read_to_string(path).await?;
    ContentDocument::from_json(&text)
}

/// Loads the content document, substituting the built-in fallback when the file
/// is missing or malformed. Never fails: the games run in degraded mode instead.
pub async fn load_content(path: &Path) -> ContentDocument {
    let document = match read_document(path).await {
        Ok(document) => {
            info!(
                "Loaded {} pools and {} sequences from {}",
                document.pools.len(),
                document.sequences.len(),
                path.display()
            );
            document
        }
        Err(e) => {
            warn!("Could not load content from {}: {}. Using fallback content.", path.display(), e);
            return ContentDocument::fallback();
        }
    };

    let document = sanitize_document(document);
    if document.pools.values().all(|pool| pool.is_empty()) {
        warn!("Content from {} has no usable pools. Using fallback content.", path.display());
        return ContentDocument::fallback();
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use party_shared::constants::FALLBACK_CATEGORY;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("party-host-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_file_uses_fallback() {
        let document = load_content(Path::new("/definitely/not/here.json")).await;
        assert_eq!(document, ContentDocument::fallback());
    }

    #[tokio::test]
    async fn test_malformed_file_uses_fallback() {
        let path = temp_file("broken.json", "{ not json");
        let document = load_content(&path).await;
        assert!(document.pool(FALLBACK_CATEGORY).is_some());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_loads_and_drops_invalid_sequences() {
        let path = temp_file("games.json", r#"{
            "pools": { "truth": ["Worst date?"] },
            "sequences": {
                "ok": [{ "title": "Truth", "category": "truth" }],
                "broken": [{ "title": "Dare", "category": "dare" }]
            }
        }"#);
        let document = load_content(&path).await;
        assert_eq!(document.pools.len(), 1);
        assert!(document.sequences.contains_key("ok"));
        assert!(!document.sequences.contains_key("broken"));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_empty_pools_use_fallback() {
        let path = temp_file("empty.json", r#"{"pools": {"a": []}}"#);
        let document = load_content(&path).await;
        assert_eq!(document, ContentDocument::fallback());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_bundled_content_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("content/party.json");
        let document = read_document(&path).await.unwrap();
        assert!(party_shared::validation::validate_document(&document).is_empty());
        assert!(document.sequences.contains_key("pachinko"));
    }
}
