use std::borrow::Cow;
use validator::ValidationError;

use crate::content::{ContentDocument, ContentPool, StageDefinition};

fn problem(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::from(message));
    error
}

pub fn validate_stage(stage: &StageDefinition, pools: &ContentPool) -> Result<(), ValidationError> {
    if stage.title.trim().is_empty() {
        return Err(problem("empty_stage_title", format!("stage over '{}' has no title", stage.category)));
    }
    match pools.get(&stage.category) {
        None => Err(problem("unknown_category", format!("stage '{}' uses unknown category '{}'", stage.title, stage.category))),
        Some(pool) if pool.is_empty() => Err(problem("empty_category", format!("stage '{}' uses empty category '{}'", stage.title, stage.category))),
        Some(_) => Ok(()),
    }
}

pub fn validate_sequence(stages: &[StageDefinition], pools: &ContentPool) -> Result<(), ValidationError> {
    if stages.is_empty() {
        return Err(problem("empty_sequence", "sequence has no stages".to_string()));
    }
    stages.iter().try_for_each(|stage| validate_stage(stage, pools))
}

/// Every invalid sequence in the document, by name.
pub fn validate_document(document: &ContentDocument) -> Vec<(String, ValidationError)> {
    document
        .sequences
        .iter()
        .filter_map(|(name, stages)| {
            validate_sequence(stages, &document.pools)
                .err()
                .map(|error| (name.clone(), error))
        })
        .collect()
}

/// Drops invalid sequences, keeping the rest of the document usable.
pub fn sanitize_document(mut document: ContentDocument) -> ContentDocument {
    for (name, error) in validate_document(&document) {
        log::warn!(
            "Dropping sequence '{}': {}",
            name,
            error.message.as_deref().unwrap_or(error.code.as_ref())
        );
        document.sequences.remove(&name);
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentItem, Pool};

    fn document() -> ContentDocument {
        let mut document = ContentDocument::default();
        document.pools.insert("zone".to_string(), Pool::new(vec![ContentItem::text("Neck")]));
        document.pools.insert("empty".to_string(), Pool::new(vec![]));
        document.sequences.insert("good".to_string(), vec![StageDefinition::new("Zone", "zone")]);
        document.sequences.insert("blank".to_string(), vec![]);
        document.sequences.insert("unknown".to_string(), vec![StageDefinition::new("Zone", "nope")]);
        document.sequences.insert("hollow".to_string(), vec![StageDefinition::new("Zone", "empty")]);
        document.sequences.insert("untitled".to_string(), vec![StageDefinition::new("  ", "zone")]);
        document
    }

    #[test]
    fn test_reports_each_bad_sequence() {
        let problems = validate_document(&document());
        let mut codes: Vec<(String, String)> = problems
            .into_iter()
            .map(|(name, error)| (name, error.code.to_string()))
            .collect();
        codes.sort();
        assert_eq!(codes, vec![
            ("blank".to_string(), "empty_sequence".to_string()),
            ("hollow".to_string(), "empty_category".to_string()),
            ("unknown".to_string(), "unknown_category".to_string()),
            ("untitled".to_string(), "empty_stage_title".to_string()),
        ]);
    }

    #[test]
    fn test_sanitize_keeps_valid_sequences() {
        let document = sanitize_document(document());
        assert_eq!(document.sequences.keys().collect::<Vec<_>>(), vec!["good"]);
        assert_eq!(document.pools.len(), 2);
    }
}
