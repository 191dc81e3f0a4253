use std::collections::HashMap;

use crate::types::IndexedDocument;

const NAME_BOOST: f32 = 3.0;
const CONTENT_BOOST: f32 = 1.0;
const MIN_SHOULD_MATCH: f32 = 0.75;

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| token.to_ascii_lowercase())
        .collect()
}

/// Multi-field match over `{name, content}`, name boosted 3.0x over
/// content, OR'd across terms with a 75% minimum-should-match: a
/// document must match at least `ceil(0.75 * term_count)` distinct query
/// terms to be considered a hit at all.
#[must_use]
pub fn content_query_score(query: &str, document: &IndexedDocument) -> Option<f32> {
    let terms = tokenize(query);
    if terms.is_empty() {
        return None;
    }
    let name_lower = document.name.to_ascii_lowercase();
    let content_lower = document.content.to_ascii_lowercase();

    let mut matched_terms = 0usize;
    let mut score = 0.0f32;
    for term in &terms {
        let mut term_matched = false;
        if name_lower.contains(term.as_str()) {
            score += NAME_BOOST;
            term_matched = true;
        }
        if content_lower.contains(term.as_str()) {
            score += CONTENT_BOOST;
            term_matched = true;
        }
        if term_matched {
            matched_terms += 1;
        }
    }

    let required = (terms.len() as f32 * MIN_SHOULD_MATCH).ceil() as usize;
    if matched_terms < required.max(1) {
        return None;
    }
    Some(score)
}

/// Bool filter of nested term queries, one per KV pair, ALL required.
#[must_use]
pub fn metadata_query_matches(kv: &HashMap<String, String>, document: &IndexedDocument) -> bool {
    kv.iter()
        .all(|(key, value)| document.metadata.get(key) == Some(value))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn sample() -> IndexedDocument {
        IndexedDocument {
            document_id: "doc-1".into(),
            folder_id: "folder-1".into(),
            name: "Annual Invoice Report".into(),
            content_type: "application/pdf".into(),
            size: 100,
            status: "available".into(),
            content: "total amount due for services rendered".into(),
            metadata: HashMap::from([("department".to_string(), "finance".to_string())]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn name_matches_score_higher_than_content_only() {
        let document = sample();
        let name_score = content_query_score("invoice", &document).unwrap();
        let content_score = content_query_score("amount", &document).unwrap();
        assert!(name_score > content_score);
    }

    #[test]
    fn below_minimum_should_match_yields_no_hit() {
        let document = sample();
        let score = content_query_score("invoice totally-unrelated-term another-miss", &document);
        assert!(score.is_none());
    }

    #[test]
    fn metadata_requires_every_kv_pair() {
        let document = sample();
        let mut kv = HashMap::new();
        kv.insert("department".to_string(), "finance".to_string());
        assert!(metadata_query_matches(&kv, &document));
        kv.insert("region".to_string(), "emea".to_string());
        assert!(!metadata_query_matches(&kv, &document));
    }
}
