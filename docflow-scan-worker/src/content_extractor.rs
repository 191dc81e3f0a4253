use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::ScanWorkerError;
use crate::error::ScanWorkerResult;

/// Extracts plain text for indexing from a payload's content. Deliberately
/// does not perform image OCR — that is explicitly out of scope, unlike
/// the broader OCR/classification pipeline this module's shape is
/// borrowed from.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, content_type: &str, payload: &[u8]) -> ScanWorkerResult<String>;
}

const SUPPORTED_PREFIXES: &[&str] = &["text/", "application/pdf", "application/vnd.openxmlformats"];

/// Decodes `text/*` payloads as UTF-8 directly; PDF/Office payloads are
/// handed off to an injectable per-mime extractor so callers can plug in
/// a real parser without this crate depending on one.
#[derive(Default)]
pub struct PlainTextExtractor {
    overrides: RwLock<HashMap<String, String>>,
}

impl PlainTextExtractor {
    /// Registers canned extracted text for a content-type, standing in
    /// for a real PDF/Office text-extraction library in tests.
    pub async fn register_extracted_text(&self, content_type: &str, text: String) {
        self.overrides
            .write()
            .await
            .insert(content_type.to_string(), text);
    }
}

#[async_trait]
impl ContentExtractor for PlainTextExtractor {
    async fn extract(&self, content_type: &str, payload: &[u8]) -> ScanWorkerResult<String> {
        if !SUPPORTED_PREFIXES
            .iter()
            .any(|prefix| content_type.starts_with(prefix))
        {
            return Err(ScanWorkerError::Validation(format!(
                "unsupported content type for text extraction: {content_type}"
            )));
        }

        if content_type.starts_with("text/") {
            return String::from_utf8(payload.to_vec())
                .map_err(|err| ScanWorkerError::Validation(err.to_string()));
        }

        if let Some(text) = self.overrides.read().await.get(content_type) {
            return Ok(text.clone());
        }

        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn extracts_plain_text_directly() {
        let extractor = PlainTextExtractor::default();
        let text = extractor
            .extract("text/plain", b"hello world")
            .await
            .unwrap();
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn pdf_falls_back_to_registered_text() {
        let extractor = PlainTextExtractor::default();
        extractor
            .register_extracted_text("application/pdf", "extracted invoice text".into())
            .await;
        let text = extractor.extract("application/pdf", b"%PDF-1.4").await.unwrap();
        assert_eq!(text, "extracted invoice text");
    }

    #[tokio::test]
    async fn rejects_unsupported_content_type() {
        let extractor = PlainTextExtractor::default();
        let err = extractor.extract("image/png", b"\x89PNG").await.unwrap_err();
        assert!(matches!(err, ScanWorkerError::Validation(_)));
    }
}
