use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::ScanWorkerResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    Infected,
    /// Transport failure or timeout talking to the AV engine. This is a
    /// retry trigger, never an error reported upward.
    Error,
}

#[async_trait]
pub trait AvEngine: Send + Sync {
    async fn scan(&self, payload: &[u8]) -> ScanWorkerResult<ScanVerdict>;
}

/// Flags any payload whose bytes exactly match a registered signature as
/// infected; everything else is clean. Tests can also force the next N
/// scans to return `Error` to exercise the retry path.
#[derive(Default)]
pub struct MockAvEngine {
    infected_signatures: RwLock<HashSet<Vec<u8>>>,
    force_error_next: RwLock<u32>,
}

impl MockAvEngine {
    pub async fn mark_infected(&self, signature: Vec<u8>) {
        self.infected_signatures.write().await.insert(signature);
    }

    pub async fn force_error_next_n(&self, n: u32) {
        *self.force_error_next.write().await = n;
    }
}

#[async_trait]
impl AvEngine for MockAvEngine {
    async fn scan(&self, payload: &[u8]) -> ScanWorkerResult<ScanVerdict> {
        let mut force_error = self.force_error_next.write().await;
        if *force_error > 0 {
            *force_error -= 1;
            return Ok(ScanVerdict::Error);
        }
        drop(force_error);

        if self.infected_signatures.read().await.contains(payload) {
            Ok(ScanVerdict::Infected)
        } else {
            Ok(ScanVerdict::Clean)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn clean_payload_scans_clean() {
        let engine = MockAvEngine::default();
        assert_eq!(engine.scan(b"hello").await.unwrap(), ScanVerdict::Clean);
    }

    #[tokio::test]
    async fn registered_signature_scans_infected() {
        let engine = MockAvEngine::default();
        engine.mark_infected(b"eicar".to_vec()).await;
        assert_eq!(engine.scan(b"eicar").await.unwrap(), ScanVerdict::Infected);
    }

    #[tokio::test]
    async fn forced_errors_are_transient() {
        let engine = MockAvEngine::default();
        engine.force_error_next_n(1).await;
        assert_eq!(engine.scan(b"hello").await.unwrap(), ScanVerdict::Error);
        assert_eq!(engine.scan(b"hello").await.unwrap(), ScanVerdict::Clean);
    }
}
