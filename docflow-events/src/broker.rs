use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use docflow_common::EventId;
use docflow_common::TenantId;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::EventsResult;
use crate::topic::topic_for;

/// The wire envelope published to the broker; distinct from
/// `docflow_metadata_store::EventRecord`, which is the durable outbox row.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub event_id: EventId,
    #[serde(rename = "type")]
    pub event_type: String,
    pub tenant_id: TenantId,
    pub subject_id: String,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// Fire-and-forget publish to a message broker; callers never treat a
/// publish failure as reason to undo the state change it followed.
#[async_trait]
pub trait EventBroker: Send + Sync {
    async fn publish(&self, envelope: &EventEnvelope) -> EventsResult<()>;
}

#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: &'static str,
    pub envelope: EventEnvelope,
}

/// Records every successfully published envelope, and can be told to
/// fail the next N publishes to exercise outbox-retry behavior.
#[derive(Default)]
pub struct InMemoryEventBroker {
    published: RwLock<Vec<PublishedMessage>>,
    fail_next: RwLock<u32>,
}

impl InMemoryEventBroker {
    pub async fn fail_next_n(&self, n: u32) {
        *self.fail_next.write().await = n;
    }

    pub async fn published(&self) -> Vec<PublishedMessage> {
        self.published.read().await.clone()
    }
}

#[async_trait]
impl EventBroker for InMemoryEventBroker {
    async fn publish(&self, envelope: &EventEnvelope) -> EventsResult<()> {
        let mut fail_next = self.fail_next.write().await;
        if *fail_next > 0 {
            *fail_next -= 1;
            return Err(crate::error::EventsError::Dependency(
                "simulated broker outage".into(),
            ));
        }
        drop(fail_next);
        self.published.write().await.push(PublishedMessage {
            topic: topic_for(&envelope.event_type),
            envelope: envelope.clone(),
        });
        Ok(())
    }
}
