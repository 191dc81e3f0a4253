use std::sync::Arc;
use std::time::Duration;

use docflow_common::RetryPolicy;
use docflow_common::TenantId;
use docflow_metadata_store::EventRecord;
use docflow_metadata_store::EventRepository;
use tracing::warn;

use crate::broker::EventBroker;
use crate::broker::EventEnvelope;
use crate::error::EventsError;
use crate::error::EventsResult;
use crate::topic::SUPPORTED_EVENT_TYPES;

/// Writes the outbox row first, then attempts a best-effort broker
/// publish. Fire-and-forget publishing from the ingestion path is never
/// allowed — every event exists as a durable row before any network call.
pub struct EventPublisher {
    events: Arc<dyn EventRepository>,
    broker: Arc<dyn EventBroker>,
}

impl EventPublisher {
    #[must_use]
    pub fn new(events: Arc<dyn EventRepository>, broker: Arc<dyn EventBroker>) -> Self {
        Self { events, broker }
    }

    pub async fn publish(
        &self,
        tenant_id: &TenantId,
        subject_id: &str,
        event_type: &str,
        payload: serde_json::Value,
    ) -> EventsResult<EventRecord> {
        if !SUPPORTED_EVENT_TYPES.contains(&event_type) {
            return Err(EventsError::Validation(format!(
                "unsupported event type: {event_type}"
            )));
        }

        let record = self
            .events
            .append(tenant_id, event_type.to_string(), payload.clone())
            .await?;

        let envelope = EventEnvelope {
            event_id: record.id.clone(),
            event_type: event_type.to_string(),
            tenant_id: tenant_id.clone(),
            subject_id: subject_id.to_string(),
            timestamp: record.created_at,
            payload,
        };

        match self.broker.publish(&envelope).await {
            Ok(()) => {
                self.events.mark_published(&record.id).await?;
            }
            Err(err) => {
                warn!(event_id = %record.id, error = %err, "broker publish failed, leaving for outbox poller");
            }
        }

        Ok(record)
    }
}

/// Periodically retries rows the inline publish attempt left unpublished.
/// Uses the shared exponential-backoff-with-jitter policy between rounds
/// rather than a fixed interval, so a persistent broker outage doesn't
/// spin the poller.
pub struct OutboxPoller {
    events: Arc<dyn EventRepository>,
    broker: Arc<dyn EventBroker>,
    retry: RetryPolicy,
    batch_size: usize,
}

impl OutboxPoller {
    #[must_use]
    pub fn new(events: Arc<dyn EventRepository>, broker: Arc<dyn EventBroker>) -> Self {
        Self {
            events,
            broker,
            retry: RetryPolicy::default(),
            batch_size: 50,
        }
    }

    /// Runs one sweep of the outbox, publishing whatever is unpublished.
    /// Returns the number of rows successfully published.
    pub async fn poll_once(&self) -> EventsResult<usize> {
        let unpublished = self.events.list_unpublished(self.batch_size).await?;
        let mut published = 0;
        for record in unpublished {
            let envelope = EventEnvelope {
                event_id: record.id.clone(),
                event_type: record.event_type.clone(),
                tenant_id: record.tenant_id.clone(),
                subject_id: String::new(),
                timestamp: record.created_at,
                payload: record.payload.clone(),
            };
            if self.broker.publish(&envelope).await.is_ok() {
                self.events.mark_published(&record.id).await?;
                published += 1;
            }
        }
        Ok(published)
    }

    /// Runs `poll_once` in a loop, backing off between empty/failed sweeps.
    /// Exits when `shutdown` resolves.
    pub async fn run(&self, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
        let mut attempt: u32 = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => return,
                result = self.poll_once() => {
                    match result {
                        Ok(published) if published > 0 => {
                            attempt = 0;
                        }
                        Ok(_) => {
                            attempt += 1;
                        }
                        Err(err) => {
                            warn!(error = %err, "outbox poll failed");
                            attempt += 1;
                        }
                    }
                }
            }
            let wait = self
                .retry
                .backoff_for_attempt(attempt.min(self.retry.max_attempts));
            tokio::time::sleep(wait.max(Duration::from_millis(100))).await;
        }
    }
}
