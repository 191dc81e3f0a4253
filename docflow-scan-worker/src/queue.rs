use std::collections::HashMap;
use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use docflow_common::generate_id;
use docflow_common::DocumentId;
use docflow_common::TenantId;
use docflow_common::VersionId;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ScanWorkerError;
use crate::error::ScanWorkerResult;

pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const MAX_RECEIVE_COUNT: u32 = 5;

/// In-flight envelope on the scan queue. Not persisted as a first-class
/// entity; its lifetime is queue residency. Attempt count is
/// broker-maintained, never carried by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMessage {
    pub document_id: DocumentId,
    pub version_id: VersionId,
    pub tenant_id: TenantId,
    pub storage_path: String,
    pub enqueued_at: DateTime<Utc>,
}

pub type ReceiptHandle = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub handle: ReceiptHandle,
    pub message: ScanMessage,
    pub receive_count: u32,
}

/// At-least-once, FIFO-per-partition (document-id is the partition key)
/// work queue with visibility-timeout redelivery and a dead-letter queue
/// after `MAX_RECEIVE_COUNT` deliveries. The queue owns no authoritative
/// state: everything here is reconstructable by scanning documents stuck
/// in `processing`.
#[async_trait]
pub trait ScanQueue: Send + Sync {
    async fn enqueue(&self, message: ScanMessage) -> ScanWorkerResult<()>;

    /// Long-polls for up to `max` messages, reclaiming any whose
    /// visibility timeout has elapsed first.
    async fn receive(&self, max: usize) -> ScanWorkerResult<Vec<ReceivedMessage>>;

    async fn ack(&self, handle: &ReceiptHandle) -> ScanWorkerResult<()>;

    /// Releases the message back to the pending queue before its
    /// visibility timeout naturally elapses, incrementing its receive
    /// count (moving it to the DLQ if that exceeds the max).
    async fn nack(&self, handle: &ReceiptHandle) -> ScanWorkerResult<()>;

    /// Messages that exceeded `MAX_RECEIVE_COUNT`. Inspected, never
    /// auto-redriven without a human decision.
    async fn dead_letters(&self) -> Vec<ScanMessage>;
}

struct InFlightEntry {
    message: ScanMessage,
    receive_count: u32,
    visible_at: Instant,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<(ScanMessage, u32)>,
    in_flight: HashMap<ReceiptHandle, InFlightEntry>,
    dead_letters: Vec<ScanMessage>,
}

pub struct InMemoryScanQueue {
    state: Mutex<QueueState>,
    visibility_timeout: Duration,
}

impl Default for InMemoryScanQueue {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_TIMEOUT)
    }
}

impl InMemoryScanQueue {
    #[must_use]
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            visibility_timeout,
        }
    }

    fn reclaim_expired(state: &mut QueueState, now: Instant) {
        let expired: Vec<ReceiptHandle> = state
            .in_flight
            .iter()
            .filter(|(_, entry)| entry.visible_at <= now)
            .map(|(handle, _)| handle.clone())
            .collect();
        for handle in expired {
            let entry = state.in_flight.remove(&handle).expect("checked above");
            if entry.receive_count >= MAX_RECEIVE_COUNT {
                state.dead_letters.push(entry.message);
            } else {
                state.pending.push_back((entry.message, entry.receive_count));
            }
        }
    }
}

#[async_trait]
impl ScanQueue for InMemoryScanQueue {
    async fn enqueue(&self, message: ScanMessage) -> ScanWorkerResult<()> {
        let mut state = self.state.lock().await;
        state.pending.push_back((message, 0));
        Ok(())
    }

    async fn receive(&self, max: usize) -> ScanWorkerResult<Vec<ReceivedMessage>> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        Self::reclaim_expired(&mut state, now);

        let mut received = Vec::new();
        for _ in 0..max {
            let Some((message, receive_count)) = state.pending.pop_front() else {
                break;
            };
            let receive_count = receive_count + 1;
            let handle = generate_id();
            state.in_flight.insert(
                handle.clone(),
                InFlightEntry {
                    message: message.clone(),
                    receive_count,
                    visible_at: now + self.visibility_timeout,
                },
            );
            received.push(ReceivedMessage {
                handle,
                message,
                receive_count,
            });
        }
        Ok(received)
    }

    async fn ack(&self, handle: &ReceiptHandle) -> ScanWorkerResult<()> {
        let mut state = self.state.lock().await;
        state
            .in_flight
            .remove(handle)
            .map(|_| ())
            .ok_or_else(|| ScanWorkerError::NotFound(format!("receipt handle {handle}")))
    }

    async fn nack(&self, handle: &ReceiptHandle) -> ScanWorkerResult<()> {
        let mut state = self.state.lock().await;
        let entry = state
            .in_flight
            .remove(handle)
            .ok_or_else(|| ScanWorkerError::NotFound(format!("receipt handle {handle}")))?;
        if entry.receive_count >= MAX_RECEIVE_COUNT {
            state.dead_letters.push(entry.message);
        } else {
            state.pending.push_back((entry.message, entry.receive_count));
        }
        Ok(())
    }

    async fn dead_letters(&self) -> Vec<ScanMessage> {
        self.state.lock().await.dead_letters.clone()
    }
}
