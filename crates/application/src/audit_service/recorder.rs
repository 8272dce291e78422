use std::sync::Arc;
use std::time::Duration;

use pondok_domain::{
    AuditAction, AuditActor, MISSING_RECORD_ID, ResolvedIdentity, sanitize_details,
};
use serde_json::{Map, Value};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::{AuditEvent, AuditRepository};

/// Delivery settings for the audit queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditDeliveryPolicy {
    /// Records buffered before new ones are dropped.
    pub queue_capacity: usize,
    /// Append attempts per record, at least one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each further attempt.
    pub retry_base_delay: Duration,
}

impl Default for AuditDeliveryPolicy {
    fn default() -> Self {
        Self {
            queue_capacity: 1_024,
            max_attempts: 3,
            retry_base_delay: Duration::from_millis(200),
        }
    }
}

impl AuditDeliveryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_base_delay.saturating_mul(factor)
    }
}

/// Fire-and-forget handle for recording audit events.
///
/// `record` never blocks and never fails; records are handed to the
/// [`AuditWorker`] draining the queue.
#[derive(Clone)]
pub struct AuditRecorder {
    sender: mpsc::Sender<AuditEvent>,
}

/// Background consumer that appends queued records to the audit store.
pub struct AuditWorker {
    receiver: mpsc::Receiver<AuditEvent>,
    repository: Arc<dyn AuditRepository>,
    policy: AuditDeliveryPolicy,
}

impl AuditRecorder {
    /// Creates a recorder and the worker that must be spawned to drain it.
    #[must_use]
    pub fn channel(
        repository: Arc<dyn AuditRepository>,
        policy: AuditDeliveryPolicy,
    ) -> (Self, AuditWorker) {
        let (sender, receiver) = mpsc::channel(policy.queue_capacity.max(1));

        (
            Self { sender },
            AuditWorker {
                receiver,
                repository,
                policy,
            },
        )
    }

    /// Queues one audit record.
    ///
    /// Without an actor this is a no-op. Missing or blank record ids are
    /// stored as `-`; details are sanitized before queueing.
    pub fn record(
        &self,
        actor: Option<&ResolvedIdentity>,
        action: AuditAction,
        resource_name: &str,
        record_id: Option<&str>,
        details: Option<Value>,
    ) {
        let Some(actor) = actor else {
            debug!(
                action = action.as_str(),
                resource_name, "audit record skipped without actor"
            );
            return;
        };

        let event = AuditEvent {
            actor: AuditActor::from(actor),
            action,
            resource_name: resource_name.to_owned(),
            record_id: record_id
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .unwrap_or(MISSING_RECORD_ID)
                .to_owned(),
            details: details
                .map(|details| sanitize_details(&details))
                .unwrap_or_else(|| Value::Object(Map::new())),
        };

        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    action = event.action.as_str(),
                    resource_name = %event.resource_name,
                    record_id = %event.record_id,
                    "audit queue full, dropping audit record"
                );
            }
            Err(TrySendError::Closed(event)) => {
                warn!(
                    action = event.action.as_str(),
                    resource_name = %event.resource_name,
                    record_id = %event.record_id,
                    "audit worker stopped, dropping audit record"
                );
            }
        }
    }
}

impl AuditWorker {
    /// Drains the queue until every recorder handle is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.receiver.recv().await {
            self.deliver(event).await;
        }

        debug!("audit worker stopped");
    }

    async fn deliver(&self, event: AuditEvent) {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.repository.append_event(event.clone()).await {
                Ok(()) => return,
                Err(error) if attempt < max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        error = %error,
                        attempt,
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        action = event.action.as_str(),
                        resource_name = %event.resource_name,
                        "audit append failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    warn!(
                        error = %error,
                        attempts = max_attempts,
                        action = event.action.as_str(),
                        resource_name = %event.resource_name,
                        record_id = %event.record_id,
                        actor_id = %event.actor.id,
                        "audit append failed, record dropped"
                    );
                }
            }
        }
    }
}
