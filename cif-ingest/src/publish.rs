//! Outbound event publishing boundary.
//!
//! The pipeline hands every accepted event to an [`EventPublisher`] and
//! awaits the outcome before reading the next line. The transport itself
//! (message-bus client, retries, backoff, timeouts) lives behind this trait
//! and is owned elsewhere.

use async_trait::async_trait;

use crate::domain::NormalizedEvent;

/// Error from the publishing transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PublishError {
    /// The transport rejected the event
    #[error("transport rejected event: {0}")]
    Rejected(String),

    /// The event could not be serialized for the transport
    #[error("failed to serialize event: {0}")]
    Serialize(String),
}

/// Abstract outbound transport for normalized events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &NormalizedEvent) -> Result<(), PublishError>;
}

/// Publisher that logs events instead of sending them anywhere.
///
/// Useful for local runs and smoke tests without a message-bus connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &NormalizedEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event)
            .map_err(|e| PublishError::Serialize(e.to_string()))?;
        tracing::info!(
            train = %event.train_service_number,
            travel_date = %event.travel_date,
            "event: {payload}"
        );
        Ok(())
    }
}
