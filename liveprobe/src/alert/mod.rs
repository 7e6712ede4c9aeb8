//! Alerting for failing probes.
//!
//! Every failure is reported as an info event on the probe's device. When the
//! probe is attached to an entity, an availability event is sent to the event
//! API as well.

pub mod client;

use std::sync::Arc;

use serde::Serialize;

use crate::{config::ProbeConfig, error::AlertError, probe::result::ProbeOutcome, sink::Device};

/// Minutes after which the event API closes the event when no new failure
/// is reported.
pub const EVENT_TIMEOUT_MINUTES: u32 = 5;

const AVAILABILITY_EVENT: &str = "AVAILABILITY_EVENT";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRules {
    pub entity_ids: Vec<String>,
}

/// Payload of the event ingestion API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityEvent {
    pub event_type: &'static str,
    pub timeout_minutes: u32,
    pub attach_rules: AttachRules,
    pub source: String,
    pub description: String,
}

impl AvailabilityEvent {
    pub fn new(entity_id: &str, source: &str, description: &str) -> Self {
        AvailabilityEvent {
            event_type: AVAILABILITY_EVENT,
            timeout_minutes: EVENT_TIMEOUT_MINUTES,
            attach_rules: AttachRules {
                entity_ids: vec![entity_id.to_string()],
            },
            source: source.to_string(),
            description: description.to_string(),
        }
    }
}

/// Delivers availability events.
#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, event: &AvailabilityEvent) -> Result<(), AlertError>;
}

/// Reports failing probes locally and to the event API.
#[derive(Clone, Default)]
pub struct AlertDispatcher {
    sink: Option<Arc<dyn AlertSink>>,
}

impl AlertDispatcher {
    pub fn new(sink: Option<Arc<dyn AlertSink>>) -> Self {
        Self { sink }
    }

    /// Handle a failed outcome. Available outcomes are ignored. Delivery
    /// errors are logged and never change the outcome.
    pub async fn dispatch<D: Device + ?Sized>(&self, outcome: &ProbeOutcome, config: &ProbeConfig, device: &D) {
        if outcome.available {
            return;
        }

        device.report_custom_info_event(&format!("Webcheck {} is failing", config.name));

        let Some(entity_id) = config.entity_id.as_deref() else {
            return;
        };

        let Some(sink) = &self.sink else {
            log::warn!(
                "Probe {} is attached to {entity_id} but no event API is configured",
                config.name
            );
            return;
        };

        let description = outcome.failure_reason.as_deref().unwrap_or_default();
        let event = AvailabilityEvent::new(entity_id, &config.name, description);

        match sink.send(&event).await {
            Ok(()) => log::info!("Availability event sent for {} ({entity_id})", config.name),
            Err(e) => log::warn!(
                "Failed to send availability event for {} ({entity_id}): {e}",
                config.name
            ),
        }
    }
}
