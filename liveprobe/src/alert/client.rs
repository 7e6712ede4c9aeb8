use std::time::Duration;

use reqwest::{
    Client,
    header::{ACCEPT, HeaderValue},
};

use super::{AlertSink, AvailabilityEvent};
use crate::{config::EventsApiSettings, error::AlertError};

const EVENTS_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends availability events to the event ingestion API.
pub struct EventsApiClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl EventsApiClient {
    pub fn new(settings: &EventsApiSettings) -> Result<Self, AlertError> {
        let client = Client::builder().timeout(EVENTS_REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            token: settings.token.clone(),
        })
    }
}

#[async_trait::async_trait]
impl AlertSink for EventsApiClient {
    /// Posts the event to `{endpoint}?Api-Token={token}`. Any non-2xx answer is
    /// an error.
    async fn send(&self, event: &AvailabilityEvent) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("Api-Token", self.token.as_str())])
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(event)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Event API rejected event: {} - {}", status, body);
            return Err(AlertError::Rejected { status, body });
        }
        Ok(())
    }
}
