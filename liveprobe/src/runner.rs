//! Execution of a single probe.

use crate::{
    alert::AlertDispatcher,
    config::ProbeConfig,
    error::ProbeError,
    probe::{build_checker, result::ProbeOutcome},
    sink::{Device, DeviceGroup, TopologySink},
};

pub const GROUP_NAME: &str = "Liveness Probe";
pub const AVAILABILITY_METRIC: &str = "availability";
pub const RESPONSE_TIME_METRIC: &str = "responsetime";

/// Runs probes against a topology sink and raises alerts for failures.
pub struct ProbeRunner<T> {
    topology: T,
    dispatcher: AlertDispatcher,
}

impl<T> ProbeRunner<T>
where
    T: TopologySink,
{
    pub fn new(topology: T, dispatcher: AlertDispatcher) -> Self {
        Self {
            topology,
            dispatcher,
        }
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    /// Run one probe: check, report metrics, dispatch alerts on failure.
    ///
    /// Availability is always reported; response time only when the check
    /// produced one. Only checker construction errors are returned as `Err`.
    pub async fn run(&self, config: &ProbeConfig) -> Result<ProbeOutcome, ProbeError> {
        let checker = build_checker(config)?;

        let device = self
            .topology
            .create_group(GROUP_NAME)
            .create_device(&config.name);

        let outcome = checker.check().await;

        device.report_absolute_metric(AVAILABILITY_METRIC, outcome.availability());
        if let Some(response_time) = outcome.response_time_ms {
            device.report_absolute_metric(RESPONSE_TIME_METRIC, response_time);
        }

        if !outcome.available {
            log::info!(
                "Probe {} failed: {}",
                config.name,
                outcome.failure_reason.as_deref().unwrap_or_default()
            );
            self.dispatcher.dispatch(&outcome, config, &device).await;
        }

        Ok(outcome)
    }
}
