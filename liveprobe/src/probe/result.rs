use std::time::Duration;

/// The result of one probe invocation.
///
/// `failure_reason` is set exactly when `available` is false; use the
/// constructors to keep it that way.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub available: bool,
    pub response_time_ms: Option<f64>,
    pub failure_reason: Option<String>,
}

impl ProbeOutcome {
    pub fn available(response_time_ms: Option<f64>) -> Self {
        ProbeOutcome {
            available: true,
            response_time_ms,
            failure_reason: None,
        }
    }

    pub fn unavailable(reason: impl Into<String>, response_time_ms: Option<f64>) -> Self {
        ProbeOutcome {
            available: false,
            response_time_ms,
            failure_reason: Some(reason.into()),
        }
    }

    /// Availability as a metric value, 1.0 or 0.0.
    pub fn availability(&self) -> f64 {
        match self.available {
            true => 1.0,
            false => 0.0,
        }
    }
}

/// A response received from an HTTP target, before classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    pub elapsed: Duration,
}
