use std::time::Duration;

use tokio::{net::TcpStream, time::timeout};

use super::{Checker, result::ProbeOutcome};

pub const TCP_FAILURE: &str = "TCP Connection unsuccessful";

/// Checks that a TCP connection can be established.
pub struct TcpChecker {
    host: String,
    port: u16,
    timeout_duration: Duration,
    hold: bool,
}

impl TcpChecker {
    pub fn new(host: impl Into<String>, port: u16, timeout_duration: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout_duration,
            hold: false,
        }
    }

    /// Keep the connection open for the timeout duration before closing it.
    pub fn with_hold(mut self, hold: bool) -> Self {
        self.hold = hold;
        self
    }
}

#[async_trait::async_trait]
impl Checker for TcpChecker {
    async fn check(&self) -> ProbeOutcome {
        check_tcp(&self.host, self.port, self.timeout_duration, self.hold).await
    }
}

/// Connect to `host:port` within `timeout_duration`. A refused, unreachable or
/// timed out connection makes the target unavailable. No response time is
/// recorded for TCP.
pub async fn check_tcp(host: &str, port: u16, timeout_duration: Duration, hold: bool) -> ProbeOutcome {
    let connect = TcpStream::connect((host, port));

    match timeout(timeout_duration, connect).await {
        Ok(Ok(stream)) => {
            if hold {
                tokio::time::sleep(timeout_duration).await;
            }
            drop(stream);
            ProbeOutcome::available(None)
        }
        Ok(Err(e)) => {
            log::debug!("TCP connection to {host}:{port} failed: {e}");
            ProbeOutcome::unavailable(TCP_FAILURE, None)
        }
        Err(_) => {
            log::debug!(
                "TCP connection to {host}:{port} timed out after {}s",
                timeout_duration.as_secs()
            );
            ProbeOutcome::unavailable(TCP_FAILURE, None)
        }
    }
}
