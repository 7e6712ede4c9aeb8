pub mod http;
pub mod result;
pub mod tcp;

use std::fmt::Write;

use crate::{
    config::{ConnectionType, ProbeConfig},
    error::ProbeError,
};
use result::ProbeOutcome;

/// A connectivity check for one target.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Run the check. Network failures are part of the outcome, never errors.
    async fn check(&self) -> ProbeOutcome;
}

/// Build the checker matching the probe's connection type.
pub fn build_checker(config: &ProbeConfig) -> Result<Box<dyn Checker>, ProbeError> {
    match config.connection_type {
        ConnectionType::Tcp => {
            let (host, port) = config.tcp_target()?;
            Ok(Box::new(
                tcp::TcpChecker::new(host, port, config.timeout).with_hold(config.tcp_hold),
            ))
        }
        ConnectionType::Http => Ok(Box::new(http::HttpChecker::new(config)?)),
    }
}

fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, ": {}", src);
        err = src;
    }
    s
}
