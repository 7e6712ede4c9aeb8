use std::{
    io::{self, ErrorKind},
    time::{Duration, Instant},
};

use regex::Regex;
use thiserror::Error;

use super::{
    Checker, report,
    result::{ProbeOutcome, RawResponse},
};
use crate::{classify::classify, config::ProbeConfig};

const USER_AGENT: &str = concat!("liveprobe/", env!("CARGO_PKG_VERSION"));

/// A request that did not produce a response. The display text is the
/// failure reason reported for the probe.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HttpFailure {
    #[error("Timeout of {0} seconds reached.")]
    Timeout(u64),

    #[error("Connection error")]
    Connection,

    #[error("Unknown error received: {0}")]
    Other(String),
}

impl HttpFailure {
    /// Connect failures, including a connect that timed out, are connection
    /// errors. A timeout after the connection is up is a timeout.
    fn from_reqwest(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_connect() {
            HttpFailure::Connection
        } else if err.is_timeout() || has_io_kind(err, &[ErrorKind::TimedOut]) {
            HttpFailure::Timeout(timeout.as_secs())
        } else if is_connection_failure(err) {
            HttpFailure::Connection
        } else {
            HttpFailure::Other(report(err))
        }
    }
}

/// The peer reset, aborted or closed the connection before a complete
/// response arrived.
fn is_connection_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    const KINDS: &[ErrorKind] = &[
        ErrorKind::ConnectionReset,
        ErrorKind::ConnectionAborted,
        ErrorKind::BrokenPipe,
        ErrorKind::UnexpectedEof,
    ];
    if has_io_kind(err, KINDS) {
        return true;
    }
    sources(err).any(|e| {
        e.downcast_ref::<hyper::Error>()
            .is_some_and(|e| e.is_canceled() || e.is_incomplete_message() || e.is_closed())
    })
}

fn has_io_kind(err: &(dyn std::error::Error + 'static), kinds: &[ErrorKind]) -> bool {
    sources(err).any(|e| {
        e.downcast_ref::<io::Error>()
            .is_some_and(|io| kinds.contains(&io.kind()))
    })
}

fn sources<'a>(
    err: &'a (dyn std::error::Error + 'static),
) -> impl Iterator<Item = &'a (dyn std::error::Error + 'static)> {
    std::iter::successors(Some(err), |e| e.source())
}

/// Build the client for one probe. Certificates are not verified; targets are
/// often internal services with self-signed certificates. A proxy, when set,
/// is used for both http and https. Without one, proxy environment variables
/// are ignored and the target is contacted directly.
///
/// The timeout bounds connecting and each read separately, not the whole
/// exchange.
pub fn build_client(timeout: Duration, proxy: Option<&str>) -> Result<reqwest::Client, reqwest::Error> {
    let builder = reqwest::Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .danger_accept_invalid_certs(true)
        .user_agent(USER_AGENT);

    let builder = match proxy {
        Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy)?),
        None => builder.no_proxy(),
    };

    builder.build()
}

/// GETs a URL and classifies the response against the expected patterns.
pub struct HttpChecker {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    expected_code: Regex,
    expected_body: Regex,
}

impl HttpChecker {
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(config.timeout, config.proxy.as_deref())?;

        Ok(Self {
            client,
            url: config.url.clone(),
            timeout: config.timeout,
            expected_code: config.expected_code.clone(),
            expected_body: config.expected_body.clone(),
        })
    }

    /// Perform the GET request. Elapsed time covers sending the request up to
    /// receiving the response head.
    pub async fn fetch(&self) -> Result<RawResponse, HttpFailure> {
        let start = Instant::now();
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| HttpFailure::from_reqwest(&e, self.timeout))?;
        let elapsed = start.elapsed();

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| HttpFailure::from_reqwest(&e, self.timeout))?;

        Ok(RawResponse {
            status,
            body,
            elapsed,
        })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self) -> ProbeOutcome {
        match self.fetch().await {
            Ok(response) => classify(
                response.status,
                &response.body,
                response.elapsed,
                &self.expected_code,
                &self.expected_body,
            ),
            Err(failure) => {
                log::debug!("GET {} failed: {:?}", self.url, failure);
                ProbeOutcome::unavailable(failure.to_string(), None)
            }
        }
    }
}
