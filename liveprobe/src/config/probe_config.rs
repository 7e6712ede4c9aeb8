use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// The check strategy of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ConnectionType {
    #[serde(rename = "HTTP", alias = "http")]
    Http,
    #[serde(rename = "TCP", alias = "tcp")]
    Tcp,
}

/// A probe definition as it appears in the configuration file.
/// All keys except `hold` are required; empty strings for `proxy` and
/// `entityid` mean "not set".
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeDefinition {
    /// `host:port` for TCP probes, a full URL for HTTP probes.
    pub url: String,

    /// Timeout in seconds.
    pub timeout: u64,

    /// Regex searched in the HTTP status code.
    pub code: String,

    /// Regex searched in the HTTP response body.
    pub response: String,

    /// Name of the probe, used as device name and in alert titles.
    pub name: String,

    pub proxy: String,

    /// Entity the availability events are attached to.
    pub entityid: String,

    #[serde(rename = "type")]
    pub connection_type: ConnectionType,

    /// Keep a successful TCP connection open for `timeout` seconds before
    /// reporting success.
    #[serde(default)]
    pub hold: bool,
}

/// A validated probe configuration. Built once per invocation and only read
/// afterwards.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub name: String,
    pub url: String,
    pub timeout: Duration,
    pub expected_code: Regex,
    pub expected_body: Regex,
    pub proxy: Option<String>,
    pub entity_id: Option<String>,
    pub connection_type: ConnectionType,
    pub tcp_hold: bool,
}

impl ProbeConfig {
    /// Host and port of a TCP probe, parsed from `url`.
    pub fn tcp_target(&self) -> Result<(String, u16), ConfigError> {
        parse_tcp_target(&self.name, &self.url).map(|(host, port)| (host.to_string(), port))
    }
}

impl TryFrom<ProbeDefinition> for ProbeConfig {
    type Error = ConfigError;

    fn try_from(definition: ProbeDefinition) -> Result<Self, Self::Error> {
        let name = definition.name;

        if definition.timeout == 0 {
            return Err(ConfigError::ZeroTimeout { name });
        }

        match definition.connection_type {
            ConnectionType::Tcp => {
                parse_tcp_target(&name, &definition.url)?;
            }
            ConnectionType::Http => {
                Url::parse(&definition.url).map_err(|source| ConfigError::InvalidUrl {
                    name: name.clone(),
                    url: definition.url.clone(),
                    source,
                })?;
            }
        }

        let expected_code = compile_pattern(&name, "code", &definition.code)?;
        let expected_body = compile_pattern(&name, "response", &definition.response)?;

        let proxy = non_empty(definition.proxy);
        if let Some(proxy) = &proxy {
            reqwest::Proxy::all(proxy.as_str()).map_err(|e| ConfigError::InvalidProxy {
                name: name.clone(),
                proxy: proxy.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(ProbeConfig {
            url: definition.url,
            timeout: Duration::from_secs(definition.timeout),
            expected_code,
            expected_body,
            proxy,
            entity_id: non_empty(definition.entityid),
            connection_type: definition.connection_type,
            tcp_hold: definition.hold,
            name,
        })
    }
}

/// Splits `host:port` on the first colon.
fn parse_tcp_target<'a>(name: &str, url: &'a str) -> Result<(&'a str, u16), ConfigError> {
    let (host, port) = url
        .split_once(':')
        .filter(|(host, _)| !host.is_empty())
        .ok_or_else(|| ConfigError::InvalidTcpTarget {
            name: name.to_string(),
            url: url.to_string(),
        })?;

    match port.parse::<u16>() {
        Ok(port) if port > 0 => Ok((host, port)),
        _ => Err(ConfigError::InvalidPort {
            name: name.to_string(),
            url: url.to_string(),
        }),
    }
}

fn compile_pattern(name: &str, field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        name: name.to_string(),
        field,
        source,
    })
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
