use std::env;

use serde::Deserialize;

use super::probe_config::{ProbeConfig, ProbeDefinition};
use crate::error::ConfigError;

const DEFAULT_CONFIG_FILE: &str = "config.yml";
const DEFAULT_MIMIR_ENDPOINT: &str = "http://localhost:9009";

/// Endpoint and token of the event ingestion API.
#[derive(Debug, Clone)]
pub struct EventsApiSettings {
    pub endpoint: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    probes: Vec<ProbeDefinition>,
}

pub struct AppConfig {
    pub probes: Vec<ProbeConfig>,
    pub mimir_endpoint: String,
    pub mimir_tenant: Option<String>,
    pub events_api: Option<EventsApiSettings>,
    pub max_name_width: usize,
}

/// Load the application configuration from a YAML file and environment variables.
/// The file is taken from `CONFIG_FILE` (defaults to `config.yml`). The Mimir endpoint,
/// tenant and the event API credentials come from `MIMIR_ENDPOINT`, `MIMIR_TENANT`,
/// `EVENTS_API_ENDPOINT` and `EVENTS_API_TOKEN`.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let config_file_location =
        env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let config_str =
        std::fs::read_to_string(&config_file_location).map_err(|source| ConfigError::Read {
            path: config_file_location.clone(),
            source,
        })?;

    let mut config = match (env_non_empty("EVENTS_API_ENDPOINT"), env_non_empty("EVENTS_API_TOKEN")) {
        (Some(endpoint), Some(token)) => {
            AppConfig::from_yaml_str(&config_str, Some(EventsApiSettings { endpoint, token }))?
        }
        (None, None) => AppConfig::from_yaml_str(&config_str, None)?,
        (Some(_), None) => missing_for_any(&config_str, "EVENTS_API_TOKEN")?,
        (None, Some(_)) => missing_for_any(&config_str, "EVENTS_API_ENDPOINT")?,
    };

    if let Some(endpoint) = env_non_empty("MIMIR_ENDPOINT") {
        config.mimir_endpoint = endpoint;
    }
    config.mimir_tenant = env_non_empty("MIMIR_TENANT");

    log::info!(
        "Loaded {} probes from {}",
        config.probes.len(),
        config_file_location
    );

    Ok(config)
}

impl AppConfig {
    /// Parse and validate a probe file. Fails when any probe attaches alerts to an
    /// entity while no event API is configured.
    pub fn from_yaml_str(
        yaml: &str,
        events_api: Option<EventsApiSettings>,
    ) -> Result<AppConfig, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;

        let probes = file
            .probes
            .into_iter()
            .map(ProbeConfig::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        if events_api.is_none() {
            if let Some(probe) = probes.iter().find(|p| p.entity_id.is_some()) {
                return Err(ConfigError::MissingAlertCredentials {
                    name: probe.name.clone(),
                    missing: "EVENTS_API_ENDPOINT",
                });
            }
        }

        let max_name_width = probes.iter().map(|p| p.name.len()).max().unwrap_or(10);

        Ok(AppConfig {
            probes,
            mimir_endpoint: DEFAULT_MIMIR_ENDPOINT.to_string(),
            mimir_tenant: None,
            events_api,
            max_name_width,
        })
    }
}

/// Only one of the two event API variables is set. That is an error as soon as
/// a probe needs to raise events; otherwise alerting is simply off.
fn missing_for_any(config_str: &str, missing: &'static str) -> Result<AppConfig, ConfigError> {
    let config = AppConfig::from_yaml_str(config_str, None).map_err(|e| match e {
        ConfigError::MissingAlertCredentials { name, .. } => {
            ConfigError::MissingAlertCredentials { name, missing }
        }
        other => other,
    })?;
    log::warn!("{missing} is not set, availability events are disabled");
    Ok(config)
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
