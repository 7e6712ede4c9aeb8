pub mod app_config;
pub mod probe_config;

pub use app_config::{AppConfig, EventsApiSettings, load_config};
pub use probe_config::{ConnectionType, ProbeConfig, ProbeDefinition};
