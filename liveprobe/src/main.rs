use std::{process::ExitCode, sync::Arc};

use liveprobe::{
    ProbeRunner,
    alert::{AlertDispatcher, AlertSink, client::EventsApiClient},
    config::load_config,
    mimir::MimirTopology,
};

fn to_fixed_width(input: &str, width: usize) -> String {
    use unicode_truncate::UnicodeTruncateStr;

    let (truncated, _) = input.unicode_truncate(width);
    format!("{:<width$}", truncated, width = width)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let alert_sink: Option<Arc<dyn AlertSink>> = match &config.events_api {
        Some(settings) => match EventsApiClient::new(settings) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn AlertSink>),
            Err(e) => {
                log::error!("Failed to set up event API client: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    log::info!("Using Mimir endpoint: {}", config.mimir_endpoint);
    let topology = MimirTopology::new(&config.mimir_endpoint, config.mimir_tenant.clone());
    let runner = Arc::new(ProbeRunner::new(
        topology.clone(),
        AlertDispatcher::new(alert_sink),
    ));

    let mut handles = vec![];
    for probe in config.probes {
        let runner = runner.clone();
        let width = config.max_name_width;

        handles.push(tokio::spawn(async move {
            let name = to_fixed_width(&probe.name, width);
            match runner.run(&probe).await {
                Ok(outcome) if outcome.available => {
                    let elapsed = outcome
                        .response_time_ms
                        .map(|ms| format!(", Elapsed: {ms:.2}ms"))
                        .unwrap_or_default();
                    println!("[{name}] ✅ {}{elapsed}", probe.url);
                    true
                }
                Ok(outcome) => {
                    println!(
                        "[{name}] ❌ {}: {}",
                        probe.url,
                        outcome.failure_reason.unwrap_or_default()
                    );
                    true
                }
                Err(e) => {
                    log::error!("[{name}] Probe error for {}: {e}", probe.url);
                    false
                }
            }
        }));
    }

    let mut all_ran = true;
    for handle in handles {
        all_ran &= handle.await.unwrap_or(false);
    }

    match topology.push().await {
        Ok(count) => log::info!("Pushed {count} series to Mimir"),
        Err(e) => log::error!("Failed to send metrics: {e}"),
    }

    if all_ran {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
