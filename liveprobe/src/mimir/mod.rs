use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use client::prometheus::prompb;

use crate::{
    error::MimirError,
    sink::{Device, DeviceGroup, TopologySink},
};

pub mod client;

const GROUP_LABEL: &str = "group";
const DEVICE_LABEL: &str = "device";
const JOB_LABEL: &str = "job";
const TITLE_LABEL: &str = "title";
const METRIC_PREFIX: &str = "liveprobe_";
const INFO_EVENT_METRIC: &str = "liveprobe_info_event";

const LIVEPROBE_JOB: &str = "liveprobe";

type Buffer = Arc<Mutex<Vec<prompb::TimeSeries>>>;

fn lock(buffer: &Buffer) -> MutexGuard<'_, Vec<prompb::TimeSeries>> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Topology backed by a Mimir remote write endpoint.
///
/// Devices buffer their samples; `push` sends everything buffered so far in
/// one write request. Clones share the buffer.
#[derive(Clone)]
pub struct MimirTopology {
    endpoint: String,
    tenant: Option<String>,
    buffer: Buffer,
}

impl MimirTopology {
    pub fn new(endpoint: impl Into<String>, tenant: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            tenant,
            buffer: Arc::default(),
        }
    }

    /// Number of buffered time series.
    pub fn pending(&self) -> usize {
        lock(&self.buffer).len()
    }

    /// Drain the buffered time series.
    pub fn take(&self) -> Vec<prompb::TimeSeries> {
        std::mem::take(&mut *lock(&self.buffer))
    }

    /// Send all buffered samples. Returns the number of series sent. The
    /// buffer is drained even when the push fails.
    pub async fn push(&self) -> Result<usize, MimirError> {
        let metrics = self.take();
        let count = metrics.len();
        client::send_to_mimir(&self.endpoint, self.tenant.as_deref(), metrics).await?;
        Ok(count)
    }
}

impl TopologySink for MimirTopology {
    type Group = MimirGroup;

    fn create_group(&self, name: &str) -> MimirGroup {
        MimirGroup {
            name: name.to_string(),
            buffer: self.buffer.clone(),
        }
    }
}

pub struct MimirGroup {
    name: String,
    buffer: Buffer,
}

impl DeviceGroup for MimirGroup {
    type Device = MimirDevice;

    fn create_device(&self, name: &str) -> MimirDevice {
        MimirDevice {
            group: self.name.clone(),
            name: name.to_string(),
            buffer: self.buffer.clone(),
        }
    }
}

pub struct MimirDevice {
    group: String,
    name: String,
    buffer: Buffer,
}

impl MimirDevice {
    fn record(&self, metric_name: &str, value: f64, extra: Option<(&str, &str)>) {
        let mut labels = vec![
            (GROUP_LABEL, self.group.as_str()),
            (DEVICE_LABEL, self.name.as_str()),
            (JOB_LABEL, LIVEPROBE_JOB),
        ];
        labels.extend(extra);

        let series = client::create_time_series(metric_name, &labels, value, None);
        lock(&self.buffer).push(series);
    }
}

impl Device for MimirDevice {
    fn report_absolute_metric(&self, key: &str, value: f64) {
        self.record(&format!("{METRIC_PREFIX}{key}"), value, None);
    }

    /// Info events become a sample of `liveprobe_info_event` labelled with the title.
    fn report_custom_info_event(&self, title: &str) {
        log::debug!("[{}] {}", self.name, title);
        self.record(INFO_EVENT_METRIC, 1.0, Some((TITLE_LABEL, title)));
    }
}
