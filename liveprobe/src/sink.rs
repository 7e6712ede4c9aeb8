//! Reporting sinks the probes write metrics and info events to.

/// Creates device groups.
pub trait TopologySink {
    type Group: DeviceGroup;

    fn create_group(&self, name: &str) -> Self::Group;
}

/// A named group of devices.
pub trait DeviceGroup {
    type Device: Device;

    fn create_device(&self, name: &str) -> Self::Device;
}

/// One monitored target.
pub trait Device: Send + Sync {
    fn report_absolute_metric(&self, key: &str, value: f64);

    fn report_custom_info_event(&self, title: &str);
}
