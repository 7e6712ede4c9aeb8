//! HTTP and TCP liveness probes.
//!
//! A [`ProbeRunner`](runner::ProbeRunner) checks one configured target,
//! classifies the result, reports availability and response time to a
//! [`TopologySink`](sink::TopologySink) and raises availability events for
//! failing targets through an [`AlertSink`](alert::AlertSink).

pub mod alert;
pub mod classify;
pub mod config;
pub mod error;
pub mod mimir;
pub mod probe;
pub mod runner;
pub mod sink;

pub use probe::result::ProbeOutcome;
pub use runner::ProbeRunner;
