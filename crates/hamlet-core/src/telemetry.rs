//! Metrics hooks.
//!
//! The simulation reports population events through [`Telemetry`]. With
//! no sink installed every call is a no-op; installing one never changes
//! what the simulation does, only what gets reported.

use tracing::debug;

/// Metric names.
pub mod metrics {
    /// An agent was spawned or born.
    pub const PERSON_CREATED: &str = "person.created";
    /// An agent died or was removed.
    pub const PERSON_DEATH: &str = "person.death";
    /// An agent changed occupation.
    pub const PERSON_OCCUPATION_CHANGE: &str = "person.occupation_change";
    /// Age at death.
    pub const PERSON_AGE: &str = "person.age";
    /// A wage paid for a work action.
    pub const PERSON_WAGE: &str = "person.wage";
}

/// Key/value labels attached to a metric.
pub type Attributes<'a> = &'a [(&'static str, String)];

/// Destination for simulation metrics.
pub trait MetricsSink: Send {
    /// Count one occurrence of `name`.
    fn increment(&mut self, name: &'static str, attributes: Attributes<'_>);

    /// Record one observation of `name`.
    fn record(&mut self, name: &'static str, value: f64, attributes: Attributes<'_>);
}

/// Forwards metrics to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn increment(&mut self, name: &'static str, attributes: Attributes<'_>) {
        debug!(metric = name, attributes = ?attributes, "increment");
    }

    fn record(&mut self, name: &'static str, value: f64, attributes: Attributes<'_>) {
        debug!(metric = name, value, attributes = ?attributes, "record");
    }
}

/// Optional metrics sink owned by the simulation.
#[derive(Default)]
pub struct Telemetry {
    sink: Option<Box<dyn MetricsSink>>,
}

impl Telemetry {
    /// No sink; every call is dropped.
    pub const fn disabled() -> Self {
        Self { sink: None }
    }

    /// Report to `sink`.
    pub fn with_sink(sink: Box<dyn MetricsSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Whether a sink is installed.
    pub const fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Count one occurrence of `name`.
    pub fn increment(&mut self, name: &'static str, attributes: Attributes<'_>) {
        if let Some(sink) = self.sink.as_mut() {
            sink.increment(name, attributes);
        }
    }

    /// Record one observation of `name`.
    pub fn record(&mut self, name: &'static str, value: f64, attributes: Attributes<'_>) {
        if let Some(sink) = self.sink.as_mut() {
            sink.record(name, value, attributes);
        }
    }
}

impl core::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Telemetry")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
