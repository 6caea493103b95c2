use std::time::Duration;

/// Configuration for statement monitoring.
///
/// Monitoring is disabled by default; hooks run either way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Statements slower than this trigger `on_slow_query`.
    pub slow_query_threshold: Option<Duration>,
    /// Whether monitors receive events.
    pub monitoring_enabled: bool,
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slow query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn enable_monitoring(mut self) -> Self {
        self.monitoring_enabled = true;
        self
    }

    pub fn disable_monitoring(mut self) -> Self {
        self.monitoring_enabled = false;
        self
    }
}
