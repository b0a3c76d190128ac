use std::time::Duration;

use preview_core::PreviewConfig;

/// Configuration for the pipeline orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Debounce delay used when `schedule` is not given one.
    pub default_delay: Duration,
    /// Capacity of the lifecycle event channel. Slow subscribers lose the oldest events.
    pub event_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_delay: Duration::from_millis(preview_core::config::DEFAULT_DEBOUNCE_MS),
            event_capacity: 64,
        }
    }
}

impl PipelineConfig {
    pub fn from_preview_config(config: &PreviewConfig) -> Self {
        Self {
            default_delay: config.debounce(),
            ..Default::default()
        }
    }

    /// Signed millisecond delay as a `Duration`, negatives clamped to zero.
    pub fn delay_from_millis(ms: i64) -> Duration {
        Duration::from_millis(ms.max(0) as u64)
    }
}
