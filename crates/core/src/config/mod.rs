use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub chart: ChartConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chart: ChartConfig::default(),
        }
    }
}

/// Configuration specific to the ring chart subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Period of the random-walk timer, in milliseconds.
    pub walk_interval_ms: u64,
    /// Number of wedges added by the bulk-add gesture.
    pub bulk_add_count: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            walk_interval_ms: 1_000,
            bulk_add_count: 50,
        }
    }
}

impl ChartConfig {
    pub fn walk_interval(&self) -> Duration {
        Duration::from_millis(self.walk_interval_ms)
    }
}
