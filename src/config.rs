use std::time::Duration;

use crate::engine::SaveSettings;
use crate::intake::DEFAULT_MAX_BYTES;
use crate::notify::NOTICE_TTL;
use crate::progress::{DEFAULT_MAX_INCREMENT, DEFAULT_TICK};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_bytes: u64,
    pub tick: Duration,
    pub max_increment: f64,
    /// The simulated bar waits here until the real save finishes.
    pub progress_ceiling: f64,
    pub notice_ttl: Duration,
    pub save: SaveSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            tick: DEFAULT_TICK,
            max_increment: DEFAULT_MAX_INCREMENT,
            progress_ceiling: 99.0,
            notice_ttl: NOTICE_TTL,
            save: SaveSettings::default(),
        }
    }
}
