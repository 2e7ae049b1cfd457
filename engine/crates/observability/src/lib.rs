use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[derive(Debug, Clone)]
pub struct TickMetrics {
    pub tick_number: u64,
    pub duration_us: u128,
    /// Wall-clock budget for one tick at the configured rate.
    pub budget_us: u128,
    pub timers_fired: usize,
    pub frames_flushed: usize,
    pub entity_count: usize,
}

impl TickMetrics {
    pub fn over_budget(&self) -> bool {
        self.budget_us > 0 && self.duration_us > self.budget_us
    }

    pub fn log(&self) {
        if self.over_budget() {
            tracing::warn!(
                tick = self.tick_number,
                duration_us = self.duration_us,
                timers = self.timers_fired,
                frames = self.frames_flushed,
                entities = self.entity_count,
                "tick exceeded budget ({}us > {}us)",
                self.duration_us,
                self.budget_us
            );
        } else {
            tracing::trace!(
                tick = self.tick_number,
                duration_us = self.duration_us,
                timers = self.timers_fired,
                frames = self.frames_flushed,
                entities = self.entity_count,
                "tick completed"
            );
        }
    }
}
