use std::time::{Duration, Instant};

/// Tick loop configuration.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Ticks per second.
    pub tps: u32,
    /// Maximum ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tps: 50,
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tps.max(1) as f64)
    }
}

/// What a simulation did during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub timers_fired: usize,
    pub frames_flushed: usize,
    pub entity_count: usize,
}

impl std::ops::AddAssign for StepReport {
    fn add_assign(&mut self, rhs: Self) {
        self.timers_fired += rhs.timers_fired;
        self.frames_flushed += rhs.frames_flushed;
        self.entity_count += rhs.entity_count;
    }
}

/// Anything driven by the fixed-rate loop. `now_ms` is the loop's monotonic
/// clock in milliseconds since it started.
pub trait Simulation {
    fn advance(&mut self, now_ms: u64) -> StepReport;
}

/// Fixed-rate driver. Each step moves the clock to the time elapsed since
/// the loop started, so slow ticks never stretch timer delays.
pub struct TickLoop<S: Simulation> {
    pub sim: S,
    pub config: TickConfig,
    pub current_tick: u64,
    pub clock_ms: u64,
    epoch: Instant,
}

impl<S: Simulation> TickLoop<S> {
    pub fn new(config: TickConfig, sim: S) -> Self {
        Self {
            sim,
            config,
            current_tick: 0,
            clock_ms: 0,
            epoch: Instant::now(),
        }
    }

    /// Execute a single tick at the current wall-clock offset.
    pub fn step(&mut self) -> observability::TickMetrics {
        let elapsed_ms = u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.step_to(elapsed_ms)
    }

    /// Execute a single tick with the clock at `now_ms`. The clock never
    /// moves backwards.
    pub fn step_to(&mut self, now_ms: u64) -> observability::TickMetrics {
        let start = Instant::now();

        self.clock_ms = self.clock_ms.max(now_ms);
        let report = self.sim.advance(self.clock_ms);

        self.current_tick += 1;
        let duration = start.elapsed();

        observability::TickMetrics {
            tick_number: self.current_tick,
            duration_us: duration.as_micros(),
            budget_us: self.config.tick_duration().as_micros(),
            timers_fired: report.timers_fired,
            frames_flushed: report.frames_flushed,
            entity_count: report.entity_count,
        }
    }

    /// Run the tick loop for configured number of ticks (or until max_ticks).
    pub fn run(&mut self) -> Vec<observability::TickMetrics> {
        let mut all_metrics = Vec::new();
        let tick_duration = self.config.tick_duration();

        loop {
            if self.config.max_ticks > 0 && self.current_tick >= self.config.max_ticks {
                break;
            }

            let tick_start = Instant::now();
            let metrics = self.step();
            metrics.log();
            all_metrics.push(metrics);

            // Sleep until next tick
            let elapsed = tick_start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            }
        }

        all_metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<u64>,
    }

    impl Simulation for Recorder {
        fn advance(&mut self, now_ms: u64) -> StepReport {
            self.seen.push(now_ms);
            StepReport {
                timers_fired: 1,
                frames_flushed: 0,
                entity_count: self.seen.len(),
            }
        }
    }

    #[test]
    fn tick_config_defaults() {
        let config = TickConfig::default();
        assert_eq!(config.tps, 50);
        let dur = config.tick_duration();
        assert_eq!(dur.as_millis(), 20);
    }

    #[test]
    fn single_step_advances_clock() {
        let mut tick_loop = TickLoop::new(TickConfig::default(), Recorder::default());
        let metrics = tick_loop.step_to(20);
        assert_eq!(metrics.tick_number, 1);
        assert_eq!(metrics.timers_fired, 1);
        assert_eq!(tick_loop.clock_ms, 20);
        assert_eq!(tick_loop.sim.seen, vec![20]);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut tick_loop = TickLoop::new(TickConfig::default(), Recorder::default());
        tick_loop.step_to(50);
        tick_loop.step_to(30);
        assert_eq!(tick_loop.sim.seen, vec![50, 50]);
    }

    #[test]
    fn step_follows_elapsed_time() {
        let mut tick_loop = TickLoop::new(TickConfig::default(), Recorder::default());
        std::thread::sleep(Duration::from_millis(35));
        tick_loop.step();
        // one slow tick covers more than a nominal 20 ms
        assert!(tick_loop.clock_ms >= 35);
    }

    #[test]
    fn run_stops_at_max_ticks() {
        let config = TickConfig {
            tps: 1000,
            max_ticks: 10,
        };
        let mut tick_loop = TickLoop::new(config, Recorder::default());
        let metrics = tick_loop.run();
        assert_eq!(metrics.len(), 10);
        assert_eq!(tick_loop.current_tick, 10);
        let seen = &tick_loop.sim.seen;
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        // nine full sleeps precede the last step
        assert!(seen.last().is_some_and(|last| *last >= 9));
    }

    #[test]
    fn step_report_accumulates() {
        let mut total = StepReport::default();
        total += StepReport {
            timers_fired: 2,
            frames_flushed: 3,
            entity_count: 4,
        };
        total += StepReport {
            timers_fired: 1,
            frames_flushed: 1,
            entity_count: 1,
        };
        assert_eq!(total.timers_fired, 3);
        assert_eq!(total.frames_flushed, 4);
        assert_eq!(total.entity_count, 5);
    }
}
