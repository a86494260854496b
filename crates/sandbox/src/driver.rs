use std::thread;
use std::time::{Duration, Instant};

use runtime::{SceneError, SceneWorld};
use tracing::{info, warn};

use crate::config::DriverConfig;

const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverReport {
    pub frames_run: u64,
    pub iterations: u64,
    pub dropped_backlog_ms: u64,
}

/// Drives an open world for the configured frame count at a fixed
/// timestep. With `realtime` off, every iteration advances exactly one
/// tick of simulated time; with it on, wall-clock time feeds the
/// accumulator and idle iterations sleep until the next tick is due.
pub fn run(config: &DriverConfig, world: &mut SceneWorld) -> Result<DriverReport, SceneError> {
    let target_tps = config.target_tps.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let max_ticks_per_iteration = config.max_ticks_per_iteration.max(1);
    let metrics_interval = Duration::from_millis(config.metrics_log_interval_ms.max(1));

    info!(
        frames = config.frames,
        target_tps,
        max_ticks_per_iteration,
        realtime = config.realtime,
        "driver_started"
    );

    let mut report = DriverReport::default();
    let mut accumulator = Duration::ZERO;
    let mut last_iteration = Instant::now();
    let mut metrics = TickMetrics::new(metrics_interval);

    while report.frames_run < config.frames {
        if config.realtime {
            let now = Instant::now();
            let raw_dt = now.saturating_duration_since(last_iteration);
            last_iteration = now;
            accumulator = accumulator.saturating_add(clamp_frame_delta(raw_dt, MAX_FRAME_DELTA));
        } else {
            accumulator = accumulator.saturating_add(fixed_dt);
        }

        let plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_iteration);
        accumulator = plan.remaining_accumulator;

        for _ in 0..plan.ticks_to_run {
            if report.frames_run >= config.frames {
                break;
            }
            let tick_start = Instant::now();
            world.run_frame()?;
            metrics.record_tick(tick_start.elapsed());
            report.frames_run += 1;
        }

        if plan.dropped_backlog > Duration::ZERO {
            report.dropped_backlog_ms += plan.dropped_backlog.as_millis() as u64;
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_iteration, "sim_clamp_triggered"
            );
        }
        report.iterations += 1;

        if let Some(snapshot) = metrics.maybe_snapshot(Instant::now()) {
            info!(
                tps = snapshot.tps,
                tick_time_ms = snapshot.tick_time_ms,
                frame = report.frames_run,
                live_instances = world.live_instance_count(),
                "loop_metrics"
            );
        }

        if config.realtime && plan.ticks_to_run == 0 {
            thread::sleep(fixed_dt.saturating_sub(accumulator));
        }
    }

    info!(
        frames = report.frames_run,
        iterations = report.iterations,
        "driver_finished"
    );
    Ok(report)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_iteration: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_iteration {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

#[derive(Debug)]
struct TickMetrics {
    interval_start: Instant,
    interval: Duration,
    ticks: u32,
    tick_time_sum: Duration,
}

#[derive(Debug, Clone, Copy)]
struct TickMetricsSnapshot {
    tps: f32,
    tick_time_ms: f32,
}

impl TickMetrics {
    fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            ticks: 0,
            tick_time_sum: Duration::ZERO,
        }
    }

    fn record_tick(&mut self, tick_time: Duration) {
        self.ticks = self.ticks.saturating_add(1);
        self.tick_time_sum = self.tick_time_sum.saturating_add(tick_time);
    }

    fn maybe_snapshot(&mut self, now: Instant) -> Option<TickMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let tick_time_ms = if self.ticks == 0 {
            0.0
        } else {
            (self.tick_time_sum.as_secs_f32() / self.ticks as f32) * 1000.0
        };

        let snapshot = TickMetricsSnapshot {
            tps: self.ticks as f32 / elapsed_seconds,
            tick_time_ms,
        };

        self.interval_start = now;
        self.ticks = 0;
        self.tick_time_sum = Duration::ZERO;

        Some(snapshot)
    }
}
