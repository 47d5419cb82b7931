use spin_sleep::SpinSleeper;
use std::time::{Duration, Instant};

/// Absolute time instants for one control cycle.
///
/// All four are derived arithmetically from the scheduler anchor, the fixed
/// period, and the cycle index. Wait jitter never feeds back into them, so
/// deadlines cannot drift.
#[derive(Debug, Clone, Copy)]
pub struct CycleDeadlines {
    /// Start of this cycle.
    pub cycle_start: Instant,
    /// Instant at which the input device is sampled (cycle end minus the
    /// configured command latency, absorbing processing time before the read).
    pub sample: Instant,
    /// Instant at which the dispatched command should take effect on the
    /// actuator (one period past the cycle end).
    pub command_target: Instant,
    /// End of this cycle.
    pub cycle_end: Instant,
}

/// Paces the control loop against a monotonic anchor.
///
/// Overruns are absorbed by deadline slip: a late cycle proceeds to the next
/// index-based deadline instead of bursting to catch up.
pub struct CycleScheduler {
    anchor: Instant,
    period: Duration,
    command_latency: Duration,
    sleeper: SpinSleeper,
    overruns: u64,
}

impl CycleScheduler {
    pub fn new(period: Duration, command_latency: Duration) -> Self {
        Self {
            anchor: Instant::now(),
            period,
            command_latency,
            sleeper: SpinSleeper::default(),
            overruns: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of wait calls that were asked to wait until a past instant.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// `cycles` whole periods as an exact duration, valid for the full
    /// index range (Duration multiplication only takes a u32).
    fn periods(&self, cycles: u64) -> Duration {
        Duration::from_nanos(self.period.as_nanos() as u64 * cycles)
    }

    /// Compute the absolute deadlines for cycle `idx`.
    pub fn deadlines(&self, idx: u64) -> CycleDeadlines {
        let cycle_start = self.anchor + self.periods(idx);
        let cycle_end = self.anchor + self.periods(idx + 1);
        CycleDeadlines {
            cycle_start,
            sample: cycle_end - self.command_latency,
            command_target: cycle_end + self.period,
            cycle_end,
        }
    }

    /// Block until the absolute instant `target`.
    ///
    /// Never returns early. A target already in the past returns immediately
    /// and is counted as an overrun; the loop then slips to the next
    /// index-based deadline rather than falling further behind.
    pub fn wait_until(&mut self, target: Instant) {
        let now = Instant::now();
        if now >= target {
            self.overruns += 1;
            log::warn!(
                "cycle overrun: deadline missed by {:.3} ms",
                (now - target).as_secs_f64() * 1e3
            );
            return;
        }
        self.sleeper.sleep(target - now);
    }
}
