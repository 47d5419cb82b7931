use anyhow::Result;
use std::time::{Duration, Instant};
use teleop_runtime::scheduler::CycleScheduler;

// Test frequencies in Hz
const TEST_FREQUENCIES: [f64; 4] = [10.0, 50.0, 100.0, 250.0];
const CYCLES_PER_TEST: u64 = 200;

fn main() -> Result<()> {
    println!("=== Scheduler Jitter Test ===\n");
    println!("Measures how late wait_until() wakes relative to the absolute");
    println!("cycle deadline. Lateness captures systemic jitter; the wait");
    println!("primitive never wakes early.\n");

    for freq in TEST_FREQUENCIES {
        let period = Duration::from_secs_f64(1.0 / freq);
        let mut scheduler = CycleScheduler::new(period, Duration::ZERO);

        let mut max_late = Duration::ZERO;
        let mut total_late = Duration::ZERO;

        for idx in 0..CYCLES_PER_TEST {
            let deadline = scheduler.deadlines(idx).cycle_end;
            scheduler.wait_until(deadline);
            let late = Instant::now().saturating_duration_since(deadline);
            total_late += late;
            max_late = max_late.max(late);
        }

        println!(
            "{:6.0} Hz | avg lateness: {:8.2} us | max lateness: {:8.2} us | overruns: {}",
            freq,
            (total_late / CYCLES_PER_TEST as u32).as_secs_f64() * 1e6,
            max_late.as_secs_f64() * 1e6,
            scheduler.overruns(),
        );
    }

    Ok(())
}
