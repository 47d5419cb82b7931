use crate::dispatch::CommandDispatcher;
use crate::env::Environment;
use crate::episode::{EpisodeEvent, EpisodeMachine, Outcome, Prompt};
use crate::input::{MotionDevice, BUTTON_ROTATE, BUTTON_UNLOCK_Z};
use crate::keys::{KeySource, STAGE_KEY};
use crate::motion::{MotionMapper, MotionSample};
use crate::pose::PoseIntegrator;
use crate::scheduler::{CycleDeadlines, CycleScheduler};
use anyhow::Result;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Control loop parameters.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Control frequency in Hz.
    pub frequency: f64,
    /// Delay between sampling the input device and the command taking effect
    /// on the actuator, in seconds.
    pub command_latency: f64,
    /// Maximum translation speed in m/s.
    pub max_pos_speed: f64,
    /// Maximum rotation speed in rad/s.
    pub max_rot_speed: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frequency: 10.0,
            command_latency: 0.05,
            max_pos_speed: 0.25,
            max_rot_speed: 0.6,
        }
    }
}

/// Single-threaded teleoperation loop tying the components together.
///
/// Per cycle: compute deadlines, pump observations, drain key events, wait
/// until the sample instant, read the device, map and integrate, dispatch
/// with a latency-compensated timestamp, wait until cycle end.
pub struct Runtime<E, D, K, P>
where
    E: Environment,
    D: MotionDevice,
    K: KeySource,
    P: Prompt,
{
    dispatcher: CommandDispatcher<E>,
    device: D,
    keys: K,
    prompt: P,
    mapper: MotionMapper,
    integrator: PoseIntegrator,
    episodes: EpisodeMachine,
    config: RuntimeConfig,
}

impl<E, D, K, P> Runtime<E, D, K, P>
where
    E: Environment,
    D: MotionDevice,
    K: KeySource,
    P: Prompt,
{
    /// Build the runtime, seeding the integrator from the actuator driver's
    /// current target pose.
    pub fn new(config: RuntimeConfig, env: E, device: D, keys: K, prompt: P) -> Result<Self> {
        let mut dispatcher = CommandDispatcher::new(env);
        let initial = dispatcher.initial_pose()?;

        Ok(Self {
            dispatcher,
            device,
            keys,
            prompt,
            mapper: MotionMapper::new(config.max_pos_speed, config.max_rot_speed, config.frequency),
            integrator: PoseIntegrator::new(initial),
            episodes: EpisodeMachine::new(),
            config,
        })
    }

    /// Run the loop until Quit, Ctrl-C, or a fatal environment error.
    pub fn run(&mut self, shutdown: Arc<AtomicBool>) -> Result<()> {
        let period = Duration::from_secs_f64(1.0 / self.config.frequency);
        let latency = Duration::from_secs_f64(self.config.command_latency);
        let mut scheduler = CycleScheduler::new(period, latency);

        let cycles_per_report = (self.config.frequency.round() as u64).max(1);
        let mut body_total = Duration::ZERO;
        let mut body_max = Duration::ZERO;
        let mut idx: u64 = 0;

        while !shutdown.load(Ordering::SeqCst) {
            let deadlines = scheduler.deadlines(idx);
            let body_start = Instant::now();

            if !self.cycle(&mut scheduler, &deadlines)? {
                break;
            }

            let elapsed = body_start.elapsed();
            body_total += elapsed;
            body_max = body_max.max(elapsed);
            idx += 1;

            if idx % cycles_per_report == 0 {
                log::debug!(
                    "cycle {}: avg body {:.2} ms, max body {:.2} ms, overruns {}",
                    idx,
                    (body_total / idx as u32).as_secs_f64() * 1e3,
                    body_max.as_secs_f64() * 1e3,
                    scheduler.overruns(),
                );
            }
        }

        print!("\r\n");
        Ok(())
    }

    /// One full cycle, including both scheduler waits. Returns false when
    /// the operator asked to quit; the quit cycle still runs to completion
    /// (no mid-cycle abort), the loop exits at the next iteration boundary.
    fn cycle(&mut self, scheduler: &mut CycleScheduler, deadlines: &CycleDeadlines) -> Result<bool> {
        self.dispatcher.pump_observations()?;

        let keep_going = self.drain_events(deadlines)?;

        let stage = self.keys.hold_count(STAGE_KEY);
        self.print_status(stage);

        scheduler.wait_until(deadlines.sample);

        let axes = self.device.motion_state()?;
        let sample = MotionSample {
            axes,
            rotate: self.device.is_button_pressed(BUTTON_ROTATE),
            unlock_z: self.device.is_button_pressed(BUTTON_UNLOCK_Z),
        };
        let delta = self.mapper.map(&sample);
        self.integrator.apply(&delta);

        self.dispatcher
            .dispatch(self.integrator.pose(), deadlines.command_target, stage)?;

        scheduler.wait_until(deadlines.cycle_end);
        Ok(keep_going)
    }

    /// Drain pending key events in arrival order. Returns false on Quit.
    fn drain_events(&mut self, deadlines: &CycleDeadlines) -> Result<bool> {
        for key in self.keys.poll_events() {
            let Some(event) = EpisodeEvent::from_key(key) else {
                continue;
            };

            // An episode started now aligns its first sample with the command
            // taking effect two cycles ahead, i.e. this cycle's command
            // target instant.
            let outcome = self.episodes.apply(
                event,
                &mut self.dispatcher,
                &mut self.prompt,
                deadlines.command_target,
            )?;

            match outcome {
                Outcome::Quit => return Ok(false),
                Outcome::Transitioned => {
                    self.keys.clear();
                    let message = match event {
                        EpisodeEvent::Start => "Recording!",
                        EpisodeEvent::Stop => "Stopped.",
                        EpisodeEvent::Drop => "Episode dropped.",
                        EpisodeEvent::Quit => unreachable!(),
                    };
                    print!("{}\r\n", message);
                }
                Outcome::Unchanged => {}
            }
        }
        Ok(true)
    }

    fn print_status(&self, stage: u32) {
        let mut text = format!(
            "Episode: {}, Stage: {}",
            self.dispatcher.episode_count(),
            stage
        );
        if self.episodes.is_recording() {
            text += ", Recording!";
        }
        // Rewrite in place; the terminal is in raw mode.
        print!("\r{}\x1b[K", text);
        let _ = io::stdout().flush();
    }
}
