use crate::pose::Pose;
use anyhow::{bail, Result};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch. The actuator driver and episode recorder run
/// as separate processes and compare command timestamps against their own
/// wall clocks, so this is the hand-off timestamp convention.
pub type WallTime = f64;

/// Convert a monotonic instant into the wall-clock domain using a freshly
/// sampled (monotonic, wall) pair. Wall-clock deadlines are never stored;
/// conversion happens only at the hand-off boundary.
pub fn wall_time_at(instant: Instant) -> WallTime {
    let mono_now = Instant::now();
    let wall_now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64();
    if instant >= mono_now {
        wall_now + (instant - mono_now).as_secs_f64()
    } else {
        wall_now - (mono_now - instant).as_secs_f64()
    }
}

/// External environment: actuator driver plus episode recorder.
///
/// Every call is synchronous. A failure means the actuator contract is
/// broken and there is no safe partial state, so errors propagate up and
/// terminate the control loop.
pub trait Environment {
    /// Current commanded target pose of the robot, used to seed the
    /// integrator at loop start.
    fn robot_state(&mut self) -> Result<Pose>;

    /// Pull the latest observation batch so episode timestamps and stage
    /// labels are computed against fresh state.
    fn pump_observations(&mut self) -> Result<()>;

    /// Submit a command list to the trajectory servo. `timestamps` are the
    /// wall-clock instants at which each pose should take effect.
    fn exec_actions(
        &mut self,
        poses: &[Pose],
        timestamps: &[WallTime],
        stages: &[u32],
    ) -> Result<()>;

    fn start_episode(&mut self, start_time: WallTime) -> Result<()>;
    fn end_episode(&mut self) -> Result<()>;
    fn drop_episode(&mut self) -> Result<()>;

    /// Number of completed episodes, for the status display.
    fn episode_count(&self) -> usize;
}

/// Stand-in environment so the runtime and the diagnostic binaries run
/// without actuator hardware. Commands are accepted and traced, episodes are
/// counted, nothing is persisted.
pub struct SimEnvironment {
    target: Pose,
    episodes: usize,
    recording: bool,
}

impl SimEnvironment {
    pub fn new(initial: Pose) -> Self {
        Self {
            target: initial,
            episodes: 0,
            recording: false,
        }
    }
}

impl Default for SimEnvironment {
    fn default() -> Self {
        Self::new(Pose::identity())
    }
}

impl Environment for SimEnvironment {
    fn robot_state(&mut self) -> Result<Pose> {
        Ok(self.target)
    }

    fn pump_observations(&mut self) -> Result<()> {
        Ok(())
    }

    fn exec_actions(
        &mut self,
        poses: &[Pose],
        timestamps: &[WallTime],
        stages: &[u32],
    ) -> Result<()> {
        if poses.len() != timestamps.len() || poses.len() != stages.len() {
            bail!(
                "mismatched command list lengths: {} poses, {} timestamps, {} stages",
                poses.len(),
                timestamps.len(),
                stages.len()
            );
        }
        if let Some(pose) = poses.last() {
            self.target = *pose;
            log::trace!(
                "exec_actions: pos=[{:.4}, {:.4}, {:.4}] ts={:.3} stage={}",
                pose.position.x,
                pose.position.y,
                pose.position.z,
                timestamps[timestamps.len() - 1],
                stages[stages.len() - 1],
            );
        }
        Ok(())
    }

    fn start_episode(&mut self, start_time: WallTime) -> Result<()> {
        if self.recording {
            bail!("start_episode called while already recording");
        }
        self.recording = true;
        log::debug!("episode {} started at wall time {:.3}", self.episodes, start_time);
        Ok(())
    }

    fn end_episode(&mut self) -> Result<()> {
        if !self.recording {
            bail!("end_episode called while not recording");
        }
        self.recording = false;
        self.episodes += 1;
        Ok(())
    }

    fn drop_episode(&mut self) -> Result<()> {
        if !self.recording {
            bail!("drop_episode called while not recording");
        }
        self.recording = false;
        Ok(())
    }

    fn episode_count(&self) -> usize {
        self.episodes
    }
}
