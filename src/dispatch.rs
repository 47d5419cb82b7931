use crate::env::{wall_time_at, Environment};
use crate::pose::Pose;
use anyhow::{Context, Result};
use std::time::Instant;

/// Hand-off boundary between the monotonic control loop and the wall-clock
/// consumers (actuator driver, episode recorder).
///
/// The loop paces itself on `Instant`s; everything crossing this boundary is
/// converted to wall time at submission, never earlier.
pub struct CommandDispatcher<E: Environment> {
    env: E,
}

impl<E: Environment> CommandDispatcher<E> {
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// Seed pose for the integrator, read from the actuator driver.
    pub fn initial_pose(&mut self) -> Result<Pose> {
        self.env
            .robot_state()
            .context("failed to read initial robot state")
    }

    /// Pull the latest observation batch at cycle start.
    pub fn pump_observations(&mut self) -> Result<()> {
        self.env
            .pump_observations()
            .context("failed to pump observations")
    }

    /// Package the integrated pose, compensated wall-clock timestamp, and
    /// stage label into a single-step command list.
    pub fn dispatch(&mut self, pose: &Pose, command_target: Instant, stage: u32) -> Result<()> {
        let timestamp = wall_time_at(command_target);
        self.env
            .exec_actions(std::slice::from_ref(pose), &[timestamp], &[stage])
            .context("failed to execute teleop command")
    }

    /// Begin an episode whose first sample aligns with the command already in
    /// flight at `start` (two cycles ahead of the triggering event).
    pub fn start_episode_at(&mut self, start: Instant) -> Result<()> {
        self.env
            .start_episode(wall_time_at(start))
            .context("failed to start episode")
    }

    pub fn end_episode(&mut self) -> Result<()> {
        self.env.end_episode().context("failed to end episode")
    }

    pub fn drop_episode(&mut self) -> Result<()> {
        self.env.drop_episode().context("failed to drop episode")
    }

    pub fn episode_count(&self) -> usize {
        self.env.episode_count()
    }

    pub fn env(&self) -> &E {
        &self.env
    }
}
