use crate::dispatch::CommandDispatcher;
use crate::env::Environment;
use crate::keys::Key;
use anyhow::Result;
use crossterm::terminal;
use std::io::{self, BufRead, Write};
use std::time::Instant;

/// Recording lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}

/// Discrete operator command, translated from a raw key press. Consumed
/// once, never replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeEvent {
    Start,
    Stop,
    Drop,
    Quit,
}

impl EpisodeEvent {
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Char('c') => Some(Self::Start),
            Key::Char('s') => Some(Self::Stop),
            Key::Char('q') => Some(Self::Quit),
            Key::Backspace => Some(Self::Drop),
            _ => None,
        }
    }
}

/// What handling one event did to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Event was a no-op in the current state (tolerates double presses).
    Unchanged,
    /// Recording state changed; the stage counter must be reset.
    Transitioned,
    /// Orderly shutdown requested.
    Quit,
}

/// Asks the operator to confirm destructive actions.
pub trait Prompt {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Blocking y/N prompt on the controlling terminal. Raw mode is suspended
/// for the duration so line input works.
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&mut self, question: &str) -> bool {
        let _ = terminal::disable_raw_mode();
        print!("{} [y/N] ", question);
        let _ = io::stdout().flush();
        let mut line = String::new();
        let read_ok = io::stdin().lock().read_line(&mut line).is_ok();
        let _ = terminal::enable_raw_mode();
        read_ok && matches!(line.trim(), "y" | "Y" | "yes")
    }
}

/// Segments continuous operator input into discrete, labeled episodes.
///
/// Episode boundary calls go through the dispatcher so their timestamps are
/// converted to wall time at the hand-off boundary, and are made at most once
/// per event. Invalid transitions (Stop/Drop while idle, Start while
/// recording) are silent no-ops.
pub struct EpisodeMachine {
    state: RecordingState,
}

impl EpisodeMachine {
    pub fn new() -> Self {
        Self {
            state: RecordingState::Idle,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    /// Handle one event. `episode_start` is the monotonic instant the
    /// recorder's first sample should align with: two cycles ahead of the
    /// triggering cycle, so it matches an actuator command already in flight.
    pub fn apply<E: Environment, P: Prompt>(
        &mut self,
        event: EpisodeEvent,
        dispatcher: &mut CommandDispatcher<E>,
        prompt: &mut P,
        episode_start: Instant,
    ) -> Result<Outcome> {
        match (event, self.state) {
            (EpisodeEvent::Quit, _) => Ok(Outcome::Quit),

            (EpisodeEvent::Start, RecordingState::Idle) => {
                dispatcher.start_episode_at(episode_start)?;
                self.state = RecordingState::Recording;
                Ok(Outcome::Transitioned)
            }
            (EpisodeEvent::Start, RecordingState::Recording) => Ok(Outcome::Unchanged),

            (EpisodeEvent::Stop, RecordingState::Recording) => {
                dispatcher.end_episode()?;
                self.state = RecordingState::Idle;
                Ok(Outcome::Transitioned)
            }
            (EpisodeEvent::Stop, RecordingState::Idle) => Ok(Outcome::Unchanged),

            (EpisodeEvent::Drop, RecordingState::Recording) => {
                if prompt.confirm("Are you sure to drop an episode?") {
                    dispatcher.drop_episode()?;
                    self.state = RecordingState::Idle;
                    Ok(Outcome::Transitioned)
                } else {
                    Ok(Outcome::Unchanged)
                }
            }
            (EpisodeEvent::Drop, RecordingState::Idle) => Ok(Outcome::Unchanged),
        }
    }
}

impl Default for EpisodeMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::WallTime;
    use crate::pose::Pose;

    /// Records every recorder call; episode boundary trait methods only.
    #[derive(Default)]
    struct CountingEnv {
        starts: Vec<WallTime>,
        ends: u32,
        drops: u32,
    }

    impl Environment for CountingEnv {
        fn robot_state(&mut self) -> Result<Pose> {
            Ok(Pose::identity())
        }
        fn pump_observations(&mut self) -> Result<()> {
            Ok(())
        }
        fn exec_actions(&mut self, _: &[Pose], _: &[WallTime], _: &[u32]) -> Result<()> {
            Ok(())
        }
        fn start_episode(&mut self, t: WallTime) -> Result<()> {
            self.starts.push(t);
            Ok(())
        }
        fn end_episode(&mut self) -> Result<()> {
            self.ends += 1;
            Ok(())
        }
        fn drop_episode(&mut self) -> Result<()> {
            self.drops += 1;
            Ok(())
        }
        fn episode_count(&self) -> usize {
            self.ends as usize
        }
    }

    struct FixedPrompt {
        answer: bool,
        asked: u32,
    }

    impl Prompt for FixedPrompt {
        fn confirm(&mut self, _: &str) -> bool {
            self.asked += 1;
            self.answer
        }
    }

    fn setup() -> (EpisodeMachine, CommandDispatcher<CountingEnv>, FixedPrompt) {
        (
            EpisodeMachine::new(),
            CommandDispatcher::new(CountingEnv::default()),
            FixedPrompt {
                answer: true,
                asked: 0,
            },
        )
    }

    fn apply(
        machine: &mut EpisodeMachine,
        dispatcher: &mut CommandDispatcher<CountingEnv>,
        prompt: &mut FixedPrompt,
        event: EpisodeEvent,
    ) -> Outcome {
        machine
            .apply(event, dispatcher, prompt, Instant::now())
            .unwrap()
    }

    #[test]
    fn double_start_starts_exactly_one_episode() {
        let (mut machine, mut dispatcher, mut prompt) = setup();
        assert_eq!(
            apply(&mut machine, &mut dispatcher, &mut prompt, EpisodeEvent::Start),
            Outcome::Transitioned
        );
        assert_eq!(
            apply(&mut machine, &mut dispatcher, &mut prompt, EpisodeEvent::Start),
            Outcome::Unchanged
        );
        assert_eq!(dispatcher.env().starts.len(), 1);
        assert_eq!(machine.state(), RecordingState::Recording);
    }

    #[test]
    fn stop_while_idle_is_a_silent_no_op() {
        let (mut machine, mut dispatcher, mut prompt) = setup();
        assert_eq!(
            apply(&mut machine, &mut dispatcher, &mut prompt, EpisodeEvent::Stop),
            Outcome::Unchanged
        );
        assert_eq!(dispatcher.env().ends, 0);
        assert_eq!(machine.state(), RecordingState::Idle);
    }

    #[test]
    fn drop_while_idle_never_prompts() {
        let (mut machine, mut dispatcher, mut prompt) = setup();
        assert_eq!(
            apply(&mut machine, &mut dispatcher, &mut prompt, EpisodeEvent::Drop),
            Outcome::Unchanged
        );
        assert_eq!(prompt.asked, 0);
        assert_eq!(dispatcher.env().drops, 0);
    }

    #[test]
    fn declined_drop_keeps_recording() {
        let (mut machine, mut dispatcher, mut prompt) = setup();
        prompt.answer = false;
        apply(&mut machine, &mut dispatcher, &mut prompt, EpisodeEvent::Start);
        assert_eq!(
            apply(&mut machine, &mut dispatcher, &mut prompt, EpisodeEvent::Drop),
            Outcome::Unchanged
        );
        assert_eq!(prompt.asked, 1);
        assert_eq!(dispatcher.env().drops, 0);
        assert!(machine.is_recording());
    }

    #[test]
    fn confirmed_drop_returns_to_idle() {
        let (mut machine, mut dispatcher, mut prompt) = setup();
        apply(&mut machine, &mut dispatcher, &mut prompt, EpisodeEvent::Start);
        assert_eq!(
            apply(&mut machine, &mut dispatcher, &mut prompt, EpisodeEvent::Drop),
            Outcome::Transitioned
        );
        assert_eq!(dispatcher.env().drops, 1);
        assert_eq!(machine.state(), RecordingState::Idle);
    }

    #[test]
    fn quit_terminates_from_any_state() {
        let (mut machine, mut dispatcher, mut prompt) = setup();
        assert_eq!(
            apply(&mut machine, &mut dispatcher, &mut prompt, EpisodeEvent::Quit),
            Outcome::Quit
        );
        apply(&mut machine, &mut dispatcher, &mut prompt, EpisodeEvent::Start);
        assert_eq!(
            apply(&mut machine, &mut dispatcher, &mut prompt, EpisodeEvent::Quit),
            Outcome::Quit
        );
    }

    #[test]
    fn key_translation_matches_operator_bindings() {
        assert_eq!(EpisodeEvent::from_key(Key::Char('c')), Some(EpisodeEvent::Start));
        assert_eq!(EpisodeEvent::from_key(Key::Char('s')), Some(EpisodeEvent::Stop));
        assert_eq!(EpisodeEvent::from_key(Key::Char('q')), Some(EpisodeEvent::Quit));
        assert_eq!(EpisodeEvent::from_key(Key::Backspace), Some(EpisodeEvent::Drop));
        assert_eq!(EpisodeEvent::from_key(Key::Char(' ')), None);
    }
}
