use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A key press as seen by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Backspace,
}

/// Modifier key whose press count becomes the stage label on every
/// dispatched command.
pub const STAGE_KEY: Key = Key::Char(' ');

/// Keyboard event source. The producer runs outside the control loop and the
/// loop drains it once per cycle; both reads are non-blocking snapshots.
pub trait KeySource {
    /// Drain pending press events in arrival order.
    fn poll_events(&mut self) -> Vec<Key>;

    /// Discard pending events and zero all press counters.
    fn clear(&mut self);

    /// Press count for `key` accumulated since the last `clear`.
    fn hold_count(&self, key: Key) -> u32;
}

#[derive(Default)]
struct Shared {
    events: Vec<Key>,
    counts: HashMap<Key, u32>,
}

/// Terminal-backed key source: a listener thread drains raw-mode terminal
/// events into a shared buffer of presses and per-key counters.
pub struct KeystrokeCounter {
    shared: Arc<Mutex<Shared>>,
    running: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
}

impl KeystrokeCounter {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode().context("failed to enable raw terminal mode")?;

        let shared = Arc::new(Mutex::new(Shared::default()));
        let running = Arc::new(AtomicBool::new(true));

        let thread_shared = shared.clone();
        let thread_running = running.clone();
        let listener = thread::spawn(move || {
            while thread_running.load(Ordering::Relaxed) {
                if !event::poll(Duration::from_millis(20)).unwrap_or(false) {
                    continue;
                }
                let Ok(Event::Key(key)) = event::read() else {
                    continue;
                };
                if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    continue;
                }
                let mapped = match key.code {
                    // Raw mode swallows SIGINT; ^C arrives here as a key
                    // event and maps to the quit key.
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        Some(Key::Char('q'))
                    }
                    KeyCode::Char(c) => Some(Key::Char(c)),
                    KeyCode::Backspace => Some(Key::Backspace),
                    _ => None,
                };
                if let Some(k) = mapped {
                    if let Ok(mut state) = thread_shared.lock() {
                        state.events.push(k);
                        *state.counts.entry(k).or_insert(0) += 1;
                    }
                }
            }
        });

        Ok(Self {
            shared,
            running,
            listener: Some(listener),
        })
    }
}

impl KeySource for KeystrokeCounter {
    fn poll_events(&mut self) -> Vec<Key> {
        match self.shared.lock() {
            Ok(mut state) => std::mem::take(&mut state.events),
            Err(_) => Vec::new(),
        }
    }

    fn clear(&mut self) {
        if let Ok(mut state) = self.shared.lock() {
            state.events.clear();
            state.counts.clear();
        }
    }

    fn hold_count(&self, key: Key) -> u32 {
        self.shared
            .lock()
            .map(|state| state.counts.get(&key).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl Drop for KeystrokeCounter {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.listener.take() {
            let _ = handle.join();
        }
        let _ = terminal::disable_raw_mode();
    }
}
