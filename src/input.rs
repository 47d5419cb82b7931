use anyhow::Result;
use gilrs::{Axis, Button, Event, EventType, Gilrs};
use std::thread;
use std::time::Duration;

/// Rotation-enable button index.
pub const BUTTON_ROTATE: usize = 0;
/// Z-unlock button index.
pub const BUTTON_UNLOCK_Z: usize = 1;

const DEADZONE: f64 = 0.1;

/// 6-DoF input device. Reads are non-blocking point-in-time snapshots of the
/// latest state; the loop never assumes freshness beyond one cycle.
pub trait MotionDevice {
    /// Latest axis values, unit-normalized to [-1, 1]:
    /// `[tx, ty, tz, rx, ry, rz]`.
    fn motion_state(&mut self) -> Result<[f64; 6]>;

    fn is_button_pressed(&self, index: usize) -> bool;
}

/// Gamepad-backed motion device standing in for a SpaceMouse-class 6-DoF
/// puck.
///
/// Axis layout: left stick drives x/y translation, triggers drive z
/// (right minus left), right stick drives x/y rotation, d-pad drives z
/// rotation. South is the rotation-enable button, East the z-unlock button.
pub struct GamepadInput {
    gilrs: Gilrs,
    gamepad_id: Option<gilrs::GamepadId>,
    axes: [f64; 6],
    buttons: [bool; 2],
    left_trigger: f64,
    right_trigger: f64,
}

impl GamepadInput {
    pub fn new() -> Result<Self> {
        let gilrs = Gilrs::new()
            .map_err(|e| anyhow::anyhow!("Failed to initialize gamepad system: {}", e))?;

        Ok(Self {
            gilrs,
            gamepad_id: None,
            axes: [0.0; 6],
            buttons: [false; 2],
            left_trigger: 0.0,
            right_trigger: 0.0,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.gamepad_id.is_some()
    }

    /// Block until a gamepad is connected.
    pub fn wait_for_connection(&mut self) -> Result<()> {
        println!("Waiting for a gamepad to connect...");

        loop {
            for (_id, gamepad) in self.gilrs.gamepads() {
                if gamepad.is_connected() {
                    self.gamepad_id = Some(gamepad.id());
                    println!("Gamepad connected: {}", gamepad.name());
                    return Ok(());
                }
            }

            while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
                if let EventType::Connected = event {
                    self.gamepad_id = Some(id);
                    let name = self.gilrs.gamepad(id).name().to_string();
                    println!("Gamepad connected: {}", name);
                    return Ok(());
                }
            }

            thread::sleep(Duration::from_millis(100));
        }
    }

    fn update(&mut self) -> Result<()> {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if Some(id) != self.gamepad_id {
                continue;
            }

            match event {
                EventType::ButtonPressed(button, _) => self.set_button(button, true),
                EventType::ButtonReleased(button, _) => self.set_button(button, false),
                EventType::AxisChanged(axis, value, _) => {
                    let v = apply_deadzone(value as f64, DEADZONE);
                    match axis {
                        Axis::LeftStickY => self.axes[0] = v,
                        Axis::LeftStickX => self.axes[1] = -v,
                        // Triggers report -1..1 at rest..full; their
                        // difference drives the z translation axis.
                        Axis::LeftZ => {
                            self.left_trigger = (value as f64 + 1.0) / 2.0;
                            self.axes[2] = self.right_trigger - self.left_trigger;
                        }
                        Axis::RightZ => {
                            self.right_trigger = (value as f64 + 1.0) / 2.0;
                            self.axes[2] = self.right_trigger - self.left_trigger;
                        }
                        Axis::RightStickY => self.axes[3] = v,
                        Axis::RightStickX => self.axes[4] = v,
                        Axis::DPadX => self.axes[5] = v,
                        _ => {}
                    }
                }
                EventType::Disconnected => {
                    self.gamepad_id = None;
                    return Err(anyhow::anyhow!("Gamepad disconnected"));
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn set_button(&mut self, button: Button, pressed: bool) {
        match button {
            Button::South => self.buttons[BUTTON_ROTATE] = pressed,
            Button::East => self.buttons[BUTTON_UNLOCK_Z] = pressed,
            _ => {}
        }
    }
}

impl MotionDevice for GamepadInput {
    fn motion_state(&mut self) -> Result<[f64; 6]> {
        self.update()?;
        Ok(self.axes)
    }

    fn is_button_pressed(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }
}

/// Suppress stick noise around center and rescale the remaining range to
/// keep full deflection at 1.0.
pub fn apply_deadzone(value: f64, deadzone: f64) -> f64 {
    if value.abs() < deadzone {
        0.0
    } else {
        value.signum() * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadzone_zeroes_small_values_and_rescales_the_rest() {
        assert_eq!(apply_deadzone(0.05, 0.1), 0.0);
        assert_eq!(apply_deadzone(-0.09, 0.1), 0.0);
        assert_eq!(apply_deadzone(1.0, 0.1), 1.0);
        assert_eq!(apply_deadzone(-1.0, 0.1), -1.0);
        let mid = apply_deadzone(0.55, 0.1);
        assert!((mid - 0.5).abs() < 1e-12);
    }
}
