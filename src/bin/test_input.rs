use anyhow::Result;
use std::thread;
use std::time::Duration;
use teleop_runtime::input::{GamepadInput, MotionDevice, BUTTON_ROTATE, BUTTON_UNLOCK_Z};

const AXIS_NAMES: [&str; 6] = ["tx", "ty", "tz", "rx", "ry", "rz"];

fn format_bar(value: f64, width: usize) -> String {
    let normalized = ((value + 1.0) / 2.0).clamp(0.0, 1.0);
    let filled = (normalized * width as f64) as usize;
    let bar: String = (0..width)
        .map(|i| if i < filled { '█' } else { '░' })
        .collect();
    format!("[{}] {:6.2}", bar, value)
}

fn main() -> Result<()> {
    println!("=== Motion Device Monitor ===\n");

    let mut device = GamepadInput::new()?;
    device.wait_for_connection()?;
    println!("Streaming mapped axes at 10 Hz, Ctrl+C to exit.\n");

    loop {
        let axes = device.motion_state()?;

        // Clear screen and redraw
        print!("\x1B[2J\x1B[1;1H");
        println!("Mapped 6-DoF axes ([-1, 1]):\n");
        for (name, value) in AXIS_NAMES.iter().zip(axes.iter()) {
            println!("  {}  {}", name, format_bar(*value, 30));
        }
        println!();
        println!(
            "  rotation-enable: {}",
            if device.is_button_pressed(BUTTON_ROTATE) { "PRESSED" } else { "released" }
        );
        println!(
            "  z-unlock:        {}",
            if device.is_button_pressed(BUTTON_UNLOCK_Z) { "PRESSED" } else { "released" }
        );

        thread::sleep(Duration::from_millis(100));
    }
}
