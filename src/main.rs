use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use teleop_runtime::env::SimEnvironment;
use teleop_runtime::episode::StdinPrompt;
use teleop_runtime::input::GamepadInput;
use teleop_runtime::keys::KeystrokeCounter;
use teleop_runtime::runtime::{Runtime, RuntimeConfig};

/// Real-time 6-DoF teleoperation runtime with episode recording control
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Control frequency in Hz
    #[arg(short, long, default_value_t = 10.0)]
    frequency: f64,

    /// Latency between sampling the input device and the command taking
    /// effect on the robot, in seconds
    #[arg(short = 'l', long, default_value_t = 0.05)]
    command_latency: f64,

    /// Maximum translation speed in m/s
    #[arg(long, default_value_t = 0.25)]
    max_pos_speed: f64,

    /// Maximum rotation speed in rad/s
    #[arg(long, default_value_t = 0.6)]
    max_rot_speed: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("=== Teleop Runtime ===");
    println!();
    println!("Robot movement:");
    println!("  Move the left stick to translate the end effector (locked in the xy plane).");
    println!("  Hold the East button to unlock the z axis (triggers drive z).");
    println!("  Hold the South button to enable the rotation axes (right stick + d-pad).");
    println!();
    println!("Recording control:");
    println!("  Press 'c' to start recording.");
    println!("  Press 's' to stop recording.");
    println!("  Press Backspace to drop the previously recorded episode.");
    println!("  Press Space to advance the stage label.");
    println!("  Press 'q' to exit.");
    println!();

    let mut device = GamepadInput::new().context("Failed to initialize input device")?;
    device.wait_for_connection()?;

    let config = RuntimeConfig {
        frequency: args.frequency,
        command_latency: args.command_latency,
        max_pos_speed: args.max_pos_speed,
        max_rot_speed: args.max_rot_speed,
    };

    // Stand-in for the external robot driver; a real deployment plugs its
    // Environment implementation in here.
    let env = SimEnvironment::default();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    println!("Ready!");

    // Enables raw mode; dropped last so the terminal is restored on exit.
    let keys = KeystrokeCounter::new()?;

    let mut runtime = Runtime::new(config, env, device, keys, StdinPrompt)?;
    runtime.run(shutdown)?;

    println!("Done.");
    Ok(())
}
