use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use std::time::Duration;
use tracing::{info, warn};

mod args;
mod output;

use args::{Args, SinkKind};
use output::TerminalOutput;
use servo_hand::actuator::{ActuatorSink, JsonLinesSink, LogSink};
use servo_hand::clock::{Clock, ManualClock, SystemClock};
use servo_hand::config::AppConfig;
use servo_hand::controller::HandController;
use servo_hand::error::Error;
use servo_hand::logging;
use servo_hand::ranges::CalibrationRanges;
use servo_hand::record::{RecordFile, RecordStore};
use servo_hand::source::{LandmarkSource, ReplayFile, SimulatedHand};
use servo_hand::types::Channel;

fn create_sink(kind: SinkKind, config: &AppConfig) -> Box<dyn ActuatorSink> {
    let pins = config.actuator.pins.clone();
    match kind {
        SinkKind::Log => Box::new(LogSink::new(pins)),
        SinkKind::Json => Box::new(JsonLinesSink::new(
            std::io::stdout(),
            pins,
            config.actuator.port.clone(),
        )),
    }
}

fn create_source(args: &Args, config: &AppConfig) -> Result<Box<dyn LandmarkSource>> {
    if let Some(path) = &args.replay {
        let source = ReplayFile::open(path)
            .with_context(|| format!("Failed to open replay {}", path.display()))?;
        return Ok(Box::new(source));
    }
    if args.simulate {
        return Ok(Box::new(SimulatedHand::new(
            config.input.frame_width,
            config.input.frame_height,
            config.tick_interval(),
        )));
    }
    bail!("No landmark source: pass --replay <file> or --simulate")
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 0. Logging, then config
    let log_level = logging::init("info");
    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    if let Some(level) = &log_level {
        level.apply(&config.log_level);
    }

    if let Some(index) = args.hand_index {
        config.input.hand_index = index;
    }
    if let Some(path) = &args.calibration_file {
        config.calibration.record_path = path.clone();
    }

    if args.list_channels {
        println!("{:<8} | {:<5} | {:<8}", "Channel", "Pin", "Firmata");
        println!("{}", "-".repeat(28));
        for channel in Channel::ALL {
            let pins = &config.actuator.pins;
            println!("{:<8} | {:<5} | {:<8}", channel, pins.pin(channel), pins.descriptor(channel));
        }
        return Ok(());
    }

    // 1. Calibration record
    let mut store = RecordFile::new(&config.calibration.record_path);
    if args.clear {
        store
            .save(&CalibrationRanges::new())
            .context("Failed to clear calibration record")?;
        eprintln!("{}", "Calibration data cleared".yellow());
    }

    // 2. Input and output
    let mut source = create_source(&args, &config)?;
    let sink = create_sink(args.sink, &config);
    info!(source = %source.name(), sink = %sink.name(), "starting");

    // Frames carrying timestamps drive the clock; the rest follow wall time.
    let clock = ManualClock::new();
    let wall = SystemClock;
    let started = wall.now();
    let mut controller = HandController::new(sink, store, config.controller_settings(), clock.now());

    let mut display = TerminalOutput::new(Duration::from_secs(1));
    display.menu();

    let pace = args.simulate.then(|| config.tick_interval());

    // 3. Loop
    loop {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("landmark source exhausted");
                break;
            }
            Err(Error::Source(msg)) => {
                warn!(error = %msg, "skipping unreadable frame");
                continue;
            }
            Err(e) => return Err(e).context("Landmark source failed"),
        };

        clock.set(frame.at.unwrap_or_else(|| wall.now().saturating_duration_since(started)));
        let now = clock.now();

        let step = controller.step(&frame, now);
        display.show(&step, controller.session(), now);
        if step.quit() {
            info!("quit requested");
            break;
        }

        if let Some(interval) = pace {
            std::thread::sleep(interval);
        }
    }

    controller.shutdown().context("Failed to release actuator")?;
    Ok(())
}
