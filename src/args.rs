use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkKind {
    /// Log servo writes only
    Log,
    /// Print one JSON line per servo write on stdout
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (created with defaults if missing)
    #[arg(short, long, default_value = "servo_hand.json")]
    pub config: PathBuf,

    /// Replay landmark frames from a JSON-lines file ("-" for stdin)
    #[arg(long, conflicts_with = "simulate")]
    pub replay: Option<PathBuf>,

    /// Drive the controller with a synthetic hand
    #[arg(long)]
    pub simulate: bool,

    /// Which detected hand to follow (overrides config)
    #[arg(long)]
    pub hand_index: Option<usize>,

    /// Calibration record path (overrides config)
    #[arg(long)]
    pub calibration_file: Option<PathBuf>,

    /// Where servo angles go
    #[arg(long, value_enum, default_value_t = SinkKind::Log)]
    pub sink: SinkKind,

    /// Clear the stored calibration before starting
    #[arg(long, default_value_t = false)]
    pub clear: bool,

    /// List servo channels and their pins, then exit
    #[arg(long)]
    pub list_channels: bool,
}
