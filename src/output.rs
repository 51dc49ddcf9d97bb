use colored::*;
use std::time::{Duration, Instant};

use servo_hand::calibration::{CalibrationEvent, CalibrationSession, CalibrationState};
use servo_hand::command::OperatorCommand;
use servo_hand::controller::{CommandOutcome, Step};
use servo_hand::types::ServoAngleSet;

/// Operator-facing terminal output: prompts, completion notices and a
/// throttled angle readout.
pub struct TerminalOutput {
    last_state: Option<CalibrationState>,
    last_angles_at: Option<Instant>,
    angle_period: Duration,
}

impl TerminalOutput {
    pub fn new(angle_period: Duration) -> Self {
        Self {
            last_state: None,
            last_angles_at: None,
            angle_period,
        }
    }

    pub fn menu(&self) {
        eprintln!("{}", OperatorCommand::menu().green());
    }

    pub fn show(&mut self, step: &Step, session: &CalibrationSession, now: Instant) {
        for outcome in &step.commands {
            match outcome {
                CommandOutcome::Started(_) | CommandOutcome::Quit => {}
                CommandOutcome::Ignored(target) => {
                    eprintln!("{}", format!("Busy, '{}' ignored", target).yellow())
                }
                CommandOutcome::Cleared => eprintln!("{}", "Calibration data cleared".yellow()),
            }
        }

        let state = session.state();
        if self.last_state.map(|s| s.target()) != Some(state.target()) {
            if let Some(prompt) = session.prompt() {
                eprintln!("{}", prompt.green());
            }
            self.last_state = Some(state);
        }

        let Some(report) = &step.report else { return };
        if let CalibrationEvent::Captured { target, persisted } = report.calibration {
            eprintln!("{}", target.completion_message().green().bold());
            if !persisted {
                eprintln!("{}", "Calibration could not be saved".red());
            }
            self.menu();
        }

        if let Some(angles) = &report.angles {
            let due = self
                .last_angles_at
                .map_or(true, |t| now.saturating_duration_since(t) >= self.angle_period);
            if due {
                self.last_angles_at = Some(now);
                eprintln!("{}", format_angles(angles).blue());
            }
        }
    }
}

pub fn format_angles(angles: &ServoAngleSet) -> String {
    angles
        .iter()
        .map(|(channel, angle)| format!("{channel}: {angle:.1}"))
        .collect::<Vec<_>>()
        .join("  ")
}
