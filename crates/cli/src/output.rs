//! CLI output formatting utilities.
//!
//! Colored status lines for stage results, human-readable sizes and
//! durations, and JSON output for `--output json`.

use std::time::Duration;

use anyhow::Context;
use buildpack_lib::pipeline::{StageReport, StageStatus};
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
}

/// Shorten a commit id for display.
pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  hash.get(..len).unwrap_or(hash)
}

/// Size of a buildpack file, in binary units.
pub fn format_bytes(bytes: u64) -> String {
  const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

  if bytes < 1024 {
    return format!("{} B", bytes);
  }
  let mut value = bytes as f64 / 1024.0;
  let mut unit = UNITS[0];
  for next in &UNITS[1..] {
    if value < 1024.0 {
      break;
    }
    value /= 1024.0;
    unit = *next;
  }
  format!("{:.1} {}", value, unit)
}

/// Wall time of a stage or run: `850ms`, `12.4s`, `3m07s`.
pub fn format_duration(duration: Duration) -> String {
  let millis = duration.as_millis();
  if millis < 1000 {
    return format!("{}ms", millis);
  }
  let secs = duration.as_secs();
  if secs < 60 {
    format!("{:.1}s", duration.as_secs_f64())
  } else {
    format!("{}m{:02}s", secs / 60, secs % 60)
  }
}

/// One line per stage: a status symbol, the stage name and how it ended.
///
/// When output lines were dropped from the report a note says how many.
pub fn print_stage(stage: &StageReport) {
  let elapsed = format_duration(stage.duration);
  match &stage.status {
    StageStatus::Succeeded => print_success(&format!("{} {} ({})", stage.stage, symbols::ARROW, elapsed)),
    StageStatus::NoCommand => print_info(&format!("{} {} no command", stage.stage, symbols::ARROW)),
    StageStatus::Skipped => print_warning(&format!("{} {} skipped", stage.stage, symbols::ARROW)),
    StageStatus::Failed { message, .. } => {
      print_error(&format!("{} {} {} ({})", stage.stage, symbols::ARROW, message, elapsed))
    }
  }

  let dropped = stage.output.stdout_dropped + stage.output.stderr_dropped;
  if dropped > 0 {
    print_stat("Output", &format!("{} earlier line(s) not kept in the report", dropped));
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
