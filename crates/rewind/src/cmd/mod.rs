use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod demo;
pub mod listen;
pub mod version;

/// Default viewer address, shared by `listen` and `demo`.
pub const DEFAULT_ADDR: &str = "127.0.0.1:9111";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept one producer and print the frames it sends.
    Listen(ListenArgs),
    /// Connect to a viewer and stream a generated demo scene.
    Demo(DemoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Demo(args) => demo::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind (host:port).
    #[arg(env = "REWIND_LISTEN_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,
    /// Stop after printing N frames.
    #[arg(long)]
    pub count: Option<u64>,
    /// Do not print area descriptions.
    #[arg(long)]
    pub skip_areas: bool,
    /// Reject envelopes whose declared body exceeds this many bytes.
    #[arg(long, default_value_t = rewind_frame::DEFAULT_MAX_BODY)]
    pub max_body_size: usize,
    /// Fail if the producer stays silent this long (e.g. 30s, 500ms).
    #[arg(long)]
    pub read_timeout: Option<String>,
    /// Keep Nagle's algorithm enabled on the accepted connection.
    #[arg(long)]
    pub nagle: bool,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Viewer address to connect to (host:port).
    #[arg(env = "REWIND_LISTEN_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,
    /// Number of frames to send.
    #[arg(long, default_value_t = 10)]
    pub frames: u32,
    /// Delay between frames (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub interval: String,
    /// Give up on a send blocked longer than this (e.g. 5s, 500ms).
    #[arg(long)]
    pub write_timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }
}
