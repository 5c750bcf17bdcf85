use std::io;

use anyhow::Result;
use tracing::instrument;

use crate::cli::{Command, LogLevel, OutputFormat};
use crate::telemetry;

/// Runs a CLI command with default telemetry and pretty output.
///
/// ```
/// use clap::Parser;
///
/// let args = tuyadp::Args::try_parse_from([
///     "tuyadp",
///     "profile",
///     "--manufacturer",
///     "_TZE200_cwbvmsar",
///     "--driver-type",
///     "climate_sensor",
/// ])?;
/// let mut out = Vec::new();
/// tuyadp::run(args.into_command(), &mut out)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, the command input is
/// malformed, or output writing fails.
pub fn run<W>(command: Command, out: &mut W) -> Result<()>
where
    W: io::Write,
{
    run_with_options(command, out, None, None)
}

/// Runs a CLI command with explicit telemetry and output settings.
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, the command input is
/// malformed, or output writing fails.
#[instrument(
    skip(command, out),
    level = "info",
    fields(command = command_name(&command), ?log_level)
)]
pub fn run_with_options<W>(
    command: Command,
    out: &mut W,
    log_level: Option<LogLevel>,
    format: Option<OutputFormat>,
) -> Result<()>
where
    W: io::Write,
{
    telemetry::initialise_tracing(log_level.map(LogLevel::as_level_filter))?;
    let format = format.unwrap_or(OutputFormat::Pretty);

    match command {
        Command::Decode(args) => crate::cli::decode::run(&args, out, format),
        Command::Encode(args) => crate::cli::encode::run(&args, out, format),
        Command::Profile(args) => crate::cli::profile::run(&args, out, format),
        Command::Simulate(args) => crate::cli::simulate::run(&args, out, format),
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Decode(_args) => "decode",
        Command::Encode(_args) => "encode",
        Command::Profile(_args) => "profile",
        Command::Simulate(_args) => "simulate",
    }
}
