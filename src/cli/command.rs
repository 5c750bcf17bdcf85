use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

use crate::profile::DeviceIdentity;

/// Command-line options for the Tuya DataPoint bridge tool.
#[derive(Debug, Parser)]
#[command(
    name = "tuyadp",
    about = "Decode, build, and simulate Tuya DataPoint cluster traffic."
)]
pub struct Args {
    /// Telemetry log-level override.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,
    /// Output format; defaults to pretty on terminals and JSON otherwise.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,
    #[command(subcommand)]
    command: Command,
}

impl Args {
    /// Creates argument values directly without CLI parsing.
    ///
    /// ```
    /// use tuyadp::{Args, Command, ProfileArgs, IdentityArgs};
    ///
    /// let args = Args::new(Command::Profile(ProfileArgs::new(IdentityArgs::new(
    ///     "_TZE200_cwbvmsar",
    ///     "TS0601",
    ///     "climate_sensor",
    /// ))));
    /// let _ = args;
    /// ```
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            log_level: None,
            format: None,
            command,
        }
    }

    /// Returns the telemetry log-level override.
    #[must_use]
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level
    }

    /// Returns the explicit output format, when one was passed.
    #[must_use]
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.format
    }

    /// Consumes the arguments into the selected command.
    #[must_use]
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Telemetry verbosity selected on the command line.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Returns the tracing filter for this level.
    #[must_use]
    pub fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }
}

/// Output rendering selected on the command line.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a hexadecimal cluster payload against a device identity.
    Decode(DecodeArgs),
    /// Build the outgoing cluster payload for one capability write.
    Encode(EncodeArgs),
    /// Print the resolved mapping table for a device identity.
    Profile(ProfileArgs),
    /// Run a timed event fixture through the command disambiguator.
    Simulate(SimulateArgs),
}

/// Device identity flags shared by identity-bound commands.
#[derive(Debug, ClapArgs)]
pub struct IdentityArgs {
    /// Zigbee manufacturer string, e.g. `_TZE200_cwbvmsar`.
    #[arg(long)]
    manufacturer: String,
    /// Zigbee model string.
    #[arg(long, default_value = "TS0601")]
    model: String,
    /// Platform driver-type hint, e.g. `motion_sensor`.
    #[arg(long, default_value = "")]
    driver_type: String,
}

impl IdentityArgs {
    /// Creates identity arguments directly without CLI parsing.
    #[must_use]
    pub fn new(
        manufacturer: impl Into<String>,
        model: impl Into<String>,
        driver_type: impl Into<String>,
    ) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
            driver_type: driver_type.into(),
        }
    }

    /// Builds the device identity these flags describe.
    #[must_use]
    pub fn to_identity(&self) -> DeviceIdentity {
        DeviceIdentity::new(&self.manufacturer, &self.model, &self.driver_type)
    }
}

/// Arguments for the `decode` command.
#[derive(Debug, ClapArgs)]
pub struct DecodeArgs {
    #[command(flatten)]
    identity: IdentityArgs,
    /// Frame bytes as hexadecimal, whitespace tolerated.
    payload: String,
    /// Virtual receive time in milliseconds past device start.
    #[arg(long, default_value_t = 0)]
    at_ms: u64,
    /// Capabilities the value-range heuristic may propose, comma separated.
    #[arg(long = "possible", value_delimiter = ',')]
    possible_capabilities: Vec<String>,
}

impl DecodeArgs {
    /// Creates decode arguments directly without CLI parsing.
    #[must_use]
    pub fn new(identity: IdentityArgs, payload: impl Into<String>) -> Self {
        Self {
            identity,
            payload: payload.into(),
            at_ms: 0,
            possible_capabilities: Vec::new(),
        }
    }

    pub(crate) fn identity(&self) -> &IdentityArgs {
        &self.identity
    }

    pub(crate) fn payload(&self) -> &str {
        &self.payload
    }

    pub(crate) fn at_ms(&self) -> u64 {
        self.at_ms
    }

    pub(crate) fn possible_capabilities(&self) -> &[String] {
        &self.possible_capabilities
    }
}

/// Arguments for the `encode` command.
#[derive(Debug, ClapArgs)]
pub struct EncodeArgs {
    #[command(flatten)]
    identity: IdentityArgs,
    /// Capability to write, e.g. `onoff`.
    #[arg(long)]
    capability: String,
    /// Sub-channel for multi-gang devices, e.g. `gang2`.
    #[arg(long)]
    channel: Option<String>,
    /// Value literal: `true`/`false`, a number, or text.
    #[arg(long)]
    value: String,
    /// Sequence number for the outgoing frame.
    #[arg(long, default_value_t = 0)]
    seq: u16,
}

impl EncodeArgs {
    /// Creates encode arguments directly without CLI parsing.
    #[must_use]
    pub fn new(
        identity: IdentityArgs,
        capability: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            capability: capability.into(),
            channel: None,
            value: value.into(),
            seq: 0,
        }
    }

    pub(crate) fn identity(&self) -> &IdentityArgs {
        &self.identity
    }

    pub(crate) fn capability(&self) -> &str {
        &self.capability
    }

    pub(crate) fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub(crate) fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn seq(&self) -> u16 {
        self.seq
    }
}

/// Arguments for the `profile` command.
#[derive(Debug, ClapArgs)]
pub struct ProfileArgs {
    #[command(flatten)]
    identity: IdentityArgs,
}

impl ProfileArgs {
    /// Creates profile arguments directly without CLI parsing.
    #[must_use]
    pub fn new(identity: IdentityArgs) -> Self {
        Self { identity }
    }

    pub(crate) fn identity(&self) -> &IdentityArgs {
        &self.identity
    }
}

/// Arguments for the `simulate` command.
#[derive(Debug, ClapArgs)]
pub struct SimulateArgs {
    /// Fixture records `t_ms|channel|on,off,app` separated by `;`.
    fixture: String,
    /// Application-echo suppression window (e.g. `2s`, `500ms`).
    #[arg(long, value_parser = parse_duration)]
    app_window: Option<Duration>,
    /// Click-finalize quiet period (e.g. `400ms`).
    #[arg(long, value_parser = parse_duration)]
    double_click_window: Option<Duration>,
    /// Long-press hold threshold (e.g. `600ms`).
    #[arg(long, value_parser = parse_duration)]
    long_press: Option<Duration>,
}

impl SimulateArgs {
    /// Creates simulate arguments directly without CLI parsing.
    #[must_use]
    pub fn new(fixture: impl Into<String>) -> Self {
        Self {
            fixture: fixture.into(),
            app_window: None,
            double_click_window: None,
            long_press: None,
        }
    }

    pub(crate) fn fixture(&self) -> &str {
        &self.fixture
    }

    pub(crate) fn app_window(&self) -> Option<Duration> {
        self.app_window
    }

    pub(crate) fn double_click_window(&self) -> Option<Duration> {
        self.double_click_window
    }

    pub(crate) fn long_press(&self) -> Option<Duration> {
        self.long_press
    }
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use clap::error::ErrorKind;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn decode_requires_a_manufacturer() {
        let result = Args::try_parse_from(["tuyadp", "decode", "0001020008"]);

        let error = result.expect_err("missing --manufacturer should fail argument parsing");
        assert_eq!(ErrorKind::MissingRequiredArgument, error.kind());
    }

    #[test]
    fn decode_parses_identity_and_payload() {
        let args = Args::try_parse_from([
            "tuyadp",
            "decode",
            "--manufacturer",
            "_TZE200_cwbvmsar",
            "--driver-type",
            "climate_sensor",
            "00 01 02 00 08",
        ])
        .expect("valid decode arguments should parse");

        let Command::Decode(decode) = args.into_command() else {
            panic!("decode subcommand should parse as Command::Decode");
        };
        assert_eq!("_TZE200_cwbvmsar", decode.identity().to_identity().manufacturer());
        assert_eq!("00 01 02 00 08", decode.payload());
    }

    #[test]
    fn simulate_rejects_malformed_durations() {
        let result = Args::try_parse_from([
            "tuyadp",
            "simulate",
            "--app-window",
            "soonish",
            "0|main|on",
        ]);

        let error = result.expect_err("bad duration should fail argument parsing");
        assert_eq!(ErrorKind::ValueValidation, error.kind());
    }

    #[test]
    fn simulate_parses_humantime_windows() {
        let args = Args::try_parse_from([
            "tuyadp",
            "simulate",
            "--app-window",
            "2s",
            "--long-press",
            "600ms",
            "0|main|on;700|main|off",
        ])
        .expect("valid simulate arguments should parse");

        let Command::Simulate(simulate) = args.into_command() else {
            panic!("simulate subcommand should parse as Command::Simulate");
        };
        assert_eq!(Some(Duration::from_secs(2)), simulate.app_window());
        assert_eq!(Some(Duration::from_millis(600)), simulate.long_press());
    }

    #[test]
    fn global_flags_parse_before_the_subcommand() {
        let args = Args::try_parse_from([
            "tuyadp",
            "--log-level",
            "debug",
            "--format",
            "json",
            "profile",
            "--manufacturer",
            "_TZ3000_ji4araar",
        ])
        .expect("valid global flags should parse");

        assert_eq!(Some(LogLevel::Debug), args.log_level());
        assert_eq!(Some(OutputFormat::Json), args.output_format());
        assert_matches!(args.into_command(), Command::Profile(_));
    }
}
