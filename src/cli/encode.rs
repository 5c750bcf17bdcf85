use std::io;

use anyhow::{Result, bail};
use serde::Serialize;
use tracing::instrument;

use crate::cli::command::{EncodeArgs, OutputFormat};
use crate::cli::ui::painter::Painter;
use crate::cli::ui::table::Table;
use crate::clock::MonotonicTime;
use crate::engine::{DeviceEngine, EngineConfig};
use crate::profile::CapabilityValue;
use crate::utils::format_hex;

#[derive(Serialize)]
struct EncodeReport<'a> {
    capability: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
    value: &'a CapabilityValue,
    payload: String,
}

/// Runs the `encode` command.
#[instrument(skip(args, out), level = "info")]
pub(crate) fn run<W>(args: &EncodeArgs, out: &mut W, format: OutputFormat) -> Result<()>
where
    W: io::Write,
{
    let config = EngineConfig::builder().initial_sequence(args.seq()).build();
    let mut engine = DeviceEngine::with_builtin_profiles(args.identity().to_identity(), config);

    let value = parse_value_literal(args.value());
    let Some(payload) = engine.build_outgoing(
        args.capability(),
        args.channel(),
        &value,
        MonotonicTime::default(),
    ) else {
        bail!(
            "capability `{}` is not mapped writable for manufacturer `{}`",
            args.capability(),
            engine.identity().manufacturer(),
        );
    };

    match format {
        OutputFormat::Json => {
            let report = EncodeReport {
                capability: args.capability(),
                channel: args.channel(),
                value: &value,
                payload: hex::encode(&payload),
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Pretty => {
            let painter = Painter::new(false);
            writeln!(out, "{}", painter.heading("Outgoing frame"))?;
            writeln!(
                out,
                "{}",
                Table::key_value(
                    &painter,
                    vec![
                        ("capability", args.capability().to_string()),
                        ("channel", args.channel().unwrap_or("-").to_string()),
                        ("value", value.to_string()),
                        ("payload", format_hex(&payload)),
                    ],
                )
            )?;
        }
    }
    Ok(())
}

fn parse_value_literal(raw: &str) -> CapabilityValue {
    match raw {
        "true" => CapabilityValue::Bool(true),
        "false" => CapabilityValue::Bool(false),
        other => match other.parse::<f64>() {
            Ok(numeric) => CapabilityValue::Number(numeric),
            Err(_) => CapabilityValue::Text(other.to_string()),
        },
    }
}
