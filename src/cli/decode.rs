use std::io;

use anyhow::Result;
use tracing::instrument;

use crate::cli::command::{DecodeArgs, OutputFormat};
use crate::cli::ui::painter::Painter;
use crate::cli::ui::table::Table;
use crate::clock::MonotonicTime;
use crate::engine::{DeviceEngine, EngineConfig, IncomingReport};
use crate::utils::{format_hex, parse_hex};

/// Runs the `decode` command.
#[instrument(skip(args, out), level = "info")]
pub(crate) fn run<W>(args: &DecodeArgs, out: &mut W, format: OutputFormat) -> Result<()>
where
    W: io::Write,
{
    let config = EngineConfig::builder()
        .possible_capabilities(args.possible_capabilities().iter().cloned().collect())
        .build();
    let mut engine = DeviceEngine::with_builtin_profiles(args.identity().to_identity(), config);

    let payload = parse_hex(args.payload())?;
    let report = engine.parse_incoming(&payload, MonotonicTime::from_millis(args.at_ms()))?;

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Pretty => render_pretty(&report, engine.mapping_table().source(), out)?,
    }
    Ok(())
}

fn render_pretty<W>(
    report: &IncomingReport,
    source: &crate::profile::ProfileSource,
    out: &mut W,
) -> Result<()>
where
    W: io::Write,
{
    let painter = Painter::new(false);

    writeln!(out, "{}", painter.heading("Decoded frame"))?;
    writeln!(
        out,
        "{}",
        Table::key_value(
            &painter,
            vec![
                ("sequence", report.sequence().to_string()),
                ("command", format!("{:#04X}", report.command())),
                ("profile", source.to_string()),
                ("truncated", report.truncated().to_string()),
            ],
        )
    )?;

    if !report.updates().is_empty() {
        writeln!(out, "{}", painter.heading("Capability updates"))?;
        let rows = report
            .updates()
            .iter()
            .map(|update| {
                vec![
                    painter.value(update.capability()),
                    update.sub_channel().unwrap_or("-").to_string(),
                    update.value().to_string(),
                    if update.is_physical() {
                        "physical".to_string()
                    } else {
                        "application_echo".to_string()
                    },
                    update
                        .gesture()
                        .map_or_else(|| "-".to_string(), |gesture| gesture.to_string()),
                    update.heuristic().to_string(),
                ]
            })
            .collect();
        writeln!(
            out,
            "{}",
            Table::grid(
                ["capability", "channel", "value", "origin", "gesture", "heuristic"],
                rows,
            )
        )?;
    }

    if !report.unmapped().is_empty() {
        writeln!(out, "{}", painter.heading("Unmapped datapoints"))?;
        let rows = report
            .unmapped()
            .iter()
            .map(|unmapped| {
                vec![
                    unmapped.dp_id().to_string(),
                    unmapped.dp_type().to_string(),
                    format_hex(unmapped.raw()),
                    unmapped.value().to_string(),
                ]
            })
            .collect();
        writeln!(out, "{}", Table::grid(["dp", "type", "raw", "value"], rows))?;
    }

    if report.truncated() {
        writeln!(
            out,
            "{}",
            painter.warning("trailing datapoint data was truncated and dropped")
        )?;
    }
    Ok(())
}
