use std::io;

use anyhow::Result;
use tracing::instrument;

use crate::cli::command::{OutputFormat, SimulateArgs};
use crate::cli::ui::painter::Painter;
use crate::cli::ui::table::Table;
use crate::fixture::{SimulationFixture, SimulationOutcome, SimulationOutcomeKind, run_simulation};
use crate::gesture::GestureConfig;

/// Runs the `simulate` command.
#[instrument(skip(args, out), level = "info")]
pub(crate) fn run<W>(args: &SimulateArgs, out: &mut W, format: OutputFormat) -> Result<()>
where
    W: io::Write,
{
    let fixture: SimulationFixture = args.fixture().parse()?;
    let config = GestureConfig::builder()
        .maybe_app_command_window(args.app_window())
        .maybe_double_click_window(args.double_click_window())
        .maybe_long_press_threshold(args.long_press())
        .build();
    let outcomes = run_simulation(&fixture, config);

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &outcomes)?;
            writeln!(out)?;
        }
        OutputFormat::Pretty => {
            let painter = Painter::new(false);
            writeln!(out, "{}", painter.heading("Simulation"))?;
            let rows = outcomes
                .iter()
                .map(|outcome| {
                    vec![
                        format!("{}ms", outcome.at_ms()),
                        outcome.channel().to_string(),
                        describe_outcome(outcome),
                    ]
                })
                .collect();
            writeln!(out, "{}", Table::grid(["t", "channel", "outcome"], rows))?;
        }
    }
    Ok(())
}

fn describe_outcome(outcome: &SimulationOutcome) -> String {
    match outcome.kind() {
        SimulationOutcomeKind::AppCommandMarked => "application command marked".to_string(),
        SimulationOutcomeKind::StateChanged { value, physical } => format!(
            "state {} ({})",
            if *value { "on" } else { "off" },
            if *physical { "physical" } else { "application_echo" },
        ),
        SimulationOutcomeKind::Gesture { gesture } => format!("gesture {gesture}"),
    }
}
