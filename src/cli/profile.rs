use std::io;

use anyhow::Result;
use serde::Serialize;
use tracing::instrument;

use crate::cli::command::{OutputFormat, ProfileArgs};
use crate::cli::ui::painter::Painter;
use crate::cli::ui::table::Table;
use crate::codec::DpType;
use crate::profile::{
    DeviceIdentity, MappingEntry, ProfileRegistry, ProfileResolver, ProfileSource,
};

#[derive(Serialize)]
struct ProfileReport<'a> {
    identity: &'a DeviceIdentity,
    source: &'a ProfileSource,
    entries: Vec<ProfileRow>,
}

#[derive(Serialize)]
struct ProfileRow {
    dp_id: u8,
    dp_type: DpType,
    capability: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_channel: Option<&'static str>,
    transform: String,
    writable: bool,
    report_only: bool,
}

impl ProfileRow {
    fn from_entry(entry: &MappingEntry) -> Self {
        Self {
            dp_id: entry.dp_id().value(),
            dp_type: entry.dp_type(),
            capability: entry.capability(),
            sub_channel: entry.sub_channel(),
            transform: describe_transform(entry),
            writable: entry.writable(),
            report_only: entry.report_only(),
        }
    }
}

/// Runs the `profile` command.
#[instrument(skip(args, out), level = "info")]
pub(crate) fn run<W>(args: &ProfileArgs, out: &mut W, format: OutputFormat) -> Result<()>
where
    W: io::Write,
{
    let identity = args.identity().to_identity();
    let table = ProfileResolver::resolve(ProfileRegistry::builtin(), &identity);
    let rows: Vec<ProfileRow> = table.entries().map(ProfileRow::from_entry).collect();

    match format {
        OutputFormat::Json => {
            let report = ProfileReport {
                identity: &identity,
                source: table.source(),
                entries: rows,
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Pretty => {
            let painter = Painter::new(false);
            writeln!(
                out,
                "{} {}",
                painter.heading("Resolved profile"),
                painter.value(table.source().to_string()),
            )?;
            let records = rows
                .iter()
                .map(|row| {
                    vec![
                        row.dp_id.to_string(),
                        row.dp_type.to_string(),
                        row.capability.to_string(),
                        row.sub_channel.unwrap_or("-").to_string(),
                        row.transform.clone(),
                        access_label(row).to_string(),
                    ]
                })
                .collect();
            writeln!(
                out,
                "{}",
                Table::grid(
                    ["dp", "type", "capability", "channel", "transform", "access"],
                    records,
                )
            )?;
        }
    }
    Ok(())
}

fn access_label(row: &ProfileRow) -> &'static str {
    if row.report_only {
        "report"
    } else if row.writable {
        "write"
    } else {
        "read"
    }
}

fn describe_transform(entry: &MappingEntry) -> String {
    let mut parts = Vec::new();
    if let Some(map) = entry.value_map() {
        parts.push(format!("map[{}]", map.len()));
    }
    if let Some(conversion) = entry.conversion() {
        parts.push(conversion.to_string());
    }
    if entry.value_map().is_none() && entry.conversion().is_none() {
        if (entry.scale() - 1.0).abs() > f64::EPSILON {
            parts.push(format!("/{}", entry.scale()));
        }
        if entry.offset().abs() > f64::EPSILON {
            parts.push(format!("{:+}", entry.offset()));
        }
    }
    if entry.invert() {
        parts.push("invert".to_string());
    }
    if let (Some(min), Some(max)) = (entry.min(), entry.max()) {
        parts.push(format!("clamp[{min},{max}]"));
    }

    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::codec::DpId;
    use crate::profile::capability;

    use super::*;

    fn dp(value: u8) -> DpId {
        DpId::new(value).expect("test ids are non-zero")
    }

    #[test]
    fn describe_transform_summarises_linear_entries() {
        let entry = MappingEntry::builder()
            .dp_id(dp(16))
            .dp_type(DpType::Value)
            .capability(capability::TARGET_TEMPERATURE)
            .scale(2.0)
            .min(5.0)
            .max(35.0)
            .build();

        assert_eq!("/2 clamp[5,35]", describe_transform(&entry));
    }

    #[test]
    fn describe_transform_prefers_conversions_over_scale() {
        let entry = MappingEntry::builder()
            .dp_id(dp(24))
            .dp_type(DpType::Value)
            .capability(capability::MEASURE_TEMPERATURE)
            .conversion("temperature-tenths")
            .scale(10.0)
            .build();

        assert_eq!("temperature-tenths", describe_transform(&entry));
    }
}
