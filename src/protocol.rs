use std::collections::HashMap;
use std::sync::LazyLock;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Zigbee manufacturer-specific cluster that tunnels Tuya DataPoint frames.
pub const TUYA_CLUSTER_ID: u16 = 0xEF00;

/// Known cluster commands carried in the frame header's command byte.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, EnumIter, Display)]
pub enum ClusterCommand {
    /// Application-originated datapoint write.
    #[strum(to_string = "data_request")]
    DataRequest,
    /// Device response to a previous request.
    #[strum(to_string = "data_response")]
    DataResponse,
    /// Unsolicited device state report.
    #[strum(to_string = "data_report")]
    DataReport,
    /// Application query for current datapoint values.
    #[strum(to_string = "data_query")]
    DataQuery,
    /// Device request for a wall-clock time payload.
    #[strum(to_string = "time_sync")]
    TimeSync,
}

/// Direction a command travels in.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
pub(crate) enum CommandDirection {
    /// Sent by the application to the device.
    #[strum(to_string = "to_device")]
    ToDevice,
    /// Reported by the device to the application.
    #[strum(to_string = "from_device")]
    FromDevice,
}

/// Descriptive metadata for one cluster command.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct CommandMetadata {
    name: &'static str,
    raw: u8,
    direction: CommandDirection,
}

impl CommandMetadata {
    /// Human-readable command name.
    pub(crate) fn name(self) -> &'static str {
        self.name
    }

    /// Wire value of the command byte.
    pub(crate) fn raw(self) -> u8 {
        self.raw
    }

    /// Direction the command travels in.
    pub(crate) fn direction(self) -> CommandDirection {
        self.direction
    }
}

impl ClusterCommand {
    /// Returns the wire value of this command.
    #[must_use]
    pub fn raw(self) -> u8 {
        command_metadata(self).raw()
    }

    /// Maps a raw command byte back to a known command.
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        Self::iter().find(|command| command.raw() == raw)
    }
}

/// Command metadata keyed by typed command IDs.
pub(crate) static COMMANDS_BY_ID: LazyLock<HashMap<ClusterCommand, CommandMetadata>> =
    LazyLock::new(|| {
        ClusterCommand::iter()
            .map(|command| (command, metadata_for(command)))
            .collect()
    });

/// Returns metadata for one cluster command.
pub(crate) fn command_metadata(command: ClusterCommand) -> CommandMetadata {
    *COMMANDS_BY_ID
        .get(&command)
        .unwrap_or(&metadata_for(command))
}

fn metadata_for(command: ClusterCommand) -> CommandMetadata {
    match command {
        ClusterCommand::DataRequest => CommandMetadata {
            name: "datapoint write request",
            raw: 0x00,
            direction: CommandDirection::ToDevice,
        },
        ClusterCommand::DataResponse => CommandMetadata {
            name: "datapoint response",
            raw: 0x01,
            direction: CommandDirection::FromDevice,
        },
        ClusterCommand::DataReport => CommandMetadata {
            name: "datapoint report",
            raw: 0x02,
            direction: CommandDirection::FromDevice,
        },
        ClusterCommand::DataQuery => CommandMetadata {
            name: "datapoint query",
            raw: 0x03,
            direction: CommandDirection::ToDevice,
        },
        ClusterCommand::TimeSync => CommandMetadata {
            name: "time synchronisation request",
            raw: 0x24,
            direction: CommandDirection::FromDevice,
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn command_metadata_contains_expected_names() {
        let request = command_metadata(ClusterCommand::DataRequest);
        assert_eq!("datapoint write request", request.name());
        assert_eq!(CommandDirection::ToDevice, request.direction());

        let report = command_metadata(ClusterCommand::DataReport);
        assert_eq!("datapoint report", report.name());
        assert_eq!(CommandDirection::FromDevice, report.direction());
    }

    #[rstest]
    #[case(0x00, Some(ClusterCommand::DataRequest))]
    #[case(0x01, Some(ClusterCommand::DataResponse))]
    #[case(0x02, Some(ClusterCommand::DataReport))]
    #[case(0x03, Some(ClusterCommand::DataQuery))]
    #[case(0x24, Some(ClusterCommand::TimeSync))]
    #[case(0x77, None)]
    fn from_raw_maps_wire_values(#[case] raw: u8, #[case] expected: Option<ClusterCommand>) {
        assert_eq!(expected, ClusterCommand::from_raw(raw));
    }
}
