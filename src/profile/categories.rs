use std::collections::HashMap;

use crate::codec::{DpId, DpType};

use super::capability;
use super::entry::{MappedValue, MappingEntry};
use super::identity::DriverType;

// Shared raw-to-capability maps. Tuya alarm enums report 0 for the active
// state on motion/smoke hardware and 1 for the active state on leak sensors.
pub(super) static MOTION_STATE: [(i64, MappedValue); 2] =
    [(0, MappedValue::Bool(true)), (1, MappedValue::Bool(false))];
pub(super) static SMOKE_STATE: [(i64, MappedValue); 2] =
    [(0, MappedValue::Bool(true)), (1, MappedValue::Bool(false))];
pub(super) static WATER_STATE: [(i64, MappedValue); 2] =
    [(0, MappedValue::Bool(false)), (1, MappedValue::Bool(true))];
pub(super) static BATTERY_STATE: [(i64, MappedValue); 3] = [
    (0, MappedValue::Bool(true)),
    (1, MappedValue::Bool(false)),
    (2, MappedValue::Bool(false)),
];
pub(super) static CURTAIN_STATE: [(i64, MappedValue); 3] = [
    (0, MappedValue::Text("up")),
    (1, MappedValue::Text("idle")),
    (2, MappedValue::Text("down")),
];
pub(super) static THERMOSTAT_MODE: [(i64, MappedValue); 2] = [
    (0, MappedValue::Text("manual")),
    (1, MappedValue::Text("program")),
];

pub(super) fn dp(value: u8) -> DpId {
    DpId::new(value).expect("profile datapoint ids are non-zero")
}

pub(super) fn onoff(dp_id: u8, sub_channel: Option<&'static str>) -> MappingEntry {
    MappingEntry::builder()
        .dp_id(dp(dp_id))
        .dp_type(DpType::Bool)
        .capability(capability::ONOFF)
        .maybe_sub_channel(sub_channel)
        .build()
}

pub(super) fn battery_percent(dp_id: u8) -> MappingEntry {
    MappingEntry::builder()
        .dp_id(dp(dp_id))
        .dp_type(DpType::Value)
        .capability(capability::MEASURE_BATTERY)
        .conversion("battery-percent")
        .writable(false)
        .report_only(true)
        .build()
}

pub(super) fn battery_state(dp_id: u8) -> MappingEntry {
    MappingEntry::builder()
        .dp_id(dp(dp_id))
        .dp_type(DpType::Enum)
        .capability(capability::ALARM_BATTERY)
        .value_map(&BATTERY_STATE)
        .writable(false)
        .report_only(true)
        .build()
}

pub(super) fn temperature_tenths(dp_id: u8) -> MappingEntry {
    MappingEntry::builder()
        .dp_id(dp(dp_id))
        .dp_type(DpType::Value)
        .capability(capability::MEASURE_TEMPERATURE)
        .conversion("temperature-tenths")
        .writable(false)
        .report_only(true)
        .build()
}

pub(super) fn humidity_percent(dp_id: u8) -> MappingEntry {
    MappingEntry::builder()
        .dp_id(dp(dp_id))
        .dp_type(DpType::Value)
        .capability(capability::MEASURE_HUMIDITY)
        .min(0.0)
        .max(100.0)
        .writable(false)
        .report_only(true)
        .build()
}

pub(super) fn alarm(dp_id: u8, cap: &'static str, map: &'static [(i64, MappedValue)]) -> MappingEntry {
    MappingEntry::builder()
        .dp_id(dp(dp_id))
        .dp_type(DpType::Enum)
        .capability(cap)
        .value_map(map)
        .writable(false)
        .report_only(true)
        .build()
}

pub(super) fn metering(dp_id: u8, cap: &'static str, conversion: &'static str) -> MappingEntry {
    MappingEntry::builder()
        .dp_id(dp(dp_id))
        .dp_type(DpType::Value)
        .capability(cap)
        .conversion(conversion)
        .writable(false)
        .report_only(true)
        .build()
}

pub(super) fn curtain_entries() -> Vec<MappingEntry> {
    vec![
        MappingEntry::builder()
            .dp_id(dp(1))
            .dp_type(DpType::Enum)
            .capability(capability::WINDOWCOVERINGS_STATE)
            .value_map(&CURTAIN_STATE)
            .build(),
        MappingEntry::builder()
            .dp_id(dp(2))
            .dp_type(DpType::Value)
            .capability(capability::WINDOWCOVERINGS_SET)
            .scale(100.0)
            .min(0.0)
            .max(1.0)
            .build(),
    ]
}

pub(super) fn thermostat_entries() -> Vec<MappingEntry> {
    vec![
        onoff(1, None),
        MappingEntry::builder()
            .dp_id(dp(2))
            .dp_type(DpType::Enum)
            .capability(capability::THERMOSTAT_MODE)
            .value_map(&THERMOSTAT_MODE)
            .build(),
        MappingEntry::builder()
            .dp_id(dp(16))
            .dp_type(DpType::Value)
            .capability(capability::TARGET_TEMPERATURE)
            .scale(2.0)
            .min(5.0)
            .max(35.0)
            .build(),
        temperature_tenths(24),
    ]
}

/// Tier-2 fallback profiles keyed by the platform's driver-type hint.
pub(super) fn category_profiles() -> HashMap<DriverType, Vec<MappingEntry>> {
    HashMap::from([
        (DriverType::Switch, vec![onoff(1, None)]),
        (
            DriverType::Plug,
            vec![
                onoff(1, None),
                metering(18, capability::MEASURE_CURRENT, "current-milliamps"),
                metering(19, capability::MEASURE_POWER, "power-deciwatts"),
                metering(20, capability::MEASURE_VOLTAGE, "voltage-decivolts"),
            ],
        ),
        (
            DriverType::MotionSensor,
            vec![
                alarm(1, capability::ALARM_MOTION, &MOTION_STATE),
                battery_percent(4),
            ],
        ),
        (
            DriverType::ContactSensor,
            vec![
                MappingEntry::builder()
                    .dp_id(dp(1))
                    .dp_type(DpType::Bool)
                    .capability(capability::ALARM_CONTACT)
                    .writable(false)
                    .report_only(true)
                    .build(),
                battery_percent(4),
            ],
        ),
        (
            DriverType::ClimateSensor,
            vec![
                temperature_tenths(1),
                humidity_percent(2),
                battery_percent(4),
            ],
        ),
        (DriverType::Thermostat, thermostat_entries()),
        (DriverType::Curtain, curtain_entries()),
        (
            DriverType::SmokeSensor,
            vec![
                alarm(1, capability::ALARM_SMOKE, &SMOKE_STATE),
                battery_percent(15),
            ],
        ),
        (
            DriverType::WaterSensor,
            vec![
                alarm(1, capability::ALARM_WATER, &WATER_STATE),
                battery_percent(4),
            ],
        ),
        (
            DriverType::SoilSensor,
            vec![
                humidity_percent(3),
                MappingEntry::builder()
                    .dp_id(dp(5))
                    .dp_type(DpType::Value)
                    .capability(capability::MEASURE_TEMPERATURE)
                    .min(-40.0)
                    .max(125.0)
                    .writable(false)
                    .report_only(true)
                    .build(),
                battery_state(14),
                battery_percent(15),
            ],
        ),
    ])
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use crate::profile::table::validate_entries;

    use super::*;

    #[test]
    fn every_driver_type_has_a_fallback_profile() {
        let profiles = category_profiles();
        for driver_type in DriverType::iter() {
            assert_eq!(
                true,
                profiles.contains_key(&driver_type),
                "missing fallback profile for {driver_type}"
            );
        }
    }

    #[test]
    fn category_profiles_reference_registered_conversions_only() {
        for entries in category_profiles().values() {
            validate_entries(entries).expect("category profiles must validate");
        }
    }
}
