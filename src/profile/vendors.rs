use std::collections::HashMap;

use crate::codec::DpType;

use super::capability;
use super::categories::{
    MOTION_STATE, SMOKE_STATE, WATER_STATE, alarm, battery_percent, battery_state,
    curtain_entries, dp, humidity_percent, metering, onoff, temperature_tenths,
    thermostat_entries,
};
use super::entry::MappingEntry;
use super::resolver::VendorProfile;

/// Tier-1 profiles keyed by exact Zigbee manufacturer string.
///
/// `Inherit` entries redirect to another manufacturer once; longer chains and
/// cycles fall through to tier 2 during resolution.
pub(super) fn vendor_profiles() -> HashMap<&'static str, VendorProfile> {
    HashMap::from([
        // Single-gang switch modules.
        (
            "_TZ3000_ji4araar",
            VendorProfile::Entries(vec![onoff(1, None)]),
        ),
        ("_TZ3000_zmy1waw6", VendorProfile::Inherit("_TZ3000_ji4araar")),
        // Two-gang wall switch.
        (
            "_TZ3000_18ejxno0",
            VendorProfile::Entries(vec![onoff(1, None), onoff(2, Some("gang2"))]),
        ),
        ("_TZ3000_tqlv4ug4", VendorProfile::Inherit("_TZ3000_18ejxno0")),
        // Climate sensor with external probe.
        (
            "_TZE200_cwbvmsar",
            VendorProfile::Entries(vec![
                temperature_tenths(1),
                humidity_percent(2),
                battery_percent(4),
            ]),
        ),
        // PIR with illuminance reporting.
        (
            "_TZE200_3towulqd",
            VendorProfile::Entries(vec![
                alarm(1, capability::ALARM_MOTION, &MOTION_STATE),
                battery_percent(4),
                MappingEntry::builder()
                    .dp_id(dp(9))
                    .dp_type(DpType::Value)
                    .capability(capability::MEASURE_LUMINANCE)
                    .writable(false)
                    .report_only(true)
                    .build(),
            ]),
        ),
        // Wall thermostat.
        (
            "_TZE200_aoclfnxz",
            VendorProfile::Entries(thermostat_entries()),
        ),
        // Curtain motor.
        ("_TZE200_cowvfni3", VendorProfile::Entries(curtain_entries())),
        // DIN-rail energy meter; the relay sits on DP 16.
        (
            "_TZE200_bkkmqmyo",
            VendorProfile::Entries(vec![
                onoff(16, None),
                metering(18, capability::MEASURE_CURRENT, "current-milliamps"),
                metering(19, capability::MEASURE_POWER, "power-deciwatts"),
                metering(20, capability::MEASURE_VOLTAGE, "voltage-decivolts"),
            ]),
        ),
        // Water-leak probe.
        (
            "_TZE200_qq9mpfhw",
            VendorProfile::Entries(vec![
                alarm(1, capability::ALARM_WATER, &WATER_STATE),
                battery_percent(4),
            ]),
        ),
        // Soil moisture/temperature probe.
        (
            "_TZE200_myd45weu",
            VendorProfile::Entries(vec![
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
            ]),
        ),
        // Smoke detector.
        (
            "_TZE200_ntcy3xu1",
            VendorProfile::Entries(vec![
                alarm(1, capability::ALARM_SMOKE, &SMOKE_STATE),
                battery_state(14),
                battery_percent(15),
            ]),
        ),
    ])
}
