use crate::codec::DpType;

use super::capability;
use super::categories::{battery_state, dp, metering};
use super::entry::MappingEntry;

/// Tier-3 universal datapoint conventions observed across vendors.
///
/// `multi_use` marks ids that mean something else on profiled devices (gang
/// relays reuse the low ids); those entries are dropped whenever a tier-1/2
/// profile exists.
pub(super) fn universal_entries() -> Vec<MappingEntry> {
    vec![
        MappingEntry::builder()
            .dp_id(dp(1))
            .dp_type(DpType::Bool)
            .capability(capability::ONOFF)
            .multi_use(true)
            .build(),
        MappingEntry::builder()
            .dp_id(dp(2))
            .dp_type(DpType::Value)
            .capability(capability::DIM)
            .conversion("percentage-thousandths")
            .min(0.0)
            .max(1.0)
            .multi_use(true)
            .build(),
        MappingEntry::builder()
            .dp_id(dp(4))
            .dp_type(DpType::Value)
            .capability(capability::MEASURE_BATTERY)
            .conversion("battery-percent")
            .writable(false)
            .report_only(true)
            .multi_use(true)
            .build(),
        battery_state(14),
        MappingEntry::builder()
            .dp_id(dp(15))
            .dp_type(DpType::Value)
            .capability(capability::MEASURE_BATTERY)
            .conversion("battery-percent")
            .writable(false)
            .report_only(true)
            .build(),
        metering(18, capability::MEASURE_CURRENT, "current-milliamps"),
        metering(19, capability::MEASURE_POWER, "power-deciwatts"),
        metering(20, capability::MEASURE_VOLTAGE, "voltage-decivolts"),
    ]
}
