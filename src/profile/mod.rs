mod categories;
mod entry;
mod heuristic;
mod identity;
mod resolver;
mod table;
mod universal;
mod vendors;

pub use self::entry::{CapabilityValue, DEFAULT_CHANNEL, MappedValue, MappingEntry};
pub use self::identity::{DeviceIdentity, DriverType};
pub use self::resolver::{ProfileRegistry, ProfileResolver};
pub use self::table::{MappingTable, ProfileError, ProfileSource};

pub(crate) use self::heuristic::classify_unmapped;

/// Capability identifiers shared by the profile tables.
pub mod capability {
    pub const ONOFF: &str = "onoff";
    pub const DIM: &str = "dim";
    pub const MEASURE_TEMPERATURE: &str = "measure_temperature";
    pub const MEASURE_HUMIDITY: &str = "measure_humidity";
    pub const MEASURE_BATTERY: &str = "measure_battery";
    pub const MEASURE_LUMINANCE: &str = "measure_luminance";
    pub const MEASURE_POWER: &str = "measure_power";
    pub const MEASURE_VOLTAGE: &str = "measure_voltage";
    pub const MEASURE_CURRENT: &str = "measure_current";
    pub const TARGET_TEMPERATURE: &str = "target_temperature";
    pub const THERMOSTAT_MODE: &str = "thermostat_mode";
    pub const ALARM_MOTION: &str = "alarm_motion";
    pub const ALARM_CONTACT: &str = "alarm_contact";
    pub const ALARM_WATER: &str = "alarm_water";
    pub const ALARM_SMOKE: &str = "alarm_smoke";
    pub const ALARM_BATTERY: &str = "alarm_battery";
    pub const WINDOWCOVERINGS_STATE: &str = "windowcoverings_state";
    pub const WINDOWCOVERINGS_SET: &str = "windowcoverings_set";
}
