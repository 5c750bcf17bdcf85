use serde::Serialize;
use serde_with::SerializeDisplay;
use strum_macros::{Display, EnumIter, EnumString};

/// Identity of one paired device, supplied by the platform's device registry.
///
/// Immutable for the device's lifetime; profile resolution happens once per
/// identity at device initialisation.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct DeviceIdentity {
    manufacturer: String,
    model: String,
    driver_type: String,
}

impl DeviceIdentity {
    /// Creates a device identity.
    ///
    /// ```
    /// use tuyadp::DeviceIdentity;
    ///
    /// let identity = DeviceIdentity::new("_TZE200_cwbvmsar", "TS0601", "climate_sensor");
    /// assert_eq!("_TZE200_cwbvmsar", identity.manufacturer());
    /// ```
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

    /// Returns the Zigbee manufacturer string.
    #[must_use]
    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    /// Returns the Zigbee model string.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the coarse driver-type hint supplied by the platform.
    #[must_use]
    pub fn driver_type(&self) -> &str {
        &self.driver_type
    }

    /// Returns the driver-type hint as a known category, when it is one.
    #[must_use]
    pub(crate) fn driver_category(&self) -> Option<DriverType> {
        self.driver_type.parse().ok()
    }
}

/// Coarse device category used for tier-2 profile fallback.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    SerializeDisplay,
)]
#[strum(serialize_all = "snake_case")]
pub enum DriverType {
    Switch,
    Plug,
    MotionSensor,
    ContactSensor,
    ClimateSensor,
    Thermostat,
    Curtain,
    SmokeSensor,
    WaterSensor,
    SoilSensor,
}
