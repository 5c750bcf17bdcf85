use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::codec::{DpType, DpValue};
use crate::profile::{CapabilityValue, MappingEntry};

/// Named semantic conversions registered for profile entries.
///
/// Each conversion is a pure, invertible function between a raw datapoint
/// reading and a capability value. Profile tables reference conversions by
/// name; the names are validated when a registry is loaded.
#[derive(Debug, Clone, Copy, Eq, PartialEq, EnumIter)]
pub(crate) enum Conversion {
    /// Temperature reported in tenths of a degree.
    TemperatureTenths,
    /// Battery percentage, clamped to `0..=100`.
    BatteryPercent,
    /// Percentage reported in thousandths (`0..=1000` raw to `0..=1`).
    PercentageThousandths,
    /// Voltage reported in tenths of a volt.
    VoltageDecivolts,
    /// Current reported in milliamperes.
    CurrentMilliamps,
    /// Power reported in tenths of a watt.
    PowerDeciwatts,
}

impl Conversion {
    /// Returns the registry name of this conversion.
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::TemperatureTenths => "temperature-tenths",
            Self::BatteryPercent => "battery-percent",
            Self::PercentageThousandths => "percentage-thousandths",
            Self::VoltageDecivolts => "voltage-decivolts",
            Self::CurrentMilliamps => "current-milliamps",
            Self::PowerDeciwatts => "power-deciwatts",
        }
    }

    /// Looks up a conversion by registry name.
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Self::iter().find(|conversion| conversion.name() == name)
    }

    /// Converts a raw reading to a capability value.
    pub(crate) fn decode(self, raw: f64) -> f64 {
        match self {
            Self::TemperatureTenths | Self::VoltageDecivolts | Self::PowerDeciwatts => raw / 10.0,
            Self::BatteryPercent => raw.clamp(0.0, 100.0),
            Self::PercentageThousandths => raw / 1000.0,
            Self::CurrentMilliamps => raw / 1000.0,
        }
    }

    /// Converts a capability value back to a raw reading.
    pub(crate) fn encode(self, value: f64) -> f64 {
        match self {
            Self::TemperatureTenths | Self::VoltageDecivolts | Self::PowerDeciwatts => value * 10.0,
            Self::BatteryPercent => value.clamp(0.0, 100.0),
            Self::PercentageThousandths => value * 1000.0,
            Self::CurrentMilliamps => value * 1000.0,
        }
    }
}

/// Applies mapping-entry transforms between raw datapoint values and
/// application capability values.
pub struct TransformPipeline;

impl TransformPipeline {
    /// Decodes a raw datapoint value into a capability value.
    ///
    /// Order: value map or conversion or linear scale/offset, then inversion,
    /// then clamping. Total over validated entries; unknown raw values pass
    /// through value maps unchanged.
    ///
    /// ```
    /// use tuyadp::capability;
    /// use tuyadp::{
    ///     CapabilityValue, DpId, DpType, DpValue, MappingEntry, TransformPipeline,
    /// };
    ///
    /// let entry = MappingEntry::builder()
    ///     .dp_id(DpId::new(1).expect("1 is a valid datapoint id"))
    ///     .dp_type(DpType::Value)
    ///     .capability(capability::MEASURE_TEMPERATURE)
    ///     .scale(10.0)
    ///     .build();
    /// let value = TransformPipeline::decode(&entry, &DpValue::Integer(235));
    /// assert_eq!(CapabilityValue::Number(23.5), value);
    /// ```
    #[must_use]
    pub fn decode(entry: &MappingEntry, raw: &DpValue) -> CapabilityValue {
        let mapped = Self::decode_base(entry, raw);
        let inverted = Self::apply_invert(entry, mapped);
        Self::apply_clamp(entry, inverted)
    }

    /// Encodes a capability value back into a raw datapoint value.
    ///
    /// The exact algebraic inverse of [`Self::decode`], applied in reverse
    /// order. Returns `None` when a value-mapped entry has no pair for the
    /// requested value.
    #[must_use]
    pub fn encode(entry: &MappingEntry, value: &CapabilityValue) -> Option<DpValue> {
        let uninverted = Self::apply_invert(entry, value.clone());
        Self::encode_base(entry, &uninverted)
    }

    fn decode_base(entry: &MappingEntry, raw: &DpValue) -> CapabilityValue {
        if let Some(map) = entry.value_map() {
            if let Some(key) = raw.numeric() {
                if let Some((_, mapped)) = map.iter().find(|(candidate, _)| *candidate == key) {
                    return mapped.to_capability_value();
                }
            }
            return Self::passthrough(raw);
        }

        if let Some(name) = entry.conversion() {
            if let Some(conversion) = Conversion::from_name(name) {
                if let Some(numeric) = raw.numeric() {
                    return CapabilityValue::Number(conversion.decode(numeric as f64));
                }
            }
            return Self::passthrough(raw);
        }

        match raw {
            DpValue::Bool(flag) => CapabilityValue::Bool(*flag),
            DpValue::Text(text) => CapabilityValue::Text(text.clone()),
            other => match other.numeric() {
                Some(numeric) => {
                    CapabilityValue::Number((numeric as f64) / entry.scale() + entry.offset())
                }
                None => Self::passthrough(other),
            },
        }
    }

    fn encode_base(entry: &MappingEntry, value: &CapabilityValue) -> Option<DpValue> {
        if let Some(map) = entry.value_map() {
            let (key, _) = map.iter().find(|(_, mapped)| value.matches(*mapped))?;
            return Some(Self::numeric_to_dp_value(entry.dp_type(), *key));
        }

        if let Some(name) = entry.conversion() {
            let conversion = Conversion::from_name(name)?;
            let CapabilityValue::Number(numeric) = value else {
                return None;
            };
            let raw = conversion.encode(*numeric).round() as i64;
            return Some(Self::numeric_to_dp_value(entry.dp_type(), raw));
        }

        match value {
            CapabilityValue::Bool(flag) => Some(match entry.dp_type() {
                DpType::Bool => DpValue::Bool(*flag),
                dp_type => Self::numeric_to_dp_value(dp_type, i64::from(*flag)),
            }),
            CapabilityValue::Text(text) => Some(DpValue::Text(text.clone())),
            CapabilityValue::Number(numeric) => {
                let raw = ((numeric - entry.offset()) * entry.scale()).round() as i64;
                Some(Self::numeric_to_dp_value(entry.dp_type(), raw))
            }
        }
    }

    fn apply_invert(entry: &MappingEntry, value: CapabilityValue) -> CapabilityValue {
        if !entry.invert() {
            return value;
        }
        match value {
            CapabilityValue::Bool(flag) => CapabilityValue::Bool(!flag),
            CapabilityValue::Number(numeric) => {
                CapabilityValue::Number(entry.max().unwrap_or(100.0) - numeric)
            }
            text => text,
        }
    }

    fn apply_clamp(entry: &MappingEntry, value: CapabilityValue) -> CapabilityValue {
        let (Some(min), Some(max)) = (entry.min(), entry.max()) else {
            return value;
        };
        match value {
            CapabilityValue::Number(numeric) => CapabilityValue::Number(numeric.clamp(min, max)),
            other => other,
        }
    }

    fn passthrough(raw: &DpValue) -> CapabilityValue {
        match raw {
            DpValue::Bool(flag) => CapabilityValue::Bool(*flag),
            DpValue::Text(text) => CapabilityValue::Text(text.clone()),
            other => match other.numeric() {
                Some(numeric) => CapabilityValue::Number(numeric as f64),
                None => CapabilityValue::Text(other.to_string()),
            },
        }
    }

    fn numeric_to_dp_value(dp_type: DpType, numeric: i64) -> DpValue {
        match dp_type {
            DpType::Bool => DpValue::Bool(numeric != 0),
            DpType::Enum => DpValue::Enumeration(numeric as u8),
            DpType::Bitmap => DpValue::Bitmap(numeric as u32),
            _ => DpValue::Integer(numeric),
        }
    }
}

/// Returns whether a conversion name is registered.
pub(crate) fn conversion_exists(name: &str) -> bool {
    Conversion::from_name(name).is_some()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::codec::DpId;
    use crate::profile::{MappedValue, capability};

    use super::*;

    fn dp(value: u8) -> DpId {
        DpId::new(value).expect("test ids are non-zero")
    }

    static CURTAIN_STATE: [(i64, MappedValue); 3] = [
        (0, MappedValue::Text("up")),
        (1, MappedValue::Text("idle")),
        (2, MappedValue::Text("down")),
    ];

    #[test]
    fn decode_applies_scale() {
        let entry = MappingEntry::builder()
            .dp_id(dp(1))
            .dp_type(DpType::Value)
            .capability(capability::MEASURE_TEMPERATURE)
            .scale(10.0)
            .build();

        let value = TransformPipeline::decode(&entry, &DpValue::Integer(235));
        assert_eq!(CapabilityValue::Number(23.5), value);
    }

    #[test]
    fn decode_applies_named_conversion() {
        let entry = MappingEntry::builder()
            .dp_id(dp(24))
            .dp_type(DpType::Value)
            .capability(capability::MEASURE_TEMPERATURE)
            .conversion("temperature-tenths")
            .build();

        let value = TransformPipeline::decode(&entry, &DpValue::Integer(-401));
        assert_eq!(CapabilityValue::Number(-40.1), value);
    }

    #[rstest]
    #[case(DpValue::Enumeration(0), CapabilityValue::Text("up".to_string()))]
    #[case(DpValue::Enumeration(2), CapabilityValue::Text("down".to_string()))]
    // Unknown raw values pass through the map unchanged.
    #[case(DpValue::Enumeration(9), CapabilityValue::Number(9.0))]
    fn decode_looks_up_value_map(#[case] raw: DpValue, #[case] expected: CapabilityValue) {
        let entry = MappingEntry::builder()
            .dp_id(dp(1))
            .dp_type(DpType::Enum)
            .capability(capability::WINDOWCOVERINGS_STATE)
            .value_map(&CURTAIN_STATE)
            .build();

        assert_eq!(expected, TransformPipeline::decode(&entry, &raw));
    }

    #[rstest]
    #[case(false, DpValue::Bool(true), CapabilityValue::Bool(true))]
    #[case(true, DpValue::Bool(true), CapabilityValue::Bool(false))]
    fn decode_inverts_booleans(
        #[case] invert: bool,
        #[case] raw: DpValue,
        #[case] expected: CapabilityValue,
    ) {
        let entry = MappingEntry::builder()
            .dp_id(dp(1))
            .dp_type(DpType::Bool)
            .capability(capability::ONOFF)
            .invert(invert)
            .build();

        assert_eq!(expected, TransformPipeline::decode(&entry, &raw));
    }

    #[test]
    fn decode_inverts_numerics_against_max() {
        let entry = MappingEntry::builder()
            .dp_id(dp(2))
            .dp_type(DpType::Value)
            .capability(capability::WINDOWCOVERINGS_SET)
            .invert(true)
            .min(0.0)
            .max(100.0)
            .build();

        let value = TransformPipeline::decode(&entry, &DpValue::Integer(30));
        assert_eq!(CapabilityValue::Number(70.0), value);
    }

    #[rstest]
    #[case(DpValue::Integer(2_000), CapabilityValue::Number(100.0))]
    #[case(DpValue::Integer(-50), CapabilityValue::Number(0.0))]
    #[case(DpValue::Integer(42), CapabilityValue::Number(42.0))]
    fn decode_clamps_when_both_bounds_are_set(
        #[case] raw: DpValue,
        #[case] expected: CapabilityValue,
    ) {
        let entry = MappingEntry::builder()
            .dp_id(dp(2))
            .dp_type(DpType::Value)
            .capability(capability::MEASURE_HUMIDITY)
            .min(0.0)
            .max(100.0)
            .build();

        assert_eq!(expected, TransformPipeline::decode(&entry, &raw));
    }

    #[test]
    fn encode_reverses_scale() {
        let entry = MappingEntry::builder()
            .dp_id(dp(1))
            .dp_type(DpType::Value)
            .capability(capability::MEASURE_TEMPERATURE)
            .scale(10.0)
            .build();

        let raw = TransformPipeline::encode(&entry, &CapabilityValue::Number(23.5));
        assert_eq!(Some(DpValue::Integer(235)), raw);
    }

    #[test]
    fn encode_reverses_value_map_by_value() {
        let entry = MappingEntry::builder()
            .dp_id(dp(1))
            .dp_type(DpType::Enum)
            .capability(capability::WINDOWCOVERINGS_STATE)
            .value_map(&CURTAIN_STATE)
            .build();

        let raw =
            TransformPipeline::encode(&entry, &CapabilityValue::Text("down".to_string()));
        assert_eq!(Some(DpValue::Enumeration(2)), raw);

        let missing =
            TransformPipeline::encode(&entry, &CapabilityValue::Text("sideways".to_string()));
        assert_eq!(None, missing);
    }

    #[rstest]
    #[case("temperature-tenths", 23.5, DpValue::Integer(235))]
    #[case("percentage-thousandths", 0.5, DpValue::Integer(500))]
    #[case("current-milliamps", 1.25, DpValue::Integer(1_250))]
    #[case("voltage-decivolts", 230.1, DpValue::Integer(2_301))]
    fn encode_reverses_named_conversions(
        #[case] conversion: &'static str,
        #[case] value: f64,
        #[case] expected: DpValue,
    ) {
        let entry = MappingEntry::builder()
            .dp_id(dp(20))
            .dp_type(DpType::Value)
            .capability(capability::MEASURE_VOLTAGE)
            .conversion(conversion)
            .build();

        let raw = TransformPipeline::encode(&entry, &CapabilityValue::Number(value));
        assert_eq!(Some(expected), raw);
    }

    #[test]
    fn encode_round_trips_inverted_positions() {
        let entry = MappingEntry::builder()
            .dp_id(dp(2))
            .dp_type(DpType::Value)
            .capability(capability::WINDOWCOVERINGS_SET)
            .invert(true)
            .min(0.0)
            .max(100.0)
            .build();

        let decoded = TransformPipeline::decode(&entry, &DpValue::Integer(30));
        let encoded = TransformPipeline::encode(&entry, &decoded);
        assert_eq!(Some(DpValue::Integer(30)), encoded);
    }

    #[test]
    fn conversion_registry_knows_every_name() {
        for conversion in Conversion::iter() {
            assert_eq!(Some(conversion), Conversion::from_name(conversion.name()));
        }
        assert_eq!(None, Conversion::from_name("frobnicate-quux"));
    }
}
