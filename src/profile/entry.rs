use std::fmt;

use bon::Builder;
use serde::{Serialize, Serializer};

use crate::codec::{DpId, DpType, DpValue};

use super::capability;

/// Channel name used by gesture tracking when an entry has no sub-channel.
pub const DEFAULT_CHANNEL: &str = "main";

/// One side of a value-map pair, storable in static profile tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MappedValue {
    /// Boolean capability value.
    Bool(bool),
    /// Numeric capability value.
    Number(f64),
    /// Textual capability value.
    Text(&'static str),
}

impl MappedValue {
    /// Converts the mapped value into an owned capability value.
    #[must_use]
    pub fn to_capability_value(self) -> CapabilityValue {
        match self {
            Self::Bool(value) => CapabilityValue::Bool(value),
            Self::Number(value) => CapabilityValue::Number(value),
            Self::Text(text) => CapabilityValue::Text(text.to_string()),
        }
    }
}

/// An application-facing capability value.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityValue {
    /// Boolean state, e.g. `onoff` or an alarm.
    Bool(bool),
    /// Numeric measurement or setpoint.
    Number(f64),
    /// Textual mode or state label.
    Text(String),
}

impl CapabilityValue {
    /// Returns whether this value equals a mapped table value.
    #[must_use]
    pub fn matches(&self, mapped: MappedValue) -> bool {
        match (self, mapped) {
            (Self::Bool(a), MappedValue::Bool(b)) => *a == b,
            (Self::Number(a), MappedValue::Number(b)) => (*a - b).abs() < f64::EPSILON,
            (Self::Text(a), MappedValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for CapabilityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => write!(f, "{text}"),
        }
    }
}

impl Serialize for CapabilityValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Number(value) => serializer.serialize_f64(*value),
            Self::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// Maps one datapoint id to a capability and its value transform.
#[derive(Debug, Clone, Copy, PartialEq, Builder)]
pub struct MappingEntry {
    dp_id: DpId,
    dp_type: DpType,
    capability: &'static str,
    sub_channel: Option<&'static str>,
    value_map: Option<&'static [(i64, MappedValue)]>,
    conversion: Option<&'static str>,
    #[builder(default = 1.0)]
    scale: f64,
    #[builder(default = 0.0)]
    offset: f64,
    #[builder(default = false)]
    invert: bool,
    min: Option<f64>,
    max: Option<f64>,
    #[builder(default = true)]
    writable: bool,
    #[builder(default = false)]
    report_only: bool,
    #[builder(default = false)]
    multi_use: bool,
}

impl MappingEntry {
    /// Returns the datapoint id this entry maps.
    #[must_use]
    pub fn dp_id(&self) -> DpId {
        self.dp_id
    }

    /// Returns the wire type expected for this datapoint.
    #[must_use]
    pub fn dp_type(&self) -> DpType {
        self.dp_type
    }

    /// Returns the application capability identifier.
    #[must_use]
    pub fn capability(&self) -> &'static str {
        self.capability
    }

    /// Returns the logical sub-channel, for multi-gang devices.
    #[must_use]
    pub fn sub_channel(&self) -> Option<&'static str> {
        self.sub_channel
    }

    /// Returns the raw-to-capability value map, when present.
    #[must_use]
    pub fn value_map(&self) -> Option<&'static [(i64, MappedValue)]> {
        self.value_map
    }

    /// Returns the named semantic conversion, when present.
    #[must_use]
    pub fn conversion(&self) -> Option<&'static str> {
        self.conversion
    }

    /// Returns the linear scale divisor applied when no map or conversion is set.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the linear offset applied after scaling.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Returns whether the decoded value is inverted.
    #[must_use]
    pub fn invert(&self) -> bool {
        self.invert
    }

    /// Returns the lower clamp bound, when set.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    /// Returns the upper clamp bound, when set.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Returns whether the capability accepts application writes.
    #[must_use]
    pub fn writable(&self) -> bool {
        self.writable
    }

    /// Returns whether the datapoint is report-only diagnostics data.
    #[must_use]
    pub fn report_only(&self) -> bool {
        self.report_only
    }

    /// Returns whether this universal-table entry yields to profiled devices.
    #[must_use]
    pub fn multi_use(&self) -> bool {
        self.multi_use
    }

    /// Returns the gesture-tracking channel name for switch-like entries.
    ///
    /// Only `onoff` entries participate in command disambiguation; each gang
    /// of a multi-gang switch tracks its own channel.
    #[must_use]
    pub fn gesture_channel(&self) -> Option<&'static str> {
        if self.capability == capability::ONOFF {
            return Some(self.sub_channel.unwrap_or(DEFAULT_CHANNEL));
        }
        None
    }
}
