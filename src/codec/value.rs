use std::fmt;

use serde::{Serialize, Serializer};
use strum_macros::{Display, EnumIter};

use crate::utils::format_hex;

/// Datapoint payload type tag carried in the DP unit header.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, EnumIter, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DpType {
    /// Opaque vendor bytes.
    #[strum(to_string = "raw")]
    Raw,
    /// Single-byte boolean.
    #[strum(to_string = "bool")]
    Bool,
    /// Signed big-endian integer, 1/2/4 bytes wide.
    #[strum(to_string = "value")]
    Value,
    /// UTF-8 text.
    #[strum(to_string = "string")]
    String,
    /// Single-byte enumeration index.
    #[strum(to_string = "enum")]
    Enum,
    /// Unsigned big-endian bit field, 1/2/4 bytes wide.
    #[strum(to_string = "bitmap")]
    Bitmap,
}

impl DpType {
    /// Returns the wire tag for this type.
    ///
    /// ```
    /// use tuyadp::DpType;
    ///
    /// assert_eq!(0, DpType::Raw.tag());
    /// assert_eq!(2, DpType::Value.tag());
    /// assert_eq!(5, DpType::Bitmap.tag());
    /// ```
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Raw => 0,
            Self::Bool => 1,
            Self::Value => 2,
            Self::String => 3,
            Self::Enum => 4,
            Self::Bitmap => 5,
        }
    }

    /// Maps a wire tag to a known type.
    ///
    /// Unknown tags return `None`; callers treat those payloads as raw bytes
    /// so vendor extensions keep flowing instead of failing the frame.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Raw),
            1 => Some(Self::Bool),
            2 => Some(Self::Value),
            3 => Some(Self::String),
            4 => Some(Self::Enum),
            5 => Some(Self::Bitmap),
            _ => None,
        }
    }
}

/// A decoded datapoint value.
#[derive(Debug, Clone, PartialEq)]
pub enum DpValue {
    /// Opaque bytes, preserved verbatim.
    Raw(Vec<u8>),
    /// Boolean state.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// UTF-8 text.
    Text(String),
    /// Enumeration index.
    Enumeration(u8),
    /// Bit field.
    Bitmap(u32),
}

impl DpValue {
    /// Returns the value as a signed integer, when it has a numeric reading.
    ///
    /// ```
    /// use tuyadp::DpValue;
    ///
    /// assert_eq!(Some(3600), DpValue::Integer(3600).numeric());
    /// assert_eq!(Some(1), DpValue::Bool(true).numeric());
    /// assert_eq!(None, DpValue::Text("open".to_string()).numeric());
    /// ```
    #[must_use]
    pub fn numeric(&self) -> Option<i64> {
        match self {
            Self::Bool(value) => Some(i64::from(*value)),
            Self::Integer(value) => Some(*value),
            Self::Enumeration(value) => Some(i64::from(*value)),
            Self::Bitmap(value) => Some(i64::from(*value)),
            Self::Raw(_) | Self::Text(_) => None,
        }
    }

    /// Returns a boolean reading of the value.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Raw(bytes) => bytes.iter().any(|byte| *byte != 0),
            Self::Text(text) => !text.is_empty(),
            other => other.numeric().is_some_and(|value| value != 0),
        }
    }
}

impl fmt::Display for DpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(bytes) => write!(f, "{}", format_hex(bytes)),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(text) => write!(f, "{text}"),
            Self::Enumeration(value) => write!(f, "{value}"),
            Self::Bitmap(value) => write!(f, "{value:#010b}"),
        }
    }
}

impl Serialize for DpValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Raw(bytes) => serializer.serialize_str(&hex::encode(bytes)),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Enumeration(value) => serializer.serialize_u8(*value),
            Self::Bitmap(value) => serializer.serialize_u32(*value),
        }
    }
}

/// Decodes and encodes single datapoint payloads per their type tag.
pub struct ValueCodec;

impl ValueCodec {
    /// Decodes one datapoint payload.
    ///
    /// Decoding is total: payloads whose length does not fit the declared
    /// type degrade to an opaque raw value rather than erroring, tolerating
    /// the width mistakes real devices make.
    ///
    /// ```
    /// use tuyadp::{DpType, DpValue, ValueCodec};
    ///
    /// let value = ValueCodec::decode(DpType::Value, &[0x00, 0x00, 0x0E, 0x10]);
    /// assert_eq!(DpValue::Integer(3600), value);
    /// ```
    #[must_use]
    pub fn decode(dp_type: DpType, payload: &[u8]) -> DpValue {
        match dp_type {
            DpType::Raw => DpValue::Raw(payload.to_vec()),
            DpType::Bool => DpValue::Bool(payload.first() == Some(&1)),
            DpType::Value => match payload.len() {
                1 => DpValue::Integer(i64::from(payload[0] as i8)),
                2 => DpValue::Integer(i64::from(i16::from_be_bytes([payload[0], payload[1]]))),
                4 => DpValue::Integer(i64::from(i32::from_be_bytes([
                    payload[0], payload[1], payload[2], payload[3],
                ]))),
                _ => DpValue::Raw(payload.to_vec()),
            },
            DpType::String => DpValue::Text(String::from_utf8_lossy(payload).into_owned()),
            DpType::Enum => DpValue::Enumeration(payload.first().copied().unwrap_or(0)),
            DpType::Bitmap => match payload.len() {
                1 => DpValue::Bitmap(u32::from(payload[0])),
                2 => DpValue::Bitmap(u32::from(u16::from_be_bytes([payload[0], payload[1]]))),
                4 => DpValue::Bitmap(u32::from_be_bytes([
                    payload[0], payload[1], payload[2], payload[3],
                ])),
                _ => DpValue::Raw(payload.to_vec()),
            },
        }
    }

    /// Encodes one datapoint value at the canonical width for its type.
    ///
    /// Bool is one byte, Value four, Enum one, Bitmap the smallest of 1/2/4
    /// bytes that fits.
    ///
    /// ```
    /// use tuyadp::{DpType, DpValue, ValueCodec};
    ///
    /// let payload = ValueCodec::encode(DpType::Value, &DpValue::Integer(3600));
    /// assert_eq!(vec![0x00, 0x00, 0x0E, 0x10], payload);
    /// ```
    #[must_use]
    pub fn encode(dp_type: DpType, value: &DpValue) -> Vec<u8> {
        match dp_type {
            DpType::Raw => match value {
                DpValue::Raw(bytes) => bytes.clone(),
                other => other.to_string().into_bytes(),
            },
            DpType::Bool => vec![u8::from(value.truthy())],
            DpType::Value => {
                let numeric = value.numeric().unwrap_or(0);
                (numeric as i32).to_be_bytes().to_vec()
            }
            DpType::String => match value {
                DpValue::Text(text) => text.clone().into_bytes(),
                other => other.to_string().into_bytes(),
            },
            DpType::Enum => vec![value.numeric().unwrap_or(0) as u8],
            DpType::Bitmap => {
                let bits = value.numeric().unwrap_or(0) as u32;
                if bits <= u32::from(u8::MAX) {
                    vec![bits as u8]
                } else if bits <= u32::from(u16::MAX) {
                    (bits as u16).to_be_bytes().to_vec()
                } else {
                    bits.to_be_bytes().to_vec()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(DpType::Bool, &[0x01], DpValue::Bool(true))]
    #[case(DpType::Bool, &[0x00], DpValue::Bool(false))]
    #[case(DpType::Bool, &[], DpValue::Bool(false))]
    #[case(DpType::Value, &[0xF6], DpValue::Integer(-10))]
    #[case(DpType::Value, &[0x00, 0xEB], DpValue::Integer(235))]
    #[case(DpType::Value, &[0xFF, 0xFF, 0xFE, 0x6F], DpValue::Integer(-401))]
    #[case(DpType::String, &[0x6F, 0x70, 0x65, 0x6E], DpValue::Text("open".to_string()))]
    #[case(DpType::Enum, &[0x02], DpValue::Enumeration(2))]
    #[case(DpType::Enum, &[], DpValue::Enumeration(0))]
    #[case(DpType::Bitmap, &[0x05], DpValue::Bitmap(0b101))]
    #[case(DpType::Bitmap, &[0x01, 0x00], DpValue::Bitmap(256))]
    #[case(DpType::Bitmap, &[0x00, 0x01, 0x00, 0x00], DpValue::Bitmap(65_536))]
    #[case(DpType::Raw, &[0xDE, 0xAD], DpValue::Raw(vec![0xDE, 0xAD]))]
    fn decode_maps_payloads_to_values(
        #[case] dp_type: DpType,
        #[case] payload: &[u8],
        #[case] expected: DpValue,
    ) {
        assert_eq!(expected, ValueCodec::decode(dp_type, payload));
    }

    #[rstest]
    #[case(DpType::Value, &[0x00, 0x00, 0x0E])]
    #[case(DpType::Bitmap, &[0x01, 0x02, 0x03])]
    fn decode_degrades_ill_fitting_widths_to_raw(#[case] dp_type: DpType, #[case] payload: &[u8]) {
        assert_eq!(
            DpValue::Raw(payload.to_vec()),
            ValueCodec::decode(dp_type, payload)
        );
    }

    #[rstest]
    #[case(DpType::Bool, DpValue::Bool(true))]
    #[case(DpType::Bool, DpValue::Bool(false))]
    #[case(DpType::Value, DpValue::Integer(0))]
    #[case(DpType::Value, DpValue::Integer(3600))]
    #[case(DpType::Value, DpValue::Integer(-401))]
    #[case(DpType::Value, DpValue::Integer(i64::from(i32::MAX)))]
    #[case(DpType::String, DpValue::Text("half open".to_string()))]
    #[case(DpType::Enum, DpValue::Enumeration(7))]
    #[case(DpType::Bitmap, DpValue::Bitmap(0x05))]
    #[case(DpType::Bitmap, DpValue::Bitmap(0x0100))]
    #[case(DpType::Bitmap, DpValue::Bitmap(0x0001_0000))]
    #[case(DpType::Raw, DpValue::Raw(vec![0xAA, 0x55]))]
    fn encode_then_decode_round_trips(#[case] dp_type: DpType, #[case] value: DpValue) {
        let payload = ValueCodec::encode(dp_type, &value);
        assert_eq!(value, ValueCodec::decode(dp_type, &payload));
    }

    #[rstest]
    #[case(DpValue::Bool(true), 1)]
    #[case(DpValue::Integer(3600), 4)]
    #[case(DpValue::Enumeration(3), 1)]
    #[case(DpValue::Bitmap(0x05), 1)]
    #[case(DpValue::Bitmap(0x0100), 2)]
    #[case(DpValue::Bitmap(0x0001_0000), 4)]
    fn encode_emits_canonical_widths(#[case] value: DpValue, #[case] expected_len: usize) {
        let dp_type = match value {
            DpValue::Bool(_) => DpType::Bool,
            DpValue::Integer(_) => DpType::Value,
            DpValue::Enumeration(_) => DpType::Enum,
            DpValue::Bitmap(_) => DpType::Bitmap,
            _ => unreachable!("cases cover typed values only"),
        };
        assert_eq!(expected_len, ValueCodec::encode(dp_type, &value).len());
    }

    #[test]
    fn decode_tolerates_invalid_utf8() {
        let value = ValueCodec::decode(DpType::String, &[0x6F, 0xFF, 0x6B]);
        assert_eq!(DpValue::Text("o\u{FFFD}k".to_string()), value);
    }
}
