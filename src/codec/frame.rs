use thiserror::Error;

use super::value::{DpType, DpValue, ValueCodec};

const FRAME_HEADER_LEN: usize = 5;
const DP_HEADER_LEN: usize = 4;
const MAX_DP_PAYLOAD_LEN: usize = u16::MAX as usize;
const MAX_FRAME_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Errors returned by frame encoding and decoding.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum FrameCodecError {
    /// The buffer has fewer than the mandatory 5 frame-header bytes.
    #[error("frame is too short: expected at least 5 header bytes, got {actual}")]
    FrameTooShort { actual: usize },
    /// One datapoint payload is too large to fit in a 16-bit length field.
    #[error(
        "datapoint {dp_id} payload is too large: {payload_len} bytes exceeds max {max_payload_len}"
    )]
    DatapointPayloadTooLarge {
        dp_id: u8,
        payload_len: usize,
        max_payload_len: usize,
    },
    /// The combined datapoint payload exceeds the 16-bit frame length field.
    #[error("frame payload is too large: {payload_len} bytes exceeds max {max_payload_len}")]
    FramePayloadTooLarge {
        payload_len: usize,
        max_payload_len: usize,
    },
}

/// Datapoint identifier, valid in `1..=255`.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    derive_more::Display,
    derive_more::Into,
    serde::Serialize,
)]
pub struct DpId(u8);

impl DpId {
    /// Creates a datapoint id, rejecting the reserved value `0`.
    ///
    /// ```
    /// use tuyadp::DpId;
    ///
    /// assert_eq!(Some(4), DpId::new(4).map(|id| id.value()));
    /// assert_eq!(None, DpId::new(0));
    /// ```
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value == 0 {
            return None;
        }
        Some(Self(value))
    }

    /// Returns the raw id byte.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// One decoded datapoint unit.
#[derive(Debug, Clone, PartialEq)]
pub struct DpRecord {
    id: DpId,
    dp_type: DpType,
    raw: Vec<u8>,
    value: DpValue,
}

impl DpRecord {
    /// Creates a record and decodes its payload per the type tag.
    ///
    /// ```
    /// use tuyadp::{DpId, DpRecord, DpType, DpValue};
    ///
    /// let id = DpId::new(1).expect("1 is a valid datapoint id");
    /// let record = DpRecord::new(id, DpType::Value, vec![0x00, 0x00, 0x0E, 0x10]);
    /// assert_eq!(&DpValue::Integer(3600), record.value());
    /// ```
    #[must_use]
    pub fn new(id: DpId, dp_type: DpType, raw: Vec<u8>) -> Self {
        let value = ValueCodec::decode(dp_type, &raw);
        Self {
            id,
            dp_type,
            raw,
            value,
        }
    }

    /// Returns the datapoint id.
    #[must_use]
    pub fn id(&self) -> DpId {
        self.id
    }

    /// Returns the declared payload type.
    #[must_use]
    pub fn dp_type(&self) -> DpType {
        self.dp_type
    }

    /// Returns the undecoded payload bytes.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Returns the decoded payload value.
    #[must_use]
    pub fn value(&self) -> &DpValue {
        &self.value
    }
}

/// One parsed transport unit of the tunnelled datapoint protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    sequence: u16,
    command: u8,
    declared_payload_len: u16,
    datapoints: Vec<DpRecord>,
    truncated: bool,
}

impl Frame {
    /// Returns the frame sequence number.
    #[must_use]
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Returns the cluster command byte.
    #[must_use]
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Returns the advisory payload length declared by the sender.
    ///
    /// Real devices mis-report this field, so it is never validated against
    /// the bytes actually consumed.
    #[must_use]
    pub fn declared_payload_len(&self) -> u16 {
        self.declared_payload_len
    }

    /// Returns the decoded datapoints in wire order.
    #[must_use]
    pub fn datapoints(&self) -> &[DpRecord] {
        &self.datapoints
    }

    /// Returns whether trailing datapoint data was dropped as truncated.
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

/// Encodes and decodes tunnelled datapoint frames.
pub struct FrameCodec;

impl FrameCodec {
    /// Parses one frame from raw cluster payload bytes.
    ///
    /// A datapoint header that would overrun the buffer stops parsing; the
    /// records decoded so far are returned with the `truncated` marker set.
    /// Records carrying the reserved id `0` are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error only when fewer than 5 header bytes are present.
    ///
    /// ```
    /// use tuyadp::{DpValue, FrameCodec};
    ///
    /// let frame = FrameCodec::parse(&[
    ///     0x00, 0x01, 0x02, 0x00, 0x08, 0x01, 0x02, 0x00, 0x04, 0x00, 0x00, 0x0E, 0x10,
    /// ])?;
    /// assert_eq!(1, frame.sequence());
    /// assert_eq!(&DpValue::Integer(3600), frame.datapoints()[0].value());
    /// # Ok::<(), tuyadp::FrameCodecError>(())
    /// ```
    pub fn parse(payload: &[u8]) -> Result<Frame, FrameCodecError> {
        if payload.len() < FRAME_HEADER_LEN {
            return Err(FrameCodecError::FrameTooShort {
                actual: payload.len(),
            });
        }

        let sequence = u16::from_be_bytes([payload[0], payload[1]]);
        let command = payload[2];
        let declared_payload_len = u16::from_be_bytes([payload[3], payload[4]]);

        let mut datapoints = Vec::new();
        let mut truncated = false;
        let mut offset = FRAME_HEADER_LEN;
        while offset < payload.len() {
            if offset + DP_HEADER_LEN > payload.len() {
                truncated = true;
                break;
            }

            let raw_id = payload[offset];
            let tag = payload[offset + 1];
            let dp_len = usize::from(u16::from_be_bytes([payload[offset + 2], payload[offset + 3]]));
            let dp_payload_start = offset + DP_HEADER_LEN;
            let dp_payload_end = dp_payload_start + dp_len;
            if dp_payload_end > payload.len() {
                truncated = true;
                break;
            }

            offset = dp_payload_end;
            let Some(id) = DpId::new(raw_id) else {
                continue;
            };

            let dp_type = DpType::from_tag(tag).unwrap_or(DpType::Raw);
            datapoints.push(DpRecord::new(
                id,
                dp_type,
                payload[dp_payload_start..dp_payload_end].to_vec(),
            ));
        }

        Ok(Frame {
            sequence,
            command,
            declared_payload_len,
            datapoints,
            truncated,
        })
    }

    /// Builds the wire bytes for one outgoing frame.
    ///
    /// The 5-byte header always carries the true combined datapoint length,
    /// never a caller-claimed one.
    ///
    /// # Errors
    ///
    /// Returns an error when one datapoint payload or the combined payload
    /// does not fit its 16-bit length field.
    ///
    /// ```
    /// use tuyadp::{DpId, DpRecord, DpType, FrameCodec};
    ///
    /// let id = DpId::new(1).expect("1 is a valid datapoint id");
    /// let record = DpRecord::new(id, DpType::Value, vec![0x00, 0x00, 0x0E, 0x10]);
    /// let payload = FrameCodec::build(1, 2, &[record])?;
    /// assert_eq!(
    ///     vec![0x00, 0x01, 0x02, 0x00, 0x08, 0x01, 0x02, 0x00, 0x04, 0x00, 0x00, 0x0E, 0x10],
    ///     payload
    /// );
    /// # Ok::<(), tuyadp::FrameCodecError>(())
    /// ```
    pub fn build(
        sequence: u16,
        command: u8,
        datapoints: &[DpRecord],
    ) -> Result<Vec<u8>, FrameCodecError> {
        let mut payload_len = 0usize;
        for record in datapoints {
            if record.raw().len() > MAX_DP_PAYLOAD_LEN {
                return Err(FrameCodecError::DatapointPayloadTooLarge {
                    dp_id: record.id().value(),
                    payload_len: record.raw().len(),
                    max_payload_len: MAX_DP_PAYLOAD_LEN,
                });
            }
            payload_len += DP_HEADER_LEN + record.raw().len();
        }
        if payload_len > MAX_FRAME_PAYLOAD_LEN {
            return Err(FrameCodecError::FramePayloadTooLarge {
                payload_len,
                max_payload_len: MAX_FRAME_PAYLOAD_LEN,
            });
        }

        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload_len);
        frame.extend_from_slice(&sequence.to_be_bytes());
        frame.push(command);
        frame.extend_from_slice(&(payload_len as u16).to_be_bytes());
        for record in datapoints {
            frame.push(record.id().value());
            frame.push(record.dp_type().tag());
            frame.extend_from_slice(&(record.raw().len() as u16).to_be_bytes());
            frame.extend_from_slice(record.raw());
        }
        Ok(frame)
    }
}
