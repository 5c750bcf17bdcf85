use derive_more::From;
use thiserror::Error;

use crate::codec::FrameCodecError;
use crate::profile::ProfileError;

/// Errors returned when parsing simulation or payload fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("the simulation fixture is empty")]
    EmptyFixture,
    #[error("fixture records must contain three pipe-delimited fields")]
    InvalidRecordFieldCount,
    #[error("fixture records cannot contain empty fields")]
    EmptyRecordField,
    #[error("failed to parse fixture timestamp")]
    InvalidTimestamp(#[from] std::num::ParseIntError),
    #[error("unknown fixture action `{value}`; expected `on`, `off`, or `app`")]
    InvalidAction { value: String },
    #[error("fixture timestamps must not decrease: {current_ms}ms follows {previous_ms}ms")]
    NonMonotonicTimestamp { previous_ms: u64, current_ms: u64 },
    #[error("payload is not valid hexadecimal")]
    InvalidHexPayload(#[from] hex::FromHexError),
}

/// Errors returned when sending frames through the platform transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("the transport link to the device is closed")]
    LinkClosed,
    #[error("transport I/O failed")]
    Io(#[from] std::io::Error),
}

/// Errors returned by telemetry initialisation.
#[derive(Debug, Error)]
pub(crate) enum TelemetryError {
    #[error("failed to install tracing subscriber")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Top-level protocol errors wrapping module-specific error types.
#[derive(Debug, Error, From)]
pub enum ProtocolError {
    #[error(transparent)]
    #[from(FrameCodecError, Box<FrameCodecError>)]
    FrameCodec(Box<FrameCodecError>),
    #[error(transparent)]
    #[from(ProfileError, Box<ProfileError>)]
    Profile(Box<ProfileError>),
    #[error(transparent)]
    #[from(FixtureError, Box<FixtureError>)]
    Fixture(Box<FixtureError>),
    #[error(transparent)]
    #[from(TransportError, Box<TransportError>)]
    Transport(Box<TransportError>),
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn protocol_error_boxes_module_errors() {
        let error = ProtocolError::from(FrameCodecError::FrameTooShort { actual: 3 });
        assert_matches!(error, ProtocolError::FrameCodec(_));
        assert_eq!(
            "frame is too short: expected at least 5 header bytes, got 3",
            error.to_string()
        );
    }

    #[test]
    fn protocol_error_preserves_transport_messages() {
        let error = ProtocolError::from(TransportError::LinkClosed);
        assert_eq!("the transport link to the device is closed", error.to_string());
    }
}
