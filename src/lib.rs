mod app;
mod cli;
mod clock;
mod codec;
mod engine;
mod error;
mod fixture;
mod gesture;
mod profile;
mod protocol;
mod runtime;
mod telemetry;
mod transform;
mod utils;

pub use app::{run, run_with_options};
pub use cli::{
    Args, Command, DecodeArgs, EncodeArgs, IdentityArgs, LogLevel, OutputFormat, ProfileArgs,
    SimulateArgs,
};
pub use clock::MonotonicTime;
pub use codec::{DpId, DpRecord, DpType, DpValue, Frame, FrameCodec, FrameCodecError, ValueCodec};
pub use engine::{CapabilityUpdate, DeviceEngine, EngineConfig, IncomingReport, UnmappedDatapoint};
pub use error::{FixtureError, ProtocolError, TransportError};
pub use fixture::{
    SimulationAction, SimulationFixture, SimulationOutcome, SimulationOutcomeKind, SimulationStep,
    run_simulation,
};
pub use gesture::{
    ChannelId, DeviceEventOutcome, Disambiguator, EventClass, Gesture, GestureConfig,
    TimerDirective,
};
pub use profile::{
    CapabilityValue, DEFAULT_CHANNEL, DeviceIdentity, DriverType, MappedValue, MappingEntry,
    MappingTable, ProfileError, ProfileRegistry, ProfileResolver, ProfileSource, capability,
};
pub use protocol::{ClusterCommand, TUYA_CLUSTER_ID};
pub use runtime::{DeviceHandle, EngineEvent, FrameTransport};
pub use transform::TransformPipeline;
