pub(crate) mod command;
pub(crate) mod decode;
pub(crate) mod encode;
pub(crate) mod profile;
pub(crate) mod simulate;
pub(crate) mod ui;

pub use self::command::{
    Args, Command, DecodeArgs, EncodeArgs, IdentityArgs, LogLevel, OutputFormat, ProfileArgs,
    SimulateArgs,
};
