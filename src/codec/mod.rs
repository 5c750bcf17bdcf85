mod frame;
mod value;

pub use self::frame::{DpId, DpRecord, Frame, FrameCodec, FrameCodecError};
pub use self::value::{DpType, DpValue, ValueCodec};
