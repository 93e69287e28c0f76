mod command_frame;
mod frame_kind;

pub use command_frame::{CommandFrame, CommandType};
pub use frame_kind::{EventKind, FrameKind, RequestId};
