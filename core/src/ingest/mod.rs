pub mod frame;
pub mod source;

pub use frame::{Frame, FrameDecoder, ImageFrameDecoder};
pub use source::{DirectoryFrameSource, FrameSource};
