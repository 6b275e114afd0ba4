//! Audio streaming core
//!
//! Sender side: [`session::StreamSession`] emits header, words, and
//! framed PCM chunks over an abstract frame channel with cooperative
//! cancellation. Receiver side: [`receiver::StreamReceiver`] rebuilds
//! gapless audio from the frame sequence. [`protocol`] defines the
//! messages both sides share.

pub mod protocol;
pub mod receiver;
pub mod session;

pub use protocol::{Frame, StreamMessage, WsCommand};
pub use receiver::{Segment, SegmentSink, StreamInfo, StreamReceiver};
pub use session::{CancelFlag, StreamSession};
