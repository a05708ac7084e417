//! Inbound frame hand-off abstraction.
//!
//! The engine reassembles Ethernet frames out of chunk payloads but does
//! not own any frame memory; the surrounding network stack does. These
//! traits model that stack as a growable byte sink: the reassembler asks
//! for a fresh buffer when a frame starts, appends payload slices as
//! chunks arrive, and submits the buffer when the frame ends.
//!
//! Both allocation and append are allowed to fail: the reassembler treats
//! failure as resource exhaustion, drops the frame in progress and keeps
//! the link running.

/// A sink or buffer refused more data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SinkFull;

/// One inbound frame being accumulated.
///
/// Implementations may grow by chaining fixed-size fragments or by any
/// other means; the reassembler only ever appends and reads the length.
pub trait FrameBuffer {
    /// Append a payload slice to the frame.
    fn append(&mut self, bytes: &[u8]) -> Result<(), SinkFull>;

    /// Bytes accumulated so far.
    fn len(&self) -> usize;

    /// True when nothing has been appended yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Destination for completed inbound frames.
pub trait FrameSink {
    /// Buffer type the sink hands out.
    type Buffer: FrameBuffer;

    /// Allocate a buffer for a new frame. `None` means the stack is out
    /// of frame memory right now.
    fn start_frame(&mut self) -> Option<Self::Buffer>;

    /// Hand a completed frame to the stack. A refused frame is counted as
    /// a receive error by the caller, never propagated.
    fn submit(&mut self, frame: Self::Buffer) -> Result<(), SinkFull>;
}
