//! RX Reassembler
//!
//! Receive chunks carry at most one frame boundary marker of each kind:
//! a start (`SV`/`SWO`) and an end (`EV`/`EBO`). Frames may span many
//! chunks, several small frames may be packed back-to-back so one chunk
//! ends one frame and starts the next, and the transceiver may signal a
//! buffer overflow mid-frame. This module turns that chunk stream back
//! into whole frames and hands them to the [`FrameSink`].
//!
//! At most one frame is ever in flight; the accumulator holds the
//! sink-provided buffer between chunks.

use super::header::DataFooter;
use crate::driver::tc6::Tc6Stats;
use crate::sink::{FrameBuffer, FrameSink};

/// Inbound frame reassembly state.
#[derive(Debug)]
pub struct Reassembler<B: FrameBuffer> {
    /// Frame currently being accumulated, if any.
    current: Option<B>,
    /// Receive payload is being discarded until the next frame start.
    overflow: bool,
}

impl<B: FrameBuffer> Reassembler<B> {
    /// Create an idle reassembler.
    pub const fn new() -> Self {
        Self {
            current: None,
            overflow: false,
        }
    }

    /// True while a frame is partially accumulated.
    pub fn in_progress(&self) -> bool {
        self.current.is_some()
    }

    /// True while payload is dropped waiting for a frame start.
    pub fn overflow(&self) -> bool {
        self.overflow
    }

    /// Drop the frame in progress, if any.
    pub fn discard(&mut self, stats: &mut Tc6Stats) {
        if self.current.take().is_some() {
            stats.rx_dropped += 1;
        }
    }

    /// Transceiver receive buffer overflowed: the frame in progress is
    /// unrecoverable and payload stays dropped until a start marker.
    pub fn enter_overflow(&mut self, stats: &mut Tc6Stats) {
        self.discard(stats);
        self.overflow = true;
        stats.rx_overflows += 1;
    }

    /// Forget all reassembly state (used by the reset path).
    pub fn clear(&mut self) {
        self.current = None;
        self.overflow = false;
    }

    /// Consume one chunk payload together with its decoded footer.
    pub fn process<S: FrameSink<Buffer = B>>(
        &mut self,
        sink: &mut S,
        payload: &[u8],
        footer: &DataFooter,
        stats: &mut Tc6Stats,
    ) {
        if self.overflow {
            if !footer.start_valid {
                return;
            }
            self.overflow = false;
        }

        let sv = footer.start_valid;
        let ev = footer.end_valid;
        let start = footer.start_word_offset as usize;
        let end = footer.end_byte_offset as usize;

        if (sv && start >= payload.len()) || (ev && end >= payload.len()) {
            stats.protocol_inconsistencies += 1;
            return;
        }

        match (sv, ev) {
            // Whole frame inside one chunk.
            (true, true) if start <= end => {
                if self.current.is_some() {
                    // A start marker always abandons a half-open frame.
                    self.discard(stats);
                }
                if self.begin(sink, stats) {
                    self.append(&payload[start..=end], stats);
                    self.submit(sink, stats);
                }
            }
            // This chunk ends the previous frame and starts the next one.
            (true, true) => {
                if self.current.is_some() {
                    self.append(&payload[..=end], stats);
                    self.submit(sink, stats);
                } else {
                    stats.protocol_inconsistencies += 1;
                }
                if self.begin(sink, stats) {
                    self.append(&payload[start..], stats);
                }
            }
            // Frame start; the remainder arrives in later chunks.
            (true, false) => {
                if self.current.is_some() {
                    self.discard(stats);
                }
                if self.begin(sink, stats) {
                    self.append(&payload[start..], stats);
                }
            }
            // Frame end for an accumulator opened earlier.
            (false, true) => {
                if self.current.is_some() {
                    self.append(&payload[..=end], stats);
                    self.submit(sink, stats);
                } else {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("frame end without a frame in progress");
                    stats.protocol_inconsistencies += 1;
                }
            }
            // Pure continuation: the whole payload belongs to the frame.
            (false, false) => {
                if self.current.is_some() {
                    self.append(payload, stats);
                } else {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("continuation chunk while idle, dropping");
                    stats.protocol_inconsistencies += 1;
                }
            }
        }
    }

    /// Open a new accumulator. Returns false (and counts the exhaustion)
    /// when the sink has no buffer to give.
    fn begin<S: FrameSink<Buffer = B>>(&mut self, sink: &mut S, stats: &mut Tc6Stats) -> bool {
        match sink.start_frame() {
            Some(buf) => {
                self.current = Some(buf);
                true
            }
            None => {
                stats.rx_alloc_failures += 1;
                false
            }
        }
    }

    /// Append to the accumulator; on failure the partial frame is
    /// released and the exhaustion counted. No-op while idle.
    fn append(&mut self, bytes: &[u8], stats: &mut Tc6Stats) {
        if let Some(buf) = self.current.as_mut() {
            if buf.append(bytes).is_err() {
                self.current = None;
                stats.rx_alloc_failures += 1;
                stats.rx_dropped += 1;
            }
        }
    }

    /// Hand the completed frame to the sink. The accumulator reference is
    /// cleared whether or not the sink accepts it.
    fn submit<S: FrameSink<Buffer = B>>(&mut self, sink: &mut S, stats: &mut Tc6Stats) {
        if let Some(buf) = self.current.take() {
            let len = buf.len();
            match sink.submit(buf) {
                Ok(()) => {
                    stats.rx_frames += 1;
                    stats.rx_bytes += len as u64;
                }
                Err(_) => {
                    stats.rx_sink_errors += 1;
                }
            }
        }
    }
}

impl<B: FrameBuffer> Default for Reassembler<B> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
