//! TX Chunk Builder
//!
//! Slices the outbound frame into header-prefixed chunks, respecting the
//! transmit credit the transceiver granted and the size of the exchange
//! buffer. Whatever credit is left after the data chunks is consumed by
//! data-invalid filler chunks so the exchange is long enough to collect
//! the receive chunks the transceiver advertised.

use super::constants::HEADER_SIZE;
use super::credit::FlowState;
use super::header::DataHeader;
use crate::driver::tc6::Tc6Stats;

/// Progress through the outbound frame currently being transmitted.
///
/// The cursor survives across exchanges: a frame larger than one
/// exchange's credit continues where it left off.
#[derive(Debug)]
pub struct TxCursor<F: AsRef<[u8]>> {
    frame: F,
    offset: usize,
}

impl<F: AsRef<[u8]>> TxCursor<F> {
    /// Take ownership of a queued frame.
    pub fn new(frame: F) -> Self {
        Self { frame, offset: 0 }
    }

    /// Bytes not yet placed into a chunk.
    pub fn remaining(&self) -> usize {
        self.frame.as_ref().len() - self.offset
    }
}

/// What one call to [`build_exchange`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOutcome {
    /// Total chunks placed in the buffer (data plus filler).
    pub chunks: usize,
    /// Chunks that carry frame payload.
    pub data_chunks: usize,
}

/// Fill `out` with the chunks of the next exchange.
///
/// Data chunks are bounded by the transmit credit, the buffer capacity
/// and the frame itself; an exchange never finishes one frame and starts
/// another. Filler chunks then pad up to the advertised receive count.
/// With nothing at all to move, a pending interrupt still forces a single
/// filler chunk so the footer can be inspected.
pub fn build_exchange<F: AsRef<[u8]>>(
    out: &mut [u8],
    cps: usize,
    flow: &FlowState,
    irq_pending: bool,
    cursor: &mut Option<TxCursor<F>>,
    mut pull: impl FnMut() -> Option<F>,
    stats: &mut Tc6Stats,
) -> BuildOutcome {
    let chunk_size = HEADER_SIZE + cps;
    let cap_chunks = out.len() / chunk_size;

    let mut outcome = BuildOutcome::default();

    while outcome.data_chunks < flow.txc as usize && outcome.chunks < cap_chunks {
        if cursor.is_none() {
            match pull() {
                Some(frame) if frame.as_ref().is_empty() => continue,
                Some(frame) => *cursor = Some(TxCursor::new(frame)),
                None => break,
            }
        }
        let Some(cur) = cursor.as_mut() else { break };

        let remaining = cur.remaining();
        let complete = remaining <= cps;
        let header = DataHeader {
            data_valid: true,
            start_valid: cur.offset == 0,
            end_valid: complete,
            end_byte_offset: if complete { (remaining - 1) as u8 } else { 0 },
            ..Default::default()
        };

        let base = outcome.chunks * chunk_size;
        out[base..base + HEADER_SIZE].copy_from_slice(&header.to_wire());
        let copied = remaining.min(cps);
        out[base + HEADER_SIZE..base + HEADER_SIZE + copied]
            .copy_from_slice(&cur.frame.as_ref()[cur.offset..cur.offset + copied]);
        out[base + HEADER_SIZE + copied..base + chunk_size].fill(0);
        cur.offset += copied;

        outcome.chunks += 1;
        outcome.data_chunks += 1;

        if complete {
            stats.tx_frames += 1;
            stats.tx_bytes += cur.frame.as_ref().len() as u64;
            *cursor = None;
            break;
        }
    }

    let receive_target = (flow.rca as usize).min(cap_chunks);
    while outcome.chunks < receive_target {
        write_filler(out, outcome.chunks * chunk_size, chunk_size);
        outcome.chunks += 1;
        stats.tx_filler_chunks += 1;
    }

    if outcome.chunks == 0 && irq_pending && cap_chunks > 0 {
        write_filler(out, 0, chunk_size);
        outcome.chunks = 1;
        stats.tx_filler_chunks += 1;
    }

    outcome
}

fn write_filler(out: &mut [u8], base: usize, chunk_size: usize) {
    let header = DataHeader::default();
    out[base..base + HEADER_SIZE].copy_from_slice(&header.to_wire());
    out[base + HEADER_SIZE..base + chunk_size].fill(0);
}

// =============================================================================
// Unit Tests
// =============================================================================
