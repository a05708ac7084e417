//! Flow-Control / Credit Tracker
//!
//! The transceiver advertises its buffer situation in every data footer:
//! how many receive chunks are queued for the host (RCA) and how many
//! transmit chunks it can still absorb (TXC). This tracker is a pure
//! state update consulted by the chunk builder before each exchange; it
//! has no side effects of its own.

use super::header::DataFooter;

/// Latest flow-control view taken from the most recent footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlowState {
    /// Configuration sync flag from the footer.
    pub sync: bool,
    /// Receive chunks available on the transceiver.
    pub rca: u8,
    /// Transmit credit granted to the host.
    pub txc: u8,
    /// An exception was pending in the footer.
    pub exception: bool,
}

impl FlowState {
    /// Fresh state before any footer has been seen: no credit either way.
    pub const fn new() -> Self {
        Self {
            sync: false,
            rca: 0,
            txc: 0,
            exception: false,
        }
    }

    /// Absorb one decoded footer. Credit fields are 5-bit on the wire, so
    /// no further clamping is needed here.
    pub fn absorb(&mut self, footer: &DataFooter) {
        self.sync = footer.sync;
        self.rca = footer.rca;
        self.txc = footer.txc;
        self.exception = footer.exception;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
