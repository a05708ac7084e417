//! Status register views.
//!
//! [`StatusFlags`] parses STATUS0, the write-1-to-clear event register the
//! transceiver points at whenever a footer carries the exception bit.
//! [`BufferStatus`] parses BUFSTS, the live credit snapshot.

use crate::internal::regs::{bufsts, status0};

// =============================================================================
// Status Flags
// =============================================================================

/// Event flags parsed from the STATUS0 register.
///
/// # Example
///
/// ```ignore
/// let status = tc6.check_status()?;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFlags {
    /// Transmit protocol error.
    pub tx_protocol_error: bool,
    /// Transmit buffer overflow.
    pub tx_buffer_overflow: bool,
    /// Transmit buffer underflow.
    pub tx_buffer_underflow: bool,
    /// Receive buffer overflow; the frame in transit was lost.
    pub rx_buffer_overflow: bool,
    /// Loss of framing: configuration sync dropped.
    pub loss_of_framing: bool,
    /// The transceiver rejected a header it received.
    pub header_error: bool,
    /// Reset sequence completed.
    pub reset_complete: bool,
}

impl StatusFlags {
    /// Parse from the raw STATUS0 register value.
    #[inline]
    pub fn from_raw(status: u32) -> Self {
        Self {
            tx_protocol_error: (status & status0::TXPE) != 0,
            tx_buffer_overflow: (status & status0::TXBOE) != 0,
            tx_buffer_underflow: (status & status0::TXBUE) != 0,
            rx_buffer_overflow: (status & status0::RXBOE) != 0,
            loss_of_framing: (status & status0::LOFE) != 0,
            header_error: (status & status0::HDRE) != 0,
            reset_complete: (status & status0::RESETC) != 0,
        }
    }

    /// Convert back to a raw value for clearing (write-1-to-clear).
    #[inline]
    pub fn to_raw(&self) -> u32 {
        let mut val = 0u32;
        if self.tx_protocol_error {
            val |= status0::TXPE;
        }
        if self.tx_buffer_overflow {
            val |= status0::TXBOE;
        }
        if self.tx_buffer_underflow {
            val |= status0::TXBUE;
        }
        if self.rx_buffer_overflow {
            val |= status0::RXBOE;
        }
        if self.loss_of_framing {
            val |= status0::LOFE;
        }
        if self.header_error {
            val |= status0::HDRE;
        }
        if self.reset_complete {
            val |= status0::RESETC;
        }
        val
    }

    /// Check if any event is set.
    #[inline]
    pub fn any(&self) -> bool {
        self.to_raw() != 0
    }

    /// Check if any fatal condition is set (framing or sync loss).
    #[inline]
    pub fn has_fatal(&self) -> bool {
        self.loss_of_framing || self.header_error
    }
}

// =============================================================================
// Buffer Status
// =============================================================================

/// Live credit snapshot parsed from the BUFSTS register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferStatus {
    /// Transmit credit: chunks the transceiver can absorb.
    pub txc: u8,
    /// Receive chunks available: chunks queued for the host.
    pub rca: u8,
}

impl BufferStatus {
    /// Parse from the raw BUFSTS register value.
    #[inline]
    pub fn from_raw(value: u32) -> Self {
        Self {
            txc: ((value & bufsts::TXC_MASK) >> bufsts::TXC_SHIFT) as u8,
            rca: (value & bufsts::RCA_MASK) as u8,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
