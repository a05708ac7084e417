//! Configuration types for the MAC-PHY engine

use crate::internal::constants::RESET_TIMEOUT_POLLS;

/// Chunk payload size carried per data chunk.
///
/// The protocol encodes the size as its base-two logarithm in CONFIG0;
/// only power-of-two sizes between 8 and 64 bytes exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ChunkPayloadSize {
    /// 8 byte payloads
    Bytes8 = 8,
    /// 16 byte payloads
    Bytes16 = 16,
    /// 32 byte payloads
    Bytes32 = 32,
    /// 64 byte payloads (default, best throughput)
    #[default]
    Bytes64 = 64,
}

impl ChunkPayloadSize {
    /// Payload size in bytes.
    #[must_use]
    pub const fn as_bytes(self) -> usize {
        self as usize
    }

    /// The CONFIG0 CPS field value: log2 of the size.
    #[must_use]
    pub const fn to_cps_field(self) -> u32 {
        (self as u8).trailing_zeros()
    }
}

/// Engine lifecycle state.
///
/// `Resetting` and `Synced` bracket the bring-up handshake; `Overflowing`
/// is entered while the transceiver reports a receive buffer overflow and
/// left with the next frame start; `Faulted` is terminal until the owner
/// requests another reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Reset requested or in progress; the data plane is down.
    #[default]
    Resetting,
    /// Configuration synchronized, normal operation.
    Synced,
    /// Receive payload is being dropped until the next frame start.
    Overflowing,
    /// Fatal protocol or transport fault; reset required.
    Faulted,
}

/// Engine configuration.
///
/// Built with the `with_*` methods:
///
/// ```ignore
/// let config = Tc6Config::new()
///     .with_chunk_payload_size(ChunkPayloadSize::Bytes64)
///     .with_protected_mode(true);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tc6Config {
    /// Data bytes carried per chunk.
    pub chunk_payload_size: ChunkPayloadSize,
    /// Verify control values through their one's-complement copies.
    pub protected: bool,
    /// Ask the transceiver to start received frames at word offset zero.
    pub zero_align_rx: bool,
    /// 1 ms polls before the reset handshake is abandoned.
    pub reset_timeout_polls: u32,
}

impl Tc6Config {
    /// Default configuration: 64-byte chunks, no protected mode.
    pub const fn new() -> Self {
        Self {
            chunk_payload_size: ChunkPayloadSize::Bytes64,
            protected: false,
            zero_align_rx: false,
            reset_timeout_polls: RESET_TIMEOUT_POLLS,
        }
    }

    /// Set the chunk payload size.
    #[must_use]
    pub const fn with_chunk_payload_size(mut self, cps: ChunkPayloadSize) -> Self {
        self.chunk_payload_size = cps;
        self
    }

    /// Enable or disable protected-mode control transactions.
    #[must_use]
    pub const fn with_protected_mode(mut self, protected: bool) -> Self {
        self.protected = protected;
        self
    }

    /// Enable or disable zero-aligned receive frames.
    #[must_use]
    pub const fn with_zero_align_rx(mut self, zero_align: bool) -> Self {
        self.zero_align_rx = zero_align;
        self
    }

    /// Override the reset handshake polling bound.
    #[must_use]
    pub const fn with_reset_timeout_polls(mut self, polls: u32) -> Self {
        self.reset_timeout_polls = polls;
        self
    }
}

impl Default for Tc6Config {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
