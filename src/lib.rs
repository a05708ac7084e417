//! OPEN Alliance TC6 MAC-PHY SPI Engine
//!
//! A `no_std`, `no_alloc` driver engine for 10BASE-T1x MAC-PHY
//! transceivers that speak the OPEN Alliance TC6 serial interface: both
//! register access (control plane) and Ethernet frame transport (data
//! plane) multiplexed over a single full-duplex SPI link.
//!
//! # Architecture
//!
//! The engine is organized in three layers:
//!
//! 1. **Driver** ([`driver::tc6`]): the [`Tc6`] engine: reset handshake,
//!    the worker entry point [`Tc6::tick`], register/MDIO access, mode
//!    toggles and statistics
//! 2. **Protocol** (internal): header/footer codec, control transactions,
//!    credit tracking, chunk building and frame reassembly
//! 3. **Plumbing** ([`sync`], [`hal`], [`sink`]): the ISR-safe wake/queue
//!    state, the reset line, and the frame sink boundary to the network
//!    stack
//!
//! # Concurrency model
//!
//! Exactly one worker task owns the [`Tc6`] instance and performs every
//! SPI exchange. Two sources wake it through a shared [`Tc6Shared`]:
//! the transceiver's edge-triggered interrupt (route your HAL's callback
//! to [`Tc6Shared::on_interrupt`]) and outbound frame submission through
//! [`FrameSender`]. The frame queue holds exactly one frame; a second
//! submission blocks until the worker picks the first one up.
//!
//! # Example
//!
//! ```ignore
//! use tc6_macphy::{Tc6, Tc6Config, Tc6Shared};
//!
//! static SHARED: Tc6Shared<Frame> = Tc6Shared::new();
//!
//! // In the interrupt handler for the transceiver's IRQ line:
//! fn on_macphy_irq() {
//!     SHARED.on_interrupt();
//! }
//!
//! // Worker task:
//! let mut tc6: Tc6Default<_, _, _, _, Frame> =
//!     Tc6::new(spi, reset_pin, delay, sink, Tc6Config::new());
//! tc6.reset(&SHARED)?;
//! loop {
//!     SHARED.wait();
//!     if let Err(e) = tc6.tick(&SHARED) {
//!         // fatal: log and re-run tc6.reset(&SHARED)
//!     }
//! }
//!
//! // Any other task:
//! SHARED.sender().send(frame); // returns once the worker can see it
//! ```
//!
//! # Features
//!
//! - `defmt`: derive `defmt::Format` on public types and emit debug/warn
//!   events at state transitions
//! - `async`: waker-based async variants of the wait and send entry
//!   points

#![no_std]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
// Clippy lint levels live in Cargo.toml `[lints]`.

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;
pub mod sink;
pub mod sync;

// Internal implementation details
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{ChunkPayloadSize, State, Tc6Config};
pub use driver::error::{Error, FramingError, Result};
pub use driver::status::{BufferStatus, StatusFlags};
pub use driver::tc6::{Tc6, Tc6Default, Tc6Large, Tc6Small, Tc6Stats};
pub use sink::{FrameBuffer, FrameSink, SinkFull};
pub use sync::{FrameSender, Tc6Shared};

/// Wire-level codec types.
///
/// The transaction engines verify integrity through echo and complement
/// words, so most callers never need these; they are exposed for layers
/// that inspect or synthesize raw headers and footers (tooling, tests,
/// protocol analyzers).
pub mod protocol {
    pub use crate::internal::credit::FlowState;
    pub use crate::internal::header::{ControlHeader, DataFooter, DataHeader};
}

/// Control-plane register map.
///
/// Register addresses and bit definitions for the standard sector, plus
/// the clause-22/45 MDIO address mapping helpers.
pub mod registers {
    pub use crate::internal::regs::{
        RegisterAddress, bufsts, c22_address, c45_address, c45_mms, config0, mms, oa, reset,
        status0,
    };
}

/// Shared driver constants.
pub mod constants {
    pub use crate::internal::constants::{
        CTRL_LEN, CTRL_LEN_PROTECTED, DEFAULT_CHUNK_PAYLOAD_SIZE, HEADER_SIZE, MAX_CHUNK_PAYLOAD_SIZE,
        MAX_CREDIT, MAX_FRAME_SIZE, RESET_PULSE_US, RESET_TIMEOUT_POLLS,
    };
}
