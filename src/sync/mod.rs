//! Concurrency plumbing for the single-worker model.
//!
//! All SPI traffic for a device instance is driven by one worker task.
//! This module provides the pieces that other contexts are allowed to
//! touch: the wake signal, the interrupt-pending flag and the one-slot
//! outbound frame queue.

pub mod channel;
pub mod primitives;

pub use channel::{FrameSender, Tc6Shared};
pub use primitives::IsrCell;
#[cfg(feature = "async")]
pub use primitives::WakerCell;
