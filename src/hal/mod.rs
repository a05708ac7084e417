//! Hardware abstraction for the GPIO surface of the transceiver.
//!
//! The SPI transport itself comes in through `embedded_hal::spi::SpiDevice`
//! and needs no wrapper; only the reset line has enough behavior attached
//! to deserve one. The interrupt input is the caller's: route the edge
//! callback of your HAL to [`Tc6Shared::on_interrupt`](crate::sync::Tc6Shared::on_interrupt).

pub mod reset;

pub use reset::ResetLine;
