//! Reset line control.
//!
//! The transceiver's hardware reset input is active low and must be held
//! asserted for at least 10 microseconds. The bounded wait for the
//! reset-complete indication lives in the driver; this module only owns
//! the pin.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::driver::error::{Error, Result};
use crate::internal::constants::RESET_PULSE_US;

/// Active-low reset line of the transceiver.
#[derive(Debug)]
pub struct ResetLine<RST: OutputPin> {
    pin: RST,
}

impl<RST: OutputPin> ResetLine<RST> {
    /// Wrap the reset output pin (const, suitable for static init).
    pub const fn new(pin: RST) -> Self {
        Self { pin }
    }

    /// Drive a full reset pulse: assert, hold past the minimum width,
    /// release.
    pub fn pulse<D: DelayNs>(&mut self, delay: &mut D) -> Result<()> {
        self.pin.set_low().map_err(|_| Error::Gpio)?;
        delay.delay_us(RESET_PULSE_US);
        self.pin.set_high().map_err(|_| Error::Gpio)
    }

    /// Release the line without a pulse (used before first bring-up).
    pub fn release(&mut self) -> Result<()> {
        self.pin.set_high().map_err(|_| Error::Gpio)
    }

    /// Give the pin back.
    pub fn into_inner(self) -> RST {
        self.pin
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
