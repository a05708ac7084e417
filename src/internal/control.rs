//! Control Transaction Engine
//!
//! Single-register read/write over SPI. A control transaction is one
//! fixed-size full-duplex exchange: the 32-bit header, then data words.
//! The transceiver echoes the byte stream delayed by one word, so the
//! response carries the header back at bytes 4..8 and the data after it.
//! Verification is done on that echo; in protected mode every value also
//! travels with its one's-complement copy and both are compared.

use embedded_hal::spi::SpiDevice;

use super::constants::{CTRL_LEN, CTRL_LEN_PROTECTED};
use super::header::ControlHeader;
use super::regs::RegisterAddress;
use crate::driver::error::{Error, FramingError, Result};

const HDR: core::ops::Range<usize> = 0..4;
const ECHO: core::ops::Range<usize> = 4..8;
const VALUE: core::ops::Range<usize> = 8..12;
const COMPLEMENT: core::ops::Range<usize> = 12..16;

fn word_at(buf: &[u8], range: core::ops::Range<usize>) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[range]);
    u32::from_be_bytes(bytes)
}

fn header_for(addr: RegisterAddress, write: bool) -> ControlHeader {
    ControlHeader {
        write_not_read: write,
        auto_increment: false,
        mms: addr.mms(),
        addr: addr.offset(),
        len: 0,
    }
}

/// Read a single register.
pub fn read_register<SPI: SpiDevice<u8>>(
    spi: &mut SPI,
    protected: bool,
    addr: RegisterAddress,
) -> Result<u32> {
    let len = if protected { CTRL_LEN_PROTECTED } else { CTRL_LEN };
    let mut tx = [0u8; CTRL_LEN_PROTECTED];
    let mut rx = [0u8; CTRL_LEN_PROTECTED];

    let header = header_for(addr, false);
    tx[HDR].copy_from_slice(&header.to_wire());

    spi.transfer(&mut rx[..len], &tx[..len])
        .map_err(Error::transport)?;

    if rx[ECHO] != tx[HDR] {
        return Err(FramingError::HeaderMismatch.into());
    }

    let value = word_at(&rx, VALUE);
    if protected && word_at(&rx, COMPLEMENT) != !value {
        return Err(FramingError::ProtectedMismatch.into());
    }

    Ok(value)
}

/// Write a single register.
pub fn write_register<SPI: SpiDevice<u8>>(
    spi: &mut SPI,
    protected: bool,
    addr: RegisterAddress,
    value: u32,
) -> Result<()> {
    let len = if protected { CTRL_LEN_PROTECTED } else { CTRL_LEN };
    let mut tx = [0u8; CTRL_LEN_PROTECTED];
    let mut rx = [0u8; CTRL_LEN_PROTECTED];

    let header = header_for(addr, true);
    tx[HDR].copy_from_slice(&header.to_wire());
    tx[ECHO].copy_from_slice(&value.to_be_bytes());
    if protected {
        tx[VALUE].copy_from_slice(&(!value).to_be_bytes());
    }

    spi.transfer(&mut rx[..len], &tx[..len])
        .map_err(Error::transport)?;

    if rx[ECHO] != tx[HDR] {
        return Err(FramingError::HeaderMismatch.into());
    }
    if word_at(&rx, VALUE) != value {
        return Err(FramingError::ProtectedMismatch.into());
    }
    if protected && word_at(&rx, COMPLEMENT) != !value {
        return Err(FramingError::ProtectedMismatch.into());
    }

    Ok(())
}

/// Read a register, clear `mask` bits, OR in `value & mask`, write back.
pub fn read_modify_write<SPI: SpiDevice<u8>>(
    spi: &mut SPI,
    protected: bool,
    addr: RegisterAddress,
    mask: u32,
    value: u32,
) -> Result<()> {
    let current = read_register(spi, protected, addr)?;
    let updated = (current & !mask) | (value & mask);
    write_register(spi, protected, addr, updated)
}

// =============================================================================
// Unit Tests
// =============================================================================
