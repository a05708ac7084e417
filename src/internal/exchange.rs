//! Data Transaction Engine
//!
//! Assembles one complete SPI exchange out of the chunk builder's output,
//! executes it as a single full-duplex transfer, and walks the returned
//! chunks strictly in array order: every footer feeds the credit tracker,
//! every data-valid payload feeds the reassembler. Errors split the way
//! the protocol does: transport and framing faults abort the exchange,
//! buffer overflows on the transceiver are absorbed and recovered from.

use embedded_hal::spi::SpiDevice;

use super::constants::HEADER_SIZE;
use super::control::{read_register, write_register};
use super::credit::FlowState;
use super::header::DataFooter;
use super::regs::oa;
use super::rx::Reassembler;
use super::tx::{TxCursor, build_exchange};
use crate::driver::error::{Error, FramingError, Result};
use crate::driver::status::StatusFlags;
use crate::driver::tc6::Tc6Stats;
use crate::sink::FrameSink;

/// Run one full exchange. Returns `false` when there was nothing to put
/// on the wire (no data, no advertised receive chunks, no interrupt).
pub fn run_exchange<SPI, S, F>(
    spi: &mut SPI,
    protected: bool,
    cps: usize,
    tx_buf: &mut [u8],
    rx_buf: &mut [u8],
    flow: &mut FlowState,
    reassembler: &mut Reassembler<S::Buffer>,
    cursor: &mut Option<TxCursor<F>>,
    sink: &mut S,
    irq_pending: bool,
    pull: impl FnMut() -> Option<F>,
    stats: &mut Tc6Stats,
) -> Result<bool>
where
    SPI: SpiDevice<u8>,
    S: FrameSink,
    F: AsRef<[u8]>,
{
    let outcome = build_exchange(tx_buf, cps, flow, irq_pending, cursor, pull, stats);
    if outcome.chunks == 0 {
        return Ok(false);
    }

    let chunk_size = HEADER_SIZE + cps;
    let len = outcome.chunks * chunk_size;
    spi.transfer(&mut rx_buf[..len], &tx_buf[..len])
        .map_err(Error::transport)?;

    let mut exception = false;
    for chunk in rx_buf[..len].chunks_exact(chunk_size) {
        let (payload, footer_bytes) = chunk.split_at(cps);
        let mut wire = [0u8; 4];
        wire.copy_from_slice(footer_bytes);
        let footer = DataFooter::from_wire(wire)?;

        if footer.header_bad {
            return Err(FramingError::HeaderBad.into());
        }

        flow.absorb(&footer);

        if !footer.sync {
            // Remaining chunks of this exchange are not processed.
            return Err(Error::ConfigurationLost);
        }

        if footer.frame_drop {
            reassembler.discard(stats);
            stats.frame_drops += 1;
        }

        if footer.data_valid {
            reassembler.process(sink, payload, &footer, stats);
        }

        exception |= footer.exception;
    }

    if exception {
        service_status(spi, protected, reassembler, stats)?;
    }

    Ok(true)
}

/// Read STATUS0, clear what it reports and act on it.
///
/// A receive buffer overflow is recoverable: the frame in transit is
/// discarded and payload stays dropped until the next frame start.
/// Loss of framing and header errors are fatal and propagate after the
/// register has been cleared.
pub fn service_status<SPI, B>(
    spi: &mut SPI,
    protected: bool,
    reassembler: &mut Reassembler<B>,
    stats: &mut Tc6Stats,
) -> Result<StatusFlags>
where
    SPI: SpiDevice<u8>,
    B: crate::sink::FrameBuffer,
{
    let flags = StatusFlags::from_raw(read_register(spi, protected, oa::STATUS0)?);

    if flags.any() {
        write_register(spi, protected, oa::STATUS0, flags.to_raw())?;
    }

    if flags.rx_buffer_overflow {
        #[cfg(feature = "defmt")]
        defmt::warn!("transceiver receive buffer overflow");
        reassembler.enter_overflow(stats);
    }

    if flags.tx_protocol_error || flags.tx_buffer_overflow || flags.tx_buffer_underflow {
        #[cfg(feature = "defmt")]
        defmt::warn!("transmit path error reported in STATUS0");
        stats.tx_errors += 1;
    }

    if flags.loss_of_framing {
        return Err(Error::ConfigurationLost);
    }
    if flags.header_error {
        return Err(FramingError::HeaderBad.into());
    }

    Ok(flags)
}

// =============================================================================
// Unit Tests
// =============================================================================
