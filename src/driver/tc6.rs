//! Core MAC-PHY engine implementation.
//!
//! This module contains the main [`Tc6`] structure and core operations:
//!
//! - Reset handshake and bring-up
//! - The worker entry point [`Tc6::tick`]
//! - Register and MDIO access (clause 22 and clause 45)
//! - Mode toggles (sync, zero-aligned RX, protected mode)
//! - Status service and statistics
//!
//! The engine multiplexes two planes over one SPI device: single-register
//! control transactions and chunked Ethernet frame transport. All of it
//! is driven by exactly one worker task; the only pieces other contexts
//! touch live in [`Tc6Shared`](crate::sync::Tc6Shared).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use super::config::{State, Tc6Config};
use super::error::{Error, Result};
use super::status::{BufferStatus, StatusFlags};
use crate::hal::reset::ResetLine;
use crate::internal::constants::RESET_POLL_INTERVAL_MS;
use crate::internal::control;
use crate::internal::credit::FlowState;
use crate::internal::exchange::{run_exchange, service_status};
use crate::internal::regs::{RegisterAddress, c22_address, c45_address, config0, oa, status0};
use crate::internal::rx::Reassembler;
use crate::internal::tx::TxCursor;
use crate::sink::FrameSink;
use crate::sync::Tc6Shared;

// =============================================================================
// Statistics
// =============================================================================

/// Event counters kept by the engine.
///
/// Recoverable conditions are visible only here; fatal errors additionally
/// unwind out of [`Tc6::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tc6Stats {
    /// Frames handed to the sink.
    pub rx_frames: u32,
    /// Bytes handed to the sink.
    pub rx_bytes: u64,
    /// Frames fully transmitted.
    pub tx_frames: u32,
    /// Bytes fully transmitted.
    pub tx_bytes: u64,
    /// Inbound frames discarded mid-assembly.
    pub rx_dropped: u32,
    /// Completed frames the sink refused.
    pub rx_sink_errors: u32,
    /// Sink had no buffer, or a buffer refused to grow.
    pub rx_alloc_failures: u32,
    /// Transceiver receive buffer overflow events.
    pub rx_overflows: u32,
    /// Frames the transceiver asked us to drop via the footer.
    pub frame_drops: u32,
    /// Footers that contradicted the reassembly state.
    pub protocol_inconsistencies: u32,
    /// Filler chunks sent to collect receive data.
    pub tx_filler_chunks: u32,
    /// Transmit-path errors reported through STATUS0.
    pub tx_errors: u32,
}

impl Tc6Stats {
    /// All counters at zero.
    pub const fn new() -> Self {
        Self {
            rx_frames: 0,
            rx_bytes: 0,
            tx_frames: 0,
            tx_bytes: 0,
            rx_dropped: 0,
            rx_sink_errors: 0,
            rx_alloc_failures: 0,
            rx_overflows: 0,
            frame_drops: 0,
            protocol_inconsistencies: 0,
            tx_filler_chunks: 0,
            tx_errors: 0,
        }
    }
}

impl Default for Tc6Stats {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Engine
// =============================================================================

/// MAC-PHY SPI engine.
///
/// # Type Parameters
/// * `SPI` - full-duplex SPI device the transceiver hangs off
/// * `RST` - reset line output pin
/// * `D` - delay provider for the reset handshake
/// * `S` - sink receiving completed inbound frames
/// * `F` - outbound frame type (any byte-slice owner)
/// * `BUF_SIZE` - exchange buffer size in bytes; bounds the chunks per
///   exchange (each chunk is payload size + 4)
///
/// # Example
/// ```ignore
/// static SHARED: Tc6Shared<HeaplessFrame> = Tc6Shared::new();
///
/// let mut tc6: Tc6Default<_, _, _, _, HeaplessFrame> =
///     Tc6::new(spi, reset_pin, delay, sink, Tc6Config::new());
/// tc6.reset(&SHARED)?;
///
/// loop {
///     SHARED.wait();
///     tc6.tick(&SHARED)?;
/// }
/// ```
pub struct Tc6<SPI, RST, D, S, F, const BUF_SIZE: usize>
where
    SPI: SpiDevice<u8>,
    RST: OutputPin,
    D: DelayNs,
    S: FrameSink,
    F: AsRef<[u8]>,
{
    spi: SPI,
    reset_line: ResetLine<RST>,
    delay: D,
    sink: S,
    config: Tc6Config,
    state: State,
    /// Control transactions currently carry complement words.
    protected: bool,
    device_id: u32,
    flow: FlowState,
    reassembler: Reassembler<S::Buffer>,
    cursor: Option<TxCursor<F>>,
    stats: Tc6Stats,
    tx_buf: [u8; BUF_SIZE],
    rx_buf: [u8; BUF_SIZE],
}

/// Engine sized for 8 chunks of 64-byte payload per exchange.
pub type Tc6Small<SPI, RST, D, S, F> = Tc6<SPI, RST, D, S, F, 544>;
/// Engine sized for 16 chunks of 64-byte payload per exchange.
pub type Tc6Default<SPI, RST, D, S, F> = Tc6<SPI, RST, D, S, F, 1088>;
/// Engine sized for the full 31-chunk credit window per exchange.
pub type Tc6Large<SPI, RST, D, S, F> = Tc6<SPI, RST, D, S, F, 2176>;

impl<SPI, RST, D, S, F, const BUF_SIZE: usize> Tc6<SPI, RST, D, S, F, BUF_SIZE>
where
    SPI: SpiDevice<u8>,
    RST: OutputPin,
    D: DelayNs,
    S: FrameSink,
    F: AsRef<[u8]>,
{
    /// Create a new engine instance in the `Resetting` state.
    pub const fn new(spi: SPI, reset_pin: RST, delay: D, sink: S, config: Tc6Config) -> Self {
        Self {
            spi,
            reset_line: ResetLine::new(reset_pin),
            delay,
            sink,
            config,
            state: State::Resetting,
            protected: false,
            device_id: 0,
            flow: FlowState::new(),
            reassembler: Reassembler::new(),
            cursor: None,
            stats: Tc6Stats::new(),
            tx_buf: [0; BUF_SIZE],
            rx_buf: [0; BUF_SIZE],
        }
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    /// Current lifecycle state.
    #[inline(always)]
    pub fn state(&self) -> State {
        self.state
    }

    /// Event counters.
    #[inline(always)]
    pub fn stats(&self) -> &Tc6Stats {
        &self.stats
    }

    /// Reset all event counters.
    pub fn clear_stats(&mut self) {
        self.stats = Tc6Stats::new();
    }

    /// Identification register value captured during bring-up.
    #[inline(always)]
    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    /// The configuration the engine was built with.
    #[inline(always)]
    pub fn config(&self) -> &Tc6Config {
        &self.config
    }

    /// Access the inbound frame sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // =========================================================================
    // Reset & Bring-up
    // =========================================================================

    /// Run the full reset handshake and bring the data plane up.
    ///
    /// Pulses the reset line, waits for the reset-complete indication
    /// (signalled through the interrupt line into `shared`) in bounded
    /// 1 ms steps, then programs the chunk size, unmasks the error
    /// interrupts and enables configuration sync.
    ///
    /// This is also the only way out of [`State::Faulted`].
    pub fn reset(&mut self, shared: &Tc6Shared<F>) -> Result<()> {
        self.state = State::Resetting;
        self.protected = false;
        self.flow = FlowState::new();
        self.reassembler.clear();
        self.cursor = None;

        self.reset_line.pulse(&mut self.delay)?;

        let mut polls = 0u32;
        loop {
            if shared.take_interrupt() {
                let flags = StatusFlags::from_raw(self.control_read(oa::STATUS0)?);
                if flags.reset_complete {
                    break;
                }
            }
            if polls >= self.config.reset_timeout_polls {
                self.state = State::Faulted;
                return Err(Error::ResetTimeout);
            }
            self.delay.delay_ms(RESET_POLL_INTERVAL_MS);
            polls += 1;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("reset complete after {} polls", polls);

        self.control_write(oa::STATUS0, status0::RESETC)?;
        self.device_id = self.control_read(oa::ID)?;

        let mut cfg = self.control_read(oa::CONFIG0)?;
        cfg = (cfg & !config0::CPS_MASK) | self.config.chunk_payload_size.to_cps_field();
        if self.config.zero_align_rx {
            cfg |= config0::ZARFE;
        }
        if self.config.protected {
            cfg |= config0::PROTE;
        } else {
            cfg &= !config0::PROTE;
        }
        self.control_write(oa::CONFIG0, cfg)?;
        self.protected = self.config.protected;

        // Unmask the error interrupts (mask bits are 1 = masked).
        self.control_rmw(oa::IMASK0, status0::ERROR_MASK, 0)?;

        self.enable_sync()?;
        self.state = State::Synced;

        #[cfg(feature = "defmt")]
        defmt::info!("transceiver up, id {:#010x}", self.device_id);

        Ok(())
    }

    // =========================================================================
    // Worker Entry Point
    // =========================================================================

    /// Service one worker wake-up.
    ///
    /// Performs exchanges while there is immediate work: a queued or
    /// partially sent frame with transmit credit, receive chunks the
    /// transceiver advertised, or a pending interrupt whose footer needs
    /// inspecting. Chunks within an exchange are processed strictly in
    /// transfer order and inbound frames reach the sink in that order.
    ///
    /// Fatal errors move the engine to [`State::Faulted`] and unwind to
    /// the caller; recoverable conditions only show up in [`Tc6::stats`].
    pub fn tick(&mut self, shared: &Tc6Shared<F>) -> Result<()> {
        if !matches!(self.state, State::Synced | State::Overflowing) {
            return Err(Error::InvalidState);
        }

        let mut irq = shared.take_interrupt();
        loop {
            let want_tx =
                self.flow.txc > 0 && (self.cursor.is_some() || shared.frame_queued());
            let want_rx = self.flow.rca > 0;
            if !want_tx && !want_rx && !irq {
                break;
            }

            let cps = self.config.chunk_payload_size.as_bytes();
            let performed = run_exchange(
                &mut self.spi,
                self.protected,
                cps,
                &mut self.tx_buf,
                &mut self.rx_buf,
                &mut self.flow,
                &mut self.reassembler,
                &mut self.cursor,
                &mut self.sink,
                irq,
                || shared.take_frame(),
                &mut self.stats,
            )
            .map_err(|e| self.fault(e))?;

            irq = false;
            self.track_overflow_state();
            if !performed {
                break;
            }
        }

        Ok(())
    }

    // =========================================================================
    // Control Plane
    // =========================================================================

    /// Read a single register.
    pub fn register_read(&mut self, addr: RegisterAddress) -> Result<u32> {
        self.control_read(addr)
    }

    /// Write a single register.
    pub fn register_write(&mut self, addr: RegisterAddress, value: u32) -> Result<()> {
        self.control_write(addr, value)
    }

    /// Read a register, clear `mask` bits, OR in `value & mask`, write back.
    pub fn read_modify_write(
        &mut self,
        addr: RegisterAddress,
        mask: u32,
        value: u32,
    ) -> Result<()> {
        self.control_rmw(addr, mask, value)
    }

    /// Read a clause-22 PHY register.
    pub fn mdio_read_c22(&mut self, reg: u8) -> Result<u16> {
        Ok(self.control_read(c22_address(reg))? as u16)
    }

    /// Write a clause-22 PHY register.
    pub fn mdio_write_c22(&mut self, reg: u8, value: u16) -> Result<()> {
        self.control_write(c22_address(reg), value as u32)
    }

    /// Read a clause-45 PHY register through its memory map sector.
    pub fn mdio_read_c45(&mut self, devad: u8, reg: u16) -> Result<u16> {
        let addr = c45_address(devad, reg).ok_or(Error::UnsupportedMmd)?;
        Ok(self.control_read(addr)? as u16)
    }

    /// Write a clause-45 PHY register through its memory map sector.
    pub fn mdio_write_c45(&mut self, devad: u8, reg: u16, value: u16) -> Result<()> {
        let addr = c45_address(devad, reg).ok_or(Error::UnsupportedMmd)?;
        self.control_write(addr, value as u32)
    }

    // =========================================================================
    // Mode Toggles
    // =========================================================================

    /// Enable configuration sync: the transceiver starts accepting and
    /// producing data chunks.
    pub fn enable_sync(&mut self) -> Result<()> {
        self.control_rmw(oa::CONFIG0, config0::SYNC, config0::SYNC)
    }

    /// Ask the transceiver to align received frames to word offset zero.
    pub fn enable_zero_align_rx(&mut self) -> Result<()> {
        self.control_rmw(oa::CONFIG0, config0::ZARFE, config0::ZARFE)
    }

    /// Switch protected-mode control transactions on or off.
    ///
    /// The register write travels in the old mode; the new mode applies
    /// from the next transaction on.
    pub fn set_protected_mode(&mut self, enabled: bool) -> Result<()> {
        let value = if enabled { config0::PROTE } else { 0 };
        self.control_rmw(oa::CONFIG0, config0::PROTE, value)?;
        self.protected = enabled;
        Ok(())
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Read and clear STATUS0, acting on what it reports.
    ///
    /// Recoverable receive overflows are absorbed (the engine moves to
    /// [`State::Overflowing`]); loss of framing and header errors fault
    /// the engine and propagate.
    pub fn check_status(&mut self) -> Result<StatusFlags> {
        let flags = service_status(
            &mut self.spi,
            self.protected,
            &mut self.reassembler,
            &mut self.stats,
        )
        .map_err(|e| self.fault(e))?;
        self.track_overflow_state();
        Ok(flags)
    }

    /// Snapshot the transceiver's live credit counters from BUFSTS.
    pub fn buffer_status(&mut self) -> Result<BufferStatus> {
        Ok(BufferStatus::from_raw(self.control_read(oa::BUFSTS)?))
    }

    /// Latest flow-control view taken from footers.
    #[inline(always)]
    pub fn flow_state(&self) -> FlowState {
        self.flow
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn control_read(&mut self, addr: RegisterAddress) -> Result<u32> {
        control::read_register(&mut self.spi, self.protected, addr)
            .map_err(|e| self.fault(e))
    }

    fn control_write(&mut self, addr: RegisterAddress, value: u32) -> Result<()> {
        control::write_register(&mut self.spi, self.protected, addr, value)
            .map_err(|e| self.fault(e))
    }

    fn control_rmw(&mut self, addr: RegisterAddress, mask: u32, value: u32) -> Result<()> {
        control::read_modify_write(&mut self.spi, self.protected, addr, mask, value)
            .map_err(|e| self.fault(e))
    }

    /// Record a fatal error: the engine stays down until the next reset.
    fn fault(&mut self, err: Error) -> Error {
        #[cfg(feature = "defmt")]
        defmt::warn!("engine fault: {}", err);
        self.state = State::Faulted;
        err
    }

    /// Mirror the reassembler's overflow condition into the state machine.
    fn track_overflow_state(&mut self) {
        match (self.state, self.reassembler.overflow()) {
            (State::Synced, true) => self.state = State::Overflowing,
            (State::Overflowing, false) => self.state = State::Synced,
            _ => {}
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
