//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for exercising the engine
//! on the host without hardware access:
//!
//! - [`ScriptedSpi`]: replies with pre-scripted byte buffers, for
//!   transaction-level tests that pin exact wire contents.
//! - [`MockPhy`]: a behavioral transceiver model with a register file,
//!   echo semantics, credit advertisement and frame chunking, for
//!   driver-level tests.
//! - [`MockResetPin`] / [`MockDelay`]: GPIO and timing doubles.
//! - [`VecSink`] / [`VecFrame`]: a frame sink with controllable failure
//!   modes.
//!
//! Only available when running `cargo test`.

#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::collections::{HashMap, VecDeque};
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, ErrorKind, Operation, SpiDevice};

use crate::internal::constants::HEADER_SIZE;
use crate::internal::header::{ControlHeader, DataFooter, DataHeader};
use crate::internal::regs::oa;
use crate::sink::{FrameBuffer, FrameSink, SinkFull};

// =============================================================================
// SPI Error
// =============================================================================

/// Error type shared by the SPI mocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSpiError(pub ErrorKind);

impl spi::Error for MockSpiError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

// =============================================================================
// Scripted SPI
// =============================================================================

enum Step {
    Reply(Vec<u8>),
    Fail(ErrorKind),
}

/// SPI device that answers each transfer with a pre-scripted buffer.
///
/// Every transmitted buffer is recorded for assertions. A reply shorter
/// than the transfer is zero-extended.
#[derive(Default)]
pub struct ScriptedSpi {
    steps: RefCell<VecDeque<Step>>,
    tx_log: RefCell<Vec<Vec<u8>>>,
}

impl ScriptedSpi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the reply for the next transfer.
    pub fn reply(&mut self, bytes: Vec<u8>) {
        self.steps.borrow_mut().push_back(Step::Reply(bytes));
    }

    /// Make the next transfer fail.
    pub fn fail(&mut self, kind: ErrorKind) {
        self.steps.borrow_mut().push_back(Step::Fail(kind));
    }

    /// Everything transmitted so far, one entry per transfer.
    pub fn tx_log(&self) -> Vec<Vec<u8>> {
        self.tx_log.borrow().clone()
    }
}

impl spi::ErrorType for ScriptedSpi {
    type Error = MockSpiError;
}

impl SpiDevice<u8> for ScriptedSpi {
    fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            let Operation::Transfer(read, write) = op else {
                panic!("mock only supports full-duplex transfers");
            };
            let step = self
                .steps
                .borrow_mut()
                .pop_front()
                .expect("unscripted SPI transfer");
            match step {
                Step::Fail(kind) => return Err(MockSpiError(kind)),
                Step::Reply(bytes) => {
                    self.tx_log.borrow_mut().push(write.to_vec());
                    read.fill(0);
                    let n = bytes.len().min(read.len());
                    read[..n].copy_from_slice(&bytes[..n]);
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Behavioral Transceiver Model
// =============================================================================

/// A transceiver double good enough to bring the whole engine up against.
///
/// Control transactions run against a register file with the protocol's
/// echo semantics (the response stream is the request delayed one word);
/// STATUS0/STATUS1 are write-1-to-clear. Data exchanges consume queued
/// receive chunks, advertise credit, and reassemble what the engine
/// transmits so tests can compare whole frames.
pub struct MockPhy {
    cps: usize,
    /// Register file keyed by (sector, offset).
    pub regs: RefCell<HashMap<(u8, u16), u32>>,
    /// Control writes observed: (sector, offset, value).
    pub writes: RefCell<Vec<(u8, u16, u32)>>,
    /// Transmit credit to advertise in every footer.
    pub txc: Cell<u8>,
    /// Sync flag to advertise in every footer.
    pub sync: Cell<bool>,
    /// Raise the exception flag in footers until STATUS0 is read.
    pub exception: Cell<bool>,
    /// Fail the next transfer with this error.
    pub fail_next: Cell<Option<ErrorKind>>,
    /// Frames fully received from the engine.
    pub tx_frames: RefCell<Vec<Vec<u8>>>,
    tx_partial: RefCell<Vec<u8>>,
    rx_chunks: RefCell<VecDeque<(Vec<u8>, DataFooter)>>,
    data_exchanges: Cell<usize>,
}

impl MockPhy {
    /// Identification register value the model reports.
    pub const DEVICE_ID: u32 = 0x0011_0002;

    pub fn new(cps: usize) -> Self {
        let mut regs = HashMap::new();
        // Fresh out of reset: RESETC pending, default chunk size 64,
        // everything masked.
        regs.insert((oa::ID.mms(), oa::ID.offset()), Self::DEVICE_ID);
        regs.insert((oa::STATUS0.mms(), oa::STATUS0.offset()), 1 << 6);
        regs.insert((oa::CONFIG0.mms(), oa::CONFIG0.offset()), 0x0000_0006);
        regs.insert((oa::IMASK0.mms(), oa::IMASK0.offset()), 0xFFFF_FFFF);
        Self {
            cps,
            regs: RefCell::new(regs),
            writes: RefCell::new(Vec::new()),
            txc: Cell::new(0),
            sync: Cell::new(true),
            exception: Cell::new(false),
            fail_next: Cell::new(None),
            tx_frames: RefCell::new(Vec::new()),
            tx_partial: RefCell::new(Vec::new()),
            rx_chunks: RefCell::new(VecDeque::new()),
            data_exchanges: Cell::new(0),
        }
    }

    /// Queue a whole frame to be delivered chunk by chunk.
    pub fn queue_rx_frame(&self, frame: &[u8]) {
        let chunks: Vec<&[u8]> = frame.chunks(self.cps).collect();
        let last = chunks.len() - 1;
        for (i, chunk) in chunks.iter().enumerate() {
            let footer = DataFooter {
                start_valid: i == 0,
                end_valid: i == last,
                end_byte_offset: if i == last { (chunk.len() - 1) as u8 } else { 0 },
                ..Default::default()
            };
            self.rx_chunks
                .borrow_mut()
                .push_back((chunk.to_vec(), footer));
        }
    }

    /// Queue a lone frame-start chunk with no end marker.
    pub fn queue_rx_start_only(&self, payload: &[u8]) {
        let footer = DataFooter {
            start_valid: true,
            ..Default::default()
        };
        self.rx_chunks
            .borrow_mut()
            .push_back((payload.to_vec(), footer));
    }

    /// Latch an exception: STATUS0 gains `bits` and footers carry the
    /// exception flag until STATUS0 is read.
    pub fn raise_exception(&self, bits: u32) {
        let key = (oa::STATUS0.mms(), oa::STATUS0.offset());
        let mut regs = self.regs.borrow_mut();
        let current = regs.get(&key).copied().unwrap_or(0);
        regs.insert(key, current | bits);
        self.exception.set(true);
    }

    /// Data exchanges seen since the last [`Self::clear_logs`].
    pub fn data_exchanges(&self) -> usize {
        self.data_exchanges.get()
    }

    pub fn clear_logs(&self) {
        self.writes.borrow_mut().clear();
        self.tx_frames.borrow_mut().clear();
        self.tx_partial.borrow_mut().clear();
        self.data_exchanges.set(0);
    }

    fn serve_control(&self, read: &mut [u8], write: &[u8]) {
        let len = write.len();
        let protected = len == 16;
        let mut word = [0u8; 4];
        word.copy_from_slice(&write[0..4]);
        let header = ControlHeader::decode(u32::from_be_bytes(word)).expect("bad control header");
        let key = (header.mms, header.addr);

        if header.write_not_read {
            let mut value = [0u8; 4];
            value.copy_from_slice(&write[4..8]);
            let value = u32::from_be_bytes(value);
            let mut regs = self.regs.borrow_mut();
            let stored = if key == (oa::STATUS0.mms(), oa::STATUS0.offset())
                || key == (oa::STATUS1.mms(), oa::STATUS1.offset())
            {
                regs.get(&key).copied().unwrap_or(0) & !value
            } else {
                value
            };
            regs.insert(key, stored);
            self.writes.borrow_mut().push((header.mms, header.addr, value));
        } else if key == (oa::STATUS0.mms(), oa::STATUS0.offset()) {
            self.exception.set(false);
        }

        // Echo stream: the request delayed by one word.
        read.fill(0);
        read[4..len].copy_from_slice(&write[0..len - 4]);
        if !header.write_not_read {
            let value = self.regs.borrow().get(&key).copied().unwrap_or(0);
            read[8..12].copy_from_slice(&value.to_be_bytes());
            if protected {
                read[12..16].copy_from_slice(&(!value).to_be_bytes());
            }
        }
    }

    fn serve_data(&self, read: &mut [u8], write: &[u8]) {
        let chunk_size = HEADER_SIZE + self.cps;
        assert_eq!(write.len() % chunk_size, 0, "ragged data exchange");
        self.data_exchanges.set(self.data_exchanges.get() + 1);

        for (slot, chunk) in write.chunks(chunk_size).enumerate() {
            // Capture what the engine transmitted.
            let mut word = [0u8; 4];
            word.copy_from_slice(&chunk[0..4]);
            let header = DataHeader::decode(u32::from_be_bytes(word)).expect("bad data header");
            if header.data_valid {
                let payload = &chunk[HEADER_SIZE..];
                let mut partial = self.tx_partial.borrow_mut();
                if header.start_valid {
                    partial.clear();
                }
                if header.end_valid {
                    partial.extend_from_slice(&payload[..=header.end_byte_offset as usize]);
                    self.tx_frames.borrow_mut().push(core::mem::take(&mut *partial));
                } else {
                    partial.extend_from_slice(payload);
                }
            }

            // Produce the receive side of the slot.
            let (payload, mut footer) = match self.rx_chunks.borrow_mut().pop_front() {
                Some((payload, footer)) => (payload, footer),
                None => (Vec::new(), DataFooter::default()),
            };
            footer.data_valid = !payload.is_empty();
            footer.rca = self.rx_chunks.borrow().len().min(31) as u8;
            footer.txc = self.txc.get();
            footer.sync = self.sync.get();
            footer.exception = self.exception.get();

            let base = slot * chunk_size;
            read[base..base + self.cps].fill(0);
            read[base..base + payload.len()].copy_from_slice(&payload);
            read[base + self.cps..base + chunk_size].copy_from_slice(&footer.to_wire());
        }
    }
}

impl spi::ErrorType for MockPhy {
    type Error = MockSpiError;
}

impl SpiDevice<u8> for MockPhy {
    fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            let Operation::Transfer(read, write) = op else {
                panic!("mock only supports full-duplex transfers");
            };
            if let Some(kind) = self.fail_next.take() {
                return Err(MockSpiError(kind));
            }
            assert_eq!(read.len(), write.len(), "half-duplex transfer");
            if write[0] & 0x80 != 0 {
                self.serve_data(read, write);
            } else {
                self.serve_control(read, write);
            }
        }
        Ok(())
    }
}

// =============================================================================
// GPIO and Delay Doubles
// =============================================================================

/// Edge recorded by [`MockResetPin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Low,
    High,
}

/// Output pin that records every level change.
#[derive(Debug, Default)]
pub struct MockResetPin {
    events: Vec<PinEvent>,
}

impl MockResetPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PinEvent> {
        self.events.clone()
    }
}

impl digital::ErrorType for MockResetPin {
    type Error = Infallible;
}

impl OutputPin for MockResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.events.push(PinEvent::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.events.push(PinEvent::High);
        Ok(())
    }
}

/// Delay provider that only accumulates requested time.
#[derive(Debug, Default)]
pub struct MockDelay {
    total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_us(&self) -> u64 {
        self.total_ns / 1_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

// =============================================================================
// Frame Sink Doubles
// =============================================================================

/// Growable frame buffer with an optional capacity cap.
#[derive(Debug, Default)]
pub struct VecFrame {
    bytes: Vec<u8>,
    capacity: Option<usize>,
}

impl FrameBuffer for VecFrame {
    fn append(&mut self, bytes: &[u8]) -> Result<(), SinkFull> {
        if let Some(cap) = self.capacity {
            if self.bytes.len() + bytes.len() > cap {
                return Err(SinkFull);
            }
        }
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// Frame sink with controllable failure modes.
#[derive(Debug, Default)]
pub struct VecSink {
    /// Completed frames, in submission order.
    pub frames: Vec<Vec<u8>>,
    /// Refuse to hand out buffers (simulates pool exhaustion).
    pub refuse_allocs: bool,
    /// Refuse completed frames (simulates a saturated stack).
    pub refuse_submits: bool,
    /// Cap on each handed-out buffer.
    pub frame_capacity: Option<usize>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for VecSink {
    type Buffer = VecFrame;

    fn start_frame(&mut self) -> Option<VecFrame> {
        if self.refuse_allocs {
            return None;
        }
        Some(VecFrame {
            bytes: Vec::new(),
            capacity: self.frame_capacity,
        })
    }

    fn submit(&mut self, frame: VecFrame) -> Result<(), SinkFull> {
        if self.refuse_submits {
            return Err(SinkFull);
        }
        self.frames.push(frame.bytes);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::regs::RegisterAddress;

    #[test]
    fn scripted_spi_replays_and_records() {
        let mut spi = ScriptedSpi::new();
        spi.reply(std::vec![1, 2, 3, 4]);

        let mut rx = [0u8; 4];
        spi.transfer(&mut rx, &[9, 9, 9, 9]).unwrap();

        assert_eq!(rx, [1, 2, 3, 4]);
        assert_eq!(spi.tx_log(), std::vec![std::vec![9, 9, 9, 9]]);
    }

    #[test]
    fn mock_phy_echoes_control_stream() {
        let mut phy = MockPhy::new(64);
        let addr = RegisterAddress::new(0, 0x1234);

        let value =
            crate::internal::control::read_register(&mut phy, false, addr).unwrap();
        assert_eq!(value, 0);

        crate::internal::control::write_register(&mut phy, false, addr, 0xAABB_CCDD).unwrap();
        let value =
            crate::internal::control::read_register(&mut phy, false, addr).unwrap();
        assert_eq!(value, 0xAABB_CCDD);
    }

    #[test]
    fn mock_phy_status0_is_write_one_to_clear() {
        let mut phy = MockPhy::new(64);

        // RESETC starts set.
        let status =
            crate::internal::control::read_register(&mut phy, false, oa::STATUS0).unwrap();
        assert_eq!(status & (1 << 6), 1 << 6);

        crate::internal::control::write_register(&mut phy, false, oa::STATUS0, 1 << 6).unwrap();
        let status =
            crate::internal::control::read_register(&mut phy, false, oa::STATUS0).unwrap();
        assert_eq!(status & (1 << 6), 0);
    }

    #[test]
    fn vec_frame_respects_capacity() {
        let mut frame = VecFrame {
            bytes: Vec::new(),
            capacity: Some(4),
        };

        frame.append(&[1, 2, 3]).unwrap();
        assert!(frame.append(&[4, 5]).is_err());
        assert_eq!(frame.len(), 3);
    }
}
