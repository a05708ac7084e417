//! Header/footer codec for the SPI chunk protocol.
//!
//! Every control transaction and every data chunk starts (host to
//! transceiver) or ends (transceiver to host) with one 32-bit word,
//! big-endian on the wire. This module is the single place where field
//! packing, parity and endianness are handled; everything above it works
//! with the typed structs.
//!
//! The parity bit `P` (bit 0) is chosen so the population count of the
//! complete word is odd. Decoding recomputes the fold and rejects words
//! whose parity does not hold.

use crate::driver::error::FramingError;

// =============================================================================
// Field Layout
// =============================================================================

// Control header: DNC(31) HDRB(30) WNR(29) AID(28) MMS(27:24) ADDR(23:8)
// LEN(7:1) P(0)
const CTRL_DNC: u32 = 1 << 31;
const CTRL_WNR: u32 = 1 << 29;
const CTRL_AID: u32 = 1 << 28;
const CTRL_MMS_SHIFT: u32 = 24;
const CTRL_MMS_MASK: u32 = 0x0F00_0000;
const CTRL_ADDR_SHIFT: u32 = 8;
const CTRL_ADDR_MASK: u32 = 0x00FF_FF00;
const CTRL_LEN_SHIFT: u32 = 1;
const CTRL_LEN_MASK: u32 = 0x0000_00FE;

// Data header: DNC(31) SEQ(30) NORX(29) DV(21) SV(20) SWO(19:16) EV(14)
// EBO(13:8) P(0)
const DATA_DNC: u32 = 1 << 31;
const DATA_SEQ: u32 = 1 << 30;
const DATA_NORX: u32 = 1 << 29;
const DATA_DV: u32 = 1 << 21;
const DATA_SV: u32 = 1 << 20;
const DATA_SWO_SHIFT: u32 = 16;
const DATA_SWO_MASK: u32 = 0x000F_0000;
const DATA_EV: u32 = 1 << 14;
const DATA_EBO_SHIFT: u32 = 8;
const DATA_EBO_MASK: u32 = 0x0000_3F00;

// Data footer: EXST(31) HDRB(30) SYNC(29) RCA(28:24) DV(21) SV(20)
// SWO(19:16) FD(15) EV(14) EBO(13:8) TXC(5:1) P(0)
const FTR_EXST: u32 = 1 << 31;
const FTR_HDRB: u32 = 1 << 30;
const FTR_SYNC: u32 = 1 << 29;
const FTR_RCA_SHIFT: u32 = 24;
const FTR_RCA_MASK: u32 = 0x1F00_0000;
const FTR_DV: u32 = 1 << 21;
const FTR_SV: u32 = 1 << 20;
const FTR_SWO_SHIFT: u32 = 16;
const FTR_SWO_MASK: u32 = 0x000F_0000;
const FTR_FD: u32 = 1 << 15;
const FTR_EV: u32 = 1 << 14;
const FTR_EBO_SHIFT: u32 = 8;
const FTR_EBO_MASK: u32 = 0x0000_3F00;
const FTR_TXC_SHIFT: u32 = 1;
const FTR_TXC_MASK: u32 = 0x0000_003E;

// =============================================================================
// Parity
// =============================================================================

/// XOR-fold all 32 bits pairwise down to one: the population parity.
#[inline]
const fn fold(word: u32) -> u32 {
    let mut p = word;
    p ^= p >> 16;
    p ^= p >> 8;
    p ^= p >> 4;
    p ^= p >> 2;
    p ^= p >> 1;
    p & 1
}

/// Parity bit for a word whose P position is still clear: the value that
/// makes the total population count odd.
#[inline]
const fn parity_for(word: u32) -> u32 {
    fold(word) ^ 1
}

/// Check the parity of a complete received word.
#[inline]
const fn parity_holds(word: u32) -> bool {
    fold(word) == 1
}

/// Finalize an encoded word by stamping its parity bit.
#[inline]
const fn seal(word: u32) -> u32 {
    word | parity_for(word)
}

fn checked(word: u32) -> Result<u32, FramingError> {
    if parity_holds(word) {
        Ok(word)
    } else {
        Err(FramingError::ParityError)
    }
}

// =============================================================================
// Control Header
// =============================================================================

/// Header word of a register read/write transaction.
///
/// The transceiver echoes this word back verbatim one word later in the
/// exchange; the control engine verifies the echo byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlHeader {
    /// Write (true) or read (false).
    pub write_not_read: bool,
    /// Address auto-increment for multi-register transactions.
    pub auto_increment: bool,
    /// Memory map sector (4 bits).
    pub mms: u8,
    /// Register offset within the sector.
    pub addr: u16,
    /// Number of registers minus one (7 bits); 0 for a single register.
    pub len: u8,
}

impl ControlHeader {
    /// Pack into a 32-bit word with the parity bit stamped.
    pub fn encode(&self) -> u32 {
        let mut word = 0u32;
        if self.write_not_read {
            word |= CTRL_WNR;
        }
        if self.auto_increment {
            word |= CTRL_AID;
        }
        word |= ((self.mms as u32) << CTRL_MMS_SHIFT) & CTRL_MMS_MASK;
        word |= ((self.addr as u32) << CTRL_ADDR_SHIFT) & CTRL_ADDR_MASK;
        word |= ((self.len as u32) << CTRL_LEN_SHIFT) & CTRL_LEN_MASK;
        seal(word)
    }

    /// Unpack a received word, verifying its parity.
    pub fn decode(word: u32) -> Result<Self, FramingError> {
        let word = checked(word)?;
        Ok(Self {
            write_not_read: word & CTRL_WNR != 0,
            auto_increment: word & CTRL_AID != 0,
            mms: ((word & CTRL_MMS_MASK) >> CTRL_MMS_SHIFT) as u8,
            addr: ((word & CTRL_ADDR_MASK) >> CTRL_ADDR_SHIFT) as u16,
            len: ((word & CTRL_LEN_MASK) >> CTRL_LEN_SHIFT) as u8,
        })
    }

    /// Big-endian wire form.
    pub fn to_wire(&self) -> [u8; 4] {
        self.encode().to_be_bytes()
    }
}

// =============================================================================
// Data Header
// =============================================================================

/// Header word prefixed to every transmitted data chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataHeader {
    /// Sequence toggle.
    pub seq: bool,
    /// Host cannot accept receive data in this chunk slot.
    pub no_rx: bool,
    /// Payload carries transmit data.
    pub data_valid: bool,
    /// A frame starts within this chunk.
    pub start_valid: bool,
    /// Word offset of the frame start (4 bits, in 32-bit words).
    pub start_word_offset: u8,
    /// A frame ends within this chunk.
    pub end_valid: bool,
    /// Byte offset of the final frame byte (6 bits).
    pub end_byte_offset: u8,
}

impl DataHeader {
    /// Pack into a 32-bit word with the parity bit stamped.
    pub fn encode(&self) -> u32 {
        let mut word = DATA_DNC;
        if self.seq {
            word |= DATA_SEQ;
        }
        if self.no_rx {
            word |= DATA_NORX;
        }
        if self.data_valid {
            word |= DATA_DV;
        }
        if self.start_valid {
            word |= DATA_SV;
        }
        word |= ((self.start_word_offset as u32) << DATA_SWO_SHIFT) & DATA_SWO_MASK;
        if self.end_valid {
            word |= DATA_EV;
        }
        word |= ((self.end_byte_offset as u32) << DATA_EBO_SHIFT) & DATA_EBO_MASK;
        seal(word)
    }

    /// Unpack a received word, verifying its parity.
    pub fn decode(word: u32) -> Result<Self, FramingError> {
        let word = checked(word)?;
        Ok(Self {
            seq: word & DATA_SEQ != 0,
            no_rx: word & DATA_NORX != 0,
            data_valid: word & DATA_DV != 0,
            start_valid: word & DATA_SV != 0,
            start_word_offset: ((word & DATA_SWO_MASK) >> DATA_SWO_SHIFT) as u8,
            end_valid: word & DATA_EV != 0,
            end_byte_offset: ((word & DATA_EBO_MASK) >> DATA_EBO_SHIFT) as u8,
        })
    }

    /// Big-endian wire form.
    pub fn to_wire(&self) -> [u8; 4] {
        self.encode().to_be_bytes()
    }
}

// =============================================================================
// Data Footer
// =============================================================================

/// Footer word trailing every received data chunk.
///
/// Besides the frame boundary markers this carries the transceiver's flow
/// control state: receive chunks available, transmit credit, the sync flag
/// and the exception indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataFooter {
    /// An exception is pending; STATUS0 holds the detail.
    pub exception: bool,
    /// The transceiver rejected the header of this chunk.
    pub header_bad: bool,
    /// Configuration is synchronized; payload is only meaningful when set.
    pub sync: bool,
    /// Receive chunks available (5 bits).
    pub rca: u8,
    /// Payload carries receive data.
    pub data_valid: bool,
    /// A frame starts within this chunk.
    pub start_valid: bool,
    /// Word offset of the frame start (4 bits, in 32-bit words).
    pub start_word_offset: u8,
    /// The frame in progress must be dropped.
    pub frame_drop: bool,
    /// A frame ends within this chunk.
    pub end_valid: bool,
    /// Byte offset of the final frame byte (6 bits).
    pub end_byte_offset: u8,
    /// Transmit credit (5 bits).
    pub txc: u8,
}

impl DataFooter {
    /// Pack into a 32-bit word with the parity bit stamped.
    ///
    /// On hardware the footer only ever travels transceiver-to-host;
    /// encoding exists for the round-trip law and for scripted exchanges
    /// in tests.
    pub fn encode(&self) -> u32 {
        let mut word = 0u32;
        if self.exception {
            word |= FTR_EXST;
        }
        if self.header_bad {
            word |= FTR_HDRB;
        }
        if self.sync {
            word |= FTR_SYNC;
        }
        word |= ((self.rca as u32) << FTR_RCA_SHIFT) & FTR_RCA_MASK;
        if self.data_valid {
            word |= FTR_DV;
        }
        if self.start_valid {
            word |= FTR_SV;
        }
        word |= ((self.start_word_offset as u32) << FTR_SWO_SHIFT) & FTR_SWO_MASK;
        if self.frame_drop {
            word |= FTR_FD;
        }
        if self.end_valid {
            word |= FTR_EV;
        }
        word |= ((self.end_byte_offset as u32) << FTR_EBO_SHIFT) & FTR_EBO_MASK;
        word |= ((self.txc as u32) << FTR_TXC_SHIFT) & FTR_TXC_MASK;
        seal(word)
    }

    /// Unpack a received word, verifying its parity.
    pub fn decode(word: u32) -> Result<Self, FramingError> {
        let word = checked(word)?;
        Ok(Self {
            exception: word & FTR_EXST != 0,
            header_bad: word & FTR_HDRB != 0,
            sync: word & FTR_SYNC != 0,
            rca: ((word & FTR_RCA_MASK) >> FTR_RCA_SHIFT) as u8,
            data_valid: word & FTR_DV != 0,
            start_valid: word & FTR_SV != 0,
            start_word_offset: ((word & FTR_SWO_MASK) >> FTR_SWO_SHIFT) as u8,
            frame_drop: word & FTR_FD != 0,
            end_valid: word & FTR_EV != 0,
            end_byte_offset: ((word & FTR_EBO_MASK) >> FTR_EBO_SHIFT) as u8,
            txc: ((word & FTR_TXC_MASK) >> FTR_TXC_SHIFT) as u8,
        })
    }

    /// Decode from the big-endian wire form.
    pub fn from_wire(bytes: [u8; 4]) -> Result<Self, FramingError> {
        Self::decode(u32::from_be_bytes(bytes))
    }

    /// Big-endian wire form.
    pub fn to_wire(&self) -> [u8; 4] {
        self.encode().to_be_bytes()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
