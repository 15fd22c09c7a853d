//! Data chunk header and footer words.

use super::bits::{data_header, footer, has_odd_parity, parity_bit};

// =============================================================================
// Data Header
// =============================================================================

/// Transmit timestamp capture request carried in the TSC header field.
///
/// A non-zero value asks the MAC-PHY to capture the transmit timestamp of the
/// frame into the matching TTSCx register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TimestampCapture {
    /// No timestamp capture
    #[default]
    None = 0,
    /// Capture into TTSCA
    A = 1,
    /// Capture into TTSCB
    B = 2,
    /// Capture into TTSCC
    C = 3,
}

impl TimestampCapture {
    /// Raw TSC field value
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// 32-bit header of a TX data chunk, built field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataHeader(u32);

impl DataHeader {
    /// Header with DNC and DV set for the given sequence counter.
    pub const fn new(sequence: u8) -> Self {
        Self(data_header::DNC.make(1) | data_header::DV.make(1) | data_header::SEQ.make(sequence as u32))
    }

    /// Header of an empty data chunk (no valid data).
    pub const fn empty() -> Self {
        Self(data_header::DNC.make(1))
    }

    /// Mark a frame start at the given 32-bit word offset.
    #[must_use]
    pub const fn with_start(self, word_offset: u32) -> Self {
        Self(self.0 | data_header::SV.make(1) | data_header::SWO.make(word_offset))
    }

    /// Mark a frame end at the given byte offset (index of the last byte).
    #[must_use]
    pub const fn with_end(self, byte_offset: u32) -> Self {
        Self(self.0 | data_header::EV.make(1) | data_header::EBO.make(byte_offset))
    }

    /// Request a transmit timestamp capture.
    #[must_use]
    pub const fn with_timestamp_capture(self, tsc: TimestampCapture) -> Self {
        Self(self.0 | data_header::TSC.make(tsc.bits()))
    }

    /// Whether a frame starts in this chunk.
    pub const fn start_valid(self) -> bool {
        data_header::SV.is_set(self.0)
    }

    /// Start word offset.
    pub const fn start_word_offset(self) -> u32 {
        data_header::SWO.get(self.0)
    }

    /// Whether a frame ends in this chunk.
    pub const fn end_valid(self) -> bool {
        data_header::EV.is_set(self.0)
    }

    /// End byte offset.
    pub const fn end_byte_offset(self) -> u32 {
        data_header::EBO.get(self.0)
    }

    /// Requested timestamp capture bits.
    pub const fn timestamp_capture(self) -> u32 {
        data_header::TSC.get(self.0)
    }

    /// Sequence bit.
    pub const fn sequence(self) -> u32 {
        data_header::SEQ.get(self.0)
    }

    /// Final wire word, parity included.
    pub const fn to_word(self) -> u32 {
        let word = self.0 & !data_header::P.make(1);
        word | data_header::P.make(parity_bit(word))
    }

    /// Decode a header word (parity bit is kept as received).
    pub const fn from_word(word: u32) -> Self {
        Self(word)
    }
}

// =============================================================================
// Footer
// =============================================================================

/// 32-bit footer of an RX data chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Footer(u32);

impl Footer {
    /// Wrap a raw footer word.
    pub const fn from_word(word: u32) -> Self {
        Self(word)
    }

    /// Raw footer word.
    pub const fn word(self) -> u32 {
        self.0
    }

    /// All-zero or all-one footers mean nobody drives MISO.
    pub const fn is_stuck(self) -> bool {
        self.0 == 0 || self.0 == u32::MAX
    }

    /// Odd parity over the whole footer.
    pub const fn parity_ok(self) -> bool {
        has_odd_parity(self.0)
    }

    /// Extended status flag
    pub const fn extended_status(self) -> bool {
        footer::EXST.is_set(self.0)
    }

    /// The MAC-PHY rejected the previous header
    pub const fn header_bad(self) -> bool {
        footer::HDRB.is_set(self.0)
    }

    /// Configuration synchronized
    pub const fn synced(self) -> bool {
        footer::SYNC.is_set(self.0)
    }

    /// Receive chunks available
    pub const fn rx_chunks_available(self) -> u8 {
        footer::RCA.get(self.0) as u8
    }

    /// Transmit credits
    pub const fn tx_credit(self) -> u8 {
        footer::TXC.get(self.0) as u8
    }

    /// Any frame data in this chunk
    pub const fn has_data(self) -> bool {
        self.0 & footer::DATA_MASK != 0
    }

    /// Data valid
    pub const fn data_valid(self) -> bool {
        footer::DV.is_set(self.0)
    }

    /// Start of frame valid
    pub const fn start_valid(self) -> bool {
        footer::SV.is_set(self.0)
    }

    /// Byte offset of the frame start (word offset times four)
    pub const fn start_byte_offset(self) -> usize {
        footer::SWO.get(self.0) as usize * 4
    }

    /// End of frame valid
    pub const fn end_valid(self) -> bool {
        footer::EV.is_set(self.0)
    }

    /// Index of the last frame byte in the chunk
    pub const fn end_byte_offset(self) -> usize {
        footer::EBO.get(self.0) as usize
    }

    /// Frame drop
    pub const fn frame_drop(self) -> bool {
        footer::FD.is_set(self.0)
    }

    /// Receive timestamp added in front of the frame
    pub const fn timestamp_added(self) -> bool {
        footer::RTSA.is_set(self.0)
    }

    /// Receive timestamp parity
    pub const fn timestamp_parity(self) -> bool {
        footer::RTSP.is_set(self.0)
    }

    /// Footer that can be trusted for flow control: parity intact, header
    /// accepted and configuration synchronized.
    pub const fn is_credit_valid(self) -> bool {
        self.parity_ok() && !self.header_bad() && self.synced()
    }
}
