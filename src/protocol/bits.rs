//! Header and footer bit field definitions.
//!
//! Layouts follow the OPEN Alliance 10BASE-T1x MAC-PHY Serial Interface
//! (TC6) data header, control header and data footer.

/// A bit field inside a 32-bit header or footer word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pos: u32,
    width: u32,
}

impl Field {
    /// Define a field starting at bit `pos` spanning `width` bits.
    pub const fn new(pos: u32, width: u32) -> Self {
        Self { pos, width }
    }

    /// Mask of the field, unshifted.
    #[inline(always)]
    pub const fn mask(self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    /// Extract the field from `word`.
    #[inline(always)]
    pub const fn get(self, word: u32) -> u32 {
        (word >> self.pos) & self.mask()
    }

    /// Whether a single-bit field is set in `word`.
    #[inline(always)]
    pub const fn is_set(self, word: u32) -> bool {
        self.get(word) != 0
    }

    /// Place `value` (truncated to the field width) at the field position.
    #[inline(always)]
    pub const fn make(self, value: u32) -> u32 {
        (value & self.mask()) << self.pos
    }
}

/// Data transaction header (host to MAC-PHY)
pub mod data_header {
    use super::Field;

    /// Data, not control
    pub const DNC: Field = Field::new(31, 1);
    /// Data chunk sequence
    pub const SEQ: Field = Field::new(30, 1);
    /// No receive
    pub const NORX: Field = Field::new(29, 1);
    /// Data valid
    pub const DV: Field = Field::new(21, 1);
    /// Start of frame valid
    pub const SV: Field = Field::new(20, 1);
    /// Start of frame word offset
    pub const SWO: Field = Field::new(16, 4);
    /// End of frame valid
    pub const EV: Field = Field::new(14, 1);
    /// End of frame byte offset
    pub const EBO: Field = Field::new(8, 6);
    /// Transmit frame timestamp capture
    pub const TSC: Field = Field::new(6, 2);
    /// Header parity
    pub const P: Field = Field::new(0, 1);
}

/// Control transaction header
pub mod control_header {
    use super::Field;

    /// Data, not control (always clear)
    pub const DNC: Field = Field::new(31, 1);
    /// Header bad (echoed by the MAC-PHY)
    pub const HDRB: Field = Field::new(30, 1);
    /// Write, not read
    pub const WNR: Field = Field::new(29, 1);
    /// Address increment disable
    pub const AID: Field = Field::new(28, 1);
    /// Memory map selector
    pub const MMS: Field = Field::new(24, 4);
    /// Register address within the memory map
    pub const ADDR: Field = Field::new(8, 16);
    /// Number of registers minus one
    pub const LEN: Field = Field::new(1, 7);
    /// Header parity
    pub const P: Field = Field::new(0, 1);
}

/// Data footer (MAC-PHY to host)
pub mod footer {
    use super::Field;

    /// Extended status
    pub const EXST: Field = Field::new(31, 1);
    /// Transmit header bad
    pub const HDRB: Field = Field::new(30, 1);
    /// Configuration synchronized
    pub const SYNC: Field = Field::new(29, 1);
    /// Receive chunks available
    pub const RCA: Field = Field::new(24, 5);
    /// Vendor specific
    pub const VS: Field = Field::new(22, 2);
    /// Data valid
    pub const DV: Field = Field::new(21, 1);
    /// Start of frame valid
    pub const SV: Field = Field::new(20, 1);
    /// Start of frame word offset
    pub const SWO: Field = Field::new(16, 4);
    /// Frame drop
    pub const FD: Field = Field::new(15, 1);
    /// End of frame valid
    pub const EV: Field = Field::new(14, 1);
    /// End of frame byte offset
    pub const EBO: Field = Field::new(8, 6);
    /// Receive frame timestamp added
    pub const RTSA: Field = Field::new(7, 1);
    /// Receive frame timestamp parity
    pub const RTSP: Field = Field::new(6, 1);
    /// Transmit credits
    pub const TXC: Field = Field::new(1, 5);
    /// Footer parity
    pub const P: Field = Field::new(0, 1);

    /// Any of the frame data flags
    pub const DATA_MASK: u32 = SV.make(1) | DV.make(1) | EV.make(1);
}

// =============================================================================
// Parity
// =============================================================================

/// Parity bit that makes `word` (with its parity bit clear) odd.
///
/// Returns 1 when `word` holds an even number of set bits, 0 otherwise.
#[inline]
pub const fn parity_bit(word: u32) -> u32 {
    let mut v = word;
    v ^= v >> 16;
    v ^= v >> 8;
    v ^= v >> 4;
    v ^= v >> 2;
    v ^= v >> 1;
    !v & 1
}

/// Whether a complete header or footer word, parity bit included, has odd parity.
#[inline]
pub const fn has_odd_parity(word: u32) -> bool {
    parity_bit(word) == 0
}

/// Set the parity bit of `word` so the whole word has odd parity.
#[inline]
pub const fn with_parity(word: u32) -> u32 {
    let cleared = word & !data_header::P.make(1);
    cleared | data_header::P.make(parity_bit(cleared))
}

// =============================================================================
// Byte order helpers
// =============================================================================

/// Read a big-endian word at the start of `buf`.
#[inline]
pub(crate) fn read_be(buf: &[u8]) -> u32 {
    u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])
}

/// Write `value` big-endian at the start of `buf`.
#[inline]
pub(crate) fn write_be(buf: &mut [u8], value: u32) {
    buf[..4].copy_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::XorShift;

    #[test]
    fn field_make_and_get() {
        assert_eq!(data_header::SWO.make(0xF), 0x000F_0000);
        assert_eq!(data_header::SWO.get(0x000A_0000), 0xA);
        assert_eq!(footer::TXC.make(31), 0x3E);
        assert_eq!(footer::RCA.get(0x1F00_0000), 31);
    }

    #[test]
    fn field_make_truncates() {
        assert_eq!(data_header::EBO.make(0x40), 0);
        assert_eq!(data_header::EBO.make(0x7F), 0x3F << 8);
    }

    #[test]
    fn parity_bit_makes_word_odd() {
        assert_eq!(parity_bit(0), 1);
        assert_eq!(parity_bit(0b10), 0);
        assert_eq!(parity_bit(0b110), 1);
        assert!(has_odd_parity(0x8000_0000));
        assert!(!has_odd_parity(0));
        assert!(!has_odd_parity(u32::MAX));
    }

    #[test]
    fn parity_is_self_dual_for_random_words() {
        let mut rng = XorShift::new(0xC0FF_EE11);
        for _ in 0..2_000 {
            // parity sits in bit 0, so compute over the upper bits
            let word = rng.next_u32() & !1;
            let encoded = word | parity_bit(word);
            assert_eq!(encoded.count_ones() % 2, 1);
            assert!(has_odd_parity(encoded));
            assert_eq!(with_parity(word), encoded);

            for bit in 0..32 {
                assert!(!has_odd_parity(encoded ^ (1 << bit)));
            }
        }
    }

    #[test]
    fn data_mask_covers_sv_dv_ev() {
        assert_eq!(footer::DATA_MASK, (1 << 20) | (1 << 21) | (1 << 14));
    }

    #[test]
    fn big_endian_helpers() {
        let mut buf = [0u8; 6];
        write_be(&mut buf[1..], 0x1234_5678);
        assert_eq!(buf, [0, 0x12, 0x34, 0x56, 0x78, 0]);
        assert_eq!(read_be(&buf[1..]), 0x1234_5678);
    }
}
