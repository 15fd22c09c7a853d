//! OPEN Alliance standard register map
//!
//! Register addresses as used by the register API: the memory map selector
//! (MMS) sits in bits 19:16 and the register offset in bits 15:0. MMS 0 holds
//! the standard control and status registers below.

use crate::driver::config::ChunkSize;

/// Memory map selectors
pub mod mms {
    /// Standard control and status registers
    pub const STANDARD: u8 = 0;
    /// MAC registers
    pub const MAC: u8 = 1;
    /// PHY PCS registers
    pub const PCS: u8 = 2;
    /// PHY PMA/PMD registers
    pub const PMA_PMD: u8 = 3;
    /// PHY vendor specific registers
    pub const PHY_VENDOR: u8 = 4;
    /// PHY PLCA registers
    pub const PLCA: u8 = 10;
}

/// Build a register address from a memory map selector and offset.
#[inline]
pub const fn register_address(mms: u8, offset: u16) -> u32 {
    ((mms as u32 & 0xF) << 16) | offset as u32
}

/// Memory map selector of a register address.
#[inline]
pub const fn mms_of(address: u32) -> u8 {
    ((address >> 16) & 0xF) as u8
}

/// Register offset inside its memory map.
#[inline]
pub const fn offset_of(address: u32) -> u16 {
    address as u16
}

/// Standard registers (MMS 0)
pub mod oa {
    /// Identification and version
    pub const IDVER: u32 = 0x00;
    /// PHY identification
    pub const PHYID: u32 = 0x01;
    /// Standard capabilities
    pub const STDCAP: u32 = 0x02;
    /// Reset control and status
    pub const RESET: u32 = 0x03;
    /// Configuration 0
    pub const CONFIG0: u32 = 0x04;
    /// Configuration 2
    pub const CONFIG2: u32 = 0x06;
    /// Status 0 (write one to clear)
    pub const STATUS0: u32 = 0x08;
    /// Status 1 (write one to clear)
    pub const STATUS1: u32 = 0x09;
    /// Buffer status
    pub const BUFSTS: u32 = 0x0B;
    /// Interrupt mask 0
    pub const IMASK0: u32 = 0x0C;
    /// Interrupt mask 1
    pub const IMASK1: u32 = 0x0D;
    /// Transmit timestamp capture A (high word)
    pub const TTSCAH: u32 = 0x10;
    /// Transmit timestamp capture A (low word)
    pub const TTSCAL: u32 = 0x11;

    /// RESET bits
    pub mod reset {
        /// Software reset
        pub const SWRESET: u32 = 1 << 0;
    }

    /// CONFIG0 bits
    pub mod config0 {
        /// Configuration synchronized
        pub const SYNC: u32 = 1 << 15;
        /// Transmit frame check sequence validation enable
        pub const TXFCSVE: u32 = 1 << 14;
        /// Transmit cut-through enable
        pub const TXCTE: u32 = 1 << 9;
        /// Receive cut-through enable
        pub const RXCTE: u32 = 1 << 8;
        /// Frame timestamp enable
        pub const FTSE: u32 = 1 << 7;
        /// Frame timestamp select (64-bit when set)
        pub const FTSS: u32 = 1 << 6;
        /// Control data read/write protection enable
        pub const PROTE: u32 = 1 << 5;
        /// Chunk payload size field
        pub const CPS_MASK: u32 = 0x7;
    }

    /// STATUS0 bits
    pub mod status0 {
        /// Control data protection error
        pub const CPDE: u32 = 1 << 12;
        /// Transmit frame check sequence error
        pub const TXFCSE: u32 = 1 << 11;
        /// PHY interrupt
        pub const PHYINT: u32 = 1 << 7;
        /// Reset complete
        pub const RESETC: u32 = 1 << 6;
        /// Header error
        pub const HDRE: u32 = 1 << 5;
        /// Loss of framing error
        pub const LOFE: u32 = 1 << 4;
        /// Receive buffer overflow error
        pub const RXBOE: u32 = 1 << 3;
        /// Transmit buffer underflow error
        pub const TXBUE: u32 = 1 << 2;
        /// Transmit buffer overflow error
        pub const TXBOE: u32 = 1 << 1;
        /// Transmit protocol error
        pub const TXPE: u32 = 1 << 0;
    }
}

/// CONFIG0.CPS encoding of a chunk payload size.
pub const fn cps(chunk_size: ChunkSize) -> u32 {
    match chunk_size {
        ChunkSize::Bytes32 => 5,
        ChunkSize::Bytes64 => 6,
    }
}
