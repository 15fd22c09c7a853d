//! Centralized Constants
//!
//! This module provides a single source of truth for all magic numbers and
//! configuration defaults used throughout the TC6 engine.
//!
//! # Organization
//!
//! Constants are grouped by category:
//! - **Chunk geometry**: header/footer size, payload sizes
//! - **Control transactions**: register count limits, buffer sizes
//! - **Data transactions**: filler bytes, idle chunk header, segment limits
//! - **Defaults**: queue capacities, credit and threshold defaults
//!
//! # Note
//!
//! Header and footer bit field definitions live in `protocol::bits` as they
//! are specific to the wire format.

// =============================================================================
// Chunk Geometry
// =============================================================================

/// Size of the TX header / RX footer carried by every chunk (fixed by OPEN Alliance)
pub const HEADER_SIZE: usize = 4;

/// Default chunk payload size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// Largest supported chunk payload size in bytes
pub const MAX_CHUNK_SIZE: usize = 64;

/// Largest chunk including its header or footer
pub const MAX_CHUNK_BUF_SIZE: usize = MAX_CHUNK_SIZE + HEADER_SIZE;

// =============================================================================
// Control Transactions
// =============================================================================

/// Maximum number of registers a single control transaction may address
pub const MAX_CONTROL_REGISTERS: usize = 128;

/// Registers addressed by one queued register operation
pub const REGISTERS_PER_OPERATION: usize = 1;

/// Control buffer size for one queued operation (header + secure pairs + turnaround)
pub const CONTROL_BUF_SIZE: usize = (2 + REGISTERS_PER_OPERATION * 2) * 4;

/// Register value reported when a read could not be decoded
pub const INVALID_REGISTER_VALUE: u32 = 0xFFFF_FFFF;

// =============================================================================
// Data Transactions
// =============================================================================

/// Filler byte for unused TX chunk payload bytes
pub const TX_PAD_BYTE: u8 = 0xCC;

/// Header of an empty data chunk (DNC set, nothing valid, odd parity already)
pub const EMPTY_CHUNK_HEADER: u32 = 0x8000_0000;

/// Maximum number of caller-owned segments forming one TX frame
pub const MAX_TX_SEGMENTS: usize = 4;

/// Maximum total length of one TX frame (16-bit length field)
pub const MAX_TX_FRAME_LEN: usize = u16::MAX as usize;

/// Length of the receive timestamp prepended when RTSA is set
pub const RX_TIMESTAMP_LEN: usize = 8;

// =============================================================================
// Defaults
// =============================================================================

/// Default register operation queue depth
pub const DEFAULT_REG_OPS: usize = 64;

/// Default TX frame queue depth
pub const DEFAULT_TX_FRAMES: usize = 2;

/// Default number of SPI transaction buffers
pub const DEFAULT_SPI_BUFS: usize = 16;

/// Default number of chunks carried by one SPI transaction
pub const DEFAULT_CHUNKS_PER_TRANSACTION: usize = 22;

/// Default SPI transaction buffer length in bytes
pub const DEFAULT_SPI_BUF_LEN: usize = DEFAULT_CHUNKS_PER_TRANSACTION * MAX_CHUNK_BUF_SIZE;

/// Frames longer than this are never started in the tail of a shared chunk
pub const DEFAULT_CONCAT_THRESHOLD: u16 = 1024;

/// Empty chunks appended when servicing a pending interrupt
pub const DEFAULT_IDLE_CHUNKS: u8 = 2;

/// TX credit assumed until the first valid footer arrives
pub const DEFAULT_TX_CREDIT: u8 = 24;

/// Largest value of the 5-bit TXC and RCA footer fields
pub const MAX_CHUNK_CREDIT: u8 = 31;
