//! Control transaction encoding.
//!
//! A control transaction is a header word followed by register values and a
//! trailing turnaround word. The MAC-PHY echoes everything shifted by one word,
//! so the reply values start 8 bytes into the received buffer.
//!
//! ```text
//! plain:   [hdr][v0][v1]...[vN-1][turnaround]
//! secure:  [hdr][v0][!v0][v1][!v1]...[turnaround]
//! ```

use super::bits::{control_header, read_be, with_parity, write_be};
use crate::driver::error::{CodecError, CodecResult};
use crate::internal::constants::{HEADER_SIZE, MAX_CONTROL_REGISTERS};

/// Direction and payload of a control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'a> {
    /// Read `count` consecutive registers
    Read {
        /// Number of registers
        count: usize,
    },
    /// Write the given values to consecutive registers
    Write(&'a [u32]),
}

impl Access<'_> {
    /// Number of registers addressed.
    pub const fn count(&self) -> usize {
        match self {
            Access::Read { count } => *count,
            Access::Write(values) => values.len(),
        }
    }

    /// Whether this is a write.
    pub const fn is_write(&self) -> bool {
        matches!(self, Access::Write(_))
    }
}

/// A single control transaction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest<'a> {
    address: u32,
    access: Access<'a>,
    fixed_address: bool,
}

impl<'a> ControlRequest<'a> {
    /// Read `count` registers starting at `address`.
    pub const fn read(address: u32, count: usize) -> Self {
        Self {
            address,
            access: Access::Read { count },
            fixed_address: false,
        }
    }

    /// Write `values` to consecutive registers starting at `address`.
    pub const fn write(address: u32, values: &'a [u32]) -> Self {
        Self {
            address,
            access: Access::Write(values),
            fixed_address: false,
        }
    }

    /// Access the same register for every value (AID set).
    #[must_use]
    pub const fn with_fixed_address(mut self) -> Self {
        self.fixed_address = true;
        self
    }

    /// Register address (memory map selector in the upper 16 bits).
    pub const fn address(&self) -> u32 {
        self.address
    }

    /// Direction and payload.
    pub const fn access(&self) -> Access<'a> {
        self.access
    }

    /// Header word including parity.
    pub const fn header(&self) -> u32 {
        let count = self.access.count() as u32;
        let word = control_header::DNC.make(0)
            | control_header::WNR.make(self.access.is_write() as u32)
            | control_header::AID.make(self.fixed_address as u32)
            | control_header::MMS.make(self.address >> 16)
            | control_header::ADDR.make(self.address)
            | control_header::LEN.make(count.wrapping_sub(1));
        with_parity(word)
    }

    fn check_count(&self) -> CodecResult<usize> {
        let count = self.access.count();
        if count == 0 || count > MAX_CONTROL_REGISTERS {
            return Err(CodecError::InvalidRegisterCount);
        }
        Ok(count)
    }

    /// Encoded length of the plain form.
    pub const fn plain_len(&self) -> usize {
        self.access.count() * 4 + 2 * HEADER_SIZE
    }

    /// Encoded length of the secure form.
    pub const fn secure_len(&self) -> usize {
        self.access.count() * 8 + 2 * HEADER_SIZE
    }

    /// Encode the plain form into `buf`, returning the transaction length.
    pub fn encode(&self, buf: &mut [u8]) -> CodecResult<usize> {
        let count = self.check_count()?;
        if count + 2 > buf.len() / 4 {
            return Err(CodecError::BufferTooSmall);
        }
        let len = self.plain_len();

        buf[HEADER_SIZE..len].fill(0);
        if let Access::Write(values) = self.access {
            for (slot, value) in buf[HEADER_SIZE..].chunks_exact_mut(4).zip(values) {
                write_be(slot, *value);
            }
        }
        write_be(buf, self.header());
        Ok(len)
    }

    /// Encode the secure form (each value followed by its complement).
    pub fn encode_secure(&self, buf: &mut [u8]) -> CodecResult<usize> {
        let count = self.check_count()?;
        if count * 2 + 2 > buf.len() / 4 {
            return Err(CodecError::BufferTooSmall);
        }
        let len = self.secure_len();

        buf[HEADER_SIZE..len].fill(0);
        if let Access::Write(values) = self.access {
            for (pair, value) in buf[HEADER_SIZE..].chunks_exact_mut(8).zip(values) {
                write_be(&mut pair[..4], *value);
                write_be(&mut pair[4..], !*value);
            }
        }
        write_be(buf, self.header());
        Ok(len)
    }
}

/// Decode the register values of a control reply into `out`.
///
/// `rx` is the received buffer of the whole transaction. Returns the number of
/// values recovered; zero means the reply is unusable (a secure pair did not
/// match, or `out` is too small).
pub fn decode_control_reply(rx: &[u8], out: &mut [u32], secure: bool) -> usize {
    if rx.len() < 2 * HEADER_SIZE {
        return 0;
    }

    let values = &rx[2 * HEADER_SIZE..];
    if secure {
        if rx.len() % 8 != 0 {
            return 0;
        }
        let count = rx.len() / 8 - 1;
        if count > out.len() {
            return 0;
        }
        let intact = values
            .chunks_exact(8)
            .take(count)
            .all(|pair| read_be(pair) == !read_be(&pair[4..]));
        if !intact {
            return 0;
        }
        for (slot, pair) in out.iter_mut().zip(values.chunks_exact(8).take(count)) {
            *slot = read_be(pair);
        }
        count
    } else {
        let count = values.len() / 4;
        if count > out.len() {
            return 0;
        }
        for (slot, word) in out.iter_mut().zip(values.chunks_exact(4)) {
            *slot = read_be(word);
        }
        count
    }
}
