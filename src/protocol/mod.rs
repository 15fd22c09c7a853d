//! OPEN Alliance TC6 wire format.
//!
//! - [`bits`]: header/footer bit fields and odd parity
//! - [`header`]: data chunk header builder and footer decoder
//! - [`control`]: plain and secure control transaction encoding

pub mod bits;
pub mod control;
pub mod header;

pub use bits::{has_odd_parity, parity_bit, with_parity};
pub use control::{Access, ControlRequest, decode_control_reply};
pub use header::{DataHeader, Footer, TimestampCapture};
