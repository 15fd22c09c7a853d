//! OPEN Alliance TC6 Protocol Engine
//!
//! A `no_std`, `no_alloc` Rust implementation of the OPEN Alliance
//! 10BASE-T1S MAC-PHY serial interface ("TC6"): register access and
//! Ethernet frame transport over fixed-size SPI chunks.
//!
//! The engine turns a half-duplex SPI link into:
//!
//! - a register read / write / read-modify-write channel, with the
//!   protected ("secure") encoding that carries every value twice, and
//! - a segmented Ethernet frame transport with credit-based flow control
//!   driven by the footer of every received chunk.
//!
//! # Architecture
//!
//! The crate is organized into these layers:
//!
//! 1. **Wire format** ([`protocol`]): header and footer bit fields, parity,
//!    control transaction codec
//! 2. **Engine** ([`driver`]): the [`Tc6`] state machine with its register,
//!    TX frame and SPI buffer pipelines
//! 3. **Register map** ([`register`]): OPEN Alliance standard registers and
//!    memory map selectors
//! 4. **Integration** ([`integration`]): embedded-hal SPI transport
//!
//! The engine never owns the SPI bus and never blocks. It asks the
//! integrator to start a transfer through [`Tc6Handler::on_spi_transaction`]
//! and is told about completion with `spi_transfer_done`. At most one
//! transaction is outstanding at any time.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for public types and protocol logging
//! - `critical-section`: Enable the ISR-safe `SharedTc6` wrapper
//!
//! # Example
//!
//! ```ignore
//! use oa_tc6::{Tc6Default, Tc6Handler, register};
//! use oa_tc6::protocol::TimestampCapture;
//!
//! let mut tc6: Tc6Default<'_, Board> = Tc6Default::new(Board::new());
//!
//! tc6.write_register(register::oa::CONFIG0, config0, None, 0)?;
//! tc6.enable_data(true);
//! tc6.send_frame(&frame, TimestampCapture::None, None, 0)?;
//!
//! loop {
//!     tc6.service(irq_asserted());
//!     if let Some((tx, rx)) = tc6.in_flight_transfer() {
//!         let ok = spi.transfer(rx, tx).is_ok();
//!         tc6.spi_transfer_done(ok);
//!     }
//! }
//! ```
//!
//! # Memory Requirements
//!
//! With the default configuration (64 register operations, 2 TX frames,
//! 16 SPI buffers of 22 chunks): about 50 KB, all inside the engine value.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
// Clippy lint levels mirror the [lints] table in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod integration;
pub mod protocol;
pub mod register;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{ChunkSize, LinkStatus, Tc6Config};
pub use driver::control::{MemoryMapEntry, MemoryOp, RegisterCallback, RegisterEvent};
pub use driver::error::{
    CodecError, CodecResult, ConfigError, ConfigResult, Error, ProtocolError, QueueError,
    QueueResult, Result,
};
pub use driver::handler::{RxFrame, Tc6Handler};
pub use driver::spi::SpiOperation;
pub use driver::tc6::{Tc6, Tc6Default, Tc6Large, Tc6Small};
pub use driver::tx::{TxCallback, TxEvent};
pub use protocol::TimestampCapture;

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::{SharedTc6, SharedTc6Default, SharedTc6Large, SharedTc6Small};

/// Shared protocol constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on engine types and integration points.
pub mod constants {
    pub use crate::internal::constants::{
        // Queue capacities
        DEFAULT_CHUNKS_PER_TRANSACTION,
        // Chunk geometry
        DEFAULT_CHUNK_SIZE,
        // Flow control
        DEFAULT_CONCAT_THRESHOLD,
        DEFAULT_IDLE_CHUNKS,
        DEFAULT_REG_OPS,
        DEFAULT_SPI_BUF_LEN,
        DEFAULT_SPI_BUFS,
        DEFAULT_TX_CREDIT,
        DEFAULT_TX_FRAMES,
        // Wire values
        EMPTY_CHUNK_HEADER,
        HEADER_SIZE,
        INVALID_REGISTER_VALUE,
        MAX_CHUNK_BUF_SIZE,
        MAX_CHUNK_CREDIT,
        MAX_CHUNK_SIZE,
        // Register access
        MAX_CONTROL_REGISTERS,
        // Frames
        MAX_TX_FRAME_LEN,
        MAX_TX_SEGMENTS,
        RX_TIMESTAMP_LEN,
        TX_PAD_BYTE,
    };
}
