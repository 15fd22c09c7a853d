//! Core engine components for the TC6 MAC-PHY protocol.
//!
//! - [`config`] - Configuration types and builder methods
//! - [`error`] - Error types and result aliases
//! - [`handler`] - Integrator callback trait
//! - [`tc6`] - The engine and its lifecycle
//! - [`control`] - Register access pipeline
//! - [`tx`] - Ethernet frame transmit pipeline
//! - [`spi`] - SPI transaction multiplexer
//!
//! # Example
//!
//! ```ignore
//! use oa_tc6::driver::{Tc6Config, ChunkSize, Tc6Default};
//!
//! let config = Tc6Config::new()
//!     .with_instance(1)
//!     .with_chunk_size(ChunkSize::Bytes64);
//! let tc6: Tc6Default<'_, Board> = Tc6Default::with_config(board, config)?;
//! ```

// Submodules
pub mod config;
pub mod control;
pub mod error;
pub mod handler;
mod rx;
pub mod spi;
pub mod tc6;
pub mod tx;

// Re-exports for convenience
pub use config::{ChunkSize, LinkStatus, Tc6Config};
pub use control::{MemoryMapEntry, MemoryOp, RegisterCallback, RegisterEvent, modified_value};
pub use error::{
    CodecError, CodecResult, ConfigError, ConfigResult, Error, ProtocolError, QueueError,
    QueueResult, Result,
};
pub use handler::{RxFrame, Tc6Handler};
pub use spi::SpiOperation;
pub use tc6::{Tc6, Tc6Default, Tc6Large, Tc6Small};
pub use tx::{TxCallback, TxEvent};
