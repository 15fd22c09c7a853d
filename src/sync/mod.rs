//! Synchronization Support
//!
//! This module provides interrupt-safe access to the protocol engine. The
//! engine itself does no locking; every entry point (`service`,
//! `spi_transfer_done`, the enqueue calls) must be serialized by the caller.
//!
//! - **Primitives** (`primitives`): [`CriticalSectionCell`] - ISR-safe
//!   interior mutability
//! - **Shared Wrappers** (`shared`): [`SharedTc6`] - critical-section
//!   protected engine
//!
//! # Feature Flags
//!
//! - `critical-section`: Enables this module
//!
//! # Example
//!
//! ```ignore
//! use oa_tc6::sync::SharedTc6Default;
//!
//! static TC6: SharedTc6Default<'static, Board> = SharedTc6::new(Board::new());
//!
//! #[interrupt]
//! fn MACPHY_IRQ() {
//!     TC6.with(|tc6| tc6.service(true));
//! }
//! ```

mod primitives;

pub use primitives::CriticalSectionCell;

mod shared;

pub use shared::{SharedTc6, SharedTc6Default, SharedTc6Large, SharedTc6Small};
