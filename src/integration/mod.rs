//! External Stack Integrations
//!
//! This module connects the engine to the embedded-hal ecosystem:
//!
//! - **embedded-hal** (`embedded_hal`): blocking SPI transport
//!   - Runs the outstanding transaction over any `SpiDevice`
//!   - Reports bus errors as failed transfers
//!
//! # Example
//!
//! ```ignore
//! use oa_tc6::integration::SpiDeviceTransport;
//!
//! let mut transport = SpiDeviceTransport::new(spi_device);
//! loop {
//!     transport.poll(&mut tc6, irq_asserted());
//! }
//! ```

pub mod embedded_hal;

pub use embedded_hal::SpiDeviceTransport;
