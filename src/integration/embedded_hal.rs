//! Blocking SPI transport over `embedded_hal::spi::SpiDevice`.
//!
//! The engine never touches the bus. Its handler accepts the transaction in
//! [`Tc6Handler::on_spi_transaction`] and the integrator later runs the
//! transfer and reports the result. This adapter does the second half with a
//! blocking full-duplex transfer, so a polling main loop only needs
//! [`SpiDeviceTransport::poll`].

use embedded_hal::spi::SpiDevice;

use crate::driver::handler::Tc6Handler;
use crate::driver::tc6::Tc6;

// =============================================================================
// SPI Device Transport
// =============================================================================

/// Runs engine transactions on an [`SpiDevice`].
///
/// Chip select handling is left to the `SpiDevice` implementation; each
/// engine transaction becomes exactly one device transaction.
pub struct SpiDeviceTransport<SPI> {
    spi: SPI,
    /// Transfers the bus refused
    bus_errors: u32,
}

impl<SPI: SpiDevice> SpiDeviceTransport<SPI> {
    /// Wrap an SPI device.
    pub const fn new(spi: SPI) -> Self {
        Self { spi, bus_errors: 0 }
    }

    /// Give the SPI device back.
    pub fn release(self) -> SPI {
        self.spi
    }

    /// Mutable access to the SPI device
    pub fn spi_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Number of transfers that failed on the bus
    pub fn bus_errors(&self) -> u32 {
        self.bus_errors
    }

    /// Full-duplex transfer of `tx` into `rx`.
    ///
    /// Returns `false` if the bus reported an error.
    pub fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> bool {
        match self.spi.transfer(rx, tx) {
            Ok(()) => true,
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("tc6: spi transfer of {} bytes failed", tx.len());
                self.bus_errors = self.bus_errors.wrapping_add(1);
                false
            }
        }
    }

    /// Run the engine's outstanding transaction and report its outcome.
    ///
    /// Returns `false` if nothing was in flight.
    pub fn complete<
        H: Tc6Handler,
        const REG_OPS: usize,
        const TX_FRAMES: usize,
        const SPI_BUFS: usize,
        const SPI_BUF_LEN: usize,
    >(
        &mut self,
        tc6: &mut Tc6<'_, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>,
    ) -> bool {
        let success = match tc6.in_flight_transfer() {
            Some((tx, rx)) => self.transfer(tx, rx),
            None => return false,
        };
        tc6.spi_transfer_done(success);
        true
    }

    /// Service the engine once and complete what it started.
    ///
    /// Returns whether a transaction was run.
    pub fn poll<
        H: Tc6Handler,
        const REG_OPS: usize,
        const TX_FRAMES: usize,
        const SPI_BUFS: usize,
        const SPI_BUF_LEN: usize,
    >(
        &mut self,
        tc6: &mut Tc6<'_, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>,
        interrupt_pending: bool,
    ) -> bool {
        tc6.service(interrupt_pending);
        self.complete(tc6)
    }
}
