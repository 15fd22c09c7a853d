//! Integrator notification seam.
//!
//! The engine never blocks and never owns the SPI bus. Everything it needs from
//! the outside world, and everything it reports back, goes through
//! [`Tc6Handler`]. Per-operation completions (register callbacks, TX frame
//! callbacks) are plain function pointers that receive the engine itself so
//! they can enqueue follow-up work.

use super::error::ProtocolError;

/// End of a received Ethernet frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxFrame {
    /// Frame arrived completely; on `false` discard every slice since the
    /// last frame end
    pub success: bool,
    /// Total frame length (timestamp excluded), zero on failure
    pub len: usize,
    /// Receive timestamp when the MAC-PHY prepended one
    pub timestamp: Option<u64>,
}

impl RxFrame {
    pub(crate) const fn failed() -> Self {
        Self {
            success: false,
            len: 0,
            timestamp: None,
        }
    }
}

/// Callbacks from the engine to the integrator.
///
/// Only [`on_spi_transaction`](Self::on_spi_transaction) is mandatory. The
/// handler must not call back into the engine; it only gets told what
/// happened. Queue follow-up work after `service` returns, or from a
/// per-operation callback.
pub trait Tc6Handler {
    /// The engine has work; call `service` soon.
    fn on_need_service(&mut self) {}

    /// Start a full-duplex SPI transfer of `tx` into `rx`.
    ///
    /// Return `false` if the transfer cannot be started (bus busy); the engine
    /// retries on the next service call. After returning `true`, report the
    /// outcome with `spi_transfer_done`. The buffers stay reachable through
    /// `in_flight_transfer` until then.
    fn on_spi_transaction(&mut self, tx: &[u8], rx: &mut [u8]) -> bool;

    /// A protocol fault was detected.
    fn on_error(&mut self, _error: ProtocolError) {}

    /// The MAC-PHY flagged extended status. Not repeated until
    /// `unlock_extended_status` is called.
    fn on_extended_status(&mut self) {}

    /// Part of a received frame, `offset` bytes into it.
    fn on_rx_slice(&mut self, _data: &[u8], _offset: usize) {}

    /// A received frame ended (or was aborted).
    fn on_rx_frame(&mut self, _frame: RxFrame) {}
}

impl<T: Tc6Handler + ?Sized> Tc6Handler for &mut T {
    fn on_need_service(&mut self) {
        (**self).on_need_service();
    }

    fn on_spi_transaction(&mut self, tx: &[u8], rx: &mut [u8]) -> bool {
        (**self).on_spi_transaction(tx, rx)
    }

    fn on_error(&mut self, error: ProtocolError) {
        (**self).on_error(error);
    }

    fn on_extended_status(&mut self) {
        (**self).on_extended_status();
    }

    fn on_rx_slice(&mut self, data: &[u8], offset: usize) {
        (**self).on_rx_slice(data, offset);
    }

    fn on_rx_frame(&mut self, frame: RxFrame) {
        (**self).on_rx_frame(frame);
    }
}
