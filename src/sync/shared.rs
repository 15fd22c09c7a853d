//! ISR-safe engine wrapper using critical sections.
//!
//! Provides [`SharedTc6`] for serializing the engine entry points between
//! the main loop, the MAC-PHY interrupt and the SPI completion interrupt.

use super::primitives::CriticalSectionCell;
use crate::driver::tc6::Tc6;
use crate::internal::constants::{
    DEFAULT_REG_OPS, DEFAULT_SPI_BUF_LEN, DEFAULT_SPI_BUFS, DEFAULT_TX_FRAMES, MAX_CHUNK_BUF_SIZE,
};

/// ISR-safe engine wrapper using critical sections.
///
/// All access goes through `critical_section::with()`, disabling interrupts
/// for the duration of the closure. Handler callbacks run inside that
/// critical section, so keep them short.
///
/// # Example
///
/// ```ignore
/// static TC6: SharedTc6Default<'static, Board> = SharedTc6::new(Board::new());
///
/// #[interrupt]
/// fn SPI_DONE() {
///     TC6.with(|tc6| tc6.spi_transfer_done(true));
/// }
///
/// loop {
///     TC6.with(|tc6| tc6.service(irq_asserted()));
/// }
/// ```
pub struct SharedTc6<
    'buf,
    H,
    const REG_OPS: usize,
    const TX_FRAMES: usize,
    const SPI_BUFS: usize,
    const SPI_BUF_LEN: usize,
> {
    inner: CriticalSectionCell<Tc6<'buf, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>>,
}

impl<
    'buf,
    H,
    const REG_OPS: usize,
    const TX_FRAMES: usize,
    const SPI_BUFS: usize,
    const SPI_BUF_LEN: usize,
> SharedTc6<'buf, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>
{
    /// Create a new shared engine (const, suitable for static initialization).
    pub const fn new(handler: H) -> Self {
        Self {
            inner: CriticalSectionCell::new(Tc6::new(handler)),
        }
    }

    /// Wrap an engine that was already configured.
    pub const fn from_engine(tc6: Tc6<'buf, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>) -> Self {
        Self {
            inner: CriticalSectionCell::new(tc6),
        }
    }

    /// Execute a closure with exclusive access to the engine.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Tc6<'buf, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>) -> R,
    {
        self.inner.with(f)
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Tc6<'buf, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>) -> R,
    {
        self.inner.try_with(f)
    }
}

impl<
    H: Default,
    const REG_OPS: usize,
    const TX_FRAMES: usize,
    const SPI_BUFS: usize,
    const SPI_BUF_LEN: usize,
> Default for SharedTc6<'_, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>
{
    fn default() -> Self {
        Self::new(H::default())
    }
}

/// Default shared engine configuration.
pub type SharedTc6Default<'buf, H> =
    SharedTc6<'buf, H, DEFAULT_REG_OPS, DEFAULT_TX_FRAMES, DEFAULT_SPI_BUFS, DEFAULT_SPI_BUF_LEN>;

/// Small shared engine configuration for memory-constrained systems.
pub type SharedTc6Small<'buf, H> = SharedTc6<'buf, H, 8, 2, 4, { 8 * MAX_CHUNK_BUF_SIZE }>;

/// Large shared engine configuration for high-throughput applications.
pub type SharedTc6Large<'buf, H> = SharedTc6<'buf, H, 128, 8, 16, { 31 * MAX_CHUNK_BUF_SIZE }>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::handler::Tc6Handler;
    use crate::driver::spi::SpiOperation;

    #[derive(Debug, Default)]
    struct Bus {
        transfers: usize,
    }

    impl Tc6Handler for Bus {
        fn on_spi_transaction(&mut self, _tx: &[u8], _rx: &mut [u8]) -> bool {
            self.transfers += 1;
            true
        }
    }

    #[test]
    fn shared_tc6_static() {
        static TC6: SharedTc6Small<'static, Bus> = SharedTc6::new(Bus { transfers: 0 });
        let op = TC6.with(|tc6| tc6.current_operation());
        assert_eq!(op, SpiOperation::Idle);
    }

    #[test]
    fn shared_tc6_default_aliases() {
        let _small: SharedTc6Small<'_, Bus> = SharedTc6::default();
        let _large: SharedTc6Large<'_, Bus> = SharedTc6::default();
        let _default: SharedTc6Default<'_, Bus> = SharedTc6::default();
    }

    #[test]
    fn shared_tc6_with_drives_engine() {
        let shared: SharedTc6Small<'_, Bus> = SharedTc6::default();
        shared.with(|tc6| {
            tc6.read_register(0, None, 0).unwrap();
            tc6.service(false);
        });
        assert_eq!(shared.with(|tc6| tc6.handler().transfers), 1);
        assert_eq!(
            shared.with(|tc6| tc6.current_operation()),
            SpiOperation::Control
        );
    }

    #[test]
    fn shared_tc6_try_with_inside_with_is_none() {
        let shared: SharedTc6Small<'_, Bus> = SharedTc6::default();
        let nested = shared.with(|_| shared.try_with(|_| ()));
        assert_eq!(nested, None);
        assert_eq!(shared.try_with(|_| 5), Some(5));
    }
}
