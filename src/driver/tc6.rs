//! Core TC6 protocol engine.
//!
//! This module contains the main [`Tc6`] structure and its lifecycle:
//!
//! - Construction and configuration
//! - The `service` entry point
//! - Data path enable and bring-up tracking
//! - Reset
//! - State queries
//!
//! The pipelines are implemented next to their data:
//! - [`control`](super::control): register read/write/read-modify-write
//! - [`tx`](super::tx): Ethernet frame queue and chunk packer
//! - [`spi`](super::spi): SPI transaction multiplexer
//! - [`rx`](super::rx): footer validation and frame reassembly

use heapless::Vec;

use super::config::{LinkStatus, Tc6Config};
use super::control::{RegisterCompletion, RegisterOp, reg_stage};
use super::error::{QueueError, QueueResult, Result};
use super::handler::Tc6Handler;
use super::rx::RxAssembler;
use super::spi::{SpiBuffer, SpiOperation, spi_stage};
use super::tx::{TxCompletion, TxFrame, TxPacker, tx_stage};
use crate::internal::constants::{
    DEFAULT_REG_OPS, DEFAULT_SPI_BUF_LEN, DEFAULT_SPI_BUFS, DEFAULT_TX_CREDIT, DEFAULT_TX_FRAMES,
    MAX_CHUNK_BUF_SIZE,
};
use crate::internal::stage_ring::StageRing;

// =============================================================================
// TC6 Engine
// =============================================================================

/// OPEN Alliance TC6 protocol engine
///
/// One instance drives one MAC-PHY. It owns three pipelines (register
/// operations, TX frames, SPI transaction buffers) and keeps at most one SPI
/// transaction outstanding.
///
/// # Type Parameters
/// * `H` - Integrator callbacks, see [`Tc6Handler`]
/// * `REG_OPS` - Register operation queue depth (power of two)
/// * `TX_FRAMES` - TX frame queue depth (power of two)
/// * `SPI_BUFS` - SPI transaction buffers (power of two)
/// * `SPI_BUF_LEN` - Bytes per SPI transaction buffer
///
/// # Example
/// ```ignore
/// let mut tc6: Tc6Default<'_, Board> = Tc6::new(Board::new(spi));
///
/// tc6.write_register(register::oa::CONFIG0, config0, None, 0)?;
/// tc6.enable_data(true);
///
/// loop {
///     tc6.service(irq_asserted());
///     if let Some((tx, rx)) = tc6.in_flight_transfer() {
///         let ok = board_spi_transfer(tx, rx);
///         tc6.spi_transfer_done(ok);
///     }
/// }
/// ```
///
/// # Reentrancy
///
/// The engine does no locking. All entry points (`service`,
/// `spi_transfer_done`, enqueue calls) must be serialized by the caller, for
/// example through [`SharedTc6`](crate::sync::SharedTc6).
pub struct Tc6<
    'buf,
    H,
    const REG_OPS: usize,
    const TX_FRAMES: usize,
    const SPI_BUFS: usize,
    const SPI_BUF_LEN: usize,
> {
    /// Integrator callbacks
    pub(super) handler: H,
    /// Current configuration
    pub(super) config: Tc6Config,
    /// Register operation pipeline
    pub(super) registers: StageRing<RegisterOp<Self>, REG_OPS, { reg_stage::COUNT }>,
    /// TX frame pipeline
    pub(super) frames: StageRing<TxFrame<'buf, Self>, TX_FRAMES, { tx_stage::COUNT }>,
    /// SPI transaction buffers
    pub(super) transfers: StageRing<SpiBuffer<SPI_BUF_LEN>, SPI_BUFS, { spi_stage::COUNT }>,
    /// Position inside the head TX frame
    pub(super) packer: TxPacker,
    /// RX frame reassembly
    pub(super) rx: RxAssembler,
    /// Owner of the outstanding SPI transaction
    pub(super) current_op: SpiOperation,
    /// Credits and sync from the latest trusted footer
    pub(super) link: LinkStatus,
    /// Data chunk sequence counter
    pub(super) sequence: u8,
    /// Data traffic enabled by the integrator
    pub(super) data_enabled: bool,
    /// Bring-up register burst finished
    pub(super) init_done: bool,
}

impl<
    'buf,
    H,
    const REG_OPS: usize,
    const TX_FRAMES: usize,
    const SPI_BUFS: usize,
    const SPI_BUF_LEN: usize,
> Tc6<'buf, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>
{
    const BUFFER_CHECK: () = assert!(
        SPI_BUF_LEN >= MAX_CHUNK_BUF_SIZE,
        "SPI buffer must hold at least one chunk"
    );

    /// Create a new engine with the default configuration
    ///
    /// This is a const function suitable for static initialization.
    /// Data traffic starts disabled.
    pub const fn new(handler: H) -> Self {
        let () = Self::BUFFER_CHECK;
        Self {
            handler,
            config: Tc6Config::new(),
            registers: StageRing::new(RegisterOp::empty()),
            frames: StageRing::new(TxFrame::empty()),
            transfers: StageRing::new(SpiBuffer::empty()),
            packer: TxPacker::new(),
            rx: RxAssembler::new(),
            current_op: SpiOperation::Idle,
            link: LinkStatus {
                tx_credit: DEFAULT_TX_CREDIT,
                rx_chunks_available: 0,
                synced: false,
            },
            sequence: 0,
            data_enabled: false,
            init_done: false,
        }
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    /// Integrator callbacks
    #[inline(always)]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Mutable integrator callbacks
    #[inline(always)]
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Current configuration
    #[inline(always)]
    pub fn config(&self) -> &Tc6Config {
        &self.config
    }

    /// Instance number from the configuration
    #[inline(always)]
    pub fn instance(&self) -> u8 {
        self.config.instance
    }

    /// TX credit, RX chunks available and sync flag
    #[inline(always)]
    pub fn state(&self) -> LinkStatus {
        self.link
    }

    /// Whether data traffic is enabled
    #[inline(always)]
    pub fn is_data_enabled(&self) -> bool {
        self.data_enabled
    }

    /// Whether the bring-up register burst has completed
    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.init_done
    }

    /// Owner of the outstanding SPI transaction
    #[inline(always)]
    pub fn current_operation(&self) -> SpiOperation {
        self.current_op
    }
}

impl<
    'buf,
    H: Tc6Handler,
    const REG_OPS: usize,
    const TX_FRAMES: usize,
    const SPI_BUFS: usize,
    const SPI_BUF_LEN: usize,
> Tc6<'buf, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>
{
    /// Create a new engine with a validated configuration
    pub fn with_config(handler: H, config: Tc6Config) -> Result<Self> {
        config.validate()?;
        let mut tc6 = Self::new(handler);
        tc6.config = config;
        tc6.link.tx_credit = config.initial_tx_credit;
        Ok(tc6)
    }

    /// Replace the configuration
    ///
    /// Meant for bring-up: the TX credit is reset to the configured initial
    /// value. Fails while an SPI transaction is outstanding.
    pub fn configure(&mut self, config: Tc6Config) -> Result<()> {
        config.validate()?;
        if self.current_op != SpiOperation::Idle {
            return Err(QueueError::TransactionInFlight.into());
        }
        self.config = config;
        self.link.tx_credit = config.initial_tx_credit;
        Ok(())
    }

    // =========================================================================
    // Service
    // =========================================================================

    /// Drain the pipelines and start at most one SPI transaction.
    ///
    /// Call this whenever [`Tc6Handler::on_need_service`] fired, and whenever
    /// the MAC-PHY interrupt line is asserted (`interrupt_pending`). While an
    /// interrupt is pending, empty chunks are clocked out to fetch RX data and
    /// refresh the footer state.
    ///
    /// Returns `true` if a data transaction was started.
    pub fn service(&mut self, interrupt_pending: bool) -> bool {
        self.service_control();
        if !self.data_enabled {
            return false;
        }
        self.process_rx();
        let started = self.service_data(interrupt_pending);
        self.process_rx();
        started
    }

    /// Enable or disable Ethernet data traffic.
    pub fn enable_data(&mut self, enable: bool) {
        self.data_enabled = enable;
        self.handler.on_need_service();
    }

    /// Allow the next extended status notification.
    pub fn unlock_extended_status(&mut self) {
        self.rx.unlock_extended_status();
    }

    // =========================================================================
    // Reset
    // =========================================================================

    /// Drop every queued operation and restore protocol defaults.
    ///
    /// Outstanding register operations complete with `success = false`,
    /// queued frames are reported as not sent and a partially received frame
    /// is reported as failed. Callbacks run after the queues were cleared, so
    /// they may enqueue fresh work.
    pub fn reset(&mut self) -> QueueResult<()> {
        if self.current_op != SpiOperation::Idle {
            return Err(QueueError::TransactionInFlight);
        }

        let mut frames: Vec<TxCompletion<'buf, Self>, TX_FRAMES> = Vec::new();
        while self.frames.is_ready(tx_stage::CONVERT) {
            // the ring holds at most TX_FRAMES entries
            let _ = frames.push(self.frames.slot(tx_stage::CONVERT).completion(false));
            self.frames.done(tx_stage::CONVERT);
        }

        let mut operations: Vec<RegisterCompletion<Self>, REG_OPS> = Vec::new();
        for stage in reg_stage::SEND..reg_stage::EVENT {
            while self.registers.is_ready(stage) {
                self.registers.done(stage);
            }
        }
        while self.registers.is_ready(reg_stage::EVENT) {
            let _ = operations.push(self.registers.slot(reg_stage::EVENT).aborted());
            self.registers.done(reg_stage::EVENT);
        }

        self.rx.reset(&mut self.handler);
        self.registers.reset();
        self.frames.reset();
        self.transfers.reset();
        for buffer in self.transfers.slots_mut() {
            buffer.clear();
        }
        self.packer.reset();
        self.link = LinkStatus {
            tx_credit: self.config.initial_tx_credit,
            rx_chunks_available: 0,
            synced: false,
        };

        #[cfg(feature = "defmt")]
        defmt::info!(
            "tc6[{}]: reset, {} frames and {} register ops aborted",
            self.config.instance,
            frames.len(),
            operations.len()
        );

        for frame in frames {
            frame.fire(self);
        }
        for operation in operations {
            operation.fire(self);
        }
        Ok(())
    }
}

impl<
    H: Tc6Handler + Default,
    const REG_OPS: usize,
    const TX_FRAMES: usize,
    const SPI_BUFS: usize,
    const SPI_BUF_LEN: usize,
> Default for Tc6<'_, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>
{
    fn default() -> Self {
        Self::new(H::default())
    }
}

// =============================================================================
// Type Aliases
// =============================================================================

/// Default configuration: 64 register ops, 2 TX frames, 16 SPI buffers of 22 chunks
pub type Tc6Default<'buf, H> =
    Tc6<'buf, H, DEFAULT_REG_OPS, DEFAULT_TX_FRAMES, DEFAULT_SPI_BUFS, DEFAULT_SPI_BUF_LEN>;

/// Small footprint: 8 register ops, 2 TX frames, 4 SPI buffers of 8 chunks
pub type Tc6Small<'buf, H> = Tc6<'buf, H, 8, 2, 4, { 8 * MAX_CHUNK_BUF_SIZE }>;

/// High throughput: 128 register ops, 8 TX frames, 16 SPI buffers of 31 chunks
pub type Tc6Large<'buf, H> = Tc6<'buf, H, 128, 8, 16, { 31 * MAX_CHUNK_BUF_SIZE }>;
