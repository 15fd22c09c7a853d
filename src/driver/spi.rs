//! SPI transaction multiplexer.
//!
//! Control and data transactions share one bus, and only one may be
//! outstanding. Data transactions cycle through a ring of buffers:
//!
//! ```text
//! TRANSFER (fill + submit) -> INT (awaiting completion) -> PROCESS (RX parse)
//! ```
//!
//! A buffer is filled with TX chunks up to the current credit, followed by
//! empty chunks to clock in pending RX data.

use heapless::Vec;

use super::control::reg_stage;
use super::error::ProtocolError;
use super::handler::Tc6Handler;
use super::tc6::Tc6;
use super::tx::TxCompletion;
use crate::internal::constants::{EMPTY_CHUNK_HEADER, HEADER_SIZE};
use crate::protocol::bits::{read_be, write_be};
use crate::protocol::header::Footer;

/// SPI buffer pipeline stages
pub(crate) mod spi_stage {
    pub const TRANSFER: usize = 0;
    pub const INT: usize = 1;
    pub const PROCESS: usize = 2;
    pub const COUNT: usize = 3;
}

/// Owner of the outstanding SPI transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiOperation {
    /// Bus free
    #[default]
    Idle,
    /// Register access in flight
    Control,
    /// Data chunks in flight
    Data,
}

#[derive(Clone, Copy)]
pub(crate) struct SpiBuffer<const LEN: usize> {
    tx: [u8; LEN],
    rx: [u8; LEN],
    len: usize,
    failed: bool,
}

impl<const LEN: usize> SpiBuffer<LEN> {
    pub(crate) const fn empty() -> Self {
        Self {
            tx: [0; LEN],
            rx: [0; LEN],
            len: 0,
            failed: false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
        self.failed = false;
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
    // =========================================================================
    // Transaction Completion
    // =========================================================================

    /// Report the outcome of the transaction started by
    /// [`Tc6Handler::on_spi_transaction`].
    ///
    /// May be called from interrupt context as long as it is serialized with
    /// the other entry points.
    pub fn spi_transfer_done(&mut self, success: bool) {
        if !success {
            self.rx.abort(&mut self.handler);
            self.handler.on_error(ProtocolError::SpiError);
        }

        match self.current_op {
            SpiOperation::Data => {
                if self.transfers.is_ready(spi_stage::INT) {
                    let buffer = self.transfers.slot_mut(spi_stage::INT);
                    buffer.failed = !success;
                    if success && buffer.len >= HEADER_SIZE {
                        let last = &buffer.rx[buffer.len - HEADER_SIZE..buffer.len];
                        let footer = Footer::from_word(read_be(last));
                        if footer.is_credit_valid() {
                            self.link.tx_credit = footer.tx_credit();
                            self.link.rx_chunks_available = footer.rx_chunks_available();
                        }
                    }
                    self.transfers.done(spi_stage::INT);
                }
            }
            SpiOperation::Control => {
                for stage in [reg_stage::INT, reg_stage::INT_MODIFIED] {
                    if self.registers.is_ready(stage) {
                        self.registers.slot_mut(stage).failed = !success;
                        self.registers.done(stage);
                        break;
                    }
                }
            }
            SpiOperation::Idle => {}
        }

        self.current_op = SpiOperation::Idle;
        self.handler.on_need_service();
    }

    /// Buffers of the outstanding transaction, `(tx, rx)`.
    ///
    /// Valid between a successful [`Tc6Handler::on_spi_transaction`] and
    /// [`spi_transfer_done`](Self::spi_transfer_done).
    pub fn in_flight_transfer(&mut self) -> Option<(&[u8], &mut [u8])> {
        match self.current_op {
            SpiOperation::Idle => None,
            SpiOperation::Control => {
                let stage = [reg_stage::INT, reg_stage::INT_MODIFIED]
                    .into_iter()
                    .find(|&stage| self.registers.is_ready(stage))?;
                let op = self.registers.slot_mut(stage);
                Some((&op.tx[..op.len], &mut op.rx[..op.len]))
            }
            SpiOperation::Data => {
                if !self.transfers.is_ready(spi_stage::INT) {
                    return None;
                }
                let buffer = self.transfers.slot_mut(spi_stage::INT);
                Some((&buffer.tx[..buffer.len], &mut buffer.rx[..buffer.len]))
            }
        }
    }

    // =========================================================================
    // Data Transactions
    // =========================================================================

    /// Fill and submit the next data transaction.
    pub(super) fn service_data(&mut self, interrupt_pending: bool) -> bool {
        if !self.data_enabled
            || !self.init_done
            || self.current_op != SpiOperation::Idle
            || !self.transfers.is_ready(spi_stage::TRANSFER)
        {
            return false;
        }

        let chunk_buf = self.config.chunk_size.bytes() + HEADER_SIZE;
        let capacity = SPI_BUF_LEN / chunk_buf * chunk_buf;
        let threshold = self.config.concat_threshold as usize;
        let mut completions: Vec<TxCompletion<'buf, Self>, TX_FRAMES> = Vec::new();

        let buffer = self.transfers.slot_mut(spi_stage::TRANSFER);
        // a buffer the handler refused last time is resent unchanged
        if buffer.len == 0 {
            let max_tx = (self.link.tx_credit as usize * chunk_buf).min(capacity);
            let mut len = 0;
            while len < max_tx
                && self.packer.pack_chunk(
                    &mut self.frames,
                    &mut buffer.tx[len..len + chunk_buf],
                    &mut self.sequence,
                    threshold,
                    &mut completions,
                )
            {
                len += chunk_buf;
            }

            let trailing = if self.link.rx_chunks_available != 0 {
                self.link.rx_chunks_available
            } else if interrupt_pending {
                if self.link.tx_credit == 0 { 1 } else { self.config.idle_chunks }
            } else {
                0
            };
            for _ in 0..trailing {
                if len + chunk_buf > capacity {
                    break;
                }
                write_be(&mut buffer.tx[len..], EMPTY_CHUNK_HEADER);
                buffer.tx[len + HEADER_SIZE..len + chunk_buf].fill(0);
                len += chunk_buf;
            }

            buffer.len = len;
            buffer.failed = false;
        }

        let mut accepted = false;
        if buffer.len != 0 {
            self.transfers.done(spi_stage::TRANSFER);
            self.current_op = SpiOperation::Data;
            let buffer = self.transfers.slot_mut(spi_stage::INT);
            accepted = self
                .handler
                .on_spi_transaction(&buffer.tx[..buffer.len], &mut buffer.rx[..buffer.len]);
            if !accepted {
                self.current_op = SpiOperation::Idle;
                self.transfers.undo(spi_stage::TRANSFER);
                #[cfg(feature = "defmt")]
                defmt::debug!("tc6[{}]: data transaction rejected", self.config.instance);
            }
        }

        for completion in completions {
            completion.fire(self);
        }
        accepted
    }

    /// Parse every completed data transaction.
    pub(super) fn process_rx(&mut self) {
        let chunk_size = self.config.chunk_size.bytes();
        while self.transfers.is_ready(spi_stage::PROCESS) {
            let buffer = self.transfers.slot_mut(spi_stage::PROCESS);
            if !buffer.failed {
                self.rx.process_transaction(
                    &buffer.rx[..buffer.len],
                    chunk_size,
                    &mut self.link,
                    &mut self.handler,
                );
            }
            buffer.clear();
            self.transfers.done(spi_stage::PROCESS);
        }
    }
}
