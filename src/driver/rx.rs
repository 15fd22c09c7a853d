//! RX footer validation and frame reassembly.
//!
//! Every RX chunk carries a footer describing the payload in front of it. A
//! chunk may hold the middle of a frame, a start, an end, or the end of one
//! frame followed by the start of the next (end offset at or before the start
//! offset). After any fault the assembler drops data until the next start of
//! frame.

use super::config::LinkStatus;
use super::error::ProtocolError;
use super::handler::{RxFrame, Tc6Handler};
use crate::internal::constants::{HEADER_SIZE, RX_TIMESTAMP_LEN};
use crate::protocol::bits::read_be;
use crate::protocol::header::Footer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum RxState {
    /// Between frames
    Idle,
    /// Inside a frame, slices are delivered
    Receiving,
    /// After a fault, waiting for the next start of frame
    Discarding,
}

pub(crate) struct RxAssembler {
    state: RxState,
    /// Frame bytes delivered so far, timestamp excluded
    offset: usize,
    timestamp: u64,
    /// Timestamp bytes still to strip from the frame head
    timestamp_pending: usize,
    timestamp_added: bool,
    ext_status_locked: bool,
}

impl RxAssembler {
    pub(crate) const fn new() -> Self {
        Self {
            state: RxState::Idle,
            offset: 0,
            timestamp: 0,
            timestamp_pending: 0,
            timestamp_added: false,
            ext_status_locked: false,
        }
    }

    pub(crate) fn unlock_extended_status(&mut self) {
        self.ext_status_locked = false;
    }

    /// Fail a frame in progress and restore the initial state.
    pub(crate) fn reset<H: Tc6Handler>(&mut self, handler: &mut H) {
        if self.state == RxState::Receiving {
            handler.on_rx_frame(RxFrame::failed());
        }
        *self = Self::new();
    }

    /// Fail a frame in progress and drop data until the next start.
    pub(crate) fn abort<H: Tc6Handler>(&mut self, handler: &mut H) {
        if self.state == RxState::Receiving {
            handler.on_rx_frame(RxFrame::failed());
        }
        self.state = RxState::Discarding;
        self.offset = 0;
        self.timestamp_pending = 0;
    }

    fn fail<H: Tc6Handler>(&mut self, error: ProtocolError, handler: &mut H) {
        handler.on_error(error);
        self.abort(handler);
    }

    /// Walk the chunks of a completed data transaction.
    ///
    /// Stops at the first chunk whose footer cannot be trusted.
    pub(crate) fn process_transaction<H: Tc6Handler>(
        &mut self,
        rx: &[u8],
        chunk_size: usize,
        link: &mut LinkStatus,
        handler: &mut H,
    ) {
        for chunk in rx.chunks_exact(chunk_size + HEADER_SIZE) {
            let (payload, tail) = chunk.split_at(chunk_size);
            let footer = Footer::from_word(read_be(tail));

            if let Err(error) = Self::validate(footer, link) {
                #[cfg(feature = "defmt")]
                defmt::warn!("tc6: footer {=u32:#x} rejected: {}", footer.word(), error);
                self.fail(error, handler);
                break;
            }

            if footer.frame_drop() {
                self.abort(handler);
                continue;
            }

            if footer.extended_status() && !self.ext_status_locked {
                self.ext_status_locked = true;
                handler.on_extended_status();
            }

            self.reassemble(payload, footer, handler);
        }
    }

    fn validate(footer: Footer, link: &mut LinkStatus) -> Result<(), ProtocolError> {
        if footer.is_stuck() {
            link.synced = false;
            return Err(ProtocolError::NoHardware);
        }
        if !footer.parity_ok() {
            return Err(ProtocolError::BadChecksum);
        }
        link.synced = footer.synced();
        if footer.header_bad() {
            return Err(ProtocolError::BadTxData);
        }
        if !footer.synced() {
            return Err(ProtocolError::SyncLost);
        }
        Ok(())
    }

    fn reassemble<H: Tc6Handler>(&mut self, payload: &[u8], footer: Footer, handler: &mut H) {
        if !footer.has_data() {
            return;
        }

        let chunk_size = payload.len();
        let start_valid = footer.start_valid();
        let end_valid = footer.end_valid();
        let start = if start_valid { footer.start_byte_offset() } else { 0 };
        let end = if end_valid { footer.end_byte_offset() + 1 } else { chunk_size };
        if start >= chunk_size || end > chunk_size {
            self.fail(ProtocolError::UnexpectedDataValid, handler);
            return;
        }

        if start_valid && end_valid && end <= start {
            if self.state == RxState::Receiving {
                self.deliver(&payload[..end], handler);
                self.finish(handler);
            }
            self.begin(footer);
            self.deliver(&payload[start..], handler);
            return;
        }

        if start_valid {
            if self.state == RxState::Receiving {
                handler.on_error(ProtocolError::UnexpectedStartValid);
                handler.on_rx_frame(RxFrame::failed());
            }
            self.begin(footer);
            self.deliver(&payload[start..end], handler);
            if end_valid {
                self.finish(handler);
            }
            return;
        }

        match self.state {
            RxState::Receiving => {
                self.deliver(&payload[..end], handler);
                if end_valid {
                    self.finish(handler);
                }
            }
            RxState::Idle => self.fail(ProtocolError::UnexpectedDataValid, handler),
            RxState::Discarding => {}
        }
    }

    fn begin(&mut self, footer: Footer) {
        let timestamped = footer.timestamp_added();
        self.state = RxState::Receiving;
        self.offset = 0;
        self.timestamp = 0;
        self.timestamp_added = timestamped;
        self.timestamp_pending = if timestamped { RX_TIMESTAMP_LEN } else { 0 };
    }

    /// Strip pending timestamp bytes, hand the rest to the integrator.
    fn deliver<H: Tc6Handler>(&mut self, mut data: &[u8], handler: &mut H) {
        if self.timestamp_pending > 0 {
            let n = self.timestamp_pending.min(data.len());
            for &byte in &data[..n] {
                self.timestamp = (self.timestamp << 8) | u64::from(byte);
            }
            self.timestamp_pending -= n;
            data = &data[n..];
        }
        if !data.is_empty() {
            handler.on_rx_slice(data, self.offset);
            self.offset += data.len();
        }
    }

    fn finish<H: Tc6Handler>(&mut self, handler: &mut H) {
        let frame = if self.timestamp_pending == 0 {
            RxFrame {
                success: true,
                len: self.offset,
                timestamp: self.timestamp_added.then_some(self.timestamp),
            }
        } else {
            RxFrame::failed()
        };
        handler.on_rx_frame(frame);
        self.state = RxState::Idle;
        self.offset = 0;
        self.timestamp_pending = 0;
    }
}
