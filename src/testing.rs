//! Testing utilities and mock implementations
//!
//! This module provides a recording handler and a MAC-PHY simulator for
//! testing the protocol engine on the host without hardware.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use std::collections::{BTreeMap, VecDeque};
use std::vec::Vec;

use crate::driver::config::ChunkSize;
use crate::driver::control::RegisterEvent;
use crate::driver::error::ProtocolError;
use crate::driver::handler::{RxFrame, Tc6Handler};
use crate::driver::spi::SpiOperation;
use crate::driver::tc6::Tc6;
use crate::driver::tx::TxEvent;
use crate::internal::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_SPI_BUF_LEN, HEADER_SIZE};
use crate::protocol::bits::{
    control_header, data_header, footer, has_odd_parity, read_be, with_parity, write_be,
};
use crate::protocol::header::DataHeader;
use crate::register::{cps, oa, register_address};

/// Engine used by the unit tests: 8 register ops, 4 frames, 8 buffers
pub type TestTc6<'buf> = Tc6<'buf, MockHandler, 8, 4, 8, DEFAULT_SPI_BUF_LEN>;

// =============================================================================
// Random Numbers
// =============================================================================

/// Deterministic xorshift64 generator for property-style tests
#[derive(Debug, Clone)]
pub struct XorShift {
    state: u64,
}

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }
}

// =============================================================================
// Footer Builder
// =============================================================================

/// Builds RX footer words; starts out synchronized with no data.
#[derive(Debug, Clone, Copy)]
pub struct FooterBuilder {
    word: u32,
}

impl Default for FooterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FooterBuilder {
    pub fn new() -> Self {
        Self {
            word: footer::SYNC.make(1),
        }
    }

    fn set(mut self, bits: u32) -> Self {
        self.word |= bits;
        self
    }

    pub fn tx_credit(mut self, credit: u8) -> Self {
        self.word &= !footer::TXC.make(u32::MAX);
        self.set(footer::TXC.make(credit as u32))
    }

    pub fn rx_chunks_available(mut self, chunks: u8) -> Self {
        self.word &= !footer::RCA.make(u32::MAX);
        self.set(footer::RCA.make(chunks as u32))
    }

    /// Frame start at `word_offset` (times four bytes)
    pub fn start(self, word_offset: u32) -> Self {
        self.set(footer::DV.make(1) | footer::SV.make(1) | footer::SWO.make(word_offset))
    }

    /// Frame end with `byte_offset` as the index of its last byte
    pub fn end(self, byte_offset: u32) -> Self {
        self.set(footer::DV.make(1) | footer::EV.make(1) | footer::EBO.make(byte_offset))
    }

    /// Frame data without boundaries
    pub fn data(self) -> Self {
        self.set(footer::DV.make(1))
    }

    pub fn header_bad(self) -> Self {
        self.set(footer::HDRB.make(1))
    }

    pub fn unsynced(mut self) -> Self {
        self.word &= !footer::SYNC.make(1);
        self
    }

    pub fn extended_status(self) -> Self {
        self.set(footer::EXST.make(1))
    }

    pub fn frame_drop(self) -> Self {
        self.set(footer::FD.make(1))
    }

    pub fn timestamp_added(self) -> Self {
        self.set(footer::RTSA.make(1))
    }

    /// Final word with odd parity
    pub fn build(self) -> u32 {
        with_parity(self.word)
    }
}

// =============================================================================
// Mock Handler
// =============================================================================

/// Everything the engine reported, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NeedService,
    Transaction(usize),
    Rejected,
    Error(ProtocolError),
    ExtendedStatus,
    Slice { offset: usize, len: usize },
    Frame(RxFrame),
}

/// Recording [`Tc6Handler`]
///
/// Transactions are accepted (unless `reject_transactions` is non-zero) and
/// left for a [`Simulator`] or the test to complete.
#[derive(Debug, Default)]
pub struct MockHandler {
    pub events: Vec<Event>,
    /// TX bytes of every accepted transaction
    pub transactions: Vec<Vec<u8>>,
    /// Refuse this many transactions before accepting again
    pub reject_transactions: usize,
    pub slices: Vec<(usize, Vec<u8>)>,
    pub frames: Vec<RxFrame>,
    /// Frames that completed successfully, reassembled from their slices
    pub received: Vec<Vec<u8>>,
    pub extended_status: usize,
    pub register_events: Vec<RegisterEvent>,
    /// Filled by [`record_tx`]: `(tag, success)`
    pub tx_done: Vec<(usize, bool)>,
    partial: Vec<u8>,
}

impl MockHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<ProtocolError> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Error(error) => Some(*error),
                _ => None,
            })
            .collect()
    }
}

impl Tc6Handler for MockHandler {
    fn on_need_service(&mut self) {
        self.events.push(Event::NeedService);
    }

    fn on_spi_transaction(&mut self, tx: &[u8], _rx: &mut [u8]) -> bool {
        if self.reject_transactions > 0 {
            self.reject_transactions -= 1;
            self.events.push(Event::Rejected);
            return false;
        }
        self.events.push(Event::Transaction(tx.len()));
        self.transactions.push(tx.to_vec());
        true
    }

    fn on_error(&mut self, error: ProtocolError) {
        self.events.push(Event::Error(error));
    }

    fn on_extended_status(&mut self) {
        self.extended_status += 1;
        self.events.push(Event::ExtendedStatus);
    }

    fn on_rx_slice(&mut self, data: &[u8], offset: usize) {
        self.events.push(Event::Slice {
            offset,
            len: data.len(),
        });
        self.slices.push((offset, data.to_vec()));
        self.partial.extend_from_slice(data);
    }

    fn on_rx_frame(&mut self, frame: RxFrame) {
        self.events.push(Event::Frame(frame));
        self.frames.push(frame);
        let data = core::mem::take(&mut self.partial);
        if frame.success {
            self.received.push(data);
        }
    }
}

/// TX callback that stores `(tag, success)` in the [`MockHandler`]
pub fn record_tx(tc6: &mut TestTc6<'_>, event: TxEvent<'_>) {
    tc6.handler_mut().tx_done.push((event.tag, event.success));
}

// =============================================================================
// MAC-PHY Simulator
// =============================================================================

/// Minimal MAC-PHY model
///
/// Answers control transactions from a register file, collects transmitted
/// frames and feeds queued RX frames into the chunks clocked in by the host.
#[derive(Debug)]
pub struct Simulator {
    chunk_size: usize,
    registers: BTreeMap<u32, u32>,
    writes: Vec<(u32, u32)>,
    control_transactions: usize,
    data_chunks: usize,
    corrupt_next: bool,
    tx_credit: u8,
    stuck: bool,
    extended_status: bool,
    rx_chunks: VecDeque<([u8; DEFAULT_CHUNK_SIZE], u32)>,
    tx_frames: Vec<Vec<u8>>,
    tx_partial: Vec<u8>,
    bad_headers: usize,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            registers: BTreeMap::new(),
            writes: Vec::new(),
            control_transactions: 0,
            data_chunks: 0,
            corrupt_next: false,
            tx_credit: 24,
            stuck: false,
            extended_status: false,
            rx_chunks: VecDeque::new(),
            tx_frames: Vec::new(),
            tx_partial: Vec::new(),
            bad_headers: 0,
        }
    }

    pub fn set_register(&mut self, address: u32, value: u32) {
        self.registers.insert(address, value);
    }

    pub fn register(&self, address: u32) -> u32 {
        self.registers.get(&address).copied().unwrap_or(0)
    }

    /// Register writes in the order they arrived
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.writes.clone()
    }

    pub fn control_transactions(&self) -> usize {
        self.control_transactions
    }

    pub fn data_chunks(&self) -> usize {
        self.data_chunks
    }

    /// Flip a bit in the complement word of the next control reply
    pub fn corrupt_next_control_reply(&mut self) {
        self.corrupt_next = true;
    }

    pub fn set_tx_credit(&mut self, credit: u8) {
        self.tx_credit = credit;
    }

    /// Answer every data chunk with an all-ones footer
    pub fn set_stuck(&mut self, stuck: bool) {
        self.stuck = stuck;
    }

    pub fn set_extended_status(&mut self, set: bool) {
        self.extended_status = set;
    }

    /// Interrupt line state: RX data waiting
    pub fn interrupt_pending(&self) -> bool {
        !self.rx_chunks.is_empty()
    }

    /// Frames reassembled from the TX chunks
    pub fn tx_frames(&self) -> &[Vec<u8>] {
        &self.tx_frames
    }

    /// TX chunk headers that failed the parity check
    pub fn bad_headers(&self) -> usize {
        self.bad_headers
    }

    /// Queue a frame for the host to receive
    pub fn queue_rx_frame(&mut self, frame: &[u8]) {
        let last = frame.len().div_ceil(self.chunk_size) - 1;
        for (i, piece) in frame.chunks(self.chunk_size).enumerate() {
            let mut payload = [0u8; DEFAULT_CHUNK_SIZE];
            payload[..piece.len()].copy_from_slice(piece);
            let mut builder = FooterBuilder::new().data();
            if i == 0 {
                builder = builder.start(0);
            }
            if i == last {
                builder = builder.end(piece.len() as u32 - 1);
            }
            self.rx_chunks.push_back((payload, builder.build()));
        }
    }

    /// Complete the outstanding transaction of `tc6`, if any.
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
        let operation = tc6.current_operation();
        let Some((tx, rx)) = tc6.in_flight_transfer() else {
            return false;
        };
        match operation {
            SpiOperation::Control => self.answer_control(tx, rx),
            SpiOperation::Data => self.answer_data(tx, rx),
            SpiOperation::Idle => return false,
        }
        tc6.spi_transfer_done(true);
        true
    }

    fn answer_control(&mut self, tx: &[u8], rx: &mut [u8]) {
        self.control_transactions += 1;
        let header = read_be(tx);
        let base = register_address(
            control_header::MMS.get(header) as u8,
            control_header::ADDR.get(header) as u16,
        );
        let count = control_header::LEN.get(header) as usize + 1;
        let secure = tx.len() == count * 8 + 8;
        let stride = if secure { 8 } else { 4 };

        rx.fill(0);
        if control_header::WNR.is_set(header) {
            for i in 0..count {
                let value = read_be(&tx[4 + stride * i..]);
                self.registers.insert(base + i as u32, value);
                self.writes.push((base + i as u32, value));
            }
            let len = tx.len();
            rx[4..].copy_from_slice(&tx[..len - 4]);
        } else {
            write_be(&mut rx[4..], header);
            for i in 0..count {
                let value = self.register(base + i as u32);
                write_be(&mut rx[8 + stride * i..], value);
                if secure {
                    write_be(&mut rx[12 + stride * i..], !value);
                }
            }
        }

        if self.corrupt_next && rx.len() > 12 {
            self.corrupt_next = false;
            rx[12] ^= 0x01;
        }
    }

    fn answer_data(&mut self, tx: &[u8], rx: &mut [u8]) {
        let chunk_buf = self.chunk_size + HEADER_SIZE;
        for (tx_chunk, rx_chunk) in tx.chunks(chunk_buf).zip(rx.chunks_mut(chunk_buf)) {
            self.data_chunks += 1;
            self.receive_chunk(tx_chunk);
            self.fill_rx_chunk(rx_chunk);
        }
    }

    fn receive_chunk(&mut self, chunk: &[u8]) {
        let word = read_be(chunk);
        if !has_odd_parity(word) {
            self.bad_headers += 1;
            return;
        }
        if !data_header::DV.is_set(word) {
            return;
        }
        let header = DataHeader::from_word(word);

        let payload = &chunk[HEADER_SIZE..];
        let start = if header.start_valid() {
            header.start_word_offset() as usize * 4
        } else {
            0
        };
        let end = if header.end_valid() {
            header.end_byte_offset() as usize + 1
        } else {
            payload.len()
        };

        if header.start_valid() && header.end_valid() && end <= start {
            self.tx_partial.extend_from_slice(&payload[..end]);
            self.tx_frames.push(core::mem::take(&mut self.tx_partial));
            self.tx_partial.extend_from_slice(&payload[start..]);
            return;
        }
        if header.start_valid() {
            self.tx_partial.clear();
        }
        self.tx_partial.extend_from_slice(&payload[start..end]);
        if header.end_valid() {
            self.tx_frames.push(core::mem::take(&mut self.tx_partial));
        }
    }

    fn fill_rx_chunk(&mut self, chunk: &mut [u8]) {
        if self.stuck {
            chunk.fill(0xFF);
            return;
        }
        let (payload, footer_bytes) = chunk.split_at_mut(self.chunk_size);
        let mut builder = match self.rx_chunks.pop_front() {
            Some((data, word)) => {
                payload.copy_from_slice(&data[..self.chunk_size]);
                FooterBuilder { word }
            }
            None => {
                payload.fill(0);
                FooterBuilder::new()
            }
        };
        builder = builder
            .tx_credit(self.tx_credit)
            .rx_chunks_available(self.rx_chunks.len().min(31) as u8);
        if self.extended_status {
            builder = builder.extended_status();
        }
        write_be(footer_bytes, builder.build());
    }
}

/// Service `tc6` and let `sim` complete transactions for a number of rounds.
pub fn run<
    H: Tc6Handler,
    const REG_OPS: usize,
    const TX_FRAMES: usize,
    const SPI_BUFS: usize,
    const SPI_BUF_LEN: usize,
>(
    tc6: &mut Tc6<'_, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>,
    sim: &mut Simulator,
    rounds: usize,
) {
    for _ in 0..rounds {
        tc6.service(sim.interrupt_pending());
        sim.complete(tc6);
    }
    tc6.service(false);
}

/// Configure the MAC-PHY, enable data and forget everything recorded so far.
pub fn bring_up(tc6: &mut TestTc6<'_>) {
    let mut sim = Simulator::new();
    tc6.write_register(
        oa::CONFIG0,
        oa::config0::SYNC | cps(ChunkSize::Bytes64),
        None,
        0,
    )
    .unwrap();
    run(tc6, &mut sim, 4);
    assert!(tc6.is_initialized());
    tc6.enable_data(true);
    *tc6.handler_mut() = MockHandler::new();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::header::Footer;

    #[test]
    fn xorshift_is_deterministic() {
        let mut a = XorShift::new(7);
        let mut b = XorShift::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
        assert_ne!(XorShift::new(0).next_u64(), 0);
    }

    #[test]
    fn footer_builder_defaults() {
        let footer = Footer::from_word(FooterBuilder::new().build());
        assert!(footer.parity_ok());
        assert!(footer.synced());
        assert!(!footer.has_data());
        assert!(!footer.is_stuck());
    }

    #[test]
    fn queued_rx_frame_is_split_into_chunks() {
        let mut sim = Simulator::new();
        sim.queue_rx_frame(&[0xAB; 130]);
        assert!(sim.interrupt_pending());
        assert_eq!(sim.rx_chunks.len(), 3);

        let first = Footer::from_word(sim.rx_chunks[0].1);
        assert!(first.start_valid() && !first.end_valid());
        let last = Footer::from_word(sim.rx_chunks[2].1);
        assert!(last.end_valid());
        assert_eq!(last.end_byte_offset(), 1);
    }
}
