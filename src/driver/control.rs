//! Register access pipeline.
//!
//! Every register operation occupies one slot of a seven stage ring:
//!
//! ```text
//! ENQUEUE -> SEND -> INT -> MODIFY -> SEND_MODIFIED -> INT_MODIFIED -> EVENT
//! ```
//!
//! Plain reads and writes pass MODIFY, SEND_MODIFIED and INT_MODIFIED without
//! touching the bus. A read-modify-write reads the register in SEND/INT,
//! computes the new value in MODIFY and writes it back in
//! SEND_MODIFIED/INT_MODIFIED. Each operation carries its own control
//! transaction buffers.

use core::slice;

use super::error::{ProtocolError, QueueError, Result};
use super::handler::Tc6Handler;
use super::spi::SpiOperation;
use super::tc6::Tc6;
use crate::internal::constants::{CONTROL_BUF_SIZE, INVALID_REGISTER_VALUE};
use crate::protocol::control::{ControlRequest, decode_control_reply};
use crate::register::oa;

/// Register pipeline stages
pub(crate) mod reg_stage {
    pub const ENQUEUE: usize = 0;
    pub const SEND: usize = 1;
    pub const INT: usize = 2;
    pub const MODIFY: usize = 3;
    pub const SEND_MODIFIED: usize = 4;
    pub const INT_MODIFIED: usize = 5;
    pub const EVENT: usize = 6;
    pub const COUNT: usize = 7;
}

// =============================================================================
// Public Types
// =============================================================================

/// Completion callback of a register operation.
///
/// Receives the engine so it can queue follow-up operations.
pub type RegisterCallback<E> = fn(&mut E, RegisterEvent);

/// Result of a register operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterEvent {
    /// The reply was received and, for secure transfers, verified
    pub success: bool,
    /// Register address
    pub address: u32,
    /// Value read, or value written back; `0xFFFF_FFFF` on failure
    pub value: u32,
    /// Caller tag
    pub tag: usize,
}

/// Operation of a [`MemoryMapEntry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryOp {
    /// Write `value`
    Write,
    /// Read the register
    Read,
    /// Replace the bits selected by `mask` with those of `value`
    ReadModifyWrite,
}

/// One step of a bulk register sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryMapEntry {
    /// Register address (memory map selector in the upper 16 bits)
    pub address: u32,
    /// Value to write
    pub value: u32,
    /// Bits to modify (read-modify-write only)
    pub mask: u32,
    /// Operation
    pub op: MemoryOp,
    /// Use the secure (complement protected) encoding
    pub secure: bool,
}

impl MemoryMapEntry {
    /// Secure write entry
    pub const fn write(address: u32, value: u32) -> Self {
        Self {
            address,
            value,
            mask: 0,
            op: MemoryOp::Write,
            secure: true,
        }
    }

    /// Secure read entry
    pub const fn read(address: u32) -> Self {
        Self {
            address,
            value: 0,
            mask: 0,
            op: MemoryOp::Read,
            secure: true,
        }
    }

    /// Secure read-modify-write entry
    pub const fn modify(address: u32, value: u32, mask: u32) -> Self {
        Self {
            address,
            value,
            mask,
            op: MemoryOp::ReadModifyWrite,
            secure: true,
        }
    }

    /// Use the plain encoding instead
    #[must_use]
    pub const fn plain(mut self) -> Self {
        self.secure = false;
        self
    }
}

/// Value written back by a read-modify-write.
#[inline]
pub const fn modified_value(current: u32, value: u32, mask: u32) -> u32 {
    (current & !mask) | (value & mask)
}

// =============================================================================
// Queue Entries
// =============================================================================

/// Progress of a register operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegisterKind {
    Write,
    Read,
    ModifyPendingRead,
    ModifyPendingWrite,
}

impl RegisterKind {
    const fn is_write(self) -> bool {
        matches!(self, RegisterKind::Write | RegisterKind::ModifyPendingWrite)
    }
}

pub(crate) struct RegisterOp<E> {
    address: u32,
    value: u32,
    mask: u32,
    secure: bool,
    kind: RegisterKind,
    callback: Option<RegisterCallback<E>>,
    tag: usize,
    pub(super) tx: [u8; CONTROL_BUF_SIZE],
    pub(super) rx: [u8; CONTROL_BUF_SIZE],
    pub(super) len: usize,
    pub(super) failed: bool,
}

impl<E> Clone for RegisterOp<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for RegisterOp<E> {}

impl<E> RegisterOp<E> {
    pub(crate) const fn empty() -> Self {
        Self {
            address: 0,
            value: 0,
            mask: 0,
            secure: false,
            kind: RegisterKind::Read,
            callback: None,
            tag: 0,
            tx: [0; CONTROL_BUF_SIZE],
            rx: [0; CONTROL_BUF_SIZE],
            len: 0,
            failed: false,
        }
    }

    /// Decode the reply; `None` if the transfer failed or the reply is corrupt.
    fn reply(&self) -> Option<u32> {
        if self.failed {
            return None;
        }
        let mut value = INVALID_REGISTER_VALUE;
        let count = decode_control_reply(
            &self.rx[..self.len],
            slice::from_mut(&mut value),
            self.secure,
        );
        (count != 0).then_some(value)
    }

    fn completion(&self) -> RegisterCompletion<E> {
        let value = self.reply();
        RegisterCompletion {
            callback: self.callback,
            event: RegisterEvent {
                success: value.is_some(),
                address: self.address,
                value: value.unwrap_or(INVALID_REGISTER_VALUE),
                tag: self.tag,
            },
        }
    }

    pub(crate) fn aborted(&self) -> RegisterCompletion<E> {
        RegisterCompletion {
            callback: self.callback,
            event: RegisterEvent {
                success: false,
                address: self.address,
                value: 0,
                tag: self.tag,
            },
        }
    }
}

/// Deferred register callback
pub(crate) struct RegisterCompletion<E> {
    callback: Option<RegisterCallback<E>>,
    event: RegisterEvent,
}

impl<E> RegisterCompletion<E> {
    pub(crate) fn fire(self, engine: &mut E) {
        if let Some(callback) = self.callback {
            callback(engine, self.event);
        }
    }
}

// =============================================================================
// Register Access
// =============================================================================

impl<
    'buf,
    H: Tc6Handler,
    const REG_OPS: usize,
    const TX_FRAMES: usize,
    const SPI_BUFS: usize,
    const SPI_BUF_LEN: usize,
> Tc6<'buf, H, REG_OPS, TX_FRAMES, SPI_BUFS, SPI_BUF_LEN>
{
    /// Queue a secure register read.
    pub fn read_register(
        &mut self,
        address: u32,
        callback: Option<RegisterCallback<Self>>,
        tag: usize,
    ) -> Result<()> {
        self.enqueue_register(RegisterKind::Read, address, 0, 0, true, callback, tag)
    }

    /// Queue a secure register write.
    pub fn write_register(
        &mut self,
        address: u32,
        value: u32,
        callback: Option<RegisterCallback<Self>>,
        tag: usize,
    ) -> Result<()> {
        self.enqueue_register(RegisterKind::Write, address, value, 0, true, callback, tag)
    }

    /// Queue a read-modify-write: the bits selected by `mask` take the value
    /// of the same bits in `value`.
    ///
    /// The callback fires once, after the write back, with the written value.
    pub fn read_modify_write_register(
        &mut self,
        address: u32,
        value: u32,
        mask: u32,
        callback: Option<RegisterCallback<Self>>,
        tag: usize,
    ) -> Result<()> {
        self.enqueue_register(
            RegisterKind::ModifyPendingRead,
            address,
            value,
            mask,
            true,
            callback,
            tag,
        )
    }

    /// Queue a sequence of register operations.
    ///
    /// Stops at the first entry that does not fit and returns how many
    /// entries were queued. All entries share `callback` and `tag`.
    pub fn multiple_register_access(
        &mut self,
        map: &[MemoryMapEntry],
        callback: Option<RegisterCallback<Self>>,
        tag: usize,
    ) -> usize {
        let mut queued = 0;
        for entry in map {
            let (kind, value, mask) = match entry.op {
                MemoryOp::Write => (RegisterKind::Write, entry.value, 0),
                MemoryOp::Read => (RegisterKind::Read, 0, 0),
                MemoryOp::ReadModifyWrite => {
                    (RegisterKind::ModifyPendingRead, entry.value, entry.mask)
                }
            };
            if self
                .enqueue_register(kind, entry.address, value, mask, entry.secure, callback, tag)
                .is_err()
            {
                break;
            }
            queued += 1;
        }
        queued
    }

    /// Clear the extended status and re-arm its notification.
    ///
    /// Reads STATUS0, writes the value back (write one to clear) and unlocks
    /// extended status notifications once done.
    pub fn acknowledge_extended_status(&mut self) -> Result<()> {
        self.enqueue_register(
            RegisterKind::Read,
            oa::STATUS0,
            0,
            0,
            true,
            Some(Self::on_status0_read),
            0,
        )
    }

    fn on_status0_read(tc6: &mut Self, event: RegisterEvent) {
        let queued = event.success
            && tc6
                .write_register(oa::STATUS0, event.value, Some(Self::on_status0_cleared), 0)
                .is_ok();
        if !queued {
            tc6.unlock_extended_status();
        }
    }

    fn on_status0_cleared(tc6: &mut Self, _event: RegisterEvent) {
        tc6.unlock_extended_status();
    }

    fn enqueue_register(
        &mut self,
        kind: RegisterKind,
        address: u32,
        value: u32,
        mask: u32,
        secure: bool,
        callback: Option<RegisterCallback<Self>>,
        tag: usize,
    ) -> Result<()> {
        if !self.registers.is_ready(reg_stage::ENQUEUE) {
            return Err(QueueError::Full.into());
        }

        let op = self.registers.slot_mut(reg_stage::ENQUEUE);
        let values = [value];
        let request = if kind.is_write() {
            ControlRequest::write(address, &values)
        } else {
            ControlRequest::read(address, 1)
        };
        let encoded = if secure {
            request.encode_secure(&mut op.tx)
        } else {
            request.encode(&mut op.tx)
        };
        let len = match encoded {
            Ok(len) => len,
            Err(e) => {
                self.handler.on_error(ProtocolError::ControlTxFail);
                return Err(e.into());
            }
        };

        op.address = address;
        op.value = value;
        op.mask = mask;
        op.secure = secure;
        op.kind = kind;
        op.callback = callback;
        op.tag = tag;
        op.len = len;
        op.failed = false;

        if !self.data_enabled {
            self.init_done = false;
        }
        self.registers.done(reg_stage::ENQUEUE);
        self.handler.on_need_service();
        Ok(())
    }

    // =========================================================================
    // Pipeline Processing
    // =========================================================================

    /// Run the control side of a service pass.
    pub(super) fn service_control(&mut self) {
        self.process_modify();
        self.process_register_events();
        self.send_control();
    }

    /// Turn completed read-modify-write reads into writes; let everything else
    /// pass straight to EVENT.
    fn process_modify(&mut self) {
        // one modified write at a time keeps MODIFY aligned with the later stages
        while self.registers.is_ready(reg_stage::MODIFY)
            && !self.registers.is_ready(reg_stage::SEND_MODIFIED)
            && !self.registers.is_ready(reg_stage::INT_MODIFIED)
        {
            let op = self.registers.slot_mut(reg_stage::MODIFY);
            let current = match op.kind {
                RegisterKind::ModifyPendingRead => op.reply(),
                _ => None,
            };

            let mut rewritten = false;
            if let Some(current) = current {
                let values = [modified_value(current, op.value, op.mask)];
                match ControlRequest::write(op.address, &values).encode_secure(&mut op.tx) {
                    Ok(len) => {
                        op.kind = RegisterKind::ModifyPendingWrite;
                        op.secure = true;
                        op.len = len;
                        rewritten = true;
                    }
                    Err(_) => {
                        op.failed = true;
                        self.handler.on_error(ProtocolError::ControlTxFail);
                    }
                }
            }

            self.registers.done(reg_stage::MODIFY);
            if !rewritten {
                self.registers.done(reg_stage::SEND_MODIFIED);
                self.registers.done(reg_stage::INT_MODIFIED);
            }
        }
    }

    fn process_register_events(&mut self) {
        while self.registers.is_ready(reg_stage::EVENT) {
            let completion = self.registers.slot(reg_stage::EVENT).completion();
            self.registers.done(reg_stage::EVENT);

            let success = completion.event.success;
            if completion.callback.is_some() {
                completion.fire(self);
            } else if !success {
                self.handler.on_error(ProtocolError::NoHardware);
            }

            if !self.init_done && !self.registers.is_ready(reg_stage::SEND) {
                self.init_done = true;
                #[cfg(feature = "defmt")]
                defmt::info!("tc6[{}]: bring-up complete", self.config.instance);
            }
        }
    }

    /// Submit a control transaction; write backs go before fresh operations.
    fn send_control(&mut self) {
        for stage in [reg_stage::SEND_MODIFIED, reg_stage::SEND] {
            if self.current_op != SpiOperation::Idle {
                return;
            }
            if !self.registers.is_ready(stage) {
                continue;
            }

            self.registers.done(stage);
            self.current_op = SpiOperation::Control;
            // nothing else is in flight, so the next stage now points at this op
            let op = self.registers.slot_mut(stage + 1);
            op.failed = false;
            if !self
                .handler
                .on_spi_transaction(&op.tx[..op.len], &mut op.rx[..op.len])
            {
                self.current_op = SpiOperation::Idle;
                self.registers.undo(stage);
                #[cfg(feature = "defmt")]
                defmt::debug!("tc6[{}]: control transaction rejected", self.config.instance);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;
    use crate::driver::error::Error;
    use crate::testing::{Event, MockHandler, Simulator, TestTc6, XorShift, run};

    fn record(tc6: &mut TestTc6<'_>, event: RegisterEvent) {
        tc6.handler_mut().register_events.push(event);
    }

    #[test]
    fn modified_value_formula() {
        let mut rng = XorShift::new(0xABCD_0123);
        let mut patterns = Vec::from([0u32, u32::MAX, 0x5555_5555, 0x0F0F_F0F0]);
        for _ in 0..200 {
            patterns.push(rng.next_u32());
        }

        for &m in &patterns {
            for &v in &patterns[..8] {
                for &r in &patterns[..8] {
                    let out = modified_value(r, v, m);
                    assert_eq!(out & m, v & m);
                    assert_eq!(out & !m, r & !m);
                }
            }
        }
        assert_eq!(modified_value(0x1234_5678, 0xFFFF_FFFF, 0), 0x1234_5678);
        assert_eq!(modified_value(0x1234_5678, 0xCAFE_BABE, u32::MAX), 0xCAFE_BABE);
        assert_eq!(modified_value(0, 0, 0), 0);
    }

    #[test]
    fn write_then_read_through_simulator() {
        let mut tc6 = TestTc6::new(MockHandler::new());
        let mut sim = Simulator::new();

        tc6.write_register(0x0001_0004, 0xDEAD_BEEF, Some(record), 1).unwrap();
        tc6.read_register(0x0001_0004, Some(record), 2).unwrap();
        run(&mut tc6, &mut sim, 8);

        let events = &tc6.handler().register_events;
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            RegisterEvent {
                success: true,
                address: 0x0001_0004,
                value: 0xDEAD_BEEF,
                tag: 1
            }
        );
        assert_eq!(events[1].value, 0xDEAD_BEEF);
        assert_eq!(events[1].tag, 2);
        assert_eq!(sim.register(0x0001_0004), 0xDEAD_BEEF);
    }

    #[test]
    fn read_modify_write_applies_mask() {
        let mut rng = XorShift::new(0x0BAD_F00D);
        let cases = [
            (0u32, 0u32, 0u32),
            (u32::MAX, u32::MAX, u32::MAX),
            (0, u32::MAX, 0xFFFF_0000),
            (u32::MAX, 0, 0x00FF_00FF),
            (rng.next_u32(), rng.next_u32(), rng.next_u32()),
            (rng.next_u32(), rng.next_u32(), rng.next_u32()),
        ];

        for (r, v, m) in cases {
            let mut tc6 = TestTc6::new(MockHandler::new());
            let mut sim = Simulator::new();
            sim.set_register(0x0004_0010, r);

            tc6.read_modify_write_register(0x0004_0010, v, m, Some(record), 7)
                .unwrap();
            run(&mut tc6, &mut sim, 8);

            let expected = (r & !m) | (v & m);
            assert_eq!(sim.register(0x0004_0010), expected);
            let events = &tc6.handler().register_events;
            assert_eq!(events.len(), 1);
            assert!(events[0].success);
            assert_eq!(events[0].value, expected);
            // one read, one write
            assert_eq!(sim.control_transactions(), 2);
        }
    }

    #[test]
    fn corrupted_secure_reply_fails_operation() {
        let mut tc6 = TestTc6::new(MockHandler::new());
        let mut sim = Simulator::new();
        sim.corrupt_next_control_reply();

        tc6.read_register(oa::STATUS0, Some(record), 0).unwrap();
        run(&mut tc6, &mut sim, 4);

        let events = &tc6.handler().register_events;
        assert_eq!(events.len(), 1);
        assert!(!events[0].success);
        assert_eq!(events[0].value, INVALID_REGISTER_VALUE);
    }

    #[test]
    fn failure_without_callback_reports_no_hardware() {
        let mut tc6 = TestTc6::new(MockHandler::new());
        let mut sim = Simulator::new();
        sim.corrupt_next_control_reply();

        tc6.read_register(oa::STATUS0, None, 0).unwrap();
        run(&mut tc6, &mut sim, 4);

        assert_eq!(
            tc6.handler().errors(),
            Vec::from([ProtocolError::NoHardware])
        );
    }

    #[test]
    fn failed_spi_transfer_fails_operation() {
        let mut tc6 = TestTc6::new(MockHandler::new());
        tc6.read_register(oa::IDVER, Some(record), 0).unwrap();

        tc6.service(false);
        assert_eq!(tc6.current_operation(), SpiOperation::Control);
        tc6.spi_transfer_done(false);
        tc6.service(false);

        let events = &tc6.handler().register_events;
        assert_eq!(events.len(), 1);
        assert!(!events[0].success);
        assert!(tc6.handler().errors().contains(&ProtocolError::SpiError));
    }

    #[test]
    fn queue_full_is_reported() {
        let mut tc6 = TestTc6::new(MockHandler::new());
        for i in 0..8 {
            tc6.write_register(i, i, None, 0).unwrap();
        }
        assert_eq!(
            tc6.write_register(9, 9, None, 0),
            Err(Error::Queue(QueueError::Full))
        );
    }

    #[test]
    fn rejected_transaction_is_retried() {
        let mut tc6 = TestTc6::new(MockHandler::new());
        let mut sim = Simulator::new();
        tc6.handler_mut().reject_transactions = 1;

        tc6.write_register(oa::IMASK0, 0, Some(record), 0).unwrap();
        tc6.service(false);
        assert_eq!(tc6.current_operation(), SpiOperation::Idle);
        assert_eq!(tc6.handler().transactions.len(), 0);

        run(&mut tc6, &mut sim, 4);
        assert_eq!(tc6.handler().register_events.len(), 1);
        assert!(tc6.handler().register_events[0].success);
    }

    #[test]
    fn modified_write_goes_before_fresh_operation() {
        let mut tc6 = TestTc6::new(MockHandler::new());
        let mut sim = Simulator::new();
        sim.set_register(0x10, 0xF0);

        tc6.read_modify_write_register(0x10, 0x0F, 0x0F, None, 0).unwrap();
        tc6.write_register(0x20, 1, None, 0).unwrap();

        // read of 0x10
        tc6.service(false);
        sim.complete(&mut tc6);
        // the write back of 0x10 must win over the queued write to 0x20
        tc6.service(false);
        let (tx, _) = tc6.in_flight_transfer().unwrap();
        let header = u32::from_be_bytes([tx[0], tx[1], tx[2], tx[3]]);
        assert_eq!((header >> 8) & 0xFFFF, 0x10);
        assert_ne!(header & (1 << 29), 0);

        sim.complete(&mut tc6);
        run(&mut tc6, &mut sim, 4);
        assert_eq!(sim.register(0x10), 0xFF);
        assert_eq!(sim.register(0x20), 1);
    }

    #[test]
    fn bulk_access_stops_when_full() {
        let mut tc6 = TestTc6::new(MockHandler::new());
        let mut sim = Simulator::new();
        let map = [
            MemoryMapEntry::write(0x0004_00D0, 0x3F31),
            MemoryMapEntry::modify(0x0004_00E0, 0x0C00, 0x0F00).plain(),
            MemoryMapEntry::read(0x0004_00D0),
        ];

        assert_eq!(tc6.multiple_register_access(&map, Some(record), 9), 3);
        run(&mut tc6, &mut sim, 12);

        let events = &tc6.handler().register_events;
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.success && e.tag == 9));
        assert_eq!(events[2].value, 0x3F31);
        assert_eq!(sim.register(0x0004_00E0), 0x0C00);

        let long = [MemoryMapEntry::write(0, 0); 12];
        assert_eq!(tc6.multiple_register_access(&long, None, 0), 8);
    }

    #[test]
    fn bring_up_completes_after_last_operation() {
        let mut tc6 = TestTc6::new(MockHandler::new());
        let mut sim = Simulator::new();
        assert!(!tc6.is_initialized());

        tc6.write_register(oa::CONFIG0, 0x8006, None, 0).unwrap();
        tc6.write_register(oa::IMASK0, 0, None, 0).unwrap();
        tc6.service(false);
        sim.complete(&mut tc6);
        tc6.service(false);
        // second write still waiting to be sent
        assert!(!tc6.is_initialized());

        run(&mut tc6, &mut sim, 4);
        assert!(tc6.is_initialized());
    }

    #[test]
    fn acknowledge_extended_status_writes_back_and_unlocks() {
        let mut tc6 = TestTc6::new(MockHandler::new());
        let mut sim = Simulator::new();
        sim.set_register(oa::STATUS0, 0x0000_0040);

        tc6.acknowledge_extended_status().unwrap();
        run(&mut tc6, &mut sim, 8);

        assert_eq!(sim.control_transactions(), 2);
        assert_eq!(sim.writes(), Vec::from([(oa::STATUS0, 0x0000_0040)]));
        assert!(
            tc6.handler()
                .events
                .iter()
                .all(|e| !matches!(e, Event::Error(_)))
        );
    }
}
