//! Ethernet transmit pipeline.
//!
//! Frames are queued as up to four borrowed segments and sliced into data
//! chunks while the SPI multiplexer fills a transaction buffer. A frame shorter
//! than the concatenation threshold may start in the tail of the chunk that
//! ends the previous frame, provided it does not also end there.

use heapless::Vec;

use super::error::{QueueError, QueueResult};
use super::handler::Tc6Handler;
use super::tc6::Tc6;
use crate::internal::constants::{HEADER_SIZE, MAX_TX_FRAME_LEN, MAX_TX_SEGMENTS, TX_PAD_BYTE};
use crate::internal::stage_ring::StageRing;
use crate::protocol::bits::write_be;
use crate::protocol::header::{DataHeader, TimestampCapture};

/// TX frame pipeline stages
pub(crate) mod tx_stage {
    pub const ENQUEUE: usize = 0;
    pub const CONVERT: usize = 1;
    pub const COUNT: usize = 2;
}

/// Completion callback of a queued frame.
pub type TxCallback<'buf, E> = fn(&mut E, TxEvent<'buf>);

/// Outcome of a queued frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxEvent<'buf> {
    /// Every chunk of the frame was packed into a transaction buffer
    pub success: bool,
    /// First segment as passed to `send_frame`
    pub data: &'buf [u8],
    /// Total frame length
    pub len: usize,
    /// Caller tag
    pub tag: usize,
}

pub(crate) struct TxFrame<'buf, E> {
    segments: [&'buf [u8]; MAX_TX_SEGMENTS],
    count: usize,
    len: usize,
    tsc: TimestampCapture,
    callback: Option<TxCallback<'buf, E>>,
    tag: usize,
}

impl<E> Clone for TxFrame<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for TxFrame<'_, E> {}

impl<'buf, E> TxFrame<'buf, E> {
    pub(crate) const fn empty() -> Self {
        Self {
            segments: [&[]; MAX_TX_SEGMENTS],
            count: 0,
            len: 0,
            tsc: TimestampCapture::None,
            callback: None,
            tag: 0,
        }
    }

    fn fill(
        &mut self,
        segments: &[&'buf [u8]],
        len: usize,
        tsc: TimestampCapture,
        callback: Option<TxCallback<'buf, E>>,
        tag: usize,
    ) {
        self.segments = [&[]; MAX_TX_SEGMENTS];
        self.segments[..segments.len()].copy_from_slice(segments);
        self.count = segments.len();
        self.len = len;
        self.tsc = tsc;
        self.callback = callback;
        self.tag = tag;
    }

    pub(crate) fn completion(&self, success: bool) -> TxCompletion<'buf, E> {
        TxCompletion {
            callback: self.callback,
            event: TxEvent {
                success,
                data: self.segments[0],
                len: self.len,
                tag: self.tag,
            },
        }
    }
}

/// Deferred frame callback
pub(crate) struct TxCompletion<'buf, E> {
    callback: Option<TxCallback<'buf, E>>,
    event: TxEvent<'buf>,
}

impl<'buf, E> TxCompletion<'buf, E> {
    pub(crate) fn fire(self, engine: &mut E) {
        if let Some(callback) = self.callback {
            callback(engine, self.event);
        }
    }
}

// =============================================================================
// Chunk Packer
// =============================================================================

/// Read position inside the frame at the head of the CONVERT stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct TxPacker {
    offset: usize,
    segment: usize,
    segment_offset: usize,
}

impl TxPacker {
    pub(crate) const fn new() -> Self {
        Self {
            offset: 0,
            segment: 0,
            segment_offset: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    /// Copy the next `dst.len()` frame bytes, walking across segments.
    fn copy<E>(&mut self, frame: &TxFrame<'_, E>, dst: &mut [u8]) {
        let mut written = 0;
        while written < dst.len() && self.segment < frame.count {
            let segment = frame.segments[self.segment];
            let n = (segment.len() - self.segment_offset).min(dst.len() - written);
            dst[written..written + n]
                .copy_from_slice(&segment[self.segment_offset..self.segment_offset + n]);
            written += n;
            self.offset += n;
            self.segment_offset += n;
            if self.segment_offset == segment.len() {
                self.segment += 1;
                self.segment_offset = 0;
            }
        }
    }

    /// Fill one chunk (header plus payload) from the frame queue.
    ///
    /// Returns `false` without touching `chunk` when no frame is waiting.
    /// Frames that end in this chunk are moved to `completions`.
    pub(crate) fn pack_chunk<'buf, E, const N: usize>(
        &mut self,
        frames: &mut StageRing<TxFrame<'buf, E>, N, { tx_stage::COUNT }>,
        chunk: &mut [u8],
        sequence: &mut u8,
        concat_threshold: usize,
        completions: &mut Vec<TxCompletion<'buf, E>, N>,
    ) -> bool {
        if !frames.is_ready(tx_stage::CONVERT) {
            return false;
        }

        let (head, payload) = chunk.split_at_mut(HEADER_SIZE);
        let chunk_size = payload.len();
        let frame = *frames.slot(tx_stage::CONVERT);

        let mut header = DataHeader::new(*sequence);
        *sequence = sequence.wrapping_add(1);

        let started_here = self.offset == 0;
        if started_here {
            header = header.with_start(0).with_timestamp_capture(frame.tsc);
        }

        let take = (frame.len - self.offset).min(chunk_size);
        self.copy(&frame, &mut payload[..take]);
        payload[take..].fill(TX_PAD_BYTE);

        if self.offset == frame.len {
            header = header.with_end((take - 1) as u32);
            // at most N frames are queued, so this never overflows
            let _ = completions.push(frame.completion(true));
            frames.done(tx_stage::CONVERT);
            self.reset();

            // a frame that started here may not be followed by another start
            if !started_here && frames.is_ready(tx_stage::CONVERT) {
                let next = *frames.slot(tx_stage::CONVERT);
                let used = take.next_multiple_of(4);
                let room = chunk_size - used;
                if next.len <= concat_threshold && room != 0 && next.len > room {
                    header = header
                        .with_start((used / 4) as u32)
                        .with_timestamp_capture(next.tsc);
                    self.copy(&next, &mut payload[used..]);
                }
            }
        }

        write_be(head, header.to_word());
        true
    }
}

// =============================================================================
// Frame Queue
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
    /// Queue an Ethernet frame (without FCS) for transmission.
    ///
    /// `data` stays borrowed until the callback reported the frame done or
    /// [`reset`](Self::reset) aborted it.
    pub fn send_frame(
        &mut self,
        data: &'buf [u8],
        tsc: TimestampCapture,
        callback: Option<TxCallback<'buf, Self>>,
        tag: usize,
    ) -> QueueResult<()> {
        self.send_frame_segments(&[data], tsc, callback, tag)
    }

    /// Queue a frame made of up to four segments sent back to back.
    ///
    /// # Errors
    /// * [`QueueError::NotReady`] - data disabled or bring-up not finished
    /// * [`QueueError::TooManySegments`] - more than four segments
    /// * [`QueueError::InvalidLength`] - total length zero or above 65535
    /// * [`QueueError::Full`] - no free frame slot
    pub fn send_frame_segments(
        &mut self,
        segments: &[&'buf [u8]],
        tsc: TimestampCapture,
        callback: Option<TxCallback<'buf, Self>>,
        tag: usize,
    ) -> QueueResult<()> {
        if !self.data_enabled || !self.init_done {
            return Err(QueueError::NotReady);
        }
        if segments.len() > MAX_TX_SEGMENTS {
            return Err(QueueError::TooManySegments);
        }
        let len: usize = segments.iter().map(|segment| segment.len()).sum();
        if len == 0 || len > MAX_TX_FRAME_LEN {
            return Err(QueueError::InvalidLength);
        }
        if !self.frames.is_ready(tx_stage::ENQUEUE) {
            return Err(QueueError::Full);
        }

        self.frames
            .slot_mut(tx_stage::ENQUEUE)
            .fill(segments, len, tsc, callback, tag);
        self.frames.done(tx_stage::ENQUEUE);
        self.handler.on_need_service();
        Ok(())
    }
}
