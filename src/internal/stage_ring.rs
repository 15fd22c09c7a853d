//! Stage-tracked ring buffer.
//!
//! A fixed-capacity array shared by an ordered sequence of processing stages.
//! Every stage owns one free-running `u32` cursor. An entry enters at stage 0,
//! walks through every stage in order and becomes free again once the last
//! stage is done with it. Cursor differences are taken with wrapping
//! arithmetic, which stays exact as long as the capacity is at most 2^31.
//!
//! ```text
//!  stage 0 (enqueue) ──> stage 1 ──> ... ──> stage S-1 ──┐
//!       ^                                               │
//!       └───────────── slot becomes free ───────────────┘
//! ```

/// Circular buffer with `STAGES` ordered cursors over `N` slots.
pub(crate) struct StageRing<T, const N: usize, const STAGES: usize> {
    slots: [T; N],
    cursors: [u32; STAGES],
}

impl<T, const N: usize, const STAGES: usize> StageRing<T, N, STAGES> {
    const CAPACITY_CHECK: () = assert!(
        N.is_power_of_two() && N <= (1 << 31),
        "stage ring capacity must be a power of two no larger than 2^31"
    );
    const STAGE_CHECK: () = assert!(STAGES >= 2, "stage ring needs at least two stages");

    /// Create a ring with every slot set to `init` and all cursors at zero.
    pub const fn new(init: T) -> Self
    where
        T: Copy,
    {
        let () = Self::CAPACITY_CHECK;
        let () = Self::STAGE_CHECK;
        Self {
            slots: [init; N],
            cursors: [0; STAGES],
        }
    }

    /// Number of slots in the ring.
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline(always)]
    const fn predecessor(stage: usize) -> usize {
        if stage == 0 { STAGES - 1 } else { stage - 1 }
    }

    #[inline(always)]
    fn index(&self, stage: usize) -> usize {
        (self.cursors[stage] as usize) & (N - 1)
    }

    /// Whether `stage` has an entry to work on.
    ///
    /// Stage 0 is ready while fewer than `N` entries are outstanding; every
    /// other stage is ready while its predecessor is ahead of it.
    #[inline]
    pub fn is_ready(&self, stage: usize) -> bool {
        self.pending(stage) > 0
    }

    /// Number of entries `stage` could take right now.
    ///
    /// For stage 0 this is the number of free slots.
    #[inline]
    pub fn pending(&self, stage: usize) -> u32 {
        let ahead = self.cursors[Self::predecessor(stage)];
        let own = self.cursors[stage];
        if stage == 0 {
            ahead.wrapping_add(N as u32).wrapping_sub(own)
        } else {
            ahead.wrapping_sub(own)
        }
    }

    /// Entries that entered stage 0 and have not left the final stage.
    #[inline]
    pub fn occupied(&self) -> u32 {
        self.cursors[0].wrapping_sub(self.cursors[STAGES - 1])
    }

    /// Slot currently addressed by `stage`.
    #[inline(always)]
    pub fn slot(&self, stage: usize) -> &T {
        &self.slots[self.index(stage)]
    }

    /// Mutable slot currently addressed by `stage`.
    #[inline(always)]
    pub fn slot_mut(&mut self, stage: usize) -> &mut T {
        let index = self.index(stage);
        &mut self.slots[index]
    }

    /// Hand the current entry of `stage` to the next stage.
    #[inline]
    pub fn done(&mut self, stage: usize) {
        debug_assert!(self.is_ready(stage), "stage {stage} advanced while idle");
        self.cursors[stage] = self.cursors[stage].wrapping_add(1);
    }

    /// Take back the last entry handed on by `stage`.
    #[inline]
    pub fn undo(&mut self, stage: usize) {
        self.cursors[stage] = self.cursors[stage].wrapping_sub(1);
    }

    /// Forget every entry.
    pub fn reset(&mut self) {
        self.cursors = [0; STAGES];
    }

    /// Mutable access to every slot, in storage order.
    pub fn slots_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut()
    }

    #[cfg(test)]
    pub(crate) fn set_cursors(&mut self, cursors: [u32; STAGES]) {
        self.cursors = cursors;
    }
}

// =============================================================================
// Tests
// =============================================================================
