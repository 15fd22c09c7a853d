//! Configuration types for the TC6 protocol engine

use super::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_CONCAT_THRESHOLD, DEFAULT_IDLE_CHUNKS, DEFAULT_TX_CREDIT, MAX_CHUNK_CREDIT,
};

/// Chunk payload size negotiated with the MAC-PHY (CONFIG0.CPS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ChunkSize {
    /// 32 payload bytes per chunk
    Bytes32 = 32,
    /// 64 payload bytes per chunk (default)
    #[default]
    Bytes64 = 64,
}

impl ChunkSize {
    /// Payload bytes per chunk
    pub const fn bytes(self) -> usize {
        self as usize
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tc6Config {
    /// Instance number reported back to the integrator
    pub instance: u8,
    /// Chunk payload size
    pub chunk_size: ChunkSize,
    /// Frames up to this length may start in the tail of a chunk shared with
    /// the end of the previous frame
    pub concat_threshold: u16,
    /// Empty chunks appended while an interrupt is pending and TX credit is left
    pub idle_chunks: u8,
    /// TX credit assumed until the first valid footer
    pub initial_tx_credit: u8,
}

impl Default for Tc6Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Tc6Config {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            instance: 0,
            chunk_size: ChunkSize::Bytes64,
            concat_threshold: DEFAULT_CONCAT_THRESHOLD,
            idle_chunks: DEFAULT_IDLE_CHUNKS,
            initial_tx_credit: DEFAULT_TX_CREDIT,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the instance number
    #[must_use]
    pub const fn with_instance(mut self, instance: u8) -> Self {
        self.instance = instance;
        self
    }

    /// Set the chunk payload size
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: ChunkSize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the small-frame concatenation threshold
    #[must_use]
    pub const fn with_concat_threshold(mut self, threshold: u16) -> Self {
        self.concat_threshold = threshold;
        self
    }

    /// Set the idle chunk count used while servicing an interrupt
    #[must_use]
    pub const fn with_idle_chunks(mut self, chunks: u8) -> Self {
        self.idle_chunks = chunks;
        self
    }

    /// Set the TX credit assumed after reset
    #[must_use]
    pub const fn with_initial_tx_credit(mut self, credit: u8) -> Self {
        self.initial_tx_credit = credit;
        self
    }

    /// Check the configuration against the 5-bit footer fields.
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.initial_tx_credit > MAX_CHUNK_CREDIT {
            return Err(ConfigError::InvalidChunkCredit);
        }
        if self.idle_chunks == 0 || self.idle_chunks > MAX_CHUNK_CREDIT {
            return Err(ConfigError::InvalidIdleChunks);
        }
        Ok(())
    }
}

/// Flow control and synchronization state from the latest valid footer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStatus {
    /// Chunks the MAC-PHY can currently accept
    pub tx_credit: u8,
    /// Chunks the MAC-PHY holds for the host
    pub rx_chunks_available: u8,
    /// MAC-PHY configuration synchronized
    pub synced: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================
