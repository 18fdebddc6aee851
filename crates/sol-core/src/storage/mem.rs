//! RAM-backed byte store for the simulator and tests.

use crate::error::SolError;
use crate::hardware::ByteStore;

/// Size of the emulated part: 4 KiB, matching the 32 kbit EEPROM.
const STORE_SIZE: usize = 4096;

/// In-memory [`ByteStore`] with optional write-fault injection.
///
/// Fresh stores read back erased flash (0xFF everywhere), so cursor and
/// flag normalization paths get exercised the same way they would be on a
/// factory-new part. A write budget, when set, makes every write past the
/// budget fail with [`SolError::StorageFault`], simulating both bus
/// faults and power loss mid-sequence.
pub struct MemoryStore {
    bytes: [u8; STORE_SIZE],
    writes: usize,
    write_budget: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            bytes: [0xFF; STORE_SIZE],
            writes: 0,
            write_budget: None,
        }
    }

    /// A store whose writes start failing after `budget` successful ones.
    pub fn with_write_budget(budget: usize) -> Self {
        Self {
            write_budget: Some(budget),
            ..Self::new()
        }
    }

    /// Total writes performed so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStore for MemoryStore {
    fn read_byte(&mut self, address: u16) -> Result<u8, SolError> {
        self.bytes
            .get(address as usize)
            .copied()
            .ok_or(SolError::StorageFault)
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), SolError> {
        if let Some(budget) = self.write_budget {
            if self.writes >= budget {
                return Err(SolError::StorageFault);
            }
        }

        let slot = self
            .bytes
            .get_mut(address as usize)
            .ok_or(SolError::StorageFault)?;
        *slot = value;
        self.writes += 1;
        Ok(())
    }
}
