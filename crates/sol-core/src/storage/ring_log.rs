//! Append-only circular log of measurement records.
//!
//! The persisted cursor is the sole source of truth: it always points at
//! the next free slot, `pending_count` is `(cursor - LOG_START) / SIZE`,
//! and `append`/`reset` are the only mutators. When the cursor cannot fit
//! one more record before [`LOG_END`] it wraps back to [`LOG_START`]
//! before the write, silently overwriting the oldest unread data. Bounded
//! storage that is lossy under overflow is the intended policy.

use log::{debug, warn};

use crate::error::SolError;
use crate::hardware::ByteStore;
use crate::storage::{CURSOR_ADDR, DataRecord, LOG_END, LOG_START};

/// Circular log view over a byte store.
///
/// Construct it on demand around `&mut store`; it carries no state of its
/// own beyond the store handle.
pub struct CircularLog<S> {
    store: S,
}

impl<S: ByteStore> CircularLog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Number of records the storage range can hold.
    pub const fn capacity() -> u16 {
        (LOG_END - LOG_START) / DataRecord::SIZE as u16
    }

    /// Appends one record at the cursor and persists the advanced cursor.
    ///
    /// No partial-record retry is attempted on a bus fault; the caller
    /// decides whether to skip this cycle's persistence.
    pub fn append(&mut self, record: &DataRecord) -> Result<(), SolError> {
        let mut cursor = self.load_cursor()?;

        // Wrap before the write: when one more record cannot fit, the
        // next slot is the log start and the oldest data gets overwritten.
        if cursor + DataRecord::SIZE as u16 > LOG_END {
            cursor = LOG_START;
        }

        self.store.write_bytes(cursor, &record.to_bytes())?;

        let advanced = cursor + DataRecord::SIZE as u16;
        self.store_cursor(advanced)?;

        debug!("appended record at {:#06x}, cursor now {:#06x}", cursor, advanced);
        Ok(())
    }

    /// Number of records written since the last reset (or wrap).
    pub fn pending_count(&mut self) -> Result<u16, SolError> {
        let cursor = self.load_cursor()?;
        Ok((cursor - LOG_START) / DataRecord::SIZE as u16)
    }

    /// Reads the pending record at `index` (0 = oldest) without removing it.
    pub fn read(&mut self, index: u16) -> Result<DataRecord, SolError> {
        let address = LOG_START + index * DataRecord::SIZE as u16;
        let mut bytes = [0u8; DataRecord::SIZE];
        self.store.read_bytes(address, &mut bytes)?;
        Ok(DataRecord::from_bytes(&bytes))
    }

    /// Iterates every pending record in write order without removing them.
    pub fn drain(&mut self) -> Result<Drain<'_, S>, SolError> {
        let count = self.pending_count()?;
        Ok(Drain {
            log: self,
            index: 0,
            count,
        })
    }

    /// Logically discards all pending records with a single persisted
    /// cursor write. Idempotent.
    pub fn reset(&mut self) -> Result<(), SolError> {
        self.store_cursor(LOG_START)
    }

    /// Loads the persisted cursor, normalizing a fresh or corrupted value
    /// (out of range or not record-aligned) back to [`LOG_START`]. The
    /// cursor may legitimately sit where no further record fits; the wrap
    /// happens on the next append.
    fn load_cursor(&mut self) -> Result<u16, SolError> {
        let mut bytes = [0u8; 2];
        self.store.read_bytes(CURSOR_ADDR, &mut bytes)?;
        let cursor = u16::from_le_bytes(bytes);

        let misaligned =
            cursor < LOG_START || cursor > LOG_END || (cursor - LOG_START) % DataRecord::SIZE as u16 != 0;
        if misaligned {
            warn!("cursor {:#06x} out of range, resetting to log start", cursor);
            self.store_cursor(LOG_START)?;
            return Ok(LOG_START);
        }

        Ok(cursor)
    }

    fn store_cursor(&mut self, cursor: u16) -> Result<(), SolError> {
        self.store.write_bytes(CURSOR_ADDR, &cursor.to_le_bytes())
    }
}

/// Iterator over pending records, oldest first.
pub struct Drain<'a, S> {
    log: &'a mut CircularLog<S>,
    index: u16,
    count: u16,
}

impl<S: ByteStore> Iterator for Drain<'_, S> {
    type Item = Result<DataRecord, SolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let item = self.log.read(self.index);
        self.index += 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn record(n: u32) -> DataRecord {
        DataRecord {
            timestamp: n,
            peak_power_mw: n as f32,
            ..DataRecord::default()
        }
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = MemoryStore::new();
        let mut log = CircularLog::new(&mut store);

        for n in 0..5 {
            log.append(&record(n)).unwrap();
        }

        assert_eq!(log.pending_count().unwrap(), 5);

        let drained: Vec<_> = log.drain().unwrap().map(|r| r.unwrap()).collect();
        let timestamps: Vec<u32> = drained.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_fresh_store_has_no_pending_records() {
        let mut store = MemoryStore::new();
        let mut log = CircularLog::new(&mut store);

        // A fresh EEPROM reads 0xFFFF at the cursor; it must normalize.
        assert_eq!(log.pending_count().unwrap(), 0);
    }

    #[test]
    fn test_wraparound_overwrites_oldest() {
        let mut store = MemoryStore::new();
        let mut log = CircularLog::new(&mut store);

        let capacity = CircularLog::<&mut MemoryStore>::capacity();
        for n in 0..capacity as u32 {
            log.append(&record(n)).unwrap();
        }
        assert_eq!(log.pending_count().unwrap(), capacity);

        // One more than fits: the cursor wraps to the start before the
        // write and the count reflects only records since the wrap.
        log.append(&record(9999)).unwrap();
        assert_eq!(log.pending_count().unwrap(), 1);
        assert_eq!(log.read(0).unwrap().timestamp, 9999);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut store = MemoryStore::new();
        let mut log = CircularLog::new(&mut store);

        log.append(&record(1)).unwrap();
        log.reset().unwrap();
        assert_eq!(log.pending_count().unwrap(), 0);
        log.reset().unwrap();
        assert_eq!(log.pending_count().unwrap(), 0);
    }

    #[test]
    fn test_bus_fault_surfaces_as_storage_fault() {
        let mut store = MemoryStore::with_write_budget(0);
        let mut log = CircularLog::new(&mut store);

        assert_eq!(log.append(&record(1)), Err(SolError::StorageFault));
    }

    #[test]
    fn test_capacity_matches_storage_range() {
        // (0x0FA0 - 0x006F) / 28
        assert_eq!(
            CircularLog::<MemoryStore>::capacity(),
            138,
            "capacity must cover the whole record storage range"
        );
    }
}
