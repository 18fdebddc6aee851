//! Batch upload of pending records over an established connection.

use log::{debug, trace};

use crate::error::SolError;
use crate::hardware::{ByteStore, NetworkInterface};
use crate::storage::CircularLog;

/// Worst-case postcard frame for one record: two varint u32s (5 bytes
/// each) and five fixed 4-byte floats.
const FRAME_CAPACITY: usize = 30;

/// Sends every pending record, oldest first, one postcard frame each.
///
/// The device identity is stamped at upload time, so records captured
/// before an identity change still carry the current identity. Any send
/// failure mid-batch surfaces as [`SolError::TransferIncomplete`]; the
/// caller must leave the log unreset so nothing is partially discarded.
pub fn upload_pending<S, N>(store: &mut S, net: &mut N, device_id: u32) -> Result<u16, SolError>
where
    S: ByteStore,
    N: NetworkInterface,
{
    let mut log = CircularLog::new(&mut *store);
    let pending = log.pending_count()?;
    debug!("uploading {} pending records", pending);

    let mut sent = 0u16;
    for item in log.drain()? {
        let mut record = item?;
        record.device_id = device_id;

        let mut frame = [0u8; FRAME_CAPACITY];
        let frame = postcard::to_slice(&record, &mut frame)
            .map_err(|_| SolError::TransferIncomplete { sent, pending })?;

        net.send(frame)
            .map_err(|_| SolError::TransferIncomplete { sent, pending })?;
        sent += 1;

        // The response contents are ignored; we only give the server its
        // byte-wait window.
        let mut ack = [0u8; 32];
        match net.receive(&mut ack) {
            Ok(n) => trace!("record {} acked with {} bytes", sent, n),
            Err(_) => trace!("record {} sent, no ack", sent),
        }
    }

    Ok(sent)
}
