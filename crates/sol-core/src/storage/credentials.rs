//! Persisted network credentials.
//!
//! The availability flag is written last: a partially written credential
//! pair must never be observed as available. A crash between the byte
//! writes and the flag write leaves the store reporting "no credentials".

use heapless::Vec;
use log::{debug, info};

use crate::error::SolError;
use crate::hardware::ByteStore;
use crate::storage::{
    CREDENTIALS_AVAILABLE_ADDR, MAX_CREDENTIAL_LEN, PASSWORD_LENGTH_ADDR, PASSWORD_START_ADDR,
    SSID_LENGTH_ADDR, SSID_START_ADDR,
};

/// An SSID/password pair, each at most 64 bytes.
///
/// Longer inputs are truncated at construction; an empty SSID is accepted
/// (no validation against the network actually existing).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: Vec<u8, MAX_CREDENTIAL_LEN>,
    pub password: Vec<u8, MAX_CREDENTIAL_LEN>,
}

impl Credentials {
    pub fn new(ssid: &[u8], password: &[u8]) -> Self {
        let mut result = Self::default();
        result
            .ssid
            .extend_from_slice(&ssid[..ssid.len().min(MAX_CREDENTIAL_LEN)])
            .ok();
        result
            .password
            .extend_from_slice(&password[..password.len().min(MAX_CREDENTIAL_LEN)])
            .ok();
        result
    }

    /// SSID as text, if it is valid UTF-8.
    pub fn ssid_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.ssid).ok()
    }
}

/// Credential persistence view over a byte store.
pub struct CredentialStore<S> {
    store: S,
}

impl<S: ByteStore> CredentialStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// True iff a complete pair has been persisted (reads only the flag).
    pub fn has_credentials(&mut self) -> Result<bool, SolError> {
        Ok(self.store.read_byte(CREDENTIALS_AVAILABLE_ADDR)? == 1)
    }

    /// Persists a credential pair: lengths, then bytes, then the
    /// availability flag, strictly in that order.
    pub fn save(&mut self, credentials: &Credentials) -> Result<(), SolError> {
        self.store
            .write_byte(SSID_LENGTH_ADDR, credentials.ssid.len() as u8)?;
        self.store
            .write_byte(PASSWORD_LENGTH_ADDR, credentials.password.len() as u8)?;

        self.store.write_bytes(SSID_START_ADDR, &credentials.ssid)?;
        self.store
            .write_bytes(PASSWORD_START_ADDR, &credentials.password)?;

        // Flag goes last; everything above must already be durable.
        self.store.write_byte(CREDENTIALS_AVAILABLE_ADDR, 1)?;

        info!("credentials persisted ({} byte ssid)", credentials.ssid.len());
        Ok(())
    }

    /// Loads the persisted pair, or `None` when the flag is unset.
    pub fn load(&mut self) -> Result<Option<Credentials>, SolError> {
        if !self.has_credentials()? {
            debug!("no credentials available");
            return Ok(None);
        }

        // Guard against lengths beyond the region size.
        let ssid_len = (self.store.read_byte(SSID_LENGTH_ADDR)? as usize).min(MAX_CREDENTIAL_LEN);
        let password_len =
            (self.store.read_byte(PASSWORD_LENGTH_ADDR)? as usize).min(MAX_CREDENTIAL_LEN);

        let mut credentials = Credentials::default();
        for i in 0..ssid_len {
            let byte = self.store.read_byte(SSID_START_ADDR + i as u16)?;
            credentials.ssid.push(byte).ok();
        }
        for i in 0..password_len {
            let byte = self.store.read_byte(PASSWORD_START_ADDR + i as u16)?;
            credentials.password.push(byte).ok();
        }

        Ok(Some(credentials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_round_trip() {
        let mut store = MemoryStore::new();
        let mut creds = CredentialStore::new(&mut store);

        let pair = Credentials::new(b"MyNet", b"secret123");
        creds.save(&pair).unwrap();

        assert!(creds.has_credentials().unwrap());
        let loaded = creds.load().unwrap().expect("credentials must be present");
        assert_eq!(loaded, pair);
        assert_eq!(loaded.ssid_str(), Some("MyNet"));
    }

    #[test]
    fn test_fresh_store_reports_unavailable() {
        let mut store = MemoryStore::new();
        let mut creds = CredentialStore::new(&mut store);

        assert!(!creds.has_credentials().unwrap());
        assert_eq!(creds.load().unwrap(), None);
    }

    #[test]
    fn test_over_long_inputs_are_truncated() {
        let long = [b'x'; 100];
        let pair = Credentials::new(&long, &long);
        assert_eq!(pair.ssid.len(), 64);
        assert_eq!(pair.password.len(), 64);

        let mut store = MemoryStore::new();
        let mut creds = CredentialStore::new(&mut store);
        creds.save(&pair).unwrap();

        let loaded = creds.load().unwrap().unwrap();
        assert_eq!(loaded.ssid.len(), 64);
        assert_eq!(loaded.password.len(), 64);
    }

    #[test]
    fn test_empty_ssid_is_accepted() {
        let mut store = MemoryStore::new();
        let mut creds = CredentialStore::new(&mut store);

        creds.save(&Credentials::new(b"", b"pw")).unwrap();
        let loaded = creds.load().unwrap().unwrap();
        assert!(loaded.ssid.is_empty());
        assert_eq!(&loaded.password[..], b"pw");
    }

    #[test]
    fn test_crash_before_flag_leaves_credentials_unavailable() {
        // The save sequence is lengths, bytes, flag. Budget every write
        // except the final flag write, simulating power loss just before
        // the pair becomes visible.
        let pair = Credentials::new(b"MyNet", b"secret123");
        let writes_before_flag = 2 + pair.ssid.len() + pair.password.len();

        let mut store = MemoryStore::with_write_budget(writes_before_flag);
        let mut creds = CredentialStore::new(&mut store);

        assert_eq!(creds.save(&pair), Err(SolError::StorageFault));
        assert!(
            !creds.has_credentials().unwrap(),
            "a partially written credential must never be observed as available"
        );
    }
}
