//! Persistent storage over the byte-addressable EEPROM.
//!
//! The address map below is the on-device format of already-deployed
//! nodes and must stay byte-for-byte compatible: availability flag first,
//! then the SSID and password regions, their length bytes, the two-byte
//! write cursor, and finally the record storage range filling the rest of
//! the 32 kbit part.

pub mod credentials;
pub mod eeprom;
pub mod mem;
pub mod record;
pub mod ring_log;

pub use credentials::{CredentialStore, Credentials};
pub use eeprom::I2cEeprom;
pub use mem::MemoryStore;
pub use record::DataRecord;
pub use ring_log::CircularLog;

/// Flag byte: 1 when a complete credential pair has been persisted.
pub const CREDENTIALS_AVAILABLE_ADDR: u16 = 0x0000;
/// Start of the SSID byte region (up to 64 bytes).
pub const SSID_START_ADDR: u16 = 0x0001;
/// Start of the password byte region (up to 64 bytes).
pub const PASSWORD_START_ADDR: u16 = 0x0042;
/// SSID length byte.
pub const SSID_LENGTH_ADDR: u16 = 0x006B;
/// Password length byte.
pub const PASSWORD_LENGTH_ADDR: u16 = 0x006C;
/// Write cursor, u16 little-endian (also occupies 0x006E).
pub const CURSOR_ADDR: u16 = 0x006D;
/// First address of the record storage range.
pub const LOG_START: u16 = 0x006F;
/// One past the last usable record storage address.
pub const LOG_END: u16 = 0x0FA0;

/// Maximum persisted length of an SSID or password.
pub const MAX_CREDENTIAL_LEN: usize = 64;
