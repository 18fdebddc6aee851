//! Credential provisioning over a local listening endpoint.
//!
//! The machine accepts one operator connection at a time and scans the
//! HTTP-style request byte-by-byte for `SSID=` and `PASSWORD=` tokens with
//! `&`-terminated values. Clients are handled strictly sequentially, so
//! two captures can never interleave in the store. Once both values are
//! terminated the pair is persisted (lengths, bytes, flag last) and the
//! machine completes.

use embassy_time::Duration;
use embedded_io::{Read, Write};
use heapless::Vec;
use log::{info, warn};

use crate::error::SolError;
use crate::hardware::{ByteStore, Monotonic, NetworkInterface};
use crate::storage::{CredentialStore, Credentials, MAX_CREDENTIAL_LEN};

/// Longest request line the token scanner keeps in memory.
const LINE_CAPACITY: usize = 128;

/// Form page returned to the operator once capture completes (and to
/// plain GETs that carry no tokens).
const FORM_RESPONSE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
<html><body><form action='' method='GET'>Please provide your WiFi SSID and password: <br>\
SSID:<input type='text' name='SSID' placeholder='SSID (network name)'><br>\
Password:<input type='password' name='PASSWORD' placeholder='password'><br>\
<input type='submit' name='SUBMIT' value='Submit'></form></body></html>\r\n";

/// Provisioning capture states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningState {
    Idle,
    Listening,
    CapturingSsid,
    CapturingPassword,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenState {
    Searching,
    Capturing,
    Done,
}

/// Incremental scanner for one credential request.
struct CaptureParser {
    line: Vec<u8, LINE_CAPACITY>,
    ssid: Vec<u8, MAX_CREDENTIAL_LEN>,
    ssid_state: TokenState,
    password: Vec<u8, MAX_CREDENTIAL_LEN>,
    password_state: TokenState,
    headers_ended: bool,
}

impl CaptureParser {
    fn new() -> Self {
        Self {
            line: Vec::new(),
            ssid: Vec::new(),
            ssid_state: TokenState::Searching,
            password: Vec::new(),
            password_state: TokenState::Searching,
            headers_ended: false,
        }
    }

    fn push(&mut self, byte: u8) {
        if byte == b'\n' {
            // Two newlines in a row end the request headers.
            if self.line.is_empty() {
                self.headers_ended = true;
            }
            self.line.clear();
            return;
        }
        if byte == b'\r' {
            return;
        }

        // Value assembly happens before token detection so the '=' of the
        // token itself is never captured.
        if self.ssid_state == TokenState::Capturing {
            if byte == b'&' {
                self.ssid_state = TokenState::Done;
            } else {
                // Over-long values silently truncate at 64 bytes.
                self.ssid.push(byte).ok();
            }
        }
        if self.password_state == TokenState::Capturing {
            if byte == b'&' {
                self.password_state = TokenState::Done;
            } else {
                self.password.push(byte).ok();
            }
        }

        if self.line.push(byte).is_err() {
            // Token boundaries never straddle a line this long; start over.
            self.line.clear();
            self.line.push(byte).ok();
        }

        if self.ssid_state == TokenState::Searching && self.line.ends_with(b"SSID=") {
            self.ssid_state = TokenState::Capturing;
        }
        if self.password_state == TokenState::Searching && self.line.ends_with(b"PASSWORD=") {
            self.password_state = TokenState::Capturing;
        }
    }

    fn is_complete(&self) -> bool {
        self.ssid_state == TokenState::Done && self.password_state == TokenState::Done
    }

    fn into_credentials(self) -> Credentials {
        Credentials {
            ssid: self.ssid,
            password: self.password,
        }
    }
}

/// The provisioning state machine.
///
/// Only one capture may be in flight; [`ProvisioningMachine::run`] handles
/// clients one at a time until a capture completes or the window elapses.
pub struct ProvisioningMachine {
    state: ProvisioningState,
}

impl ProvisioningMachine {
    pub fn new() -> Self {
        Self {
            state: ProvisioningState::Idle,
        }
    }

    pub fn state(&self) -> ProvisioningState {
        self.state
    }

    /// Listens for operator connections until a credential pair is
    /// captured and persisted, or `timeout` elapses.
    ///
    /// On timeout nothing has been persisted and the machine is back in
    /// [`ProvisioningState::Idle`].
    pub fn run<N, S, M>(
        &mut self,
        net: &mut N,
        store: &mut S,
        clock: &mut M,
        timeout: Duration,
    ) -> Result<Credentials, SolError>
    where
        N: NetworkInterface,
        S: ByteStore,
        M: Monotonic,
    {
        self.state = ProvisioningState::Listening;
        let deadline = clock.now() + timeout;

        loop {
            let now = clock.now();
            if now >= deadline {
                self.state = ProvisioningState::Idle;
                return Err(SolError::ConnectionTimeout);
            }

            let Some(mut conn) = net.listen_and_accept(deadline - now)? else {
                self.state = ProvisioningState::Idle;
                return Err(SolError::ConnectionTimeout);
            };

            match self.capture_from(&mut conn, store) {
                Ok(credentials) => {
                    self.state = ProvisioningState::Complete;
                    info!("provisioning complete");
                    return Ok(credentials);
                }
                Err(e) => {
                    // This client failed; keep listening for another.
                    warn!("provisioning client rejected: {}", e);
                    self.state = ProvisioningState::Listening;
                }
            }
        }
    }

    /// Reads one client connection to completion, persisting the captured
    /// pair if both tokens terminate.
    fn capture_from<C, S>(&mut self, conn: &mut C, store: &mut S) -> Result<Credentials, SolError>
    where
        C: Read + Write,
        S: ByteStore,
    {
        let mut parser = CaptureParser::new();
        let mut buf = [0u8; 64];

        self.state = ProvisioningState::CapturingSsid;
        'read: loop {
            let n = match conn.read(&mut buf) {
                Ok(0) => break 'read,
                Ok(n) => n,
                // Client gone; whatever we have is all we get.
                Err(_) => break 'read,
            };

            for &byte in &buf[..n] {
                parser.push(byte);

                if parser.ssid_state == TokenState::Done {
                    self.state = ProvisioningState::CapturingPassword;
                }
                if parser.is_complete() {
                    break 'read;
                }
                if parser.headers_ended {
                    // A request with no tokens: serve the form so the
                    // operator's browser has something to submit.
                    break 'read;
                }
            }
        }

        if !parser.is_complete() {
            conn.write_all(FORM_RESPONSE.as_bytes()).ok();
            return Err(SolError::MalformedCredentialRequest);
        }

        let credentials = parser.into_credentials();
        store_completed(&credentials, store)?;
        conn.write_all(FORM_RESPONSE.as_bytes()).ok();
        Ok(credentials)
    }
}

impl Default for ProvisioningMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Persists an already-completed credential pair.
///
/// This is the shared persistence step for both provisioning flavors: the
/// listening capture above and an external interactive-configuration
/// collaborator (captive portal) that hands over a finished pair.
pub fn store_completed<S: ByteStore>(
    credentials: &Credentials,
    store: &mut S,
) -> Result<(), SolError> {
    CredentialStore::new(store).save(credentials)
}
