//! Error types shared across the control core.

use thiserror_no_std::Error;

/// Errors surfaced by the control core.
///
/// Every variant is recoverable at the orchestrator level: the failure is
/// logged and the cycle still proceeds to the sleep transition. None of
/// them halts the process.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolError {
    /// Bus-level read or write against the non-volatile store failed.
    #[error("storage bus fault")]
    StorageFault,

    /// A network connect or listen exceeded its deadline.
    #[error("connection timed out")]
    ConnectionTimeout,

    /// An upload started but not every pending record was sent.
    ///
    /// The remaining records stay in the log; nothing is partially
    /// discarded.
    #[error("transfer incomplete: {sent} of {pending} records sent")]
    TransferIncomplete { sent: u16, pending: u16 },

    /// A provisioning request ended without both credential tokens.
    #[error("malformed credential request")]
    MalformedCredentialRequest,
}
