//! Wake-cause plumbing.
//!
//! The touch interrupt does no I/O: its handler only sets a single-slot
//! flag, which the orchestrator drains exactly once at cycle start.

use core::cell::Cell;

use critical_section::Mutex;

/// Why this cycle is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    /// First power-up; retained memory is fresh.
    ColdBoot,
    /// The sleep timer fired.
    Timer,
    /// The external (touch) wake line fired: the operator is asking for
    /// provisioning.
    Provisioning,
}

/// Single-slot provisioning-request flag, safe to set from an interrupt
/// handler.
pub struct ProvisionRequestFlag {
    requested: Mutex<Cell<bool>>,
}

impl ProvisionRequestFlag {
    pub const fn new() -> Self {
        Self {
            requested: Mutex::new(Cell::new(false)),
        }
    }

    /// Called from the interrupt handler. Sets the flag and nothing else.
    pub fn signal(&self) {
        critical_section::with(|cs| self.requested.borrow(cs).set(true));
    }

    /// Drains the flag; returns whether a request was pending.
    pub fn take(&self) -> bool {
        critical_section::with(|cs| self.requested.borrow(cs).replace(false))
    }
}

impl Default for ProvisionRequestFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves the effective wake cause for this cycle: a pending
/// provisioning request overrides whatever the sleep controller reports.
pub fn resolve(flag: &ProvisionRequestFlag, hardware_cause: WakeCause) -> WakeCause {
    if flag.take() {
        WakeCause::Provisioning
    } else {
        hardware_cause
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_drained_on_take() {
        let flag = ProvisionRequestFlag::new();

        flag.signal();
        assert!(flag.take());
        assert!(!flag.take(), "take must drain the flag");
    }

    #[test]
    fn test_pending_request_overrides_timer_cause() {
        let flag = ProvisionRequestFlag::new();

        flag.signal();
        assert_eq!(resolve(&flag, WakeCause::Timer), WakeCause::Provisioning);
        assert_eq!(resolve(&flag, WakeCause::Timer), WakeCause::Timer);
    }
}
