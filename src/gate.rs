//! Admission gate bounding concurrent predict calls.
//!
//! A fixed-capacity counting semaphore: `acquire` blocks while all permits
//! are held and hands back an RAII [`GatePermit`] that returns its permit
//! on drop, so release happens on every exit path including panics and
//! early error returns. The gate bounds *concurrent in-flight calls*, not
//! total throughput; queueing order is whatever the platform Condvar
//! provides.

use std::sync::{Condvar, Mutex};

/// Counting semaphore with a fixed capacity set at construction.
pub struct AdmissionGate {
    permits: Mutex<usize>,
    available: Condvar,
}

impl AdmissionGate {
    /// Gate admitting up to `capacity` concurrent holders.
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Mutex::new(capacity),
            available: Condvar::new(),
        }
    }

    /// Take one permit, blocking until one is free.
    pub fn acquire(&self) -> GatePermit<'_> {
        let mut permits = self.permits.lock().unwrap_or_else(|e| e.into_inner());
        while *permits == 0 {
            permits = self
                .available
                .wait(permits)
                .unwrap_or_else(|e| e.into_inner());
        }
        *permits -= 1;
        GatePermit { gate: self }
    }

    /// Permits currently free. Snapshot only; stale by the time it returns.
    pub fn available_permits(&self) -> usize {
        *self.permits.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn release(&self) {
        let mut permits = self.permits.lock().unwrap_or_else(|e| e.into_inner());
        *permits += 1;
        self.available.notify_one();
    }
}

/// RAII guard for one admission permit.
pub struct GatePermit<'a> {
    gate: &'a AdmissionGate,
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}
