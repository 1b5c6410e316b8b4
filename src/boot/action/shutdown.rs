//! Provides [`shutdown`] which powers the system off.
//!
//! This is what Escape at the menu does.

use uefi::{
    Status,
    runtime::{self, ResetType},
};

/// Powers the system off with a success status.
pub fn shutdown() -> ! {
    runtime::reset(ResetType::SHUTDOWN, Status::SUCCESS, None) // never returns and cannot fail
}
