//! Provides [`reset_to_firmware`] which reboots into firmware setup.

use uefi::{
    Status, cstr16,
    runtime::{self, ResetType, VariableAttributes, VariableVendor},
};

use crate::{
    BootResult,
    system::variable::{get_u64, set_u64},
};

/// The bit that indicates to the firmware if booting into firmware setup should be done.
const EFI_OS_INDICATIONS_BOOT_TO_FW_UI: u64 = 1;

/// Reboots into firmware setup using the `OsIndications` variable.
///
/// Gets the `OsIndications` variable (absent counts as zero), sets the
/// [`EFI_OS_INDICATIONS_BOOT_TO_FW_UI`] bit, writes it back, then issues a cold reset.
///
/// # Errors
///
/// May return an `Error` if the variable could not be written, in which case no reset is issued
/// and control stays with the menu. On success this never returns.
pub fn reset_to_firmware() -> BootResult<()> {
    let mut osind = get_u64(cstr16!("OsIndications"), &VariableVendor::GLOBAL_VARIABLE)?;
    osind |= EFI_OS_INDICATIONS_BOOT_TO_FW_UI;
    set_u64(
        cstr16!("OsIndications"),
        &VariableVendor::GLOBAL_VARIABLE,
        VariableAttributes::NON_VOLATILE
            | VariableAttributes::BOOTSERVICE_ACCESS
            | VariableAttributes::RUNTIME_ACCESS,
        osind,
    )?;
    runtime::reset(ResetType::COLD, Status::SUCCESS, None)
}
