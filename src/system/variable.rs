// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! UEFI variable storage helpers.
//!
//! The only variable this program touches is the 64 bit `OsIndications` global, so the helpers
//! are fixed to that width rather than generic over every integer.

use uefi::{
    CStr16, Status,
    runtime::{self, VariableAttributes, VariableVendor},
};

use crate::{BootResult, error::BootError};

/// Gets a 64 bit UEFI variable given its name and vendor namespace.
///
/// If the variable was not found, a default value of `0` is returned. A variable that has never
/// been written and a variable holding zero ask for the same treatment everywhere this is used.
///
/// # Errors
///
/// May return an `Error` for many reasons, see [`runtime::get_variable`]
pub fn get_u64(name: &CStr16, vendor: &VariableVendor) -> BootResult<u64> {
    let mut buf = [0; size_of::<u64>()];
    match runtime::get_variable(name, vendor, &mut buf) {
        Ok((var, _)) => {
            let mut array = [0; size_of::<u64>()];
            let len = var.len().min(array.len());
            array[..len].copy_from_slice(&var[..len]);
            Ok(u64::from_le_bytes(array))
        }
        Err(e) if e.status() == Status::NOT_FOUND => Ok(0), // pretend that we got all zeroes if its not found
        Err(e) => Err(BootError::Uefi(e.to_err_without_payload())),
    }
}

/// Sets a 64 bit UEFI variable given its name, vendor namespace, and attributes.
///
/// # Errors
///
/// May return an `Error` for many reasons, see [`runtime::set_variable`]
pub fn set_u64(
    name: &CStr16,
    vendor: &VariableVendor,
    attrs: VariableAttributes,
    value: u64,
) -> BootResult<()> {
    Ok(runtime::set_variable(
        name,
        vendor,
        attrs,
        &value.to_le_bytes(),
    )?)
}
