use anyhow::anyhow;
use uefi::{
    CStr16, cstr16, guid, println,
    runtime::{VariableAttributes, VariableVendor},
};
use zbl_rs::system::variable::{get_u64, set_u64};

/// A vendor namespace owned by this test binary, so nothing of the firmware's is touched.
const TEST_VENDOR: VariableVendor = VariableVendor(guid!("7d95d891-ec0d-4c52-95f6-238947c54f29"));

const VARIABLE_NAME: &CStr16 = cstr16!("ZblTestVariable");
const VARIABLE_CONTENT: u64 = 23;

/// Tests a set/get round trip in a private vendor namespace.
pub fn test_variables() -> anyhow::Result<()> {
    set_u64(
        VARIABLE_NAME,
        &TEST_VENDOR,
        VariableAttributes::BOOTSERVICE_ACCESS,
        VARIABLE_CONTENT,
    )
    .map_err(|e| anyhow!("{e}"))?;
    println!("Set value of {VARIABLE_NAME} to {VARIABLE_CONTENT}");

    let read_back = get_u64(VARIABLE_NAME, &TEST_VENDOR).map_err(|e| anyhow!("{e}"))?;
    assert_eq!(read_back, VARIABLE_CONTENT);

    let missing = get_u64(cstr16!("ZblNeverWritten"), &TEST_VENDOR).map_err(|e| anyhow!("{e}"))?;
    assert_eq!(missing, 0); // absent variables read as zero

    Ok(())
}
