//! Various helper functions for other modules.

use smallvec::SmallVec;
use thiserror::Error;
use uefi::{
    CStr16, CString16, Handle,
    boot::{self, ScopedProtocol},
    proto::ProtocolPointer,
};

/// The max length of a path in UEFI.
const MAX_PATH: usize = 256;

/// An `Error` that may result from converting a [`alloc::string::String`] to another format.
#[derive(Error, Debug)]
pub enum StrError {
    /// A string could not be converted into a [`CString16`]
    #[error("Could not convert String to CString16")]
    CstrFromStr(#[from] uefi::data_types::FromStrError),

    /// A slice of UTF-16 code units could not be converted into a [`CString16`], due to an
    /// invalid character or a missing nul terminator.
    #[error("Could not convert a u16 slice to a CString16")]
    FromSliceWithNul(#[from] uefi::data_types::FromSliceWithNulError),
}

/// Gets a [`CString16`] from an [`&str`].
///
/// # Errors
///
/// May return an `Error` if the string could not be converted into a [`CString16`], either due to
/// unsupported characters or an interior nul character.
pub fn str_to_cstr(str: &str) -> Result<CString16, StrError> {
    Ok(CString16::try_from(str)?)
}

/// Gets a [`CString16`] path given a prefix and a filename.
///
/// # Errors
///
/// May return an `Error` if the finalized string could not be converted into a [`CString16`].
/// This should be impossible because of the fact that validation is already done through the
/// parameters being [`CStr16`].
pub fn get_path_cstr(prefix: &CStr16, filename: &CStr16) -> Result<CString16, StrError> {
    let mut path_buf: SmallVec<[_; MAX_PATH]> =
        SmallVec::with_capacity(prefix.as_slice().len() + 1 + filename.as_slice().len());

    path_buf.extend_from_slice(prefix.to_u16_slice());
    path_buf.push(u16::from(b'\\'));
    path_buf.extend_from_slice(filename.to_u16_slice_with_nul());

    Ok(CStr16::from_u16_with_nul(&path_buf)?.into())
}

/// Opens a protocol exclusively on the first handle that supports it.
///
/// # Errors
///
/// May return an `Error` if no handle supports the protocol, or the protocol could not be opened.
pub fn locate_protocol<P: ProtocolPointer + ?Sized>() -> crate::BootResult<ScopedProtocol<P>> {
    let handle = boot::get_handle_for_protocol::<P>()?;
    Ok(boot::open_protocol_exclusive::<P>(handle)?)
}

/// Gets the device handle this image was loaded from.
///
/// # Errors
///
/// May return an `Error` if the image handle does not support
/// [`uefi::proto::loaded_image::LoadedImage`], or the image was not loaded from a device (for
/// example, when it was loaded over the network).
pub fn image_device_handle() -> crate::BootResult<Handle> {
    let loaded_image = boot::open_protocol_exclusive::<uefi::proto::loaded_image::LoadedImage>(
        boot::image_handle(),
    )?;
    loaded_image
        .device()
        .ok_or_else(|| uefi::Error::from(uefi::Status::NOT_FOUND).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{borrow::ToOwned, string::String};
    use uefi::cstr16;

    #[test]
    fn test_str_to_cstr() -> Result<(), StrError> {
        let cstr = str_to_cstr("foo bar")?;
        let str = String::from(&cstr);
        assert_eq!(str, "foo bar".to_owned());
        Ok(())
    }

    #[test]
    fn test_get_path_cstr() -> Result<(), StrError> {
        const PREFIX: &CStr16 = cstr16!("\\root");
        const FILE: &CStr16 = cstr16!("somefilename");
        let path = get_path_cstr(PREFIX, FILE)?;
        let str = String::from(&path);
        assert_eq!(str, "\\root\\somefilename".to_owned());
        Ok(())
    }
}
