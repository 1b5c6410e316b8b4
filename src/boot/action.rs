//! Provides [`BootAction`], which decides what dispatch does with a selected entry.

use alloc::vec::Vec;

use crate::loader::{Loader, LoaderBuilder};

pub mod firmware;
pub mod shutdown;

/// What selecting a menu entry does.
///
/// Dispatch over this enum is a closed match in the application loop; entries carry their data
/// in the [`Loader`] record itself.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BootAction {
    /// Chain-load the entry's image with its recorded options.
    #[default]
    BootEfi,

    /// Open a submenu of root partitions for a kernel found without a `.conf` sidecar, then
    /// chain-load with synthesized `root=PARTUUID=` options.
    PickRoot,

    /// Reboot the system into firmware setup.
    RebootFirmware,

    /// Print the partition root map, for checking what discovery saw.
    PrintRoots,

    /// Leave the menu and return to the firmware.
    Exit,
}

/// Appends the fixed entries to the tail of the boot list.
pub fn add_special_entries(loaders: &mut Vec<Loader>) {
    let actions = [
        ("Reboot into firmware", BootAction::RebootFirmware),
        ("Exit", BootAction::Exit),
        ("Print roots", BootAction::PrintRoots),
    ];

    for (title, action) in actions {
        loaders.push(LoaderBuilder::new(title).action(action).build());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_entries_at_tail() {
        let mut loaders = Vec::new();
        add_special_entries(&mut loaders);

        let actions: Vec<BootAction> = loaders.iter().map(|x| x.action).collect();
        assert_eq!(
            actions,
            [
                BootAction::RebootFirmware,
                BootAction::Exit,
                BootAction::PrintRoots,
            ]
        );
    }
}
