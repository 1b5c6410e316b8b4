//! The main application logic.
//!
//! This is where the menu loop lives: discovery results in, one dispatched action at a time out.
//! Every callback failure is reported on screen, held for a second, and then the menu resumes.

use alloc::{format, string::String, vec::Vec};
use log::error;
use uefi::{
    boot::{self, ScopedProtocol},
    proto::console::text::Input,
};

use crate::{
    BootResult,
    boot::{
        BootMenu,
        action::{BootAction, firmware::reset_to_firmware},
        loader::{load_boot_option, start_boot_option},
    },
    device_path::guid_text,
    loader::{Loader, LoaderBuilder},
    scan::linux::root_options,
    system::helper::locate_protocol,
    ui::{Menu, show_text},
};

/// How long an error message stays on screen before the menu resumes.
const ERROR_DELAY: usize = 1_000_000; // 1 second

/// The menu loop and its inputs.
pub struct App {
    /// The discovered entries and the partition root map.
    boot_menu: BootMenu,

    /// The [`Input`] of the console.
    input: ScopedProtocol<Input>,
}

impl App {
    /// Runs discovery and initializes the state of the [`App`].
    ///
    /// # Errors
    ///
    /// May return an `Error` if discovery failed outright, or there is no [`Handle`] supporting
    /// [`Input`].
    ///
    /// [`Handle`]: uefi::Handle
    pub fn new() -> BootResult<Self> {
        let boot_menu = BootMenu::new()?;
        let input = locate_protocol::<Input>()?;

        Ok(Self { boot_menu, input })
    }

    /// Provides the main loop for the [`App`].
    ///
    /// Runs the menu, dispatches the chosen entry, and resumes the menu after any callback that
    /// returns. Only the `Exit` entry leaves the loop.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the menu itself cannot be built or drawn. Callback errors are
    /// reported and do not end the loop.
    pub fn run(&mut self) -> BootResult<()> {
        let mut menu = Menu::new(self.boot_menu.list().iter().map(|x| x.title.as_str()))?;

        loop {
            let selected = menu.run(&mut self.input)?;

            let result = match self.boot_menu.list()[selected].action {
                BootAction::Exit => return Ok(()),
                BootAction::BootEfi => self.boot(selected),
                BootAction::PickRoot => self.pick_root(selected),
                BootAction::RebootFirmware => reset_to_firmware(),
                BootAction::PrintRoots => self.print_roots(),
            };

            if let Err(e) = result {
                error!("{e}");
                boot::stall(ERROR_DELAY); // hold the message so the error is visible
            }
        }
    }

    /// Chain-loads one entry and starts it. An image that returns resumes the menu.
    fn boot(&mut self, selected: usize) -> BootResult<()> {
        let image = self.boot_menu.load(selected)?;
        start_boot_option(image)
    }

    /// Opens the root-partition submenu for a kernel discovered without a `.conf` sidecar.
    ///
    /// Each row is one entry of the root map; choosing one chain-loads the kernel with
    /// synthesized `root=PARTUUID=` options. The tail `Back` row returns to the main menu.
    fn pick_root(&mut self, selected: usize) -> BootResult<()> {
        let kernel = &self.boot_menu.list()[selected];
        let sub_loaders = root_choices(kernel, &self.boot_menu.roots);

        let mut submenu = Menu::new(sub_loaders.iter().map(|x| x.title.as_str()))?;
        let choice = submenu.run(&mut self.input)?;

        match sub_loaders[choice].action {
            BootAction::Exit => Ok(()), // back to the main menu
            _ => {
                let image = load_boot_option(&sub_loaders[choice])?;
                start_boot_option(image)
            }
        }
    }

    /// Shows the partition root map until a key is pressed.
    fn print_roots(&mut self) -> BootResult<()> {
        let lines: Vec<String> = self
            .boot_menu
            .roots
            .iter()
            .map(|(guid, name)| format!("{}  {name}", guid_text(guid)))
            .collect();
        show_text(&lines, &mut self.input)
    }
}

/// Builds the submenu rows for one kernel: one per known root partition, then `Back`.
fn root_choices(kernel: &Loader, roots: &crate::gpt::RootMap) -> Vec<Loader> {
    let initrd = kernel.initrd.as_deref().unwrap_or_default();

    let mut sub_loaders: Vec<Loader> = roots
        .iter()
        .map(|(guid, name)| {
            let guid_text = guid_text(guid);
            let mut builder = LoaderBuilder::new(format!("{name}: {guid_text}"))
                .options(root_options(&guid_text, initrd));
            if let Some(efi_path) = &kernel.efi_path {
                builder = builder.efi_path(efi_path);
            }
            if let Some(fs_handle) = kernel.fs_handle {
                builder = builder.fs_handle(fs_handle);
            }
            builder.build()
        })
        .collect();

    sub_loaders.push(
        LoaderBuilder::new("Back")
            .action(BootAction::Exit)
            .build(),
    );
    sub_loaders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpt::RootMap;
    use uefi::guid;

    #[test]
    fn test_root_choices_rows() {
        let mut roots = RootMap::new();
        roots.insert(
            guid!("11111111-1111-1111-1111-111111111111"),
            String::from("root"),
        );

        let kernel = LoaderBuilder::new("ESP: vmlinuz-6.1")
            .efi_path("vmlinuz-6.1")
            .initrd("initramfs-6.1.img")
            .action(BootAction::PickRoot)
            .build();

        let choices = root_choices(&kernel, &roots);
        assert_eq!(choices.len(), 2); // one root, one Back row

        assert_eq!(choices[0].title, "root: 11111111-1111-1111-1111-111111111111");
        assert_eq!(
            choices[0].options.as_deref(),
            Some(
                "ro root=PARTUUID=11111111-1111-1111-1111-111111111111 initrd=initramfs-6.1.img"
            )
        );
        assert_eq!(choices[0].efi_path.as_deref(), Some("vmlinuz-6.1"));
        assert_eq!(choices[0].action, BootAction::BootEfi);

        assert_eq!(choices[1].title, "Back");
        assert_eq!(choices[1].action, BootAction::Exit);
    }

    #[test]
    fn test_root_choices_empty_map_still_has_back() {
        let kernel = LoaderBuilder::new("ESP: vmlinuz")
            .efi_path("vmlinuz")
            .initrd("init.img")
            .action(BootAction::PickRoot)
            .build();

        let choices = root_choices(&kernel, &RootMap::new());
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].action, BootAction::Exit);
    }
}
