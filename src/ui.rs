//! The full-screen text menu.
//!
//! Entries render centered on screen, the highlighted row with inverted attributes. Up and down
//! wrap around, Enter yields the highlighted entry to the caller, and Escape powers the machine
//! off. The screen is redrawn after every handled key.

use alloc::{string::String, vec::Vec};
use thiserror::Error;
use uefi::{
    CString16, boot,
    proto::console::text::{Color, Input, Key, Output, ScanCode},
    system::with_stdout,
};

use crate::{
    BootResult, boot::action::shutdown::shutdown, error::BootError, system::helper::str_to_cstr,
};

/// The base colors of the menu.
const FG: Color = Color::White;
const BG: Color = Color::Black;

/// The colors of the highlighted row.
const HIGHLIGHT_FG: Color = Color::Black;
const HIGHLIGHT_BG: Color = Color::LightGray;

/// The console resolution assumed when the output mode cannot be queried.
const FALLBACK_RESOLUTION: (usize, usize) = (80, 25);

/// An `Error` that may result from running the menu.
#[derive(Error, Debug)]
pub enum MenuError {
    /// The [`Input`] protocol was closed for any reason.
    #[error("Keyboard Input protocol was closed")]
    InputClosed,

    /// The menu was created with nothing to show.
    #[error("No menu entries found")]
    NoEntries,
}

/// A full-screen menu over a fixed set of rows.
pub struct Menu {
    /// The rendered text of every row.
    items: Vec<CString16>,

    /// The currently highlighted row. Always in bounds.
    highlighted: usize,
}

impl Menu {
    /// Creates a new [`Menu`] from row descriptions.
    ///
    /// # Errors
    ///
    /// May return an `Error` if there are no rows, or a description cannot be represented on
    /// the UEFI console.
    pub fn new<'a>(descriptions: impl Iterator<Item = &'a str>) -> BootResult<Self> {
        let items = descriptions
            .map(str_to_cstr)
            .collect::<Result<Vec<_>, _>>()?;
        if items.is_empty() {
            return Err(MenuError::NoEntries.into());
        }
        Ok(Self {
            items,
            highlighted: 0,
        })
    }

    /// Runs the menu until an entry is chosen, returning its index.
    ///
    /// Escape never returns: it powers the machine off.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the screen could not be drawn, or the input protocol failed.
    pub fn run(&mut self, input: &mut Input) -> BootResult<usize> {
        loop {
            self.draw()?;

            let event = input.wait_for_key_event().ok_or(MenuError::InputClosed)?;
            boot::wait_for_event(&mut [event])
                .map_err(|e| BootError::Uefi(e.to_err_without_payload()))?;

            match input.read_key()? {
                Some(Key::Special(ScanCode::UP)) => self.select_previous(),
                Some(Key::Special(ScanCode::DOWN)) => self.select_next(),
                Some(Key::Special(ScanCode::ESCAPE)) => shutdown(),
                Some(Key::Printable(key)) if char::from(key) == '\r' => {
                    return Ok(self.highlighted);
                }
                _ => (),
            }
        }
    }

    /// Clears the screen and renders every row centered, the highlighted one inverted.
    pub fn draw(&self) -> BootResult<()> {
        with_stdout(|stdout| {
            stdout.clear()?;

            let (columns, rows) = resolution(stdout);
            let first_row = (rows / 2).saturating_sub(self.items.len() / 2);

            for (i, item) in self.items.iter().enumerate() {
                let column = (columns / 2).saturating_sub(item.num_chars() / 2);
                let row = (first_row + i).min(rows.saturating_sub(1));
                stdout.set_cursor_position(column, row)?;

                if i == self.highlighted {
                    stdout.set_color(HIGHLIGHT_FG, HIGHLIGHT_BG)?;
                } else {
                    stdout.set_color(FG, BG)?;
                }
                stdout.output_string(item)?;
            }

            stdout.set_color(FG, BG)?;
            Ok(())
        })
    }

    /// Moves the highlight up one row, wrapping to the last row from the first.
    fn select_previous(&mut self) {
        self.highlighted = self
            .highlighted
            .checked_sub(1)
            .unwrap_or(self.items.len() - 1);
    }

    /// Moves the highlight down one row, wrapping to the first row from the last.
    fn select_next(&mut self) {
        self.highlighted = (self.highlighted + 1) % self.items.len();
    }
}

/// The console's current text resolution.
fn resolution(stdout: &Output) -> (usize, usize) {
    match stdout.current_mode() {
        Ok(Some(mode)) => (mode.columns(), mode.rows()),
        _ => FALLBACK_RESOLUTION,
    }
}

/// Prints lines on a cleared screen and waits for any key before returning.
///
/// Used by the root map debugging entry; the caller redraws the menu afterwards.
///
/// # Errors
///
/// May return an `Error` if the screen could not be cleared, or the input protocol failed.
pub fn show_text(lines: &[String], input: &mut Input) -> BootResult<()> {
    with_stdout(|stdout| {
        stdout.clear()?;
        stdout.set_color(FG, BG)?;
        for line in lines {
            if let Ok(line) = str_to_cstr(line) {
                let _ = stdout.output_string(&line);
            }
            let _ = stdout.output_string(uefi::cstr16!("\r\n"));
        }
        let _ = stdout.output_string(uefi::cstr16!("\r\nPress any key to return\r\n"));
        Ok::<(), crate::error::BootError>(())
    })?;

    let event = input.wait_for_key_event().ok_or(MenuError::InputClosed)?;
    boot::wait_for_event(&mut [event])
        .map_err(|e| BootError::Uefi(e.to_err_without_payload()))?;
    let _ = input.read_key()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(n: usize) -> Menu {
        let items: Vec<String> = (0..n).map(|i| alloc::format!("entry {i}")).collect();
        Menu::new(items.iter().map(String::as_str)).expect("menu should build")
    }

    #[test]
    fn test_empty_menu_rejected() {
        assert!(Menu::new(core::iter::empty::<&str>()).is_err());
    }

    #[test]
    fn test_highlight_wraps_up_from_first() {
        let mut menu = menu(3);
        assert_eq!(menu.highlighted, 0);
        menu.select_previous();
        assert_eq!(menu.highlighted, 2);
    }

    #[test]
    fn test_highlight_wraps_down_from_last() {
        let mut menu = menu(3);
        menu.select_previous(); // 2
        menu.select_next(); // 0
        assert_eq!(menu.highlighted, 0);
    }

    #[test]
    fn test_highlight_stays_in_bounds() {
        let mut menu = menu(4);
        for _ in 0..9 {
            menu.select_next();
        }
        assert_eq!(menu.highlighted, 9 % 4);
        for _ in 0..3 {
            menu.select_previous();
        }
        assert!(menu.highlighted < 4);
    }
}
