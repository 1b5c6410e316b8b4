//! Panic handler that reports on a red console, waits for a key, then shuts down.
//!
//! A panic that arrives while another panic is already being reported skips the console entirely
//! and halts the CPU. The firmware console routines are not re-entrant.

#![cfg(target_os = "uefi")]

use core::fmt::Write;
use core::sync::atomic::{AtomicBool, Ordering};

use uefi::proto::console::text::Color;

/// Set once the first panic has entered the handler.
static PANICKING: AtomicBool = AtomicBool::new(false);

/// The stall before the key wait, so the message is visible even with a stuck key buffer.
const PANIC_DELAY: usize = 3_000_000; // 3 seconds

/// The panic handler.
#[panic_handler]
fn panic_handler(info: &core::panic::PanicInfo) -> ! {
    if PANICKING.swap(true, Ordering::Relaxed) {
        halt();
    }
    uefi::system::with_stdout(|stdout| {
        let _ = stdout.set_color(Color::White, Color::Red);
        let _ = writeln!(stdout, "[PANIC]: {info}");
        let _ = writeln!(stdout, "Press a key to shut down");
    });
    uefi::boot::stall(PANIC_DELAY);
    uefi::system::with_stdin(|stdin| {
        if let Some(event) = stdin.wait_for_key_event() {
            let _ = uefi::boot::wait_for_event(&mut [event]);
        }
    });
    uefi::runtime::reset(
        uefi::runtime::ResetType::SHUTDOWN,
        uefi::Status::ABORTED,
        None,
    )
}

/// Parks the CPU without touching any firmware service.
fn halt() -> ! {
    loop {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: hlt only pauses the CPU until the next interrupt. It reads and writes nothing.
        unsafe {
            core::arch::asm!("hlt");
        }
        #[cfg(not(target_arch = "x86_64"))]
        core::hint::spin_loop();
    }
}
