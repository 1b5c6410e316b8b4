//! Simple stub to use the UEFI pool allocator as the global allocator.
//!
//! Every allocation in the program comes out of firmware pool memory through this. Nothing is
//! returned early; the pool is reclaimed wholesale when the process chain-loads or resets.

#![cfg(target_os = "uefi")]

use uefi::allocator::Allocator;

/// The UEFI global allocator.
#[global_allocator]
static ALLOCATOR: Allocator = Allocator;
