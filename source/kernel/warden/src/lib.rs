// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: WARDEN separation kernel boot sequence for GPU-embedded RISC-V engines
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit + property tests against the simulated hart (`hal::sim`)
//! PUBLIC API: boot_entry(), boot::run(), sbi::dispatch(), shutdown::shutdown(), trap::handle()
//! DEPENDS_ON: warden-manifest, riscv (mstatus field encodings), bitflags, spin, static_assertions
//! INVARIANTS: Runs once in M-mode with interrupts masked; every privilege register is final
//!             before the lockdown release; any invalid configuration ends in shutdown
//!
//! The kernel runs right after the boot ROM authenticated the manifest. It
//! narrows the privilege configuration, releases the boot lockdown and returns
//! into the FMC partition in supervisor mode. Afterwards it only exists as the
//! machine trap vector serving the SBI calls of that partition.

#![cfg_attr(not(test), no_std)]
#![forbid(clippy::unwrap_used)]

#[macro_use]
pub mod diag;

pub mod amap;
pub mod arch;
pub mod boot;
pub mod config;
pub mod debug;
pub mod engine;
pub mod hal;
mod panic;
pub mod sbi;
pub mod shutdown;
pub mod trap;

pub use warden_manifest as manifest;

/// Boots the engine and returns the hand-off version to the FMC.
///
/// The caller returns the value with `mret`, which is what transfers control
/// to the partition programmed into `mepc`.
///
/// # Safety
///
/// Must be called exactly once, in machine mode, on the boot hart, with
/// `manifest` pointing at the boot-ROM-authenticated manifest.
#[cfg(all(target_arch = "riscv64", target_os = "none"))]
pub unsafe fn boot_entry(manifest: *const manifest::Manifest, code_size: u64) -> usize {
    let hart = arch::riscv::MachineHart;
    // SAFETY: the boot ROM places the authenticated manifest at an aligned DMEM address.
    let manifest = unsafe { manifest::Manifest::from_ptr(manifest) };
    // SAFETY: single invocation per boot, guaranteed by the caller.
    let token = unsafe { boot::LockdownToken::new() };
    boot::run::<_, engine::Selected>(&hart, manifest, boot::ImageInfo { code_size }, token)
}
