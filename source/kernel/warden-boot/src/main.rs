// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Boot wrapper for the WARDEN kernel. Provides the `_start` entry point the
//! boot ROM jumps to, runs the kernel's boot sequence and leaves machine mode
//! with `mret` into the FMC partition it selected.
//!
//! `mscratch` is pointed at the top of the boot stack before the kernel runs.
//! The stack is empty again by the time `mret` executes, so the machine trap
//! vector reuses it for SBI calls.
#![cfg_attr(all(target_arch = "riscv64", target_os = "none"), no_std, no_main)]

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
core::arch::global_asm!(
    r#"
    .section .text._start, "ax", @progbits
    .globl _start
    .balign 4
_start:
    la   sp, __stack_top
    csrw mscratch, sp
    /* RISC-V ABI: initialize gp for small-data accesses (Rust may rely on it). */
    .option push
    .option norelax
    la   gp, __global_pointer$
    .option pop
    call start_rust
    /* a0 carries the hand-off version. */
    mret
"#
);

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod engine {
    use core::ptr::{addr_of, addr_of_mut};

    use warden::manifest::Manifest;

    extern "C" {
        static __warden_manifest: u8;
        static __text_start: u8;
        static __text_end: u8;
        static mut __bss_start: u8;
        static mut __bss_end: u8;
    }

    #[no_mangle]
    extern "C" fn start_rust() -> usize {
        // SAFETY: linker-provided bounds; nothing lives in .bss yet.
        unsafe { warden::arch::riscv::clear_bss(addr_of_mut!(__bss_start), addr_of_mut!(__bss_end)) };
        // SAFETY: only the symbol addresses are taken.
        let (manifest, code_size) = unsafe {
            (
                addr_of!(__warden_manifest).cast::<Manifest>(),
                addr_of!(__text_end) as u64 - addr_of!(__text_start) as u64,
            )
        };
        // SAFETY: `_start` runs once on the boot hart in M-mode, and the boot
        // ROM has placed the authenticated manifest in its linker slot.
        unsafe { warden::boot_entry(manifest, code_size) }
    }
}

#[cfg(not(all(target_arch = "riscv64", target_os = "none")))]
fn main() {
    // The image only runs on the engine; host builds produce an empty binary.
}
