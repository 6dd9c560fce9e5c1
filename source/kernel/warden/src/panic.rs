// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Panic handler for the engine image
//! OWNERS: @kernel-boot-team
//! PUBLIC API: panic handler (no_std)
//! DEPENDS_ON: diag::log, shutdown
//! INVARIANTS: Never returns to the faulting code; no allocations; a panic is a shutdown

#[cfg(all(not(test), target_arch = "riscv64", target_os = "none"))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo<'_>) -> ! {
    if let Some(location) = info.location() {
        log_error!(target: "panic", "{}:{}: {}", location.file(), location.line(), info.message());
    } else {
        log_error!(target: "panic", "{}", info.message());
    }
    crate::shutdown::shutdown(&crate::arch::riscv::MachineHart)
}
