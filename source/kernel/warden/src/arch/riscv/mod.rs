// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! RISC-V machine-mode backend of the register layer.
//!
//! On the engine target every primitive is a single CSR instruction or a
//! volatile access into the engine-local I/O window. Host builds only see the
//! CSR definitions; tests drive the kernel through `hal::sim::SimHart`.

pub mod csr;

/// Clears the `.bss` region defined by the linker.
///
/// # Safety
///
/// `start..end` must be a writable region owned by nobody else, and nothing
/// may have relied on its contents yet.
#[inline]
pub unsafe fn clear_bss(start: *mut u8, end: *mut u8) {
    let mut ptr = start;
    while ptr < end {
        // SAFETY: within the region granted by the caller.
        unsafe {
            core::ptr::write_volatile(ptr, 0);
            ptr = ptr.add(1);
        }
    }
}

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
pub use target::MachineHart;

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod target {
    use core::arch::{asm, global_asm};
    use core::ptr::{read_volatile, write_volatile};

    use super::csr::{self, Csr};
    use crate::hal::{regs::LOCAL_IO_BASE, EngineReg, Hart};

    // Terminal stop used as the supervisor trap vector during the hand-off
    // window. `stvec` requires 4-byte alignment.
    global_asm!(
        r#"
        .section .text.warden_halt, "ax", @progbits
        .globl warden_halt_vector
        .balign 4
    warden_halt_vector:
    1:  csrwi {mopt}, {halt}
        j    1b
    "#,
        mopt = const csr::Mopt::ADDR,
        halt = const csr::mopt::CMD_HALT,
    );

    extern "C" {
        fn warden_halt_vector();
        fn warden_trap_vector();
    }

    /// The physical hart this image runs on.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct MachineHart;

    impl MachineHart {
        #[inline(always)]
        fn local(reg: EngineReg) -> usize {
            LOCAL_IO_BASE + reg.offset() as usize
        }
    }

    impl Hart for MachineHart {
        #[inline(always)]
        fn csr_read<C: Csr>(&self) -> u64 {
            let value: u64;
            // SAFETY: reading a CSR in M-mode has no memory side effects.
            unsafe { asm!("csrr {0}, {csr}", out(reg) value, csr = const C::ADDR, options(nostack)) };
            value
        }

        #[inline(always)]
        fn csr_write<C: Csr>(&self, value: u64) {
            // SAFETY: M-mode owns every CSR during boot.
            unsafe { asm!("csrw {csr}, {0}", in(reg) value, csr = const C::ADDR, options(nostack)) };
        }

        #[inline(always)]
        fn csr_set<C: Csr>(&self, bits: u64) {
            // SAFETY: as above.
            unsafe { asm!("csrs {csr}, {0}", in(reg) bits, csr = const C::ADDR, options(nostack)) };
        }

        #[inline(always)]
        fn csr_clear<C: Csr>(&self, bits: u64) {
            // SAFETY: as above.
            unsafe { asm!("csrc {csr}, {0}", in(reg) bits, csr = const C::ADDR, options(nostack)) };
        }

        #[inline(always)]
        fn csr_write_imm<C: Csr, const IMM: u8>(&self) {
            const { assert!(IMM < 32, "csrwi takes a 5-bit immediate") };
            // SAFETY: as above.
            unsafe {
                asm!("csrwi {csr}, {imm}", csr = const C::ADDR, imm = const IMM, options(nostack))
            };
        }

        #[inline(always)]
        fn reg_read(&self, reg: EngineReg) -> u32 {
            // SAFETY: engine-local registers are always mapped and 4-byte aligned.
            unsafe { read_volatile(Self::local(reg) as *const u32) }
        }

        #[inline(always)]
        fn reg_write(&self, reg: EngineReg, value: u32) {
            // SAFETY: as above.
            unsafe { write_volatile(Self::local(reg) as *mut u32, value) }
        }

        fn halt_vector(&self) -> u64 {
            warden_halt_vector as usize as u64
        }

        fn machine_trap_vector(&self) -> u64 {
            warden_trap_vector as usize as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::clear_bss;

    #[test]
    fn clear_bss_zeroes_exact_range() {
        let mut region = [0xa5u8; 16];
        let range = region[4..12].as_mut_ptr_range();
        // SAFETY: the range lies inside `region`.
        unsafe { clear_bss(range.start, range.end) };
        assert_eq!(&region[..4], &[0xa5; 4]);
        assert_eq!(&region[4..12], &[0; 8]);
        assert_eq!(&region[12..], &[0xa5; 4]);
    }
}
