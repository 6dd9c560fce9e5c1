// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Register/CSR access layer
//! OWNERS: @kernel-arch-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Exercised through every boot/SBI test via `sim::SimHart`
//! PUBLIC API: Hart, EngineReg, regs::*
//! DEPENDS_ON: arch::riscv::csr
//! INVARIANTS: No primitive can fail; no caching; every call is one hardware access
//!             (read-modify-write helpers are two)

pub mod regs;
#[cfg(test)]
pub mod sim;

use crate::arch::riscv::csr::Csr;

/// Byte offset into the engine-local register window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EngineReg(u32);

impl EngineReg {
    /// Names the register at `offset`.
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    /// Returns the byte offset.
    pub const fn offset(self) -> u32 {
        self.0
    }
}

/// Primitive accesses to the two register spaces of the core.
///
/// Implementations are selected at build time; the boot path is generic over
/// this trait and never dispatches through a vtable.
pub trait Hart {
    /// Reads CSR `C`.
    fn csr_read<C: Csr>(&self) -> u64;
    /// Writes CSR `C`.
    fn csr_write<C: Csr>(&self, value: u64);
    /// Sets `bits` in CSR `C`.
    fn csr_set<C: Csr>(&self, bits: u64);
    /// Clears `bits` in CSR `C`.
    fn csr_clear<C: Csr>(&self, bits: u64);
    /// Writes the 5-bit immediate `IMM` to CSR `C` (`csrwi`).
    fn csr_write_imm<C: Csr, const IMM: u8>(&self);
    /// Reads an engine-local register.
    fn reg_read(&self, reg: EngineReg) -> u32;
    /// Writes an engine-local register.
    fn reg_write(&self, reg: EngineReg, value: u32);
    /// Address of the terminal halt vector.
    fn halt_vector(&self) -> u64;
    /// Address of the machine trap vector serving SBI calls.
    fn machine_trap_vector(&self) -> u64;

    /// Replaces the `field` bits of CSR `C` with `value`.
    #[inline]
    fn csr_modify<C: Csr>(&self, field: u64, value: u64) {
        self.csr_clear::<C>(field);
        self.csr_set::<C>(value & field);
    }

    /// Sets `bits` in an engine-local register.
    #[inline]
    fn reg_set_bits(&self, reg: EngineReg, bits: u32) {
        let value = self.reg_read(reg);
        self.reg_write(reg, value | bits);
    }

    /// Clears `bits` in an engine-local register.
    #[inline]
    fn reg_clear_bits(&self, reg: EngineReg, bits: u32) {
        let value = self.reg_read(reg);
        self.reg_write(reg, value & !bits);
    }
}
