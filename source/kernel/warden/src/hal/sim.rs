// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Simulated hart for host tests.
//!
//! Registers start at zero unless seeded with [`SimHart::with_csr`] or
//! [`SimHart::with_reg`]. Every access is appended to an ordered log so tests
//! can assert on sequencing. Issuing the halt command panics with
//! `"hart halted"`, which turns shutdown paths into `should_panic` tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::vec::Vec;

use super::{EngineReg, Hart};
use crate::arch::riscv::csr::{self, Csr};

/// Fake halt-vector address handed out by [`SimHart::halt_vector`].
pub const SIM_HALT_VECTOR: u64 = 0x0010_0400;
/// Fake machine trap vector address.
pub const SIM_TRAP_VECTOR: u64 = 0x0010_0800;

/// One recorded hardware access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    CsrRead(u16),
    CsrWrite(u16, u64),
    CsrSet(u16, u64),
    CsrClear(u16, u64),
    CsrWriteImm(u16, u8),
    RegRead(u32),
    RegWrite(u32, u32),
}

impl Access {
    /// Whether this access mutates state.
    pub fn is_write(&self) -> bool {
        !matches!(self, Access::CsrRead(_) | Access::RegRead(_))
    }
}

#[derive(Default)]
pub struct SimHart {
    csrs: RefCell<BTreeMap<u16, u64>>,
    regs: RefCell<BTreeMap<u32, u32>>,
    log: RefCell<Vec<Access>>,
}

impl SimHart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds CSR `C` with `value` without recording an access.
    pub fn with_csr<C: Csr>(self, value: u64) -> Self {
        self.csrs.borrow_mut().insert(C::ADDR, value);
        self
    }

    /// Seeds an engine-local register without recording an access.
    pub fn with_reg(self, reg: EngineReg, value: u32) -> Self {
        self.regs.borrow_mut().insert(reg.offset(), value);
        self
    }

    /// Current value of CSR `C`.
    pub fn csr<C: Csr>(&self) -> u64 {
        self.csrs.borrow().get(&C::ADDR).copied().unwrap_or(0)
    }

    /// Current value of an engine-local register.
    pub fn reg(&self, reg: EngineReg) -> u32 {
        self.regs.borrow().get(&reg.offset()).copied().unwrap_or(0)
    }

    /// Snapshot of the access log.
    pub fn accesses(&self) -> Vec<Access> {
        self.log.borrow().clone()
    }

    /// Whether CSR `C` was written in any way.
    pub fn csr_touched<C: Csr>(&self) -> bool {
        self.log.borrow().iter().any(|a| match *a {
            Access::CsrWrite(addr, _)
            | Access::CsrSet(addr, _)
            | Access::CsrClear(addr, _)
            | Access::CsrWriteImm(addr, _) => addr == C::ADDR,
            _ => false,
        })
    }

    /// Whether `reg` was written.
    pub fn reg_written(&self, reg: EngineReg) -> bool {
        self.log
            .borrow()
            .iter()
            .any(|a| matches!(*a, Access::RegWrite(offset, _) if offset == reg.offset()))
    }

    fn record(&self, access: Access) {
        self.log.borrow_mut().push(access);
    }

    fn update(&self, addr: u16, f: impl FnOnce(u64) -> u64) {
        let mut csrs = self.csrs.borrow_mut();
        let slot = csrs.entry(addr).or_insert(0);
        *slot = f(*slot);
    }
}

impl Hart for SimHart {
    fn csr_read<C: Csr>(&self) -> u64 {
        self.record(Access::CsrRead(C::ADDR));
        self.csr::<C>()
    }

    fn csr_write<C: Csr>(&self, value: u64) {
        self.record(Access::CsrWrite(C::ADDR, value));
        self.update(C::ADDR, |_| value);
    }

    fn csr_set<C: Csr>(&self, bits: u64) {
        self.record(Access::CsrSet(C::ADDR, bits));
        self.update(C::ADDR, |v| v | bits);
    }

    fn csr_clear<C: Csr>(&self, bits: u64) {
        self.record(Access::CsrClear(C::ADDR, bits));
        self.update(C::ADDR, |v| v & !bits);
    }

    fn csr_write_imm<C: Csr, const IMM: u8>(&self) {
        self.record(Access::CsrWriteImm(C::ADDR, IMM));
        if C::ADDR == <csr::Mopt as Csr>::ADDR && IMM == csr::mopt::CMD_HALT {
            panic!("hart halted");
        }
        self.update(C::ADDR, |_| u64::from(IMM));
    }

    fn reg_read(&self, reg: EngineReg) -> u32 {
        self.record(Access::RegRead(reg.offset()));
        self.reg(reg)
    }

    fn reg_write(&self, reg: EngineReg, value: u32) {
        self.record(Access::RegWrite(reg.offset(), value));
        self.regs.borrow_mut().insert(reg.offset(), value);
    }

    fn halt_vector(&self) -> u64 {
        SIM_HALT_VECTOR
    }

    fn machine_trap_vector(&self) -> u64 {
        SIM_TRAP_VECTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::riscv::csr::{Mstatus, Mtvec};
    use crate::hal::regs::PRIV_LOCKDOWN;

    #[test]
    fn set_and_clear_compose() {
        let hart = SimHart::new().with_csr::<Mstatus>(0b1000);
        hart.csr_set::<Mstatus>(0b0011);
        hart.csr_clear::<Mstatus>(0b1001);
        assert_eq!(hart.csr::<Mstatus>(), 0b0010);
        assert!(hart.csr_touched::<Mstatus>());
        assert!(!hart.csr_touched::<Mtvec>());
    }

    #[test]
    fn register_helpers_read_then_write() {
        let hart = SimHart::new().with_reg(PRIV_LOCKDOWN, 0b11);
        hart.reg_clear_bits(PRIV_LOCKDOWN, 0b01);
        assert_eq!(hart.reg(PRIV_LOCKDOWN), 0b10);
        assert_eq!(
            hart.accesses(),
            vec![Access::RegRead(PRIV_LOCKDOWN.offset()), Access::RegWrite(PRIV_LOCKDOWN.offset(), 0b10)]
        );
    }

    #[test]
    #[should_panic(expected = "hart halted")]
    fn halt_command_panics() {
        let hart = SimHart::new();
        hart.csr_write_imm::<csr::Mopt, { csr::mopt::CMD_HALT }>();
    }
}
