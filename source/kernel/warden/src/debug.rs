// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: In-circuit-debug (ICD) lockdown postures
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Allow/deny partition per posture; register effects per posture
//! PUBLIC API: IcdCmd, DebugPosture::{allowed, denied, apply}
//! DEPENDS_ON: hal::Hart, hal::regs::{DBGCTL, DBGCTL_LOCK}, csr::Mdbgctl
//! INVARIANTS: allowed() and denied() are disjoint and cover IcdCmd::all() for every posture

use bitflags::bitflags;

use crate::arch::riscv::csr::{mdbgctl, Mdbgctl};
use crate::hal::regs::{DBGCTL, DBGCTL_LOCK};
use crate::hal::Hart;

bitflags! {
    /// ICD commands. The same bit positions index `DBGCTL` and `DBGCTL_LOCK`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct IcdCmd: u32 {
        const STOP = 1 << 0;
        const RUN = 1 << 1;
        const STEP = 1 << 2;
        const JUMP = 1 << 3;
        const RREG = 1 << 4;
        const WREG = 1 << 5;
        const RDM = 1 << 6;
        const WDM = 1 << 7;
        const RSTAT = 1 << 8;
        const RCSR = 1 << 9;
        const WCSR = 1 << 10;
        const RPC = 1 << 11;
        const BREAKPOINT = 1 << 12;
        const RFREG = 1 << 13;
        const WFREG = 1 << 14;
    }
}

/// `DBGCTL_LOCK` only: freezes the single-step mode bit.
pub const LOCK_SINGLE_STEP_MODE: u32 = 1 << 16;

/// Read-only inspection commands.
pub const ICD_ALLOW_LIST: IcdCmd = IcdCmd::STOP
    .union(IcdCmd::RREG)
    .union(IcdCmd::RDM)
    .union(IcdCmd::RSTAT)
    .union(IcdCmd::RCSR)
    .union(IcdCmd::RPC)
    .union(IcdCmd::RFREG);

/// Commands that alter execution or state.
pub const ICD_DENY_LIST: IcdCmd = IcdCmd::RUN
    .union(IcdCmd::STEP)
    .union(IcdCmd::JUMP)
    .union(IcdCmd::WREG)
    .union(IcdCmd::WDM)
    .union(IcdCmd::WCSR)
    .union(IcdCmd::BREAKPOINT)
    .union(IcdCmd::WFREG);

/// Statically selected ICD posture, see [`crate::config::DEBUG_POSTURE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugPosture {
    /// Everything enabled, privilege follows the core, lock left for later stages.
    Maximum,
    /// Inspection only, split frozen by the lock register.
    Minimized,
    /// Nothing enabled, everything locked.
    LockedDown,
}

impl DebugPosture {
    pub const fn allowed(self) -> IcdCmd {
        match self {
            DebugPosture::Maximum => IcdCmd::all(),
            DebugPosture::Minimized => ICD_ALLOW_LIST,
            DebugPosture::LockedDown => IcdCmd::empty(),
        }
    }

    pub const fn denied(self) -> IcdCmd {
        self.allowed().complement()
    }

    /// Programs `DBGCTL`, `DBGCTL_LOCK` and `mdbgctl` for this posture.
    pub fn apply<H: Hart>(self, hart: &H) {
        hart.reg_write(DBGCTL, self.allowed().bits());
        match self {
            DebugPosture::Maximum => {
                hart.csr_clear::<Mdbgctl>(
                    mdbgctl::ICDMEMPRV_OVERRIDE
                        | mdbgctl::ICDMEMPRV_MASK
                        | mdbgctl::ICDCSRPRV_S_OVERRIDE,
                );
            }
            DebugPosture::Minimized => {
                hart.reg_write(DBGCTL_LOCK, LOCK_SINGLE_STEP_MODE | self.denied().bits());
            }
            DebugPosture::LockedDown => {
                hart.reg_write(DBGCTL_LOCK, LOCK_SINGLE_STEP_MODE | IcdCmd::all().bits());
                // ICDMEMPRV = 0 (user).
                hart.csr_modify::<Mdbgctl>(
                    mdbgctl::ICDMEMPRV_OVERRIDE
                        | mdbgctl::ICDMEMPRV_MASK
                        | mdbgctl::ICDCSRPRV_S_OVERRIDE,
                    mdbgctl::ICDMEMPRV_OVERRIDE | mdbgctl::ICDCSRPRV_S_OVERRIDE,
                );
            }
        }
        log_debug!(target: "debug", "icd posture {:?} allowed={:#x}", self, self.allowed().bits());
    }
}
