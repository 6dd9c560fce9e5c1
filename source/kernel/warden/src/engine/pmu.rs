// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! PMU engine variant.
//!
//! `mspm.MSECM` must be sampled before anything narrows it; the secure
//! transaction grant in `SCTL` mirrors what the boot ROM granted.

use super::{common, EngineHardening, BASE_COUNTERS};
use crate::arch::riscv::csr::{counteren, spm, Mspm};
use crate::hal::regs::{ctxsw, sctl, IrqSources, CTXSW_FSM_CTL, SCTL};
use crate::hal::Hart;

/// Power management unit.
#[derive(Clone, Copy, Debug)]
pub struct Pmu;

impl EngineHardening for Pmu {
    const NAME: &'static str = "pmu";
    const IRQ_DELEG_SOURCES: IrqSources = IrqSources::GPTMR
        .union(IrqSources::WDTMR)
        .union(IrqSources::MTHD)
        .union(IrqSources::CTXSW)
        .union(IrqSources::HALT)
        .union(IrqSources::EXTERR)
        .union(IrqSources::SWGEN0)
        .union(IrqSources::SWGEN1)
        .union(IrqSources::EXT)
        .union(IrqSources::MEMERR);
    const COUNTERS: u64 = BASE_COUNTERS | counteren::HPM3 | counteren::HPM4;

    fn apply<H: Hart>(hart: &H) {
        let secure = hart.csr_read::<Mspm>() & spm::MSECM_SECURE != 0;
        common::<Self, H>(hart);
        hart.reg_set_bits(CTXSW_FSM_CTL, ctxsw::ENABLE);
        if secure {
            hart.reg_set_bits(SCTL, sctl::SECURE_TXN);
        }
    }
}
