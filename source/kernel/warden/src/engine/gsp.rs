// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! GSP engine variant.

use super::{common, EngineHardening, BASE_COUNTERS};
use crate::hal::regs::IrqSources;
use crate::hal::Hart;

/// GPU system processor.
#[derive(Clone, Copy, Debug)]
pub struct Gsp;

impl EngineHardening for Gsp {
    const NAME: &'static str = "gsp";
    const IRQ_DELEG_SOURCES: IrqSources = IrqSources::GPTMR
        .union(IrqSources::WDTMR)
        .union(IrqSources::MTHD)
        .union(IrqSources::CTXSW)
        .union(IrqSources::HALT)
        .union(IrqSources::EXTERR)
        .union(IrqSources::SWGEN0)
        .union(IrqSources::SWGEN1)
        .union(IrqSources::EXT)
        .union(IrqSources::MEMERR)
        .union(IrqSources::IOPMP);
    const COUNTERS: u64 = BASE_COUNTERS;

    fn apply<H: Hart>(hart: &H) {
        common::<Self, H>(hart);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::regs::{CTXSW_FSM_CTL, SCTL};
    use crate::hal::sim::SimHart;

    #[test]
    fn gsp_leaves_pmu_registers_alone() {
        let hart = SimHart::new();
        Gsp::apply(&hart);
        assert!(!hart.reg_written(CTXSW_FSM_CTL));
        assert!(!hart.reg_written(SCTL));
    }

    #[test]
    fn icd_interrupt_stays_in_machine_mode() {
        assert!(!Gsp::IRQ_DELEG_SOURCES.contains(IrqSources::ICD));
    }
}
