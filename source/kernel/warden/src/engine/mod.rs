// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Engine-specific hardening hook
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Per-engine register effects against the simulated hart
//! PUBLIC API: EngineHardening, Gsp, Pmu, Selected
//! DEPENDS_ON: hal::Hart, hal::regs
//! INVARIANTS: Exactly one variant is `Selected` per image; no runtime dispatch

mod gsp;
mod pmu;

pub use gsp::Gsp;
pub use pmu::Pmu;

use crate::arch::riscv::csr::{counteren, Mcounteren, Scounteren};
use crate::hal::regs::{plm, IrqSources, DEVICEMAP_PLM, PERFMON_PLM};
use crate::hal::Hart;

/// Hardening step that differs between engine families.
pub trait EngineHardening {
    /// Name used in diagnostics.
    const NAME: &'static str;
    /// External sources this engine routes to the S-mode external line.
    const IRQ_DELEG_SOURCES: IrqSources;
    /// Counters exposed to S-mode and U-mode.
    const COUNTERS: u64;

    /// Applies the engine-specific register programming.
    fn apply<H: Hart>(hart: &H);
}

/// Engine compiled into this image. PMU wins if both features are enabled.
#[cfg(feature = "engine_pmu")]
pub type Selected = Pmu;
/// Engine compiled into this image. PMU wins if both features are enabled.
#[cfg(not(feature = "engine_pmu"))]
pub type Selected = Gsp;

/// Steps every engine performs.
fn common<E: EngineHardening, H: Hart>(hart: &H) {
    hart.reg_write(PERFMON_PLM, plm::OPEN);
    hart.reg_write(DEVICEMAP_PLM, plm::MACHINE_ONLY_LOCKED);
    hart.csr_set::<Mcounteren>(E::COUNTERS);
    hart.csr_set::<Scounteren>(E::COUNTERS);
    log_debug!(target: "engine", "{} counters={:#x}", E::NAME, E::COUNTERS);
}

/// Baseline counter set: cycle, time, instret.
const BASE_COUNTERS: u64 = counteren::CY | counteren::TM | counteren::IR;
