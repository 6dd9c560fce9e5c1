// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: SBI surface offered to the FMC partition
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! API_STABILITY: Stable (legacy SBI extension numbering)
//! TEST_COVERAGE: set-timer effects, unsupported EIDs, shutdown, halt-on-error
//! PUBLIC API: SbiCall, SbiRet, dispatch(), EID_* / ERR_* constants
//! DEPENDS_ON: hal::Hart, shutdown
//! INVARIANTS: Stateless; unsupported calls touch no CSR

use crate::arch::riscv::csr::{mie, mip, Mie, Mip, Mtimecmp};
use crate::config;
use crate::hal::Hart;
use crate::shutdown::shutdown;

/// Legacy set-timer extension.
pub const EID_SET_TIMER: u64 = 0x00;
/// Legacy system-shutdown extension.
pub const EID_SHUTDOWN: u64 = 0x08;

pub const SUCCESS: i64 = 0;
pub const ERR_FAILED: i64 = -1;
pub const ERR_NOT_SUPPORTED: i64 = -2;

/// Register image of an `ecall` from S-mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SbiCall {
    /// `a0`..`a5`.
    pub args: [u64; 6],
    /// `a6`.
    pub fid: u64,
    /// `a7`.
    pub eid: u64,
}

/// Result returned in `a0` (error) and `a1` (value).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SbiRet {
    pub error: i64,
    pub value: i64,
}

impl SbiRet {
    pub const fn success(value: i64) -> Self {
        Self { error: SUCCESS, value }
    }

    pub const fn error(error: i64) -> Self {
        Self { error, value: 0 }
    }

    pub const fn is_success(&self) -> bool {
        self.error == SUCCESS
    }
}

/// Serves one SBI call.
pub fn dispatch<H: Hart>(hart: &H, call: &SbiCall) -> SbiRet {
    let ret = match call.eid {
        EID_SET_TIMER => set_timer(hart, call.args[0]),
        EID_SHUTDOWN => {
            log_info!(target: "sbi", "shutdown requested");
            shutdown(hart)
        }
        eid => {
            log_warn!(target: "sbi", "unsupported eid={:#x} fid={:#x}", eid, call.fid);
            SbiRet::error(ERR_NOT_SUPPORTED)
        }
    };
    if config::SBI_HALT_ON_ERROR && !ret.is_success() {
        shutdown(hart);
    }
    ret
}

/// Arms the machine timer and withdraws any pending supervisor timer.
fn set_timer<H: Hart>(hart: &H, deadline: u64) -> SbiRet {
    hart.csr_write::<Mtimecmp>(deadline);
    hart.csr_clear::<Mip>(mip::STIP);
    hart.csr_set::<Mie>(mie::MTIE);
    SbiRet::success(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::sim::SimHart;

    fn call(eid: u64, arg0: u64) -> SbiCall {
        SbiCall { args: [arg0, 0, 0, 0, 0, 0], fid: 0, eid }
    }

    #[test]
    fn set_timer_programs_compare_and_enables_machine_timer() {
        let hart = SimHart::new().with_csr::<Mip>(mip::STIP | mip::SSIP);
        let ret = dispatch(&hart, &call(EID_SET_TIMER, 0x1234_5678));
        assert_eq!(ret, SbiRet::success(0));
        assert_eq!(hart.csr::<Mtimecmp>(), 0x1234_5678);
        assert_eq!(hart.csr::<Mip>(), mip::SSIP);
        assert_ne!(hart.csr::<Mie>() & mie::MTIE, 0);
    }

    #[test]
    #[cfg(not(feature = "sbi_halt_on_error"))]
    fn unsupported_eid_touches_nothing() {
        let hart = SimHart::new();
        for eid in [0x01, 0x07, 0x10, 0x4853_4D, u64::MAX] {
            let ret = dispatch(&hart, &call(eid, 0));
            assert_eq!(ret, SbiRet::error(ERR_NOT_SUPPORTED));
        }
        assert!(hart.accesses().is_empty());
    }

    #[test]
    #[cfg(feature = "sbi_halt_on_error")]
    #[should_panic(expected = "hart halted")]
    fn unsupported_eid_halts_when_configured() {
        let hart = SimHart::new();
        let _ = dispatch(&hart, &call(0x10, 0));
    }

    #[test]
    #[should_panic(expected = "hart halted")]
    fn shutdown_eid_halts() {
        let hart = SimHart::new();
        let _ = dispatch(&hart, &call(EID_SHUTDOWN, 0));
    }
}
