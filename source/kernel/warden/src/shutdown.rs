// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Terminal stop of the core.
//!
//! Interrupts are masked first so nothing can preempt the halt command. The
//! halt is issued in a loop: a spurious resume (debugger, glitch) lands right
//! back on it.

use crate::arch::riscv::csr::{mopt, mstatus, Mopt, Mstatus};
use crate::hal::Hart;

/// Stops the core. Never returns.
pub fn shutdown<H: Hart>(hart: &H) -> ! {
    hart.csr_clear::<Mstatus>(mstatus::SIE | mstatus::MIE);
    loop {
        hart.csr_write_imm::<Mopt, { mopt::CMD_HALT }>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::riscv::csr::Csr;
    use crate::hal::sim::{Access, SimHart};

    #[test]
    fn masks_interrupts_before_halting() {
        let hart = SimHart::new().with_csr::<Mstatus>(mstatus::SIE | mstatus::MIE | 0x1800);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| shutdown(&hart)));
        assert!(result.is_err());
        assert_eq!(hart.csr::<Mstatus>(), 0x1800);
        assert_eq!(
            hart.accesses(),
            vec![
                Access::CsrClear(Mstatus::ADDR, mstatus::SIE | mstatus::MIE),
                Access::CsrWriteImm(Mopt::ADDR, mopt::CMD_HALT),
            ]
        );
    }
}
