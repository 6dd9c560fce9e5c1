// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//! Machine trap handling after hand-off: external ASM prologue/epilogue +
//! safe Rust core. Serves S-mode ecalls through the SBI dispatcher, forwards
//! the machine timer to S-mode and stops the core on anything else.

use static_assertions::const_assert_eq;

use crate::arch::riscv::csr::{mie, mip, Mie, Mip, CAUSE_ECALL_FROM_S};
use crate::hal::Hart;
use crate::sbi::{self, SbiCall};
use crate::shutdown::shutdown;

// Low-level vector from assembly (engine target only).
#[cfg(all(target_arch = "riscv64", target_os = "none"))]
core::arch::global_asm!(
    include_str!("arch/riscv/trap.S"),
    TF_SIZE    = const core::mem::size_of::<TrapFrame>(),
    OFF_MEPC   = const 32*8,
    OFF_MCAUSE = const 33*8,
    OFF_MTVAL  = const 34*8,
);

const INTERRUPT_FLAG: u64 = 1 << 63;
const IRQ_MACHINE_TIMER: u64 = 7;

const REG_A0: usize = 10;
const REG_A1: usize = 11;
const REG_A6: usize = 16;
const REG_A7: usize = 17;

/// Saved register state for a machine trap.
/// Must match `arch/riscv/trap.S` save/restore layout.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrapFrame {
    /// x0..x31 (x0 is always 0; x2 holds the interrupted stack pointer).
    pub x: [u64; 32],
    pub mepc: u64,
    pub mcause: u64,
    pub mtval: u64,
    _pad: u64,
}

const_assert_eq!(core::mem::size_of::<TrapFrame>(), 288);
const_assert_eq!(core::mem::size_of::<TrapFrame>() % 16, 0);

impl TrapFrame {
    /// Frame of an S-mode `ecall` carrying `call`.
    pub fn ecall(call: &SbiCall, mepc: u64) -> Self {
        let mut frame = Self { mepc, mcause: CAUSE_ECALL_FROM_S, ..Self::default() };
        frame.x[REG_A0..REG_A0 + 6].copy_from_slice(&call.args);
        frame.x[REG_A6] = call.fid;
        frame.x[REG_A7] = call.eid;
        frame
    }

    /// SBI call encoded in `a0`..`a7`.
    pub fn sbi_call(&self) -> SbiCall {
        let mut args = [0u64; 6];
        args.copy_from_slice(&self.x[REG_A0..REG_A0 + 6]);
        SbiCall { args, fid: self.x[REG_A6], eid: self.x[REG_A7] }
    }
}

/// Human-readable name of an `mcause` value.
pub fn describe_cause(mcause: u64) -> &'static str {
    if mcause & INTERRUPT_FLAG != 0 {
        return match mcause & !INTERRUPT_FLAG {
            1 => "supervisor software interrupt",
            3 => "machine software interrupt",
            5 => "supervisor timer interrupt",
            7 => "machine timer interrupt",
            9 => "supervisor external interrupt",
            11 => "machine external interrupt",
            _ => "unknown interrupt",
        };
    }
    match mcause {
        0 => "instruction address misaligned",
        1 => "instruction access fault",
        2 => "illegal instruction",
        3 => "breakpoint",
        4 => "load address misaligned",
        5 => "load access fault",
        6 => "store address misaligned",
        7 => "store access fault",
        8 => "environment call from U-mode",
        9 => "environment call from S-mode",
        11 => "environment call from M-mode",
        12 => "instruction page fault",
        13 => "load page fault",
        15 => "store page fault",
        _ => "unknown exception",
    }
}

/// Handles one machine trap. Returns only if execution may resume at `frame.mepc`.
pub fn handle<H: Hart>(hart: &H, frame: &mut TrapFrame) {
    if frame.mcause == CAUSE_ECALL_FROM_S {
        let ret = sbi::dispatch(hart, &frame.sbi_call());
        frame.x[REG_A0] = ret.error as u64;
        frame.x[REG_A1] = ret.value as u64;
        frame.mepc = frame.mepc.wrapping_add(4);
        return;
    }
    if frame.mcause == INTERRUPT_FLAG | IRQ_MACHINE_TIMER {
        // Hand the deadline to S-mode; it re-arms through set-timer.
        hart.csr_clear::<Mie>(mie::MTIE);
        hart.csr_set::<Mip>(mip::STIP);
        return;
    }
    log_error!(
        target: "trap",
        "{} mcause={:#x} mepc={:#x} mtval={:#x}",
        describe_cause(frame.mcause),
        frame.mcause,
        frame.mepc,
        frame.mtval
    );
    shutdown(hart)
}

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
#[no_mangle]
extern "C" fn warden_trap_rust(frame: &mut TrapFrame) {
    handle(&crate::arch::riscv::MachineHart, frame);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::riscv::csr::Mtimecmp;
    use crate::hal::sim::SimHart;
    use crate::sbi::{EID_SET_TIMER, ERR_NOT_SUPPORTED};

    #[test]
    fn ecall_returns_in_a0_a1_and_skips_instruction() {
        let hart = SimHart::new();
        let call = SbiCall { args: [0xdead_beef, 0, 0, 0, 0, 0], fid: 0, eid: EID_SET_TIMER };
        let mut frame = TrapFrame::ecall(&call, 0x8000_1000);
        handle(&hart, &mut frame);
        assert_eq!(frame.x[REG_A0], 0);
        assert_eq!(frame.x[REG_A1], 0);
        assert_eq!(frame.mepc, 0x8000_1004);
        assert_eq!(hart.csr::<Mtimecmp>(), 0xdead_beef);
    }

    #[test]
    #[cfg(not(feature = "sbi_halt_on_error"))]
    fn unsupported_ecall_reports_error_code() {
        let hart = SimHart::new();
        let call = SbiCall { eid: 0x0A00_0000, ..SbiCall::default() };
        let mut frame = TrapFrame::ecall(&call, 0x100);
        handle(&hart, &mut frame);
        assert_eq!(frame.x[REG_A0] as i64, ERR_NOT_SUPPORTED);
        assert_eq!(frame.mepc, 0x104);
    }

    #[test]
    fn frame_round_trips_sbi_registers() {
        let call = SbiCall { args: [1, 2, 3, 4, 5, 6], fid: 7, eid: 8 };
        assert_eq!(TrapFrame::ecall(&call, 0).sbi_call(), call);
    }

    #[test]
    fn machine_timer_is_forwarded_to_supervisor() {
        let hart = SimHart::new().with_csr::<Mie>(mie::MTIE);
        let mut frame = TrapFrame {
            mepc: 0x200,
            mcause: INTERRUPT_FLAG | IRQ_MACHINE_TIMER,
            ..TrapFrame::default()
        };
        handle(&hart, &mut frame);
        assert_eq!(hart.csr::<Mie>() & mie::MTIE, 0);
        assert_ne!(hart.csr::<Mip>() & mip::STIP, 0);
        assert_eq!(frame.mepc, 0x200);
    }

    #[test]
    #[should_panic(expected = "hart halted")]
    fn other_traps_shut_down() {
        let hart = SimHart::new();
        let mut frame = TrapFrame { mcause: 5, mtval: 0x10, ..TrapFrame::default() };
        handle(&hart, &mut frame);
    }

    #[test]
    fn causes_have_names() {
        assert_eq!(describe_cause(CAUSE_ECALL_FROM_S), "environment call from S-mode");
        assert_eq!(describe_cause(INTERRUPT_FLAG | 7), "machine timer interrupt");
        assert_eq!(describe_cause(10), "unknown exception");
    }
}
