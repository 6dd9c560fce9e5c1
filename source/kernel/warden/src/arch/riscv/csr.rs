// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: CSR definitions (standard machine/supervisor CSRs plus engine custom CSRs)
//! OWNERS: @kernel-arch-team
//! PUBLIC API: Csr trait, one zero-sized type per CSR, per-CSR field modules
//! DEPENDS_ON: bitflags
//! INVARIANTS: CSR numbers are compile-time constants (they are encoded into the instruction)

use bitflags::bitflags;

/// A control-and-status register selected at compile time.
pub trait Csr {
    /// CSR number as encoded in `csrr`/`csrw`.
    const ADDR: u16;
}

macro_rules! csr {
    ($($(#[$meta:meta])* $ty:ident = $addr:literal;)+) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug)]
            pub struct $ty;

            impl Csr for $ty {
                const ADDR: u16 = $addr;
            }
        )+
    };
}

csr! {
    /// Supervisor trap vector.
    Stvec = 0x105;
    /// Supervisor counter enable (U-mode counter visibility).
    Scounteren = 0x106;
    /// Machine status.
    Mstatus = 0x300;
    /// Machine exception delegation.
    Medeleg = 0x302;
    /// Machine interrupt delegation.
    Mideleg = 0x303;
    /// Machine interrupt enable.
    Mie = 0x304;
    /// Machine trap vector.
    Mtvec = 0x305;
    /// Machine counter enable (S-mode counter visibility).
    Mcounteren = 0x306;
    /// Machine exception program counter.
    Mepc = 0x341;
    /// Machine interrupt pending.
    Mip = 0x344;
    /// Supervisor requested privilege level.
    Srsp = 0x5d8;
    /// Supervisor privilege-level mask.
    Sspm = 0x5d9;
    /// Machine miscellaneous operation enables for lower modes.
    Mmiscopen = 0x7c5;
    /// Machine hardware configuration (read-only capability bits).
    Mcfg = 0x7c6;
    /// Machine load/store attributes.
    Mldstattr = 0x7c8;
    /// Machine in-circuit-debug control.
    Mdbgctl = 0x7ce;
    /// Machine operation command (immediate writes only).
    Mopt = 0x7d5;
    /// Machine requested privilege level.
    Mrsp = 0x7d8;
    /// Machine privilege-level mask and security mask.
    Mspm = 0x7d9;
    /// Machine timer compare.
    Mtimecmp = 0x7db;
    /// Branch predictor configuration.
    Mbpcfg = 0x7dd;
    /// Machine instruction fetch attributes.
    Mfetchattr = 0x7df;
    /// User privilege-level mask.
    Uspm = 0x8d9;
}

/// `mstatus` fields.
pub mod mstatus {
    pub const SIE: u64 = 1 << 1;
    pub const MIE: u64 = 1 << 3;
    pub const MPP_SHIFT: u32 = 11;
    pub const MPP_MASK: u64 = 0b11 << MPP_SHIFT;
}

/// `mip`/`mie` bits.
pub mod mip {
    pub const SSIP: u64 = 1 << 1;
    pub const STIP: u64 = 1 << 5;
}

/// `mie` bits.
pub mod mie {
    pub const MTIE: u64 = 1 << 7;
}

/// `mcounteren`/`scounteren` bits.
pub mod counteren {
    pub const CY: u64 = 1 << 0;
    pub const TM: u64 = 1 << 1;
    pub const IR: u64 = 1 << 2;
    pub const HPM3: u64 = 1 << 3;
    pub const HPM4: u64 = 1 << 4;
}

/// Fields shared by `mspm`, `sspm` and `uspm`.
pub mod spm {
    /// 4-bit privilege-level mask, bit `n` grants level `n`.
    pub const PLM_MASK: u64 = 0xf;
    /// LS-mode mask: levels 0 and 2.
    pub const PLM_LEVEL2: u64 = 0b0101;
    /// `mspm` only: machine security mask.
    pub const MSECM_SHIFT: u32 = 16;
    /// `mspm` only: secure transaction level granted by the manifest.
    pub const MSECM_SECURE: u64 = 1 << MSECM_SHIFT;
}

/// Fields shared by `mrsp` and `srsp`.
pub mod rsp {
    pub const RPL_MASK: u64 = 0b11;
}

/// `mdbgctl` fields.
pub mod mdbgctl {
    /// Memory accesses issued by ICD use `ICDMEMPRV` instead of the core privilege.
    pub const ICDMEMPRV_OVERRIDE: u64 = 1 << 0;
    pub const ICDMEMPRV_SHIFT: u32 = 1;
    pub const ICDMEMPRV_MASK: u64 = 0b11 << ICDMEMPRV_SHIFT;
    /// ICD CSR accesses are never performed with supervisor privilege.
    pub const ICDCSRPRV_S_OVERRIDE: u64 = 1 << 3;
}

/// `mfetchattr`/`mldstattr` fields.
pub mod attr {
    pub const CACHEABLE: u64 = 1 << 0;
    pub const COHERENT: u64 = 1 << 1;
    pub const WPR_SHIFT: u32 = 8;
    pub const WPR_MASK: u64 = 0xff << WPR_SHIFT;
}

/// `mbpcfg` fields.
pub mod mbpcfg {
    pub const RAS_EN: u64 = 1 << 0;
    pub const BHT_EN: u64 = 1 << 1;
    pub const BTB_EN: u64 = 1 << 2;
    pub const RAS_FLUSH: u64 = 1 << 8;
    pub const BHT_FLUSH: u64 = 1 << 9;
    pub const BTB_FLUSH: u64 = 1 << 10;
}

/// `mmiscopen` fields.
pub mod mmiscopen {
    /// S-mode may issue data-cache flush operations.
    pub const DCACHEOP: u64 = 1 << 0;
    /// S-mode may issue system operations.
    pub const SYSOP: u64 = 1 << 1;
}

/// `mcfg` capability bits.
pub mod mcfg {
    pub const SYSOP_PRESENT: u64 = 1 << 4;
}

/// `mopt` commands; the field only accepts `csrwi`.
pub mod mopt {
    pub const CMD_HALT: u8 = 0x1;
}

bitflags! {
    /// Interrupt causes (`mideleg`, `mip`).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Interrupts: u64 {
        const SUPERVISOR_SOFT = 1 << 1;
        const MACHINE_SOFT = 1 << 3;
        const SUPERVISOR_TIMER = 1 << 5;
        const MACHINE_TIMER = 1 << 7;
        const SUPERVISOR_EXTERNAL = 1 << 9;
        const MACHINE_EXTERNAL = 1 << 11;
    }
}

bitflags! {
    /// Exception causes (`medeleg`, `mcause`).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Exceptions: u64 {
        const FETCH_MISALIGNED = 1 << 0;
        const FETCH_ACCESS = 1 << 1;
        const ILLEGAL_INSTRUCTION = 1 << 2;
        const BREAKPOINT = 1 << 3;
        const LOAD_MISALIGNED = 1 << 4;
        const LOAD_ACCESS = 1 << 5;
        const STORE_MISALIGNED = 1 << 6;
        const STORE_ACCESS = 1 << 7;
        const ECALL_FROM_U = 1 << 8;
        const ECALL_FROM_S = 1 << 9;
        const ECALL_FROM_M = 1 << 11;
        const FETCH_PAGE_FAULT = 1 << 12;
        const LOAD_PAGE_FAULT = 1 << 13;
        const STORE_PAGE_FAULT = 1 << 15;
    }
}

/// `mcause` value of an environment call from S-mode.
pub const CAUSE_ECALL_FROM_S: u64 = 9;
