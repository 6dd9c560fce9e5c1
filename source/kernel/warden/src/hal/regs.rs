// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Engine-local register map.
//!
//! Offsets are relative to [`LOCAL_IO_BASE`]. `BCR_*` registers are
//! programmed by the boot ROM and only read here.

use bitflags::bitflags;

use super::EngineReg;

/// Base of the engine-local I/O window in the core's address map.
pub const LOCAL_IO_BASE: usize = 0x0140_0000;

/// Boot lockdown; the FMC cannot be scheduled while `LOCK` is set.
pub const PRIV_LOCKDOWN: EngineReg = EngineReg::new(0x0000);
/// Code DMA configuration (target aperture).
pub const BCR_DMACFG: EngineReg = EngineReg::new(0x0010);
/// FMC code offset, bits [39:8] of the byte offset.
pub const BCR_DMAADDR_FMCCODE_LO: EngineReg = EngineReg::new(0x0014);
/// FMC code offset, bits [63:40] of the byte offset.
pub const BCR_DMAADDR_FMCCODE_HI: EngineReg = EngineReg::new(0x0018);
/// Secure DMA configuration (WPR identifier).
pub const BCR_DMACFG_SEC: EngineReg = EngineReg::new(0x001c);
/// ICD command enables.
pub const DBGCTL: EngineReg = EngineReg::new(0x0100);
/// ICD command locks.
pub const DBGCTL_LOCK: EngineReg = EngineReg::new(0x0104);
/// External interrupt delegation to S-mode.
pub const IRQDELEG: EngineReg = EngineReg::new(0x0200);
/// PLM of the performance-monitor register group.
pub const PERFMON_PLM: EngineReg = EngineReg::new(0x0300);
/// PLM of the device-map / MPU lock register group.
pub const DEVICEMAP_PLM: EngineReg = EngineReg::new(0x0304);
/// Context-switch FSM control (PMU).
pub const CTXSW_FSM_CTL: EngineReg = EngineReg::new(0x0400);
/// Security control (PMU).
pub const SCTL: EngineReg = EngineReg::new(0x0404);
/// Legacy framebuffer interface control.
pub const FBIF_CTL: EngineReg = EngineReg::new(0x0600);
/// Coherency-capable framebuffer interface control.
pub const TFBIF_CTL: EngineReg = EngineReg::new(0x0700);
/// Debug print FIFO.
pub const PRINT_FIFO: EngineReg = EngineReg::new(0x0800);

/// `PRIV_LOCKDOWN` fields.
pub mod lockdown {
    pub const LOCK: u32 = 1 << 0;
}

/// `BCR_DMACFG` fields.
pub mod dmacfg {
    pub const TARGET_MASK: u32 = 0b11;
    pub const TARGET_LOCAL_FB: u32 = 0;
    pub const TARGET_COHERENT_SYSMEM: u32 = 1;
    pub const TARGET_NONCOHERENT_SYSMEM: u32 = 2;
}

/// `BCR_DMACFG_SEC` fields.
pub mod dmacfg_sec {
    pub const WPRID_MASK: u32 = 0xf;
}

/// Privilege-level-mask register layout shared by every `*_PLM` register.
pub mod plm {
    pub const LEVEL3: u32 = 1 << 3;
    pub const ALL_LEVELS: u32 = 0xf;
    pub const READ_SHIFT: u32 = 0;
    pub const WRITE_SHIFT: u32 = 4;
    pub const READ_VIOLATION_REPORT_ERROR: u32 = 1 << 8;
    pub const WRITE_VIOLATION_REPORT_ERROR: u32 = 1 << 9;
    pub const SOURCE_SHIFT: u32 = 12;
    /// Accesses issued by this core.
    pub const SOURCE_LOCAL_CORE: u32 = 1 << SOURCE_SHIFT;
    pub const SOURCE_ALL: u32 = 0xf_ffff << SOURCE_SHIFT;

    /// Builds a PLM word.
    pub const fn word(read_levels: u32, write_levels: u32, sources: u32) -> u32 {
        ((read_levels & ALL_LEVELS) << READ_SHIFT)
            | ((write_levels & ALL_LEVELS) << WRITE_SHIFT)
            | (sources & SOURCE_ALL)
    }

    /// Machine level only, violations reported, every other initiator blocked.
    pub const MACHINE_ONLY_LOCKED: u32 = word(LEVEL3, LEVEL3, SOURCE_LOCAL_CORE)
        | READ_VIOLATION_REPORT_ERROR
        | WRITE_VIOLATION_REPORT_ERROR;

    /// Every level may read and write.
    pub const OPEN: u32 = (ALL_LEVELS << READ_SHIFT) | (ALL_LEVELS << WRITE_SHIFT);
}

/// `CTXSW_FSM_CTL` fields.
pub mod ctxsw {
    pub const ENABLE: u32 = 1 << 0;
}

/// `SCTL` fields.
pub mod sctl {
    pub const SECURE_TXN: u32 = 1 << 4;
}

/// `FBIF_CTL` / `TFBIF_CTL` fields.
pub mod fbif {
    pub const ENABLE: u32 = 1 << 0;
    pub const ALLOW_PHYS_NO_CTX: u32 = 1 << 7;
}

bitflags! {
    /// External interrupt sources routed by `IRQDELEG`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct IrqSources: u32 {
        const GPTMR = 1 << 0;
        const WDTMR = 1 << 1;
        const MTHD = 1 << 2;
        const CTXSW = 1 << 3;
        const HALT = 1 << 4;
        const EXTERR = 1 << 5;
        const SWGEN0 = 1 << 6;
        const SWGEN1 = 1 << 7;
        const EXT = 1 << 8;
        const MEMERR = 1 << 9;
        const ICD = 1 << 10;
        const IOPMP = 1 << 11;
    }
}
