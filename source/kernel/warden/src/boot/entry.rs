// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Partition entry computation.
//!
//! The boot ROM leaves the FMC code location in `BCR_DMACFG.TARGET` and the
//! `BCR_DMAADDR_FMCCODE_*` pair. This kernel's own image sits first in that
//! region, so the FMC starts at the next page after it.

use core::fmt;

use crate::amap::{align_up, Aperture, FBGPA, PAGE_SIZE, SYSGPA};
use crate::arch::riscv::csr::attr;
use crate::hal::regs::{
    dmacfg, BCR_DMAADDR_FMCCODE_HI, BCR_DMAADDR_FMCCODE_LO, BCR_DMACFG,
};
use crate::hal::Hart;

/// Memory the FMC code was loaded into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeTarget {
    LocalFb,
    CoherentSysmem,
    NoncoherentSysmem,
}

impl CodeTarget {
    pub const fn aperture(self) -> &'static Aperture {
        match self {
            CodeTarget::LocalFb => &FBGPA,
            CodeTarget::CoherentSysmem | CodeTarget::NoncoherentSysmem => &SYSGPA,
        }
    }

    pub const fn is_coherent(self) -> bool {
        matches!(self, CodeTarget::CoherentSysmem)
    }
}

impl TryFrom<u32> for CodeTarget {
    type Error = EntryError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            dmacfg::TARGET_LOCAL_FB => Ok(CodeTarget::LocalFb),
            dmacfg::TARGET_COHERENT_SYSMEM => Ok(CodeTarget::CoherentSysmem),
            dmacfg::TARGET_NONCOHERENT_SYSMEM => Ok(CodeTarget::NoncoherentSysmem),
            other => Err(EntryError::UnknownTarget(other)),
        }
    }
}

/// Reasons the partition entry cannot be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryError {
    /// `BCR_DMACFG.TARGET` holds a value with no aperture behind it.
    UnknownTarget(u32),
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryError::UnknownTarget(raw) => write!(f, "unknown code target {raw}"),
        }
    }
}

/// Where and how the FMC runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    pub target: CodeTarget,
    /// Physical address loaded into `mepc`.
    pub entry: u64,
    /// Value for `mfetchattr` and `mldstattr`.
    pub attributes: u64,
}

impl Partition {
    /// Derives the partition from the boot-ROM registers.
    pub fn locate<H: Hart>(
        hart: &H,
        code_size: u64,
        wpr_id: u8,
        pa_alias: bool,
    ) -> Result<Self, EntryError> {
        let target = CodeTarget::try_from(hart.reg_read(BCR_DMACFG) & dmacfg::TARGET_MASK)?;
        let lo = hart.reg_read(BCR_DMAADDR_FMCCODE_LO);
        let hi = hart.reg_read(BCR_DMAADDR_FMCCODE_HI);
        let raw_offset = (u64::from(hi) << 32) | u64::from(lo);
        Ok(Self {
            target,
            entry: entry_address(target, raw_offset, code_size, pa_alias),
            attributes: attributes(target, wpr_id),
        })
    }
}

/// `base(target) + (raw_offset << 8) + code_size`, page aligned, optionally
/// moved into the aperture's physical alias window.
pub fn entry_address(target: CodeTarget, raw_offset: u64, code_size: u64, pa_alias: bool) -> u64 {
    let aperture = target.aperture();
    let entry = align_up(
        aperture.start.wrapping_add(raw_offset << 8).wrapping_add(code_size),
        PAGE_SIZE,
    );
    if pa_alias {
        aperture.to_alias(entry)
    } else {
        entry
    }
}

/// Fetch and load/store attributes for code living in `target`.
pub fn attributes(target: CodeTarget, wpr_id: u8) -> u64 {
    let coherent = if target.is_coherent() { attr::COHERENT } else { 0 };
    attr::CACHEABLE | coherent | ((u64::from(wpr_id) << attr::WPR_SHIFT) & attr::WPR_MASK)
}
