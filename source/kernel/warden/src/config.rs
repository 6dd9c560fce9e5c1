// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Build-time configuration derived from cargo features
//! OWNERS: @kernel-boot-team
//! PUBLIC API: DEBUG_POSTURE, FBIF, BTB_ENABLED, LS_WPR_ID, HANDOFF_VERSION, SBI_HALT_ON_ERROR
//! INVARIANTS: Every value is a compile-time constant; conflicting feature pairs resolve to the
//!             more restrictive choice so `--all-features` builds stay valid

use crate::debug::DebugPosture;

/// ICD posture applied during debug lockdown.
///
/// `debug_min` wins over `debug_max` when both are enabled.
pub const DEBUG_POSTURE: DebugPosture = if cfg!(feature = "debug_min") {
    DebugPosture::Minimized
} else if cfg!(feature = "debug_max") {
    DebugPosture::Maximum
} else {
    DebugPosture::LockedDown
};

/// Framebuffer interface block present on this chip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FbifKind {
    /// `FBIF_CTL`.
    Legacy,
    /// `TFBIF_CTL`.
    Transcoding,
}

pub const FBIF: FbifKind = if cfg!(feature = "tfbif") {
    FbifKind::Transcoding
} else {
    FbifKind::Legacy
};

/// Whether the branch-target buffer is enabled together with RAS and BHT.
pub const BTB_ENABLED: bool = !cfg!(feature = "no_btb");

/// Whether the partition entry is rebased into the physical alias window.
pub const PA_ALIAS: bool = cfg!(feature = "pa_alias");

/// WPR identifier the boot ROM programs when the image was loaded as light-secure.
pub const LS_WPR_ID: u32 = 2;

/// Value handed to the FMC in `a0`.
pub const HANDOFF_VERSION: usize = 1;

/// Whether any failed SBI call halts the core.
pub const SBI_HALT_ON_ERROR: bool = cfg!(feature = "sbi_halt_on_error");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_build_is_locked_down() {
        if !cfg!(any(feature = "debug_min", feature = "debug_max")) {
            assert_eq!(DEBUG_POSTURE, DebugPosture::LockedDown);
        }
        if cfg!(feature = "debug_min") {
            assert_eq!(DEBUG_POSTURE, DebugPosture::Minimized);
        }
    }

    #[test]
    fn ls_wpr_id_fits_register_field() {
        assert_eq!(LS_WPR_ID & !crate::hal::regs::dmacfg_sec::WPRID_MASK, 0);
    }
}
