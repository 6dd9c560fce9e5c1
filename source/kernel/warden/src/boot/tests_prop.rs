// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Property-based tests for privilege propagation and entry computation
//! OWNERS: @kernel-boot-team
//! NOTE: Tests only; no kernel logic.
//!
//! TEST_SCENARIOS:
//!   - propagation_is_bit_exact(): S/U PLM equals M PLM for every mask, other bits untouched
//!   - rpl_is_highest_granted_level(): requested level is the top set bit
//!   - entry_is_page_aligned(): any offset/code size/target yields a 4 KiB aligned entry
//!   - entry_never_precedes_image(): the FMC starts at or after the end of this image

use proptest::prelude::*;

use super::entry::{entry_address, CodeTarget};
use super::*;
use crate::amap::PAGE_SIZE;
use crate::engine::Gsp;
use crate::hal::regs::{dmacfg, BCR_DMAADDR_FMCCODE_LO, BCR_DMACFG};
use crate::hal::sim::SimHart;

fn propagate(mspm: u64, sspm: u64, uspm: u64) -> SimHart {
    let hart = SimHart::new()
        .with_csr::<Mspm>(mspm)
        .with_csr::<Sspm>(sspm)
        .with_csr::<Uspm>(uspm);
    let manifest = Manifest::EMPTY;
    Boot::<_, Gsp, phase::CoreConfigured>::new_at(&hart, &manifest).propagate_privileges();
    hart
}

impl<'a, H: Hart, E: EngineHardening> Boot<'a, H, E, phase::CoreConfigured> {
    /// Enters the sequence right before propagation.
    fn new_at(hart: &'a H, manifest: &'a Manifest) -> Self {
        Boot::<H, E, phase::Start>::new(hart, manifest, ImageInfo { code_size: 0 }).advance()
    }
}

#[test]
fn propagation_is_bit_exact_for_all_masks() {
    for mask in 0u64..16 {
        let hart = propagate(mask, 0xf, 0);
        assert_eq!(hart.csr::<Sspm>() & spm::PLM_MASK, mask);
        assert_eq!(hart.csr::<Uspm>() & spm::PLM_MASK, mask);
        assert_eq!(hart.csr::<Mrsp>() & rsp::RPL_MASK, highest_level(mask as u8) as u64);
    }
}

fn target() -> impl Strategy<Value = CodeTarget> {
    prop_oneof![
        Just(CodeTarget::LocalFb),
        Just(CodeTarget::CoherentSysmem),
        Just(CodeTarget::NoncoherentSysmem),
    ]
}

proptest! {
    #[test]
    fn propagation_is_bit_exact(mspm in any::<u64>(), sspm in any::<u64>(), uspm in any::<u64>()) {
        let hart = propagate(mspm, sspm, uspm);
        let plm = mspm & spm::PLM_MASK;
        prop_assert_eq!(hart.csr::<Sspm>(), (sspm & !spm::PLM_MASK) | plm);
        prop_assert_eq!(hart.csr::<Uspm>(), (uspm & !spm::PLM_MASK) | plm);
        prop_assert_eq!(hart.csr::<Mspm>(), mspm);
    }

    #[test]
    fn rpl_is_highest_granted_level(mask in 1u8..16) {
        let level = highest_level(mask) as u8;
        prop_assert!(mask & (1 << level) != 0);
        prop_assert!(mask >> level == 1);
    }

    #[test]
    fn entry_is_page_aligned(
        target in target(),
        raw_offset in any::<u64>(),
        code_size in 0u64..(1 << 24),
        alias in any::<bool>(),
    ) {
        prop_assert_eq!(entry_address(target, raw_offset, code_size, alias) % PAGE_SIZE, 0);
    }

    #[test]
    fn entry_never_precedes_image(
        target in target(),
        raw_offset in 0u64..(1 << 24),
        code_size in 0u64..(1 << 24),
    ) {
        let entry = entry_address(target, raw_offset, code_size, false);
        let image_end = target.aperture().start + (raw_offset << 8) + code_size;
        prop_assert!(entry >= image_end);
        prop_assert!(entry - image_end < PAGE_SIZE);
    }

    #[test]
    fn boot_entry_matches_registers(lo in any::<u32>(), wpr in any::<u8>()) {
        let hart = SimHart::new()
            .with_reg(BCR_DMACFG, dmacfg::TARGET_NONCOHERENT_SYSMEM)
            .with_reg(BCR_DMAADDR_FMCCODE_LO, lo);
        let mut manifest = Manifest::EMPTY;
        manifest.payload.wpr_id = wpr;
        // SAFETY: one token per simulated boot.
        let token = unsafe { LockdownToken::new() };
        run::<_, Gsp>(&hart, &manifest, ImageInfo { code_size: 0x400 }, token);
        let expected = entry_address(CodeTarget::NoncoherentSysmem, u64::from(lo), 0x400, config::PA_ALIAS);
        prop_assert_eq!(hart.csr::<Mepc>(), expected);
        prop_assert_eq!(hart.csr::<Mfetchattr>() >> 8, u64::from(wpr));
    }
}
