// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Property-based tests for manifest sentinels and table entries
//! OWNERS: @kernel-boot-team
//! NOTE: Tests only; no kernel logic.
//!
//! TEST_SCENARIOS:
//!   - only_sentinels_decode(): every byte but 0xAA/0x55 is rejected
//!   - patch_apply_respects_masks(): and/or masks compose as documented
//!   - stray_reserved_byte_is_always_caught(): any non-zero reserved byte fails validation

use proptest::prelude::*;

use super::{Manifest, ManifestBool, ManifestError, RegisterPatch, HEADER_SIZE, PAYLOAD_RESERVED};

proptest! {
    #[test]
    fn only_sentinels_decode(raw in any::<u8>()) {
        let decoded = ManifestBool::from_raw(raw).get();
        match raw {
            0xAA => prop_assert_eq!(decoded, Some(true)),
            0x55 => prop_assert_eq!(decoded, Some(false)),
            _ => prop_assert_eq!(decoded, None),
        }
    }

    #[test]
    fn sentinel_encoding_roundtrips(value in any::<bool>()) {
        prop_assert_eq!(ManifestBool::new(value).get(), Some(value));
    }

    #[test]
    fn patch_apply_respects_masks(value in any::<u32>(), and_mask in any::<u32>(), or_mask in any::<u32>()) {
        let patch = RegisterPatch { address: 0x40, and_mask, or_mask };
        let patched = patch.apply(value);
        prop_assert_eq!(patched & or_mask, or_mask);
        prop_assert_eq!(patched & !or_mask, value & and_mask & !or_mask);
    }

    #[test]
    fn stray_reserved_byte_is_always_caught(index in 0usize..PAYLOAD_RESERVED, byte in 1u8..=255) {
        let mut manifest = Manifest::EMPTY;
        manifest.payload.reserved[index] = byte;
        let expected = HEADER_SIZE + core::mem::offset_of!(super::ManifestPayload, reserved) + index;
        prop_assert_eq!(manifest.validate(), Err(ManifestError::ReservedNonZero { offset: expected }));
    }
}
