// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]
#![deny(clippy::all, missing_docs)]
#![forbid(clippy::unwrap_used)]

//! CONTEXT: Boot manifest layout consumed by the WARDEN separation kernel
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! API_STABILITY: Frozen (bit-exact layout shared with the offline signing tooling)
//! TEST_COVERAGE: Unit + property tests (layout offsets, sentinels, reserved bytes)
//! PUBLIC API: Manifest, ManifestHeader, ManifestPayload, ManifestBool, ManifestError,
//!             CorePmpEntry, IoPmpEntry, RegisterPatch, MANIFEST_SIZE
//! DEPENDS_ON: bitflags, static_assertions
//! INVARIANTS: repr(C) without implicit padding; size == MANIFEST_SIZE checked at build time;
//!             reserved bytes zero; booleans use the 0xAA/0x55 sentinels
//!
//! The manifest is authenticated by the boot ROM before the kernel runs. This
//! crate never interprets the signature; it only exposes the authenticated
//! fields read-only.

use core::fmt;

mod layout;
mod pmp;

pub use layout::{
    CryptoParams, Manifest, ManifestHeader, ManifestPayload, PrivMasks, CORE_PMP_ENTRIES,
    HEADER_SIZE, IO_PMP_ENTRIES, MANIFEST_SIZE, PAYLOAD_RESERVED, REGISTER_PATCH_ENTRIES,
    SIZE_UNIT,
};
pub use pmp::{CorePmpEntry, IoPmpCfg, IoPmpEntry, PmpCfg, PmpMode, RegisterPatch};

use bitflags::bitflags;

/// Result type returned by manifest accessors.
pub type Result<T> = core::result::Result<T, ManifestError>;

/// Errors reported while reading an authenticated manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestError {
    /// A boolean field holds a byte other than the two sentinels.
    InvalidBool {
        /// Name of the offending field.
        field: &'static str,
        /// Raw byte found in the manifest.
        raw: u8,
    },
    /// A reserved byte is non-zero.
    ReservedNonZero {
        /// Byte offset from the start of the manifest.
        offset: usize,
    },
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBool { field, raw } => {
                write!(f, "manifest field `{field}` holds invalid boolean 0x{raw:02x}")
            }
            Self::ReservedNonZero { offset } => {
                write!(f, "manifest reserved byte at offset {offset} is non-zero")
            }
        }
    }
}

/// Boolean stored with corruption-detecting sentinels.
///
/// `0x00` and `0x01` are deliberately invalid: a single flipped bit can never
/// turn one sentinel into the other.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManifestBool(u8);

impl ManifestBool {
    /// Encoded `true`.
    pub const TRUE: Self = Self(0xAA);
    /// Encoded `false`.
    pub const FALSE: Self = Self(0x55);

    /// Encodes `value`.
    pub const fn new(value: bool) -> Self {
        if value {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }

    /// Wraps a raw manifest byte without checking it.
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw byte.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Decodes the sentinel, returning `None` for any other byte.
    pub const fn get(self) -> Option<bool> {
        match self.0 {
            0xAA => Some(true),
            0x55 => Some(false),
            _ => None,
        }
    }

    pub(crate) fn decode(self, field: &'static str) -> Result<bool> {
        self.get().ok_or(ManifestError::InvalidBool { field, raw: self.0 })
    }
}

bitflags! {
    /// Debug access control bits granted by the manifest.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DebugControl: u32 {
        /// In-circuit debug may be enabled by the firmware posture.
        const ICD = 1 << 0;
        /// Instruction trace capture is permitted.
        const TRACE = 1 << 1;
        /// External (JTAG) debug access is permitted.
        const EXTERNAL = 1 << 2;
    }
}

#[cfg(test)]
mod tests_prop;
