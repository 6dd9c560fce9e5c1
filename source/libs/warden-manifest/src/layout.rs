// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bit-exact manifest structure and its build-time layout checks.

use core::mem::{align_of, offset_of, size_of};

use static_assertions::{const_assert, const_assert_eq};

use crate::pmp::{CorePmpEntry, IoPmpEntry, RegisterPatch};
use crate::{DebugControl, ManifestBool, ManifestError, Result};

/// Total size of a manifest in bytes.
///
/// The size is part of the contract with the signing tooling and the boot
/// ROM. A structure of any other size does not build:
///
/// ```
/// use warden_manifest::{Manifest, MANIFEST_SIZE};
/// static_assertions::const_assert_eq!(core::mem::size_of::<Manifest>(), MANIFEST_SIZE);
/// ```
///
/// Dropping a single core PMP entry from the payload breaks it:
///
/// ```compile_fail
/// use warden_manifest::*;
///
/// #[repr(C)]
/// struct ShortPayload {
///     scp_secret_mask: [u8; 16],
///     scp_secret_mask_lock: [u8; 16],
///     debug_control: u32,
///     io_pmp_mode: u32,
///     dice: ManifestBool,
///     kdf: ManifestBool,
///     attestation: ManifestBool,
///     wpr_id: u8,
///     mspm_max: u8,
///     sspm_max: u8,
///     uspm_max: u8,
///     reserved0: u8,
///     core_pmp: [CorePmpEntry; CORE_PMP_ENTRIES - 1],
///     io_pmp: [IoPmpEntry; IO_PMP_ENTRIES],
///     register_patches: [RegisterPatch; REGISTER_PATCH_ENTRIES],
///     reserved: [u8; PAYLOAD_RESERVED],
/// }
///
/// #[repr(C)]
/// struct ShortManifest {
///     header: ManifestHeader,
///     payload: ShortPayload,
/// }
///
/// static_assertions::const_assert_eq!(core::mem::size_of::<ShortManifest>(), MANIFEST_SIZE);
/// ```
pub const MANIFEST_SIZE: usize = 2560;
/// Size of the unencrypted header.
pub const HEADER_SIZE: usize = 64;
/// Number of core PMP entries carried by the manifest.
pub const CORE_PMP_ENTRIES: usize = 32;
/// Number of IO-PMP entries carried by the manifest.
pub const IO_PMP_ENTRIES: usize = 32;
/// Number of register patch slots.
pub const REGISTER_PATCH_ENTRIES: usize = 64;
/// Reserved bytes closing the payload.
pub const PAYLOAD_RESERVED: usize = 400;
/// Granule of the code/data size fields.
pub const SIZE_UNIT: usize = 256;

/// Cryptographic parameters consumed by the boot ROM.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CryptoParams {
    /// Initialisation vector of the encrypted image.
    pub iv: [u8; 16],
    /// Digest algorithm identifier.
    pub digest_alg: u8,
    /// Signature algorithm identifier.
    pub signature_alg: u8,
    /// Must be zero.
    pub reserved: [u8; 14],
}

/// Unencrypted manifest header.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManifestHeader {
    /// Layout version.
    pub version: u8,
    /// Ucode revocation identifier.
    pub ucode_id: u8,
    /// Ucode version.
    pub ucode_version: u8,
    /// Boot ROM accepts newer-or-equal versions instead of an exact match.
    pub relaxed_version_check: ManifestBool,
    /// Engines allowed to load this image.
    pub engine_id_mask: u32,
    /// Code region size in [`SIZE_UNIT`] units.
    pub code_size: u16,
    /// Data region size in [`SIZE_UNIT`] units.
    pub data_size: u16,
    /// Must be zero.
    pub reserved: [u8; 4],
    /// Crypto parameters.
    pub crypto: CryptoParams,
    /// Must be zero.
    pub reserved_tail: [u8; 16],
}

/// Authenticated manifest payload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManifestPayload {
    /// SCP secret index mask.
    pub scp_secret_mask: [u8; 16],
    /// SCP secret lock mask.
    pub scp_secret_mask_lock: [u8; 16],
    /// Raw [`DebugControl`] bits.
    pub debug_control: u32,
    /// Bit `i` enables IO-PMP entry `i`.
    pub io_pmp_mode: u32,
    /// DICE measurement requested.
    pub dice: ManifestBool,
    /// Key derivation enabled.
    pub kdf: ManifestBool,
    /// Attestation enabled.
    pub attestation: ManifestBool,
    /// Write-protected region identifier used for partition accesses.
    pub wpr_id: u8,
    /// Maximum machine-mode privilege-level mask.
    pub mspm_max: u8,
    /// Maximum supervisor-mode privilege-level mask.
    pub sspm_max: u8,
    /// Maximum user-mode privilege-level mask.
    pub uspm_max: u8,
    /// Must be zero.
    pub reserved0: u8,
    /// Core PMP table.
    pub core_pmp: [CorePmpEntry; CORE_PMP_ENTRIES],
    /// IO-PMP table.
    pub io_pmp: [IoPmpEntry; IO_PMP_ENTRIES],
    /// Register patches, terminated by a zero address.
    pub register_patches: [RegisterPatch; REGISTER_PATCH_ENTRIES],
    /// Must be zero.
    pub reserved: [u8; PAYLOAD_RESERVED],
}

/// Complete signed manifest.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Manifest {
    /// Unencrypted header.
    pub header: ManifestHeader,
    /// Payload.
    pub payload: ManifestPayload,
}

// Structural checks. A failure here is a broken contract with the signing
// tooling, never a boot-time condition.
const_assert_eq!(size_of::<ManifestHeader>(), HEADER_SIZE);
const_assert_eq!(size_of::<CryptoParams>(), 32);
const_assert_eq!(size_of::<CorePmpEntry>(), 16);
const_assert_eq!(size_of::<IoPmpEntry>(), 24);
const_assert_eq!(size_of::<RegisterPatch>(), 12);
const_assert_eq!(size_of::<Manifest>(), MANIFEST_SIZE);
const_assert_eq!(offset_of!(Manifest, payload), HEADER_SIZE);
const_assert_eq!(offset_of!(ManifestHeader, crypto), 16);
const_assert_eq!(offset_of!(ManifestPayload, core_pmp) % align_of::<CorePmpEntry>(), 0);
const_assert_eq!(offset_of!(ManifestPayload, io_pmp) % align_of::<IoPmpEntry>(), 0);
const_assert_eq!(offset_of!(ManifestPayload, register_patches) % align_of::<RegisterPatch>(), 0);
const_assert_eq!(
    offset_of!(ManifestPayload, reserved) + PAYLOAD_RESERVED,
    size_of::<ManifestPayload>()
);
const_assert!(IO_PMP_ENTRIES <= u32::BITS as usize);

/// Maximum privilege-level masks granted by the manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrivMasks {
    /// Machine mode.
    pub machine: u8,
    /// Supervisor mode.
    pub supervisor: u8,
    /// User mode.
    pub user: u8,
}

const PLM_FIELD: u8 = 0xF;

const fn payload_offset(field: usize) -> usize {
    HEADER_SIZE + field
}

fn first_nonzero(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|&b| b != 0)
}

fn reserved_ok(bytes: &[u8], base: usize) -> Result<()> {
    match first_nonzero(bytes) {
        Some(index) => Err(ManifestError::ReservedNonZero { offset: base + index }),
        None => Ok(()),
    }
}

impl Manifest {
    /// All-zero manifest with every boolean encoded as `false`.
    pub const EMPTY: Self = Self {
        header: ManifestHeader {
            version: 0,
            ucode_id: 0,
            ucode_version: 0,
            relaxed_version_check: ManifestBool::FALSE,
            engine_id_mask: 0,
            code_size: 0,
            data_size: 0,
            reserved: [0; 4],
            crypto: CryptoParams { iv: [0; 16], digest_alg: 0, signature_alg: 0, reserved: [0; 14] },
            reserved_tail: [0; 16],
        },
        payload: ManifestPayload {
            scp_secret_mask: [0; 16],
            scp_secret_mask_lock: [0; 16],
            debug_control: 0,
            io_pmp_mode: 0,
            dice: ManifestBool::FALSE,
            kdf: ManifestBool::FALSE,
            attestation: ManifestBool::FALSE,
            wpr_id: 0,
            mspm_max: 0,
            sspm_max: 0,
            uspm_max: 0,
            reserved0: 0,
            core_pmp: [CorePmpEntry::EMPTY; CORE_PMP_ENTRIES],
            io_pmp: [IoPmpEntry::EMPTY; IO_PMP_ENTRIES],
            register_patches: [RegisterPatch::EMPTY; REGISTER_PATCH_ENTRIES],
            reserved: [0; PAYLOAD_RESERVED],
        },
    };

    /// Reinterprets the boot-ROM-provided manifest at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null, aligned for `Manifest` and point to
    /// `MANIFEST_SIZE` readable bytes that stay unmodified for `'a`.
    pub unsafe fn from_ptr<'a>(ptr: *const Manifest) -> &'a Manifest {
        // SAFETY: upheld by the caller; every bit pattern is a valid `Manifest`.
        unsafe { &*ptr }
    }

    /// Views an in-memory blob as a manifest if it is suitably aligned.
    pub fn from_bytes(bytes: &[u8; MANIFEST_SIZE]) -> Option<&Manifest> {
        let ptr = bytes.as_ptr();
        if ptr.align_offset(align_of::<Manifest>()) != 0 {
            return None;
        }
        // SAFETY: size checked at build time, alignment checked above, and the
        // structure consists of integers only so any byte pattern is valid.
        Some(unsafe { &*(ptr as *const Manifest) })
    }

    /// Returns the raw bytes of the manifest.
    pub fn as_bytes(&self) -> &[u8; MANIFEST_SIZE] {
        // SAFETY: `Manifest` is repr(C) without padding (checked at build time).
        unsafe { &*(self as *const Manifest as *const [u8; MANIFEST_SIZE]) }
    }

    /// Layout version.
    pub fn version(&self) -> u8 {
        self.header.version
    }

    /// Ucode revocation identifier.
    pub fn ucode_id(&self) -> u8 {
        self.header.ucode_id
    }

    /// Ucode version.
    pub fn ucode_version(&self) -> u8 {
        self.header.ucode_version
    }

    /// Whether the boot ROM applies the relaxed version check.
    pub fn relaxed_version_check(&self) -> Result<bool> {
        self.header.relaxed_version_check.decode("relaxed_version_check")
    }

    /// Engines allowed to run the image.
    pub fn engine_id_mask(&self) -> u32 {
        self.header.engine_id_mask
    }

    /// Code region size in bytes.
    pub fn code_size_bytes(&self) -> usize {
        usize::from(self.header.code_size) * SIZE_UNIT
    }

    /// Data region size in bytes.
    pub fn data_size_bytes(&self) -> usize {
        usize::from(self.header.data_size) * SIZE_UNIT
    }

    /// Debug access control bits; unknown bits are dropped.
    pub fn debug_control(&self) -> DebugControl {
        DebugControl::from_bits_truncate(self.payload.debug_control)
    }

    /// WPR identifier for partition fetches and loads/stores.
    pub fn wpr_id(&self) -> u8 {
        self.payload.wpr_id
    }

    /// DICE measurement flag.
    pub fn dice(&self) -> Result<bool> {
        self.payload.dice.decode("dice")
    }

    /// Key derivation flag.
    pub fn kdf(&self) -> Result<bool> {
        self.payload.kdf.decode("kdf")
    }

    /// Attestation flag.
    pub fn attestation(&self) -> Result<bool> {
        self.payload.attestation.decode("attestation")
    }

    /// Maximum privilege-level masks, each limited to the 4-bit PLM field.
    pub fn max_priv_masks(&self) -> PrivMasks {
        PrivMasks {
            machine: self.payload.mspm_max & PLM_FIELD,
            supervisor: self.payload.sspm_max & PLM_FIELD,
            user: self.payload.uspm_max & PLM_FIELD,
        }
    }

    /// Core PMP entries that are not switched off, with their index.
    pub fn core_pmp_entries(&self) -> impl Iterator<Item = (usize, &CorePmpEntry)> {
        self.payload.core_pmp.iter().enumerate().filter(|(_, entry)| entry.is_active())
    }

    /// IO-PMP entries enabled by `io_pmp_mode`, with their index.
    pub fn io_pmp_entries(&self) -> impl Iterator<Item = (usize, &IoPmpEntry)> {
        let mode = self.payload.io_pmp_mode;
        self.payload.io_pmp.iter().enumerate().filter(move |(index, _)| mode & (1 << index) != 0)
    }

    /// Register patches up to the first terminator.
    pub fn register_patches(&self) -> impl Iterator<Item = &RegisterPatch> {
        self.payload.register_patches.iter().take_while(|patch| !patch.is_terminator())
    }

    /// Checks the runtime invariants: sentinel booleans and zero reserved bytes.
    pub fn validate(&self) -> Result<()> {
        self.relaxed_version_check()?;
        self.dice()?;
        self.kdf()?;
        self.attestation()?;

        let header = &self.header;
        reserved_ok(&header.reserved, offset_of!(ManifestHeader, reserved))?;
        reserved_ok(
            &header.crypto.reserved,
            offset_of!(ManifestHeader, crypto) + offset_of!(CryptoParams, reserved),
        )?;
        reserved_ok(&header.reserved_tail, offset_of!(ManifestHeader, reserved_tail))?;

        let payload = &self.payload;
        reserved_ok(&[payload.reserved0], payload_offset(offset_of!(ManifestPayload, reserved0)))?;
        for (index, entry) in payload.core_pmp.iter().enumerate() {
            let base = payload_offset(offset_of!(ManifestPayload, core_pmp))
                + index * size_of::<CorePmpEntry>()
                + offset_of!(CorePmpEntry, reserved);
            reserved_ok(&entry.reserved, base)?;
        }
        for (index, entry) in payload.io_pmp.iter().enumerate() {
            let base = payload_offset(offset_of!(ManifestPayload, io_pmp))
                + index * size_of::<IoPmpEntry>()
                + offset_of!(IoPmpEntry, reserved);
            reserved_ok(&entry.reserved.to_le_bytes(), base)?;
        }
        reserved_ok(&payload.reserved, payload_offset(offset_of!(ManifestPayload, reserved)))
    }
}
