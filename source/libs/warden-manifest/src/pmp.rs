// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed-size manifest table entries: core PMP, IO-PMP and register patches.

use bitflags::bitflags;

bitflags! {
    /// Core PMP configuration byte (RISC-V `pmpcfg` encoding).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PmpCfg: u8 {
        /// Read permission.
        const R = 1 << 0;
        /// Write permission.
        const W = 1 << 1;
        /// Execute permission.
        const X = 1 << 2;
        /// Address-matching mode field (see [`PmpMode`]).
        const A = 0b11 << 3;
        /// Entry is locked and also applies to machine mode.
        const L = 1 << 7;
    }
}

/// Address-matching mode of a core PMP entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PmpMode {
    /// Entry disabled.
    Off,
    /// Top-of-range.
    Tor,
    /// Naturally aligned four-byte region.
    Na4,
    /// Naturally aligned power-of-two region.
    Napot,
}

/// One core PMP entry as programmed by the boot ROM.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CorePmpEntry {
    /// `pmpaddr` value (physical address shifted right by two).
    pub address: u64,
    /// `pmpcfg` byte.
    pub cfg: u8,
    /// Must be zero.
    pub reserved: [u8; 7],
}

impl CorePmpEntry {
    /// Disabled entry.
    pub const EMPTY: Self = Self { address: 0, cfg: 0, reserved: [0; 7] };

    /// Returns the permission/lock bits.
    pub fn cfg(&self) -> PmpCfg {
        PmpCfg::from_bits_truncate(self.cfg)
    }

    /// Decodes the address-matching mode.
    pub fn mode(&self) -> PmpMode {
        match (self.cfg >> 3) & 0b11 {
            0 => PmpMode::Off,
            1 => PmpMode::Tor,
            2 => PmpMode::Na4,
            _ => PmpMode::Napot,
        }
    }

    /// Returns `true` unless the entry is switched off.
    pub fn is_active(&self) -> bool {
        self.mode() != PmpMode::Off
    }
}

bitflags! {
    /// IO-PMP entry configuration word.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct IoPmpCfg: u32 {
        /// Device reads permitted.
        const READ = 1 << 0;
        /// Device writes permitted.
        const WRITE = 1 << 1;
        /// Entry cannot be changed until reset.
        const LOCK = 1 << 7;
    }
}

/// One IO-PMP range restricting device/DMA-initiated accesses.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoPmpEntry {
    /// Permission bits in [7:0], initiator mask in [31:16].
    pub cfg: u32,
    /// Must be zero.
    pub reserved: u32,
    /// Inclusive range start.
    pub address_lo: u64,
    /// Inclusive range end.
    pub address_hi: u64,
}

impl IoPmpEntry {
    /// Unused entry.
    pub const EMPTY: Self = Self { cfg: 0, reserved: 0, address_lo: 0, address_hi: 0 };

    /// Returns the permission/lock bits.
    pub fn cfg(&self) -> IoPmpCfg {
        IoPmpCfg::from_bits_truncate(self.cfg)
    }

    /// Returns the initiator (bus master) mask.
    pub fn initiators(&self) -> u16 {
        (self.cfg >> 16) as u16
    }

    /// Returns the inclusive `(start, end)` range.
    pub fn range(&self) -> (u64, u64) {
        (self.address_lo, self.address_hi)
    }
}

/// Read-modify-write instruction applied to one register by the boot ROM.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterPatch {
    /// Register address; zero terminates the list.
    pub address: u32,
    /// Bits kept from the current value.
    pub and_mask: u32,
    /// Bits forced to one afterwards.
    pub or_mask: u32,
}

impl RegisterPatch {
    /// Terminator entry.
    pub const EMPTY: Self = Self { address: 0, and_mask: 0, or_mask: 0 };

    /// Computes the patched value of a register currently holding `value`.
    pub const fn apply(&self, value: u32) -> u32 {
        (value & self.and_mask) | self.or_mask
    }

    /// Returns `true` for the list terminator.
    pub const fn is_terminator(&self) -> bool {
        self.address == 0
    }
}
