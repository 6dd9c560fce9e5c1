// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Core address map (apertures the partition code can live in)
//! OWNERS: @kernel-boot-team
//! PUBLIC API: Aperture, FBGPA, SYSGPA, align_up()
//! DEPENDS_ON: static_assertions
//! INVARIANTS: Aperture sizes are powers of two; starts and alias bases are size-aligned

use static_assertions::const_assert;

/// Granule the partition entry point is aligned to.
pub const PAGE_SIZE: u64 = 4096;

/// A window of the core's physical address space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aperture {
    /// First address of the window.
    pub start: u64,
    /// Window size in bytes.
    pub size: u64,
    /// Base of the physical-alias view of the same window.
    pub alias: u64,
}

impl Aperture {
    /// Whether `addr` falls inside the window.
    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr - self.start < self.size
    }

    /// Translates `addr` from this window into its physical-alias view.
    ///
    /// The offset inside the window is preserved, so any alignment below the
    /// window size is preserved too.
    pub const fn to_alias(&self, addr: u64) -> u64 {
        self.alias.wrapping_add(addr.wrapping_sub(self.start))
    }
}

/// Framebuffer (GPU-local memory) aperture.
pub const FBGPA: Aperture = Aperture {
    start: 0x0000_0010_0000_0000,
    size: 1 << 36,
    alias: 0x0000_4010_0000_0000,
};

/// System memory aperture, coherent and non-coherent targets alike.
pub const SYSGPA: Aperture = Aperture {
    start: 0x0000_0080_0000_0000,
    size: 1 << 39,
    alias: 0x0000_4080_0000_0000,
};

const_assert!(FBGPA.size.is_power_of_two());
const_assert!(SYSGPA.size.is_power_of_two());
const_assert!(FBGPA.start % FBGPA.size == 0);
const_assert!(SYSGPA.start % SYSGPA.size == 0);
const_assert!(FBGPA.alias % FBGPA.size == 0);
const_assert!(SYSGPA.alias % SYSGPA.size == 0);
const_assert!(FBGPA.start + FBGPA.size <= SYSGPA.start);
const_assert!(PAGE_SIZE.is_power_of_two());

/// Rounds `value` up to a multiple of `align`, which must be a power of two.
///
/// Wraps at the top of the address space instead of overflowing.
#[inline]
pub const fn align_up(value: u64, align: u64) -> u64 {
    value.wrapping_add(align - 1) & !(align - 1)
}
