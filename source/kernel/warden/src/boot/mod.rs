// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Boot orchestrator (privilege setup, lockdown release, FMC hand-off)
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Full sequence, per-step effects and ordering against the simulated hart
//!   - boot/tests.rs: sequence, LS path, shutdown on bad target, release ordering
//!   - boot/tests_prop.rs: PLM propagation and entry alignment properties
//! PUBLIC API: run(), Boot<Phase>, Handoff, LockdownToken, ImageInfo, PrivLevel, highest_level(),
//!             ls_init_required()
//! DEPENDS_ON: hal::Hart, engine::EngineHardening, debug, config, boot::entry
//! INVARIANTS: Steps run in a fixed order enforced by phase types; the lockdown token is
//!             consumed exactly once; an unknown code target never reaches `mret`

pub mod entry;

use core::marker::PhantomData;

use riscv::register::mstatus::MPP;
use static_assertions::assert_not_impl_any;

use crate::arch::riscv::csr::{
    counteren, mbpcfg, mcfg, mmiscopen, mstatus, rsp, spm, Exceptions, Interrupts, Mbpcfg, Mcfg,
    Mcounteren, Medeleg, Mepc, Mfetchattr, Mideleg, Mldstattr, Mmiscopen, Mrsp, Mspm, Mstatus,
    Mtvec, Srsp, Sspm, Stvec, Uspm,
};
use crate::config;
use crate::engine::EngineHardening;
use crate::hal::regs::{
    dmacfg_sec, fbif, lockdown, BCR_DMACFG_SEC, FBIF_CTL, IRQDELEG, PRIV_LOCKDOWN, TFBIF_CTL,
};
use crate::hal::Hart;
use crate::manifest::Manifest;
use crate::shutdown::shutdown;

use self::entry::Partition;

/// Facts about this kernel image supplied by the boot wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    /// Size in bytes of this kernel's code; the FMC is placed after it.
    pub code_size: u64,
}

/// Permission to clear `PRIV_LOCKDOWN`. There is exactly one per boot.
#[derive(Debug)]
pub struct LockdownToken {
    _private: (),
}

assert_not_impl_any!(LockdownToken: Clone, Copy);

impl LockdownToken {
    /// # Safety
    ///
    /// At most one token may exist per boot. Clearing the lockdown lets the
    /// FMC be scheduled, so the token must only reach `release` once every
    /// privilege register is final.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

/// Privilege levels as numbered by the PLM and RPL fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum PrivLevel {
    Level0 = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
}

/// Highest level granted by a 4-bit PLM mask; an empty mask yields level 0.
pub const fn highest_level(plm: u8) -> PrivLevel {
    if plm & 0b1000 != 0 {
        PrivLevel::Level3
    } else if plm & 0b0100 != 0 {
        PrivLevel::Level2
    } else if plm & 0b0010 != 0 {
        PrivLevel::Level1
    } else {
        PrivLevel::Level0
    }
}

/// Whether the boot ROM loaded this image as light-secure, in which case
/// the level-2 privilege fields must be programmed here.
pub fn ls_init_required<H: Hart>(hart: &H) -> bool {
    hart.reg_read(BCR_DMACFG_SEC) & dmacfg_sec::WPRID_MASK == config::LS_WPR_ID
}

/// Phase markers. Each `Boot` method consumes one phase and yields the next.
pub mod phase {
    pub struct Start;
    pub struct PrivInit;
    pub struct DebugLocked;
    pub struct Delegated;
    pub struct CoreConfigured;
    pub struct PrivPropagated;
    pub struct Hardened;
    pub struct InterfaceUp;
    pub struct Released;
}

/// Boot sequence in phase `P`, hardening with engine `E`.
pub struct Boot<'a, H: Hart, E: EngineHardening, P> {
    hart: &'a H,
    manifest: &'a Manifest,
    image: ImageInfo,
    _phase: PhantomData<(E, P)>,
}

impl<'a, H: Hart, E: EngineHardening, P> Boot<'a, H, E, P> {
    fn advance<N>(self) -> Boot<'a, H, E, N> {
        Boot {
            hart: self.hart,
            manifest: self.manifest,
            image: self.image,
            _phase: PhantomData,
        }
    }
}

impl<'a, H: Hart, E: EngineHardening> Boot<'a, H, E, phase::Start> {
    pub fn new(hart: &'a H, manifest: &'a Manifest, image: ImageInfo) -> Self {
        Self { hart, manifest, image, _phase: PhantomData }
    }

    /// Programs the level-2 fields when the image was loaded light-secure.
    pub fn init_ls_privileges(self) -> Boot<'a, H, E, phase::PrivInit> {
        let hart = self.hart;
        if ls_init_required(hart) {
            hart.csr_set::<Mspm>(spm::PLM_LEVEL2);
            hart.csr_set::<Sspm>(spm::PLM_LEVEL2);
            hart.csr_set::<Uspm>(spm::PLM_LEVEL2);
            hart.csr_modify::<Mrsp>(rsp::RPL_MASK, PrivLevel::Level2 as u64);
            hart.csr_modify::<Srsp>(rsp::RPL_MASK, PrivLevel::Level2 as u64);
            log_info!(target: "boot", "ls privilege init done");
        } else {
            log_debug!(target: "boot", "ls privilege init skipped");
        }
        self.advance()
    }
}

impl<'a, H: Hart, E: EngineHardening> Boot<'a, H, E, phase::PrivInit> {
    pub fn lock_debug(self) -> Boot<'a, H, E, phase::DebugLocked> {
        config::DEBUG_POSTURE.apply(self.hart);
        self.advance()
    }
}

impl<'a, H: Hart, E: EngineHardening> Boot<'a, H, E, phase::DebugLocked> {
    /// Routes supervisor interrupts, lower-mode faults and engine external
    /// sources to S-mode.
    pub fn delegate(self) -> Boot<'a, H, E, phase::Delegated> {
        let hart = self.hart;
        hart.csr_write::<Mideleg>(DELEGATED_INTERRUPTS.bits());
        hart.csr_write::<Medeleg>(DELEGATED_EXCEPTIONS.bits());
        hart.reg_write(IRQDELEG, E::IRQ_DELEG_SOURCES.bits());
        self.advance()
    }
}

/// Interrupts handled by the partition.
pub const DELEGATED_INTERRUPTS: Interrupts = Interrupts::SUPERVISOR_SOFT
    .union(Interrupts::SUPERVISOR_TIMER)
    .union(Interrupts::SUPERVISOR_EXTERNAL);

/// Exceptions handled by the partition. S-mode ecalls stay here for SBI.
pub const DELEGATED_EXCEPTIONS: Exceptions = Exceptions::FETCH_MISALIGNED
    .union(Exceptions::ILLEGAL_INSTRUCTION)
    .union(Exceptions::BREAKPOINT)
    .union(Exceptions::LOAD_MISALIGNED)
    .union(Exceptions::STORE_MISALIGNED)
    .union(Exceptions::ECALL_FROM_U)
    .union(Exceptions::FETCH_PAGE_FAULT)
    .union(Exceptions::LOAD_PAGE_FAULT)
    .union(Exceptions::STORE_PAGE_FAULT);

/// Branch predictor bits set at boot.
pub const fn branch_predictor_bits(btb: bool) -> u64 {
    let base = mbpcfg::RAS_EN | mbpcfg::RAS_FLUSH | mbpcfg::BHT_EN | mbpcfg::BHT_FLUSH;
    if btb {
        base | mbpcfg::BTB_EN | mbpcfg::BTB_FLUSH
    } else {
        base
    }
}

impl<'a, H: Hart, E: EngineHardening> Boot<'a, H, E, phase::Delegated> {
    /// Timer visibility, cache/system op enables and branch prediction.
    pub fn configure_core(self) -> Boot<'a, H, E, phase::CoreConfigured> {
        let hart = self.hart;
        hart.csr_set::<Mcounteren>(counteren::TM);
        hart.csr_set::<Mmiscopen>(mmiscopen::DCACHEOP);
        if hart.csr_read::<Mcfg>() & mcfg::SYSOP_PRESENT != 0 {
            hart.csr_set::<Mmiscopen>(mmiscopen::SYSOP);
        }
        hart.csr_set::<Mbpcfg>(branch_predictor_bits(config::BTB_ENABLED));
        self.advance()
    }
}

impl<'a, H: Hart, E: EngineHardening> Boot<'a, H, E, phase::CoreConfigured> {
    /// Copies the machine PLM into the S/U masks and raises both requested
    /// levels to its highest granted level.
    pub fn propagate_privileges(self) -> Boot<'a, H, E, phase::PrivPropagated> {
        let hart = self.hart;
        let plm = hart.csr_read::<Mspm>() & spm::PLM_MASK;
        hart.csr_modify::<Sspm>(spm::PLM_MASK, plm);
        hart.csr_modify::<Uspm>(spm::PLM_MASK, plm);
        let level = highest_level(plm as u8);
        hart.csr_modify::<Mrsp>(rsp::RPL_MASK, level as u64);
        hart.csr_modify::<Srsp>(rsp::RPL_MASK, level as u64);
        log_debug!(target: "boot", "plm={:#06b} rpl={:?}", plm, level);
        self.advance()
    }
}

impl<'a, H: Hart, E: EngineHardening> Boot<'a, H, E, phase::PrivPropagated> {
    pub fn harden_engine(self) -> Boot<'a, H, E, phase::Hardened> {
        E::apply(self.hart);
        self.advance()
    }
}

impl<'a, H: Hart, E: EngineHardening> Boot<'a, H, E, phase::Hardened> {
    pub fn enable_interface(self) -> Boot<'a, H, E, phase::InterfaceUp> {
        let ctl = match config::FBIF {
            config::FbifKind::Legacy => FBIF_CTL,
            config::FbifKind::Transcoding => TFBIF_CTL,
        };
        self.hart.reg_set_bits(ctl, fbif::ENABLE | fbif::ALLOW_PHYS_NO_CTX);
        self.advance()
    }
}

impl<'a, H: Hart, E: EngineHardening> Boot<'a, H, E, phase::InterfaceUp> {
    /// Clears the boot lockdown. Privilege state is frozen from here on.
    pub fn release(self, token: LockdownToken) -> Boot<'a, H, E, phase::Released> {
        let LockdownToken { _private: () } = token;
        self.hart.reg_clear_bits(PRIV_LOCKDOWN, lockdown::LOCK);
        log_info!(target: "boot", "lockdown released");
        self.advance()
    }
}

impl<'a, H: Hart, E: EngineHardening> Boot<'a, H, E, phase::Released> {
    /// Locates the FMC and programs its memory attributes. Shuts the core
    /// down if the boot ROM left an unknown code target.
    pub fn compute_entry(self) -> Handoff<'a, H> {
        let hart = self.hart;
        let partition = match Partition::locate(
            hart,
            self.image.code_size,
            self.manifest.wpr_id(),
            config::PA_ALIAS,
        ) {
            Ok(partition) => partition,
            Err(err) => {
                log_error!(target: "boot", "{}", err);
                shutdown(hart)
            }
        };
        hart.csr_write::<Mfetchattr>(partition.attributes);
        hart.csr_write::<Mldstattr>(partition.attributes);
        log_info!(
            target: "boot",
            "fmc {:?} entry={:#x} attr={:#x}",
            partition.target,
            partition.entry,
            partition.attributes
        );
        Handoff { hart, partition }
    }
}

/// Final phase: the partition is known and its attributes are programmed.
pub struct Handoff<'a, H: Hart> {
    hart: &'a H,
    partition: Partition,
}

impl<H: Hart> Handoff<'_, H> {
    /// Arms `mret` into the FMC and returns the hand-off version for `a0`.
    pub fn transfer(self) -> usize {
        let hart = self.hart;
        hart.csr_write::<Mepc>(self.partition.entry);
        hart.csr_modify::<Mstatus>(
            mstatus::MPP_MASK,
            (MPP::Supervisor as u64) << mstatus::MPP_SHIFT,
        );
        hart.csr_write::<Stvec>(hart.halt_vector());
        hart.csr_write::<Mtvec>(hart.machine_trap_vector());
        config::HANDOFF_VERSION
    }
}

/// Runs the whole boot sequence and returns the hand-off version.
pub fn run<H: Hart, E: EngineHardening>(
    hart: &H,
    manifest: &Manifest,
    image: ImageInfo,
    token: LockdownToken,
) -> usize {
    log_info!(target: "boot", "warden boot engine={} version={}", E::NAME, manifest.version());
    Boot::<H, E, phase::Start>::new(hart, manifest, image)
        .init_ls_privileges()
        .lock_debug()
        .delegate()
        .configure_core()
        .propagate_privileges()
        .harden_engine()
        .enable_interface()
        .release(token)
        .compute_entry()
        .transfer()
}

#[cfg(test)]
mod tests_prop;
