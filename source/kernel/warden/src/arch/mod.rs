// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Architecture specific support code
//! OWNERS: @kernel-arch-team
//! PUBLIC API: arch backends under `arch::<isa>`
//! DEPENDS_ON: per-ISA modules (riscv)
//! INVARIANTS: Keep inline assembly isolated behind module boundaries

pub mod riscv;
