// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Boot diagnostics
//! OWNERS: @kernel-boot-team
//! PUBLIC API: log_* macros, log::emit()
//! DEPENDS_ON: spin, engine print FIFO (debug_log builds only)

#[macro_use]
pub mod log;
