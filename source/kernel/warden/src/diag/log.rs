// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Minimal structured logging with severity levels
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Level gating only (the sink is hardware-only)
//! PUBLIC API: log_* macros, emit(level,target,args)
//! DEPENDS_ON: spin::Mutex, hal::regs::PRINT_FIFO
//! INVARIANTS: Compiled to nothing unless `debug_log`; Debug/Trace only in debug builds;
//!             single-line emission; never blocks on the sink lock

use core::fmt::Arguments;

/// Logging severity used by the kernel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Level {
    #[cfg_attr(not(all(feature = "debug_log", target_os = "none")), allow(dead_code))]
    const fn tag(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    const fn enabled(self) -> bool {
        if !cfg!(feature = "debug_log") {
            return false;
        }
        match self {
            Level::Debug | Level::Trace => cfg!(debug_assertions),
            _ => true,
        }
    }
}

#[cfg(all(feature = "debug_log", target_arch = "riscv64", target_os = "none"))]
mod sink {
    use core::fmt::{self, Write};

    use spin::Mutex;

    use crate::hal::regs::{LOCAL_IO_BASE, PRINT_FIFO};

    /// Byte-wide writer into the engine print FIFO.
    pub struct PrintFifo;

    impl Write for PrintFifo {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let fifo = (LOCAL_IO_BASE + PRINT_FIFO.offset() as usize) as *mut u32;
            for &byte in s.as_bytes() {
                // SAFETY: the FIFO is a fixed engine-local register; writes have no other effect.
                unsafe { core::ptr::write_volatile(fifo, u32::from(byte)) };
            }
            Ok(())
        }
    }

    pub static SINK: Mutex<PrintFifo> = Mutex::new(PrintFifo);
}

/// Emits a structured log line if the level is enabled for the current build.
pub fn emit(level: Level, target: &'static str, args: Arguments<'_>) {
    if !level.enabled() {
        return;
    }

    #[cfg(all(feature = "debug_log", target_arch = "riscv64", target_os = "none"))]
    {
        use core::fmt::Write;
        // A panic raised while logging re-enters here; drop the line instead of spinning.
        if let Some(mut fifo) = sink::SINK.try_lock() {
            let _ = write!(fifo, "[{} {}] ", level.tag(), target);
            let _ = fifo.write_fmt(args);
            let _ = fifo.write_char('\n');
        }
    }
    #[cfg(not(all(feature = "debug_log", target_arch = "riscv64", target_os = "none")))]
    {
        let _ = (target, args);
    }
}

#[macro_export]
macro_rules! log_error {
    (target: $target:expr, $($arg:tt)+) => {{
        $crate::diag::log::emit($crate::diag::log::Level::Error, $target, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        $crate::diag::log::emit($crate::diag::log::Level::Error, module_path!(), format_args!($($arg)+));
    }};
}

#[macro_export]
macro_rules! log_warn {
    (target: $target:expr, $($arg:tt)+) => {{
        $crate::diag::log::emit($crate::diag::log::Level::Warn, $target, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        $crate::diag::log::emit($crate::diag::log::Level::Warn, module_path!(), format_args!($($arg)+));
    }};
}

#[macro_export]
macro_rules! log_info {
    (target: $target:expr, $($arg:tt)+) => {{
        $crate::diag::log::emit($crate::diag::log::Level::Info, $target, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        $crate::diag::log::emit($crate::diag::log::Level::Info, module_path!(), format_args!($($arg)+));
    }};
}

#[macro_export]
macro_rules! log_debug {
    (target: $target:expr, $($arg:tt)+) => {{
        $crate::diag::log::emit($crate::diag::log::Level::Debug, $target, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        $crate::diag::log::emit($crate::diag::log::Level::Debug, module_path!(), format_args!($($arg)+));
    }};
}

#[macro_export]
macro_rules! log_trace {
    (target: $target:expr, $($arg:tt)+) => {{
        $crate::diag::log::emit($crate::diag::log::Level::Trace, $target, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        $crate::diag::log::emit($crate::diag::log::Level::Trace, module_path!(), format_args!($($arg)+));
    }};
}
