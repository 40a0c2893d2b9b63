// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Log macros for the sequence compiler.
//!
//! Records go to the [`log`] facade under `awgseq.rust::<module>`.
//! `diagnostic!` records are dropped unless [`init_logging`] turned them on.

use std::sync::atomic::{AtomicBool, Ordering};

#[doc(hidden)]
pub use log as _log;

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($level:ident, $($arg:tt)+) => {
        $crate::_log::log!(
            target: concat!("awgseq.rust::", module_path!()),
            $crate::_log::Level::$level,
            $($arg)+
        )
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::__emit!(Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::__emit!(Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::__emit!(Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        $crate::__emit!(Debug, $($arg)+)
    };
}

/// Info-level record, emitted only with diagnostics on.
#[macro_export]
macro_rules! diagnostic {
    ($($arg:tt)+) => {
        if $crate::is_diagnostics_enabled() {
            $crate::__emit!(Info, $($arg)+)
        }
    };
}

static DIAGNOSTICS: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn is_diagnostics_enabled() -> bool {
    DIAGNOSTICS.load(Ordering::Relaxed)
}

/// Turn `diagnostic!` output on or off.
///
/// Installs no logger; records reach whatever `log` backend the host set up.
pub fn init_logging(with_diagnostics: bool) {
    DIAGNOSTICS.store(with_diagnostics, Ordering::Relaxed);
}
