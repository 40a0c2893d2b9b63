// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Module for defining settings for the sequence compiler.

/// Padding shorter than this many samples is merged into the pulse waveform.
pub const DEFAULT_PADDING_CUTOFF: usize = 12;
/// Largest accepted padding cutoff.
pub const MAX_PADDING_CUTOFF: usize = 4096;

#[derive(Debug, Clone)]
pub struct SanitizationChange {
    pub field: &'static str,
    pub original: String,
    pub sanitized: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilerSettings {
    padding_cutoff: usize,
    detect_time_amplitude: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        CompilerSettings {
            padding_cutoff: DEFAULT_PADDING_CUTOFF,
            detect_time_amplitude: true,
        }
    }
}

impl CompilerSettings {
    pub fn new(padding_cutoff: usize, detect_time_amplitude: bool) -> Self {
        CompilerSettings {
            padding_cutoff,
            detect_time_amplitude,
        }
    }

    pub fn padding_cutoff(&self) -> usize {
        self.padding_cutoff
    }

    /// Whether constant waveforms are collapsed to a single time-amplitude sample.
    pub fn detect_time_amplitude(&self) -> bool {
        self.detect_time_amplitude
    }

    pub fn sanitize(&mut self) -> Vec<SanitizationChange> {
        let mut changes = vec![];
        if self.padding_cutoff > MAX_PADDING_CUTOFF {
            changes.push(SanitizationChange {
                field: "padding_cutoff",
                original: self.padding_cutoff.to_string(),
                sanitized: MAX_PADDING_CUTOFF.to_string(),
                reason: format!("Larger than {MAX_PADDING_CUTOFF}."),
            });
            self.padding_cutoff = MAX_PADDING_CUTOFF;
        }
        changes
    }
}
