// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;

/// Label of the channel a pulse is played on.
///
/// Before hardware mapping this is a logical channel label (`"q1"`, `"M-q1"`),
/// afterwards the label of a physical AWG channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(label: impl Into<String>) -> Self {
        ChannelId(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(label: &str) -> Self {
        ChannelId(label.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(label: String) -> Self {
        ChannelId(label)
    }
}

impl Borrow<str> for ChannelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
