// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

pub mod align;
pub(crate) mod build_link_list;
pub(crate) mod frame_changes;
