// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

use crate::cycle::CycleStrategy;

/// Tuning knobs for [`crate::CycleManager`]. Mirrors the `cycle:` section
/// `sven_config::Config` grows once the scheduler is wired into the main
/// binary (see DESIGN.md); kept here meanwhile so this crate builds and
/// tests standalone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Host RAM, in GB, at or above which the `Parallel` strategy is
    /// feasible under `Adaptive` selection.
    pub parallel_threshold_gb: u32,
    /// Number of trailing task outputs folded into the next task's
    /// `previous_results` under the `Pipeline` strategy.
    pub pipeline_window: usize,
    pub default_strategy: CycleStrategy,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            parallel_threshold_gb: 64,
            pipeline_window: 3,
            default_strategy: CycleStrategy::Adaptive,
        }
    }
}
