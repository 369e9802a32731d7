// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("no agent available for task {task_id} (required capabilities: {required:?})")]
    NoAgentAvailable { task_id: String, required: Vec<String> },

    #[error("insufficient RAM for parallel strategy: {available_gb}GB available, {required_gb}GB required")]
    InsufficientRAM { available_gb: u32, required_gb: u32 },

    #[error("planning failed: {0}")]
    PlanningFailed(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("model backend error: {0}")]
    Backend(#[from] anyhow::Error),
}
