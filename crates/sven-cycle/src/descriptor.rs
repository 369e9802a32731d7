// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Role an [`AgentDescriptor`] plays in delegation and in the orchestrator's
/// plan-then-execute pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Orchestrator,
    Coder,
    Researcher,
    Vision,
}

/// Describes one model seat in the cycle's agent registry: which model backs
/// it, what it can do, and how eager the scheduler should be to keep it warm
/// over other agents when breaking ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: String,
    pub model_name: String,
    pub role: AgentRole,
    pub capabilities: BTreeSet<String>,
    pub priority: i32,
}

impl AgentDescriptor {
    pub fn new(id: impl Into<String>, model_name: impl Into<String>, role: AgentRole) -> Self {
        Self {
            id: id.into(),
            model_name: model_name.into(),
            role,
            capabilities: BTreeSet::new(),
            priority: 0,
        }
    }

    pub fn with_capabilities(mut self, caps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.capabilities = caps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn can_handle(&self, required: &BTreeSet<String>) -> bool {
        required.is_empty() || required.iter().any(|c| self.capabilities.contains(c))
    }
}
