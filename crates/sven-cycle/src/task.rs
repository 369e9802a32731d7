// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Status of a [`Task`] as it moves through a [`crate::Cycle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Queued,
    Running,
    Completed,
    Failed(String),
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_) | Self::Cancelled)
    }
}

/// Workspace/context carried alongside a task's prompt content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskContext {
    pub workspace: Option<String>,
    pub files: Vec<String>,
    /// Outputs of previously completed tasks, folded in by the `Pipeline`
    /// strategy. Bounded by the manager's pipeline window.
    pub previous_results: Vec<String>,
    /// Data-URL encoded images relevant to this task (vision delegation).
    pub images: Vec<String>,
}

/// Unit of work dispatched by a [`crate::CycleManager`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub content: String,
    pub required_capabilities: BTreeSet<String>,
    pub priority: i32,
    pub task_context: TaskContext,
    /// Id of the [`crate::AgentDescriptor`] this task has been assigned to.
    /// Populated at cycle construction time; `None` only before assignment.
    pub assigned_agent: Option<String>,
    pub status: TaskStatus,
    pub result: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            required_capabilities: BTreeSet::new(),
            priority: 0,
            task_context: TaskContext::default(),
            assigned_agent: None,
            status: TaskStatus::Pending,
            result: None,
        }
    }

    pub fn with_capabilities(mut self, caps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.required_capabilities = caps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_previous_results(mut self, results: Vec<String>) -> Self {
        self.task_context.previous_results = results;
        self
    }
}
