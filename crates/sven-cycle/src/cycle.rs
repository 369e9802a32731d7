// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Execution strategy for a batch of tasks. `Adaptive` is resolved to one of
/// the other four by [`crate::CycleManager::select_strategy`] and is never
/// itself an execution rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStrategy {
    RoundRobin,
    Specialist,
    Pipeline,
    Parallel,
    Adaptive,
}

/// A batch of tasks bound to a chosen strategy and agent set. Tasks carry
/// their own assignment; the cycle just tracks aggregate progress.
#[derive(Debug, Clone)]
pub struct Cycle {
    pub name: String,
    pub tasks: Vec<Task>,
    pub strategy: CycleStrategy,
    pub chosen_agents: Vec<String>,
    pub phase: usize,
    pub results: Vec<String>,
    pub is_complete: bool,
}

impl Cycle {
    pub fn new(name: impl Into<String>, tasks: Vec<Task>, strategy: CycleStrategy) -> Self {
        Self {
            name: name.into(),
            tasks,
            strategy,
            chosen_agents: Vec::new(),
            phase: 0,
            results: Vec::new(),
            is_complete: false,
        }
    }

    pub fn unique_agent_count(&self) -> usize {
        let mut agents: Vec<&str> =
            self.tasks.iter().filter_map(|t| t.assigned_agent.as_deref()).collect();
        agents.sort_unstable();
        agents.dedup();
        agents.len()
    }

    pub fn mean_tasks_per_agent(&self) -> f64 {
        let u = self.unique_agent_count();
        if u == 0 {
            0.0
        } else {
            self.tasks.len() as f64 / u as f64
        }
    }

    pub fn all_prior_results_empty(&self) -> bool {
        self.tasks.iter().all(|t| t.task_context.previous_results.is_empty())
    }
}
