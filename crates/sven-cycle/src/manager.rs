// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use sven_model::{CompletionRequest, Message, ModelProvider, ResponseEvent};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::CycleConfig;
use crate::cycle::{Cycle, CycleStrategy};
use crate::descriptor::AgentDescriptor;
use crate::error::CycleError;
use crate::task::{Task, TaskStatus};

/// RAM-aware scheduler that runs batches of [`Task`]s across an
/// [`AgentDescriptor`] registry, picking an execution strategy that trades
/// off parallelism against model-swap cost.
pub struct CycleManager {
    agents: Vec<AgentDescriptor>,
    models: HashMap<String, Arc<dyn ModelProvider>>,
    config: CycleConfig,
    host_ram_gb: u32,
    warm_agent: Mutex<Option<String>>,
    model_switch_count: AtomicU64,
    total_model_switch_time: Mutex<Duration>,
}

impl CycleManager {
    pub fn new(
        agents: Vec<AgentDescriptor>,
        models: HashMap<String, Arc<dyn ModelProvider>>,
        config: CycleConfig,
        host_ram_gb: u32,
    ) -> Self {
        Self {
            agents,
            models,
            config,
            host_ram_gb,
            warm_agent: Mutex::new(None),
            model_switch_count: AtomicU64::new(0),
            total_model_switch_time: Mutex::new(Duration::ZERO),
        }
    }

    pub fn model_switch_count(&self) -> u64 {
        self.model_switch_count.load(Ordering::Relaxed)
    }

    pub async fn total_model_switch_time(&self) -> Duration {
        *self.total_model_switch_time.lock().await
    }

    fn agent_by_id(&self, id: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.id == id)
    }

    fn orchestrator(&self) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.role == crate::descriptor::AgentRole::Orchestrator)
    }

    /// Assigns each task to the highest-priority agent whose capabilities
    /// intersect the task's required set. Rejects the whole cycle (I8) if
    /// any task cannot be placed.
    pub fn build_cycle(
        &self,
        name: impl Into<String>,
        mut tasks: Vec<Task>,
    ) -> Result<Cycle, CycleError> {
        for task in &mut tasks {
            if task.assigned_agent.is_some() {
                continue;
            }
            let mut candidates: Vec<&AgentDescriptor> =
                self.agents.iter().filter(|a| a.can_handle(&task.required_capabilities)).collect();
            candidates.sort_by_key(|a| std::cmp::Reverse(a.priority));
            match candidates.first() {
                Some(agent) => task.assigned_agent = Some(agent.id.clone()),
                None => {
                    warn!(task_id = %task.id, required = ?task.required_capabilities, "no agent available");
                    return Err(CycleError::NoAgentAvailable {
                        task_id: task.id.clone(),
                        required: task.required_capabilities.iter().cloned().collect(),
                    });
                }
            }
        }
        Ok(Cycle::new(name, tasks, self.config.default_strategy))
    }

    /// Resolves `Adaptive` to a concrete strategy using the distribution of
    /// agent assignments already present on the cycle's tasks.
    pub fn select_strategy(&self, cycle: &Cycle) -> CycleStrategy {
        if cycle.strategy != CycleStrategy::Adaptive {
            return cycle.strategy;
        }
        let u = cycle.unique_agent_count();
        let mu = cycle.mean_tasks_per_agent();
        let parallel_feasible = self.host_ram_gb >= self.config.parallel_threshold_gb;

        let resolved = if parallel_feasible && u >= 2 && mu >= 3.0 {
            CycleStrategy::Parallel
        } else if u == 1 || mu >= 5.0 {
            CycleStrategy::Specialist
        } else if cycle.all_prior_results_empty() {
            CycleStrategy::Specialist
        } else {
            CycleStrategy::Pipeline
        };

        info!(strategy = ?resolved, unique_agents = u, mean_tasks_per_agent = mu, "adaptive strategy resolved");
        resolved
    }

    /// Runs the cycle to completion, dispatching tasks per its (or the
    /// adaptively resolved) strategy, and returns the ordered results.
    pub async fn run(&self, cycle: &mut Cycle) -> Result<(), CycleError> {
        let strategy = self.select_strategy(cycle);
        match strategy {
            CycleStrategy::Adaptive => unreachable!("select_strategy never returns Adaptive"),
            CycleStrategy::RoundRobin => self.run_round_robin(cycle).await?,
            CycleStrategy::Specialist => self.run_specialist(cycle).await?,
            CycleStrategy::Pipeline => self.run_pipeline(cycle).await?,
            CycleStrategy::Parallel => self.run_parallel(cycle).await?,
        }
        cycle.is_complete = true;
        Ok(())
    }

    async fn run_round_robin(&self, cycle: &mut Cycle) -> Result<(), CycleError> {
        for i in 0..cycle.tasks.len() {
            self.execute_one(cycle, i).await;
        }
        Ok(())
    }

    async fn run_specialist(&self, cycle: &mut Cycle) -> Result<(), CycleError> {
        let mut order: Vec<usize> = (0..cycle.tasks.len()).collect();
        order.sort_by_key(|&i| {
            let agent_id = cycle.tasks[i].assigned_agent.as_deref().unwrap_or("");
            let priority = self.agent_by_id(agent_id).map(|a| a.priority).unwrap_or(i32::MIN);
            (agent_id.to_string(), std::cmp::Reverse(priority))
        });
        for i in order {
            self.execute_one(cycle, i).await;
        }
        Ok(())
    }

    async fn run_pipeline(&self, cycle: &mut Cycle) -> Result<(), CycleError> {
        let window = self.config.pipeline_window;
        let mut trailing: Vec<String> = Vec::new();
        for i in 0..cycle.tasks.len() {
            cycle.tasks[i].task_context.previous_results = trailing.clone();
            self.execute_one(cycle, i).await;
            if let TaskStatus::Completed = cycle.tasks[i].status {
                if let Some(result) = &cycle.tasks[i].result {
                    trailing.push(result.clone());
                    if trailing.len() > window {
                        trailing.remove(0);
                    }
                }
            }
        }
        Ok(())
    }

    async fn run_parallel(&self, cycle: &mut Cycle) -> Result<(), CycleError> {
        if self.host_ram_gb < self.config.parallel_threshold_gb {
            return Err(CycleError::InsufficientRAM {
                available_gb: self.host_ram_gb,
                required_gb: self.config.parallel_threshold_gb,
            });
        }

        let mut partitions: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, task) in cycle.tasks.iter().enumerate() {
            let agent = task.assigned_agent.clone().unwrap_or_default();
            partitions.entry(agent).or_default().push(i);
        }
        let tasks_snapshot = cycle.tasks.clone();

        // Each partition runs its tasks sequentially on its own warm model;
        // partitions themselves run concurrently.
        let futures = partitions.into_values().map(|indices| {
            let tasks_snapshot = &tasks_snapshot;
            async move {
                let mut results = Vec::with_capacity(indices.len());
                for i in indices {
                    results.push((i, self.run_single_task(&tasks_snapshot[i]).await));
                }
                results
            }
        });
        let flattened: Vec<(usize, (TaskStatus, Option<String>))> =
            futures::future::join_all(futures).await.into_iter().flatten().collect();

        for (i, (status, result)) in flattened {
            cycle.tasks[i].status = status;
            cycle.tasks[i].result = result;
        }
        Ok(())
    }

    async fn execute_one(&self, cycle: &mut Cycle, index: usize) {
        let (status, result) = self.run_single_task(&cycle.tasks[index]).await;
        cycle.tasks[index].status = status;
        cycle.tasks[index].result = result;
    }

    /// Runs one task against its assigned model, warming the model first if
    /// it differs from `warm_agent`, and returns its terminal status/result.
    async fn run_single_task(&self, task: &Task) -> (TaskStatus, Option<String>) {
        let agent_id = match &task.assigned_agent {
            Some(id) => id,
            None => return (TaskStatus::Failed("task has no assigned agent".into()), None),
        };
        let agent = match self.agent_by_id(agent_id) {
            Some(a) => a,
            None => return (TaskStatus::Failed(format!("unknown agent {agent_id}")), None),
        };
        let model = match self.models.get(&agent.model_name) {
            Some(m) => m.clone(),
            None => return (TaskStatus::Failed(format!("no model bound for {}", agent.model_name)), None),
        };

        self.ensure_warm(&agent.model_name, model.as_ref()).await;

        match run_prompt(model.as_ref(), &task_prompt(task)).await {
            Ok(text) => (TaskStatus::Completed, Some(text)),
            Err(e) => (TaskStatus::Failed(e.to_string()), None),
        }
    }

    /// Warms `model_name` if it differs from the currently warm agent,
    /// accounting the swap's wall-clock time and bumping the switch counter.
    async fn ensure_warm(&self, model_name: &str, model: &dyn ModelProvider) {
        let mut warm = self.warm_agent.lock().await;
        if warm.as_deref() == Some(model_name) {
            return;
        }
        let start = Instant::now();
        if let Err(e) = model.warm().await {
            warn!(model = %model_name, error = %e, "model warm failed");
        }
        let elapsed = start.elapsed();
        self.model_switch_count.fetch_add(1, Ordering::Relaxed);
        *self.total_model_switch_time.lock().await += elapsed;
        debug!(model = %model_name, switch_count = self.model_switch_count(), ?elapsed, "model swap");
        *warm = Some(model_name.to_string());
    }

    /// Plan-then-execute: one planning call on the orchestrator producing a
    /// JSON array of `{task, agent}` objects, an adaptive execution cycle
    /// over the parsed plan, then one synthesis call folding in bounded
    /// previews of each subtask's output.
    pub async fn plan_and_execute(&self, task: &str) -> Result<String, CycleError> {
        let orchestrator = self
            .orchestrator()
            .ok_or_else(|| CycleError::PlanningFailed("no orchestrator agent configured".into()))?;
        let orchestrator_model = self
            .models
            .get(&orchestrator.model_name)
            .ok_or_else(|| CycleError::ModelUnavailable(orchestrator.model_name.clone()))?
            .clone();

        let plan_prompt = format!(
            "Break the following task into an execution plan. Respond with ONLY a JSON array \
             of objects shaped {{\"task\": <subtask text>, \"agent\": <agent id>}}.\n\nTask:\n{task}"
        );
        let plan_text = run_prompt(orchestrator_model.as_ref(), &plan_prompt).await?;

        let plan: Vec<PlanItem> = match parse_plan(&plan_text) {
            Some(items) if !items.is_empty() => items,
            _ => return Ok(plan_text),
        };

        let tasks: Vec<Task> = plan
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let mut t = Task::new(format!("plan-{i}"), item.task);
                t.assigned_agent = Some(item.agent);
                t
            })
            .collect();

        let mut cycle = Cycle::new("plan_and_execute", tasks, CycleStrategy::Adaptive);
        self.run(&mut cycle).await?;

        let previews: String = cycle
            .tasks
            .iter()
            .map(|t| {
                let preview = t.result.as_deref().unwrap_or("(no output)");
                let truncated: String = preview.chars().take(500).collect();
                format!("- {}: {}", t.id, truncated)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let synthesis_prompt =
            format!("Original task:\n{task}\n\nSubtask outputs:\n{previews}\n\nSynthesise a final answer.");
        let synthesis = run_prompt(orchestrator_model.as_ref(), &synthesis_prompt).await?;
        Ok(synthesis)
    }
}

#[derive(Debug, serde::Deserialize)]
struct PlanItem {
    task: String,
    agent: String,
}

fn parse_plan(text: &str) -> Option<Vec<PlanItem>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    serde_json::from_str(&text[start..=end]).ok()
}

fn task_prompt(task: &Task) -> String {
    if task.task_context.previous_results.is_empty() {
        task.content.clone()
    } else {
        format!(
            "{}\n\nPrior results:\n{}",
            task.content,
            task.task_context.previous_results.join("\n---\n")
        )
    }
}

async fn run_prompt(model: &dyn ModelProvider, prompt: &str) -> anyhow::Result<String> {
    let req = CompletionRequest {
        messages: vec![Message::user(prompt)],
        tools: vec![],
        stream: true,
        system_dynamic_suffix: None,
    };
    let mut stream = model.complete(req).await?;
    let mut out = String::new();
    while let Some(event) = stream.next().await {
        if let ResponseEvent::TextDelta(delta) = event? {
            out.push_str(&delta);
        }
    }
    Ok(out)
}
