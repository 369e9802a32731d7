// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use sven_model::{ModelProvider, ScriptedMockProvider};

use crate::config::CycleConfig;
use crate::cycle::CycleStrategy;
use crate::descriptor::{AgentDescriptor, AgentRole};
use crate::error::CycleError;
use crate::manager::CycleManager;
use crate::task::{Task, TaskStatus};

fn agents() -> Vec<AgentDescriptor> {
    vec![
        AgentDescriptor::new("orc", "orchestrator-model", AgentRole::Orchestrator)
            .with_capabilities(["plan", "synthesise"])
            .with_priority(10),
        AgentDescriptor::new("coder-1", "coder-model", AgentRole::Coder)
            .with_capabilities(["code_gen", "code_review"])
            .with_priority(5),
        AgentDescriptor::new("researcher-1", "researcher-model", AgentRole::Researcher)
            .with_capabilities(["research"])
            .with_priority(1),
    ]
}

fn models(replies: &[(&str, &str)]) -> HashMap<String, Arc<dyn ModelProvider>> {
    replies
        .iter()
        .map(|(name, reply)| {
            (name.to_string(), Arc::new(ScriptedMockProvider::always_text(*reply)) as Arc<dyn ModelProvider>)
        })
        .collect()
}

fn manager(host_ram_gb: u32, replies: &[(&str, &str)]) -> CycleManager {
    CycleManager::new(agents(), models(replies), CycleConfig::default(), host_ram_gb)
}

#[test]
fn cycle_assignment_rejects_unsatisfiable_capability() {
    let m = manager(16, &[]);
    let tasks = vec![Task::new("t1", "do something").with_capabilities(["image_analyse"])];
    let err = m.build_cycle("c1", tasks).unwrap_err();
    assert!(matches!(err, CycleError::NoAgentAvailable { .. }));
}

#[test]
fn cycle_assignment_is_total_for_satisfiable_tasks() {
    let m = manager(16, &[]);
    let tasks = vec![
        Task::new("t1", "write code").with_capabilities(["code_gen"]),
        Task::new("t2", "look into this").with_capabilities(["research"]),
    ];
    let cycle = m.build_cycle("c1", tasks).unwrap();
    assert!(cycle.tasks.iter().all(|t| t.assigned_agent.is_some()));
}

#[test]
fn adaptive_resolves_to_specialist_for_single_agent() {
    let m = manager(16, &[]);
    let tasks = vec![
        Task::new("t1", "a").with_capabilities(["code_gen"]),
        Task::new("t2", "b").with_capabilities(["code_gen"]),
    ];
    let cycle = m.build_cycle("c1", tasks).unwrap();
    assert_eq!(m.select_strategy(&cycle), CycleStrategy::Specialist);
}

#[test]
fn adaptive_resolves_to_parallel_when_ram_and_spread_allow() {
    let m = manager(128, &[]);
    let tasks: Vec<Task> = (0..6)
        .map(|i| {
            let cap = if i % 2 == 0 { "code_gen" } else { "research" };
            Task::new(format!("t{i}"), "work").with_capabilities([cap])
        })
        .collect();
    let cycle = m.build_cycle("c1", tasks).unwrap();
    assert_eq!(m.select_strategy(&cycle), CycleStrategy::Parallel);
}

#[test]
fn adaptive_resolves_to_pipeline_when_not_single_agent_and_has_prior_results() {
    let m = manager(16, &[]);
    let mut tasks = vec![
        Task::new("t1", "a").with_capabilities(["code_gen"]),
        Task::new("t2", "b").with_capabilities(["research"]),
    ];
    tasks[1].task_context.previous_results = vec!["earlier output".into()];
    let cycle = m.build_cycle("c1", tasks).unwrap();
    assert_eq!(m.select_strategy(&cycle), CycleStrategy::Pipeline);
}

#[tokio::test]
async fn run_round_robin_executes_every_task() {
    let m = manager(16, &[("coder-model", "done coding"), ("researcher-model", "done research")]);
    let tasks = vec![
        Task::new("t1", "a").with_capabilities(["code_gen"]),
        Task::new("t2", "b").with_capabilities(["research"]),
    ];
    let mut cycle = m.build_cycle("c1", tasks).unwrap();
    cycle.strategy = CycleStrategy::RoundRobin;
    m.run(&mut cycle).await.unwrap();
    assert!(cycle.is_complete);
    assert!(cycle.tasks.iter().all(|t| t.status == TaskStatus::Completed));
    assert_eq!(cycle.tasks[0].result.as_deref(), Some("done coding"));
}

#[tokio::test]
async fn run_pipeline_folds_prior_results_forward() {
    let m = manager(16, &[("coder-model", "step output")]);
    let tasks = vec![
        Task::new("t1", "a").with_capabilities(["code_gen"]),
        Task::new("t2", "b").with_capabilities(["code_gen"]),
    ];
    let mut cycle = m.build_cycle("c1", tasks).unwrap();
    cycle.strategy = CycleStrategy::Pipeline;
    m.run(&mut cycle).await.unwrap();
    assert_eq!(cycle.tasks[1].task_context.previous_results, vec!["step output".to_string()]);
}

#[tokio::test]
async fn run_parallel_fails_closed_under_insufficient_ram() {
    let m = manager(8, &[("coder-model", "x")]);
    let tasks = vec![Task::new("t1", "a").with_capabilities(["code_gen"])];
    let mut cycle = m.build_cycle("c1", tasks).unwrap();
    cycle.strategy = CycleStrategy::Parallel;
    let err = m.run(&mut cycle).await.unwrap_err();
    assert!(matches!(err, CycleError::InsufficientRAM { .. }));
}

#[tokio::test]
async fn warming_a_different_model_increments_switch_count() {
    let m = manager(16, &[("coder-model", "a"), ("researcher-model", "b")]);
    let tasks = vec![
        Task::new("t1", "a").with_capabilities(["code_gen"]),
        Task::new("t2", "b").with_capabilities(["research"]),
    ];
    let mut cycle = m.build_cycle("c1", tasks).unwrap();
    cycle.strategy = CycleStrategy::RoundRobin;
    m.run(&mut cycle).await.unwrap();
    assert_eq!(m.model_switch_count(), 2);
}

#[tokio::test]
async fn plan_and_execute_synthesises_from_subtask_previews() {
    let orchestrator_plan = r#"Here is the plan:
    [{"task": "write the function", "agent": "coder-1"}]
    "#;
    let mut replies = HashMap::new();
    replies.insert(
        "orchestrator-model".to_string(),
        Arc::new(ScriptedMockProvider::new(vec![
            vec![sven_model::ResponseEvent::TextDelta(orchestrator_plan.to_string()), sven_model::ResponseEvent::Done],
            vec![sven_model::ResponseEvent::TextDelta("final synthesis".to_string()), sven_model::ResponseEvent::Done],
        ])) as Arc<dyn ModelProvider>,
    );
    replies.insert(
        "coder-model".to_string(),
        Arc::new(ScriptedMockProvider::always_text("function written")) as Arc<dyn ModelProvider>,
    );

    let m = CycleManager::new(agents(), replies, CycleConfig::default(), 16);
    let result = m.plan_and_execute("build a widget").await.unwrap();
    assert_eq!(result, "final synthesis");
}

#[tokio::test]
async fn plan_and_execute_returns_plan_text_verbatim_when_unparseable() {
    let mut replies = HashMap::new();
    replies.insert(
        "orchestrator-model".to_string(),
        Arc::new(ScriptedMockProvider::always_text("I refuse to produce JSON")) as Arc<dyn ModelProvider>,
    );
    let m = CycleManager::new(agents(), replies, CycleConfig::default(), 16);
    let result = m.plan_and_execute("build a widget").await.unwrap();
    assert_eq!(result, "I refuse to produce JSON");
}
