// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::events::{TodoItem, ToolEvent};
use crate::policy::ApprovalPolicy;
use crate::tool::{SideEffectClass, Tool, ToolCall, ToolOutput};

/// Shared session todo list. Each `todo:*` tool holds a clone of the same
/// `Arc<Mutex<Vec<TodoItem>>>` so additions, updates, and completions are
/// all visible to `todo:list` without a round-trip through the model.
#[derive(Clone)]
pub struct TodoState {
    items: Arc<Mutex<Vec<TodoItem>>>,
    event_tx: mpsc::Sender<ToolEvent>,
}

impl TodoState {
    pub fn new(event_tx: mpsc::Sender<ToolEvent>) -> Self {
        Self { items: Arc::new(Mutex::new(Vec::new())), event_tx }
    }

    async fn notify(&self) {
        let items = self.items.lock().await.clone();
        let _ = self.event_tx.send(ToolEvent::TodoUpdate(items)).await;
    }
}

fn format_todos(items: &[TodoItem]) -> String {
    if items.is_empty() {
        return "(no todos)".to_string();
    }
    items
        .iter()
        .map(|t| {
            let icon = match t.status.as_str() {
                "completed" => "✓",
                "in_progress" => "→",
                "cancelled" => "✗",
                _ => "○",
            };
            format!("{icon} [{}] {}", t.id, t.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct TodoAddTool {
    state: TodoState,
}

impl TodoAddTool {
    pub fn new(state: TodoState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for TodoAddTool {
    fn name(&self) -> &str {
        "todo:add"
    }

    fn description(&self) -> &str {
        "Add a new task to the session todo list with status 'pending'."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "Unique identifier for the task" },
                "content": { "type": "string", "description": "Description of the task" }
            },
            "required": ["id", "content"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::Mutating
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let id = match call.args.get("id").and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'id'"),
        };
        let content = match call.args.get("content").and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'content'"),
        };

        debug!(id = %id, "todo:add tool");

        let mut items = self.state.items.lock().await;
        if items.iter().any(|t| t.id == id) {
            return ToolOutput::err(&call.id, format!("todo '{id}' already exists"));
        }
        items.push(TodoItem { id: id.clone(), content, status: "pending".to_string() });
        drop(items);
        self.state.notify().await;

        ToolOutput::ok(&call.id, format!("added '{id}'"))
    }
}

pub struct TodoUpdateTool {
    state: TodoState,
}

impl TodoUpdateTool {
    pub fn new(state: TodoState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for TodoUpdateTool {
    fn name(&self) -> &str {
        "todo:update"
    }

    fn description(&self) -> &str {
        "Update a todo's content and/or status. At most one task may be in_progress at once."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "content": { "type": "string" },
                "status": {
                    "type": "string",
                    "enum": ["pending", "in_progress", "completed", "cancelled"]
                }
            },
            "required": ["id"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::Mutating
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let id = match call.args.get("id").and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'id'"),
        };
        let new_status = call.args.get("status").and_then(|v| v.as_str());
        let new_content = call.args.get("content").and_then(|v| v.as_str());

        if let Some(s) = new_status {
            if !["pending", "in_progress", "completed", "cancelled"].contains(&s) {
                return ToolOutput::err(&call.id, format!("invalid status: {s}"));
            }
        }

        debug!(id = %id, "todo:update tool");

        let mut items = self.state.items.lock().await;
        if new_status == Some("in_progress") && items.iter().any(|t| t.id != id && t.status == "in_progress") {
            return ToolOutput::err(&call.id, "at most one todo can be 'in_progress' at a time");
        }
        let Some(item) = items.iter_mut().find(|t| t.id == id) else {
            return ToolOutput::err(&call.id, format!("todo '{id}' not found"));
        };
        if let Some(c) = new_content {
            item.content = c.to_string();
        }
        if let Some(s) = new_status {
            item.status = s.to_string();
        }
        drop(items);
        self.state.notify().await;

        ToolOutput::ok(&call.id, format!("updated '{id}'"))
    }
}

pub struct TodoCompleteTool {
    state: TodoState,
}

impl TodoCompleteTool {
    pub fn new(state: TodoState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for TodoCompleteTool {
    fn name(&self) -> &str {
        "todo:complete"
    }

    fn description(&self) -> &str {
        "Mark a todo as completed. Call immediately after finishing the corresponding work."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "id": { "type": "string" } },
            "required": ["id"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::Mutating
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let id = match call.args.get("id").and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'id'"),
        };

        debug!(id = %id, "todo:complete tool");

        let mut items = self.state.items.lock().await;
        let Some(item) = items.iter_mut().find(|t| t.id == id) else {
            return ToolOutput::err(&call.id, format!("todo '{id}' not found"));
        };
        item.status = "completed".to_string();
        drop(items);
        self.state.notify().await;

        ToolOutput::ok(&call.id, format!("completed '{id}'"))
    }
}

pub struct TodoRemoveTool {
    state: TodoState,
}

impl TodoRemoveTool {
    pub fn new(state: TodoState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for TodoRemoveTool {
    fn name(&self) -> &str {
        "todo:remove"
    }

    fn description(&self) -> &str {
        "Remove a todo from the session list entirely."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "id": { "type": "string" } },
            "required": ["id"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::Mutating
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let id = match call.args.get("id").and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'id'"),
        };

        debug!(id = %id, "todo:remove tool");

        let mut items = self.state.items.lock().await;
        let before = items.len();
        items.retain(|t| t.id != id);
        if items.len() == before {
            return ToolOutput::err(&call.id, format!("todo '{id}' not found"));
        }
        drop(items);
        self.state.notify().await;

        ToolOutput::ok(&call.id, format!("removed '{id}'"))
    }
}

pub struct TodoListTool {
    state: TodoState,
}

impl TodoListTool {
    pub fn new(state: TodoState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for TodoListTool {
    fn name(&self) -> &str {
        "todo:list"
    }

    fn description(&self) -> &str {
        "List all todos in the current session with their status."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {}, "additionalProperties": false })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::Pure
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        debug!("todo:list tool");
        let items = self.state.items.lock().await;
        ToolOutput::ok(&call.id, format_todos(&items))
    }
}
