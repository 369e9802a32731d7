// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::policy::ApprovalPolicy;
use crate::tool::{SideEffectClass, Tool, ToolCall, ToolOutput};

/// Renames or moves a file or directory within the workspace.
pub struct MoveTool;

#[async_trait]
impl Tool for MoveTool {
    fn name(&self) -> &str {
        "move"
    }

    fn description(&self) -> &str {
        "Move or rename a file or directory. Creates missing parent directories \
         for the destination. Fails if the destination already exists."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "from": { "type": "string", "description": "Current path" },
                "to": { "type": "string", "description": "Destination path" }
            },
            "required": ["from", "to"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Ask
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::Mutating
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let from = match call.args.get("from").and_then(|v| v.as_str()) {
            Some(p) => p.to_string(),
            None => return ToolOutput::err(&call.id, "missing required parameter 'from'"),
        };
        let to = match call.args.get("to").and_then(|v| v.as_str()) {
            Some(p) => p.to_string(),
            None => return ToolOutput::err(&call.id, "missing required parameter 'to'"),
        };

        debug!(from = %from, to = %to, "move tool");

        if tokio::fs::metadata(&to).await.is_ok() {
            return ToolOutput::err(&call.id, format!("destination already exists: {to}"));
        }

        if let Some(parent) = std::path::Path::new(&to).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    return ToolOutput::err(&call.id, format!("mkdir error: {e}"));
                }
            }
        }

        match tokio::fs::rename(&from, &to).await {
            Ok(()) => ToolOutput::ok(&call.id, format!("moved {from} -> {to}")),
            Err(e) => ToolOutput::err(&call.id, format!("move error: {e}")),
        }
    }
}
