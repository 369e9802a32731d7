// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::policy::ApprovalPolicy;
use crate::tool::{SideEffectClass, Tool, ToolCall, ToolOutput};

/// Signals that the agent loop considers the current task finished. The
/// tool itself has no side effect — the agent loop observes a call to
/// `complete` and transitions out of the Running state rather than
/// dispatching another model turn.
pub struct CompleteTool;

#[async_trait]
impl Tool for CompleteTool {
    fn name(&self) -> &str {
        "complete"
    }

    fn description(&self) -> &str {
        "Signal that the task is finished. summary: a short account of what was done. \
         Call this instead of stopping silently — the loop terminates on seeing this call."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "summary": { "type": "string", "description": "Short summary of what was accomplished" }
            },
            "required": ["summary"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::Pure
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let summary = match call.args.get("summary").and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => return ToolOutput::err(&call.id, "missing required parameter 'summary'"),
        };
        ToolOutput::ok(&call.id, summary)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tool::{Tool, ToolCall};

    fn call(args: Value) -> ToolCall {
        ToolCall { id: "c1".into(), name: "complete".into(), args }
    }

    #[tokio::test]
    async fn echoes_summary() {
        let out = CompleteTool.execute(&call(json!({ "summary": "done" }))).await;
        assert!(!out.is_error);
        assert_eq!(out.content, "done");
    }

    #[tokio::test]
    async fn missing_summary_is_error() {
        let out = CompleteTool.execute(&call(json!({}))).await;
        assert!(out.is_error);
    }

    #[test]
    fn side_effect_is_pure() {
        assert_eq!(CompleteTool.side_effect(), SideEffectClass::Pure);
    }
}
