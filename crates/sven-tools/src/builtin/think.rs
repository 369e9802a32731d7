// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::policy::ApprovalPolicy;
use crate::tool::{SideEffectClass, Tool, ToolCall, ToolOutput};

/// A scratchpad tool: the model writes out its reasoning as a tool call
/// instead of (or alongside) plain assistant text. Has no effect on the
/// workspace — it exists purely to give the model a forcing function to
/// externalize intermediate reasoning before acting.
pub struct ThinkTool;

#[async_trait]
impl Tool for ThinkTool {
    fn name(&self) -> &str {
        "think"
    }

    fn description(&self) -> &str {
        "Record a reasoning step without taking any action. Use before a complex or \
         irreversible tool call to lay out the plan; the content is echoed back verbatim."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "thought": { "type": "string", "description": "The reasoning to record" }
            },
            "required": ["thought"],
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
        let thought = match call.args.get("thought").and_then(|v| v.as_str()) {
            Some(t) => t.to_string(),
            None => return ToolOutput::err(&call.id, "missing required parameter 'thought'"),
        };
        ToolOutput::ok(&call.id, thought)
    }
}
