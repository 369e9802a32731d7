// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::policy::ApprovalPolicy;
use crate::tool::{OutputCategory, SideEffectClass, Tool, ToolCall, ToolOutput};

/// Per-file line cap, kept small since this tool is meant for skimming many
/// files at once rather than reading one in full — use read_file for that.
const PER_FILE_LINE_LIMIT: usize = 60;
const MAX_FILES: usize = 20;

pub struct BatchReadTool;

#[async_trait]
impl Tool for BatchReadTool {
    fn name(&self) -> &str {
        "batch_read"
    }

    fn description(&self) -> &str {
        "Read the first lines of several files in one call, each prefixed with its path.\n\
         Caps at 60 lines per file and 20 files per call — use read_file for full content \
         of any one file that needs closer inspection.\n\
         Prefer this over repeated read_file calls when skimming many files to get oriented."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "paths": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "File paths to read"
                },
                "limit": { "type": "integer", "description": "Lines per file (default 60, max 60)" }
            },
            "required": ["paths"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::ReadOnly
    }
    fn output_category(&self) -> OutputCategory {
        OutputCategory::FileContent
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let paths: Vec<String> = match call.args.get("paths").and_then(|v| v.as_array()) {
            Some(arr) => arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
            None => return ToolOutput::err(&call.id, "missing 'paths'"),
        };
        if paths.is_empty() {
            return ToolOutput::err(&call.id, "'paths' must contain at least one entry");
        }
        let limit = (call.args.get("limit").and_then(|v| v.as_u64()).unwrap_or(PER_FILE_LINE_LIMIT as u64) as usize)
            .min(PER_FILE_LINE_LIMIT);

        debug!(count = paths.len(), "batch_read tool");

        let mut sections = Vec::new();
        for path in paths.iter().take(MAX_FILES) {
            let section = match tokio::fs::read_to_string(path).await {
                Ok(text) => {
                    let all_lines: Vec<&str> = text.lines().collect();
                    let total = all_lines.len();
                    let shown: Vec<String> = all_lines
                        .iter()
                        .take(limit)
                        .enumerate()
                        .map(|(i, l)| format!("L{}:{}", i + 1, l))
                        .collect();
                    let mut body = shown.join("\n");
                    if total > limit {
                        body.push_str(&format!("\n...[{} more lines]", total - limit));
                    }
                    format!("=== {path} ===\n{body}")
                }
                Err(e) => format!("=== {path} ===\n[error: {e}]"),
            };
            sections.push(section);
        }
        if paths.len() > MAX_FILES {
            sections.push(format!("...[{} more files not read, exceeds {MAX_FILES}-file cap]", paths.len() - MAX_FILES));
        }

        ToolOutput::ok(&call.id, sections.join("\n\n"))
    }
}
