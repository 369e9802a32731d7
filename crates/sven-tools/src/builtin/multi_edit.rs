// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::policy::ApprovalPolicy;
use crate::tool::{SideEffectClass, Tool, ToolCall, ToolOutput};

/// Applies a batch of exact-substring edits to a single file atomically.
/// Loads the file once, applies each edit in order against the in-memory
/// buffer, and writes once at the end — never leaves the file in a
/// partially-edited state on disk.
pub struct MultiEditTool;

#[async_trait]
impl Tool for MultiEditTool {
    fn name(&self) -> &str {
        "multi_edit"
    }

    fn description(&self) -> &str {
        "Apply several old_string/new_string substitutions to one file in a single \
         atomic write. Edits are applied in the order given against an in-memory buffer, \
         so a later edit can target text introduced by an earlier one.\n\
         Edits whose old_string is not found are skipped (not fatal) and reported; \
         the file is written once if at least one edit applied."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path to the file to edit" },
                "edits": {
                    "type": "array",
                    "description": "Ordered list of substring replacements",
                    "items": {
                        "type": "object",
                        "properties": {
                            "old_string": { "type": "string" },
                            "new_string": { "type": "string" }
                        },
                        "required": ["old_string", "new_string"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["path", "edits"],
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
        let path = match call.args.get("path").and_then(|v| v.as_str()) {
            Some(p) => p.to_string(),
            None => return ToolOutput::err(&call.id, "missing required parameter 'path'"),
        };
        let edits = match call.args.get("edits").and_then(|v| v.as_array()) {
            Some(arr) if !arr.is_empty() => arr.clone(),
            _ => return ToolOutput::err(&call.id, "missing or empty 'edits' array"),
        };

        let mut buffer = match tokio::fs::read_to_string(&path).await {
            Ok(s) => s,
            Err(e) => return ToolOutput::err(&call.id, format!("read error: {e}")),
        };

        debug!(path = %path, edit_count = edits.len(), "multi_edit tool");

        let mut applied = 0usize;
        let mut skipped: Vec<String> = Vec::new();

        for (i, edit) in edits.iter().enumerate() {
            let old_string = match edit.get("old_string").and_then(|v| v.as_str()) {
                Some(s) => s,
                None => {
                    skipped.push(format!("edit {i}: missing old_string"));
                    continue;
                }
            };
            let new_string = edit.get("new_string").and_then(|v| v.as_str()).unwrap_or("");

            if buffer.contains(old_string) {
                buffer = buffer.replacen(old_string, new_string, 1);
                applied += 1;
            } else {
                skipped.push(format!("edit {i}: old_string not found ({:?})", truncate(old_string)));
            }
        }

        if applied == 0 {
            return ToolOutput::err(
                &call.id,
                format!("no edits applied; all {} were skipped:\n{}", edits.len(), skipped.join("\n")),
            );
        }

        if let Err(e) = write_atomic(&path, &buffer).await {
            return ToolOutput::err(&call.id, format!("write error: {e}"));
        }

        let mut summary = format!("applied {applied}/{} edits to {path}", edits.len());
        if !skipped.is_empty() {
            summary.push_str(&format!("\nskipped:\n{}", skipped.join("\n")));
        }
        ToolOutput::ok(&call.id, summary)
    }
}

fn truncate(s: &str) -> &str {
    let max = 80;
    if s.len() > max { &s[..max] } else { s }
}

async fn write_atomic(path: &str, content: &str) -> std::io::Result<()> {
    let tmp_path = format!("{path}.tmp-{}", Uuid::new_v4());
    tokio::fs::write(&tmp_path, content).await?;
    tokio::fs::rename(&tmp_path, path).await
}
