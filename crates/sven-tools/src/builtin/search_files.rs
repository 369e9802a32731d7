// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;
use walkdir::WalkDir;

use crate::policy::ApprovalPolicy;
use crate::tool::{OutputCategory, SideEffectClass, Tool, ToolCall, ToolOutput};

static EXCLUDED_DIRS: &[&str] = &[".git", "target", "node_modules", "dist", "__pycache__"];

/// Plain substring search over file names and paths — complements glob_search
/// (shell-style wildcards) for the case where the agent only has a fragment of
/// a name, not a pattern, e.g. "find the file about sessions".
pub struct SearchFilesTool;

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }

    fn description(&self) -> &str {
        "Search for files whose path contains a substring (case-insensitive by default).\n\
         Unlike glob_search this takes a plain fragment, not a wildcard pattern — \
         e.g. query=\"session\" matches src/session_store.rs and tests/session_test.rs.\n\
         Excludes .git/, target/, node_modules/. Results sorted alphabetically."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Substring to match against the file path" },
                "root": { "type": "string", "description": "Root directory to search from (default: current directory)" },
                "case_sensitive": { "type": "boolean", "description": "Case-sensitive match (default false)" },
                "max_results": { "type": "integer", "description": "Maximum number of results to return (default 200)" }
            },
            "required": ["query"],
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
        OutputCategory::MatchList
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let query = match call.args.get("query").and_then(|v| v.as_str()) {
            Some(q) => q.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'query'"),
        };
        let root = call.args.get("root").and_then(|v| v.as_str()).unwrap_or(".").to_string();
        let case_sensitive = call.args.get("case_sensitive").and_then(|v| v.as_bool()).unwrap_or(false);
        let max = call.args.get("max_results").and_then(|v| v.as_u64()).unwrap_or(200) as usize;

        debug!(query = %query, root = %root, "search_files tool");

        let needle = if case_sensitive { query.clone() } else { query.to_lowercase() };
        let root_owned = root.clone();

        let matches = tokio::task::spawn_blocking(move || {
            let mut found = Vec::new();
            for entry in WalkDir::new(&root_owned)
                .into_iter()
                .filter_entry(|e| {
                    e.file_type().is_file()
                        || !EXCLUDED_DIRS.contains(&e.file_name().to_string_lossy().as_ref())
                })
                .filter_map(Result::ok)
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path().to_string_lossy().to_string();
                let haystack = if case_sensitive { path.clone() } else { path.to_lowercase() };
                if haystack.contains(&needle) {
                    found.push(path);
                }
            }
            found.sort();
            found
        })
        .await
        .unwrap_or_default();

        if matches.is_empty() {
            return ToolOutput::ok(&call.id, "(no matches)");
        }

        let total = matches.len();
        let mut shown: Vec<String> = matches.into_iter().take(max).collect();
        if total > shown.len() {
            shown.push(format!("...[{} more matches not shown]", total - shown.len()));
        }
        ToolOutput::ok(&call.id, shown.join("\n"))
    }
}
