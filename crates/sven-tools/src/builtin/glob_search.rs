// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::policy::ApprovalPolicy;
use crate::tool::{OutputCategory, SideEffectClass, Tool, ToolCall, ToolOutput};

pub struct GlobSearchTool;

/// Decompose a glob pattern into `(subdirectory_suffix, name_pattern)`, the same
/// way find_file's decomposition works, so `src/**/*.rs` searches rooted at
/// `<root>/src` instead of scanning the whole tree for a name match.
fn decompose_pattern(pattern: &str) -> (String, String) {
    if let Some(pos) = pattern.rfind("**/") {
        let prefix = pattern[..pos].trim_end_matches('/');
        let name_part = &pattern[pos + 3..];
        return (prefix.to_string(), name_part.to_string());
    }
    if let Some(pos) = pattern.rfind('/') {
        let prefix = &pattern[..pos];
        let name_part = &pattern[pos + 1..];
        return (prefix.to_string(), name_part.to_string());
    }
    (String::new(), pattern.to_string())
}

#[async_trait]
impl Tool for GlobSearchTool {
    fn name(&self) -> &str {
        "glob_search"
    }

    fn description(&self) -> &str {
        "Find files by name glob pattern, searching recursively under a root directory.\n\
         Excludes .git/, target/, node_modules/, .cargo/registry/.\n\
         Patterns: '*.rs', '**/*.rs' (recursive, prefix stripped), 'src/**/*.rs' \
         (rooted at <root>/src), exact filenames, '*lint*'.\n\
         Returns paths sorted alphabetically. For content search use grep or codebase_search."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Filename glob pattern" },
                "root": { "type": "string", "description": "Root directory to search from (default: current directory)" },
                "case_insensitive": { "type": "boolean", "description": "Match case-insensitively (default false)" },
                "max_results": { "type": "integer", "description": "Maximum number of results to return (default 200)" }
            },
            "required": ["pattern"],
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
        let raw_pattern = match call.args.get("pattern").and_then(|v| v.as_str()) {
            Some(p) => p.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'pattern'"),
        };
        let root = call.args.get("root").and_then(|v| v.as_str()).unwrap_or(".").to_string();
        let case_insensitive = call.args.get("case_insensitive").and_then(|v| v.as_bool()).unwrap_or(false);
        let max = call.args.get("max_results").and_then(|v| v.as_u64()).unwrap_or(200) as usize;

        let (subdir, name_pat) = decompose_pattern(&raw_pattern);
        let search_root = if subdir.is_empty() { root.clone() } else { format!("{}/{}", root.trim_end_matches('/'), subdir) };
        let name_flag = if case_insensitive { "-iname" } else { "-name" };

        debug!(pattern = %raw_pattern, root = %search_root, "glob_search tool");

        let cmd = format!(
            "find {search_root} {name_flag} '{name_pat}' \
             -not -path '*/.git/*' -not -path '*/target/*' -not -path '*/node_modules/*' \
             -not -path '*/.cargo/registry/*' | sort | head -n {max}"
        );

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&cmd)
            .stdin(std::process::Stdio::null())
            .output()
            .await;

        match output {
            Ok(out) => {
                let text = String::from_utf8_lossy(&out.stdout).to_string();
                if text.trim().is_empty() {
                    ToolOutput::ok(&call.id, "(no matches)")
                } else {
                    ToolOutput::ok(&call.id, text.trim_end().to_string())
                }
            }
            Err(e) => ToolOutput::err(&call.id, format!("glob_search error: {e}")),
        }
    }
}
