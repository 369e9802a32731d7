// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::policy::ApprovalPolicy;
use crate::tool::{SideEffectClass, Tool, ToolCall, ToolOutput};

/// Extensions considered "code files" for recursive search_replace when no
/// explicit file list is given.
static CODE_EXTENSIONS: &[&str] = &[
    "rs", "toml", "py", "js", "ts", "tsx", "jsx", "go", "c", "h", "cpp", "hpp", "cc", "java",
    "rb", "sh", "yaml", "yml", "json", "md", "txt",
];

static EXCLUDED_DIRS: &[&str] = &[".git", "target", "node_modules", "dist", "__pycache__"];

pub struct SearchReplaceTool;

#[async_trait]
impl Tool for SearchReplaceTool {
    fn name(&self) -> &str {
        "search_replace"
    }

    fn description(&self) -> &str {
        "Find and replace an exact substring across one or more files.\n\
         dry_run defaults to true: reports the match count per file without writing.\n\
         Pass dry_run=false to actually perform the replacement (files written atomically).\n\
         files: explicit list of files to target. If omitted, recursively scans `path` \
         (default current directory) restricted to common code-file extensions."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "search": { "type": "string", "description": "Exact substring to find" },
                "replace": { "type": "string", "description": "Replacement text" },
                "files": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Explicit list of files to target"
                },
                "path": { "type": "string", "description": "Directory to scan recursively when `files` is omitted (default '.')" },
                "dry_run": { "type": "boolean", "description": "Count matches without writing (default true)" }
            },
            "required": ["search", "replace"],
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
        let search = match call.args.get("search").and_then(|v| v.as_str()) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => return ToolOutput::err(&call.id, "missing required parameter 'search'"),
        };
        let replace = call.args.get("replace").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let dry_run = call.args.get("dry_run").and_then(|v| v.as_bool()).unwrap_or(true);

        let candidates = match call.args.get("files").and_then(|v| v.as_array()) {
            Some(arr) => arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
            None => {
                let path = call.args.get("path").and_then(|v| v.as_str()).unwrap_or(".");
                enumerate_code_files(path)
            }
        };

        debug!(search = %search, dry_run, count = candidates.len(), "search_replace tool");

        let mut report = Vec::new();
        let mut total_matches = 0usize;
        let mut files_changed = 0usize;

        for path in &candidates {
            let content = match tokio::fs::read_to_string(path).await {
                Ok(c) => c,
                Err(_) => continue,
            };
            let count = content.matches(&search).count();
            if count == 0 {
                continue;
            }
            total_matches += count;
            report.push(format!("{path}: {count} match(es)"));

            if !dry_run {
                let new_content = content.replace(&search, &replace);
                if let Err(e) = write_atomic(path, &new_content).await {
                    return ToolOutput::err(&call.id, format!("write error on {path}: {e}"));
                }
                files_changed += 1;
            }
        }

        if report.is_empty() {
            return ToolOutput::ok(&call.id, "(no matches found)");
        }

        let mut summary = report.join("\n");
        if dry_run {
            summary.push_str(&format!(
                "\n\n[dry run] {total_matches} total match(es) across {} file(s). Pass dry_run=false to apply.",
                report.len()
            ));
        } else {
            summary.push_str(&format!(
                "\n\n{total_matches} total match(es) replaced across {files_changed} file(s)."
            ));
        }

        ToolOutput::ok(&call.id, summary)
    }
}

fn enumerate_code_files(path: &str) -> Vec<String> {
    WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| {
            e.file_name()
                .to_str()
                .map(|n| !EXCLUDED_DIRS.contains(&n))
                .unwrap_or(true)
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|x| x.to_str())
                .map(|ext| CODE_EXTENSIONS.contains(&ext))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_string_lossy().into_owned())
        .collect()
}

async fn write_atomic(path: &str, content: &str) -> std::io::Result<()> {
    let tmp_path = format!("{path}.tmp-{}", Uuid::new_v4());
    tokio::fs::write(&tmp_path, content).await?;
    tokio::fs::rename(&tmp_path, path).await
}
