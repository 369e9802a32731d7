// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::policy::ApprovalPolicy;
use crate::tool::{OutputCategory, SideEffectClass, Tool, ToolCall, ToolOutput};

async fn run_git(workdir: &str, args: &[&str]) -> std::io::Result<std::process::Output> {
    tokio::process::Command::new("git")
        .args(args)
        .current_dir(workdir)
        .stdin(std::process::Stdio::null())
        .output()
        .await
}

fn collect_output(out: std::process::Output) -> Result<String, String> {
    if out.status.success() {
        let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
        Ok(stdout)
    } else {
        Err(String::from_utf8_lossy(&out.stderr).into_owned())
    }
}

pub struct GitStatusTool;

#[async_trait]
impl Tool for GitStatusTool {
    fn name(&self) -> &str {
        "git_status"
    }

    fn description(&self) -> &str {
        "Show the working-tree status (porcelain v1 format): staged, modified, and untracked files."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workdir": { "type": "string", "description": "Repository directory (default '.')" }
            },
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
        let workdir = call.args.get("workdir").and_then(|v| v.as_str()).unwrap_or(".").to_string();
        debug!(workdir = %workdir, "git_status tool");

        match run_git(&workdir, &["status", "--porcelain=v1", "--branch"]).await {
            Ok(out) => match collect_output(out) {
                Ok(text) if text.trim().is_empty() => ToolOutput::ok(&call.id, "(clean)"),
                Ok(text) => ToolOutput::ok(&call.id, text),
                Err(e) => ToolOutput::err(&call.id, format!("git status failed: {e}")),
            },
            Err(e) => ToolOutput::err(&call.id, format!("git status error: {e}")),
        }
    }
}

pub struct GitDiffTool;

#[async_trait]
impl Tool for GitDiffTool {
    fn name(&self) -> &str {
        "git_diff"
    }

    fn description(&self) -> &str {
        "Show a unified diff of working-tree changes. staged=true shows the index vs HEAD \
         instead of the working tree vs index. path restricts the diff to one file or directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workdir": { "type": "string", "description": "Repository directory (default '.')" },
                "path": { "type": "string", "description": "Restrict diff to this file or directory" },
                "staged": { "type": "boolean", "description": "Diff the index against HEAD instead of the working tree (default false)" }
            },
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
        OutputCategory::HeadTail
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let workdir = call.args.get("workdir").and_then(|v| v.as_str()).unwrap_or(".").to_string();
        let staged = call.args.get("staged").and_then(|v| v.as_bool()).unwrap_or(false);
        let path = call.args.get("path").and_then(|v| v.as_str());

        debug!(workdir = %workdir, staged, "git_diff tool");

        let mut args: Vec<&str> = vec!["diff"];
        if staged {
            args.push("--staged");
        }
        if let Some(p) = path {
            args.push("--");
            args.push(p);
        }

        match run_git(&workdir, &args).await {
            Ok(out) => match collect_output(out) {
                Ok(text) if text.trim().is_empty() => ToolOutput::ok(&call.id, "(no changes)"),
                Ok(text) => ToolOutput::ok(&call.id, text),
                Err(e) => ToolOutput::err(&call.id, format!("git diff failed: {e}")),
            },
            Err(e) => ToolOutput::err(&call.id, format!("git diff error: {e}")),
        }
    }
}

pub struct GitCommitTool;

#[async_trait]
impl Tool for GitCommitTool {
    fn name(&self) -> &str {
        "git_commit"
    }

    fn description(&self) -> &str {
        "Stage files (default: all tracked changes) and create a commit with the given message.\n\
         files restricts staging to specific paths; omit to stage everything (`git add -A`)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workdir": { "type": "string", "description": "Repository directory (default '.')" },
                "message": { "type": "string", "description": "Commit message" },
                "files": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Paths to stage (default: all tracked changes)"
                }
            },
            "required": ["message"],
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
        let workdir = call.args.get("workdir").and_then(|v| v.as_str()).unwrap_or(".").to_string();
        let message = match call.args.get("message").and_then(|v| v.as_str()) {
            Some(m) if !m.trim().is_empty() => m.to_string(),
            _ => return ToolOutput::err(&call.id, "missing required parameter 'message'"),
        };
        let files: Vec<String> = call
            .args
            .get("files")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        debug!(workdir = %workdir, "git_commit tool");

        let add_args: Vec<&str> = if files.is_empty() {
            vec!["add", "-A"]
        } else {
            let mut a = vec!["add"];
            a.extend(files.iter().map(String::as_str));
            a
        };

        if let Err(e) = run_git(&workdir, &add_args).await {
            return ToolOutput::err(&call.id, format!("git add error: {e}"));
        }

        match run_git(&workdir, &["commit", "-m", &message]).await {
            Ok(out) => match collect_output(out) {
                Ok(text) => ToolOutput::ok(&call.id, text),
                Err(e) => ToolOutput::err(&call.id, format!("git commit failed: {e}")),
            },
            Err(e) => ToolOutput::err(&call.id, format!("git commit error: {e}")),
        }
    }
}
