// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::policy::ApprovalPolicy;
use crate::tool::{OutputCategory, SideEffectClass, Tool, ToolCall, ToolOutput};

const OUTPUT_LIMIT: usize = 20_000;
const DEFAULT_TIMEOUT_SECS: u64 = 600;

pub struct BuildTool;

#[async_trait]
impl Tool for BuildTool {
    fn name(&self) -> &str {
        "build"
    }

    fn description(&self) -> &str {
        "Build the project, auto-detecting cargo/npm/make from the workdir.\n\
         release: pass --release to cargo builds (default false).\n\
         workdir: project root (default current directory). timeout_secs: default 600."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workdir": { "type": "string", "description": "Project root (default: current directory)" },
                "release": { "type": "boolean", "description": "Build in release mode (cargo only, default false)" },
                "timeout_secs": { "type": "integer", "description": "Timeout in seconds (default 600)" }
            },
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::External
    }
    fn output_category(&self) -> OutputCategory {
        OutputCategory::HeadTail
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let workdir = call.args.get("workdir").and_then(|v| v.as_str()).unwrap_or(".").to_string();
        let release = call.args.get("release").and_then(|v| v.as_bool()).unwrap_or(false);
        let timeout = call.args.get("timeout_secs").and_then(|v| v.as_u64()).unwrap_or(DEFAULT_TIMEOUT_SECS);

        debug!(workdir = %workdir, release, "build tool");

        let (bin, args): (String, Vec<String>) = match detect_project_type(&workdir).await {
            Some("rust") => {
                let mut a = vec!["build".to_string()];
                if release {
                    a.push("--release".to_string());
                }
                ("cargo".to_string(), a)
            }
            Some("node") => ("npm".to_string(), vec!["run".to_string(), "build".to_string()]),
            Some("make") => ("make".to_string(), vec![]),
            _ => return ToolOutput::err(&call.id, format!("could not detect a build system under {workdir} (no Cargo.toml/package.json/Makefile found)")),
        };

        let mut cmd = tokio::process::Command::new(&bin);
        cmd.args(&args).current_dir(&workdir).stdin(std::process::Stdio::null());

        let result = tokio::time::timeout(std::time::Duration::from_secs(timeout), cmd.output()).await;
        match result {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let combined = truncate(&format!("{stdout}{stderr}"), OUTPUT_LIMIT);
                if output.status.success() {
                    ToolOutput::ok(&call.id, combined)
                } else {
                    ToolOutput::err(&call.id, format!("[exit {}]\n{combined}", output.status.code().unwrap_or(-1)))
                }
            }
            Ok(Err(e)) => ToolOutput::err(&call.id, format!("failed to spawn {bin}: {e}")),
            Err(_) => ToolOutput::err(&call.id, format!("timeout after {timeout}s")),
        }
    }
}

async fn detect_project_type(workdir: &str) -> Option<&'static str> {
    let dir = std::path::Path::new(workdir);
    let mut current = dir;
    loop {
        if current.join("Cargo.toml").exists() {
            return Some("rust");
        }
        if current.join("package.json").exists() {
            return Some("node");
        }
        if current.join("Makefile").exists() {
            return Some("make");
        }
        match current.parent() {
            Some(p) => current = p,
            None => break,
        }
    }
    None
}

fn truncate(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        s.to_string()
    } else {
        format!("{}...[truncated {} bytes]", &s[..limit], s.len() - limit)
    }
}
