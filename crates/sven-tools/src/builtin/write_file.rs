// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::policy::ApprovalPolicy;
use crate::tool::{OutputCategory, SideEffectClass, Tool, ToolCall, ToolOutput};

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file, creating it (and parent directories) if needed, \
         or overwriting it if it already exists. Written atomically.\n\
         Prefer edit_file for modifying an existing file — write_file replaces \
         the whole file."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path to the file to write" },
                "content": { "type": "string", "description": "Full content to write to the file" }
            },
            "required": ["path", "content"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Ask
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::Mutating
    }
    fn output_category(&self) -> OutputCategory {
        OutputCategory::Generic
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let path = match call.args.get("path").and_then(|v| v.as_str()) {
            Some(p) => p.to_string(),
            None => return ToolOutput::err(&call.id, "missing required parameter 'path'"),
        };
        let content = match call.args.get("content").and_then(|v| v.as_str()) {
            Some(c) => c.to_string(),
            None => return ToolOutput::err(&call.id, "missing required parameter 'content'"),
        };

        debug!(path = %path, bytes = content.len(), "write_file tool");

        if let Some(parent) = std::path::Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    return ToolOutput::err(&call.id, format!("mkdir error: {e}"));
                }
            }
        }

        match write_atomic(&path, &content).await {
            Ok(()) => ToolOutput::ok(&call.id, format!("wrote {path} ({} bytes)", content.len())),
            Err(e) => ToolOutput::err(&call.id, format!("write error: {e}")),
        }
    }
}

async fn write_atomic(path: &str, content: &str) -> std::io::Result<()> {
    let tmp_path = format!("{path}.tmp-{}", Uuid::new_v4());
    tokio::fs::write(&tmp_path, content).await?;
    tokio::fs::rename(&tmp_path, path).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tool::{Tool, ToolCall};

    fn call(args: Value) -> ToolCall {
        ToolCall { id: "w1".into(), name: "write_file".into(), args }
    }

    fn tmp_path() -> String {
        use std::sync::atomic::{AtomicU32, Ordering};
        static CTR: AtomicU32 = AtomicU32::new(0);
        let n = CTR.fetch_add(1, Ordering::Relaxed);
        format!("/tmp/sven_write_file_test_{}_{n}.txt", std::process::id())
    }

    #[tokio::test]
    async fn writes_new_file() {
        let path = tmp_path();
        let out = WriteFileTool.execute(&call(json!({ "path": path, "content": "hello\n" }))).await;
        assert!(!out.is_error, "{}", out.content);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let path = tmp_path();
        std::fs::write(&path, "old").unwrap();
        let out = WriteFileTool.execute(&call(json!({ "path": path, "content": "new" }))).await;
        assert!(!out.is_error, "{}", out.content);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        use std::sync::atomic::{AtomicU32, Ordering};
        static CTR: AtomicU32 = AtomicU32::new(0);
        let n = CTR.fetch_add(1, Ordering::Relaxed);
        let dir = format!("/tmp/sven_write_file_parent_{}_{n}", std::process::id());
        let path = format!("{dir}/nested/file.txt");
        let out = WriteFileTool.execute(&call(json!({ "path": path, "content": "x" }))).await;
        assert!(!out.is_error, "{}", out.content);
        assert!(std::path::Path::new(&path).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_content_is_error() {
        let out = WriteFileTool.execute(&call(json!({ "path": "/tmp/x.txt" }))).await;
        assert!(out.is_error);
        assert!(out.content.contains("missing required parameter 'content'"));
    }
}
