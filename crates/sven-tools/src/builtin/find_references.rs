// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::policy::ApprovalPolicy;
use crate::tool::{OutputCategory, SideEffectClass, Tool, ToolCall, ToolOutput};

pub struct FindReferencesTool;

#[async_trait]
impl Tool for FindReferencesTool {
    fn name(&self) -> &str {
        "find_references"
    }

    fn description(&self) -> &str {
        "Find all usages of a symbol: whole-word matches of the name anywhere in the codebase.\n\
         Unlike find_definition this includes the declaration site itself and every call site.\n\
         Narrow with path= for large codebases; pair with find_definition to distinguish \
         the declaration from its call sites."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": { "type": "string", "description": "Exact symbol name to find references to" },
                "path": { "type": "string", "description": "File or directory to search in (default: current directory)" },
                "limit": { "type": "integer", "description": "Maximum number of matches to return (default 100)" }
            },
            "required": ["symbol"],
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
        let symbol = match call.args.get("symbol").and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'symbol'"),
        };
        let path = call.args.get("path").and_then(|v| v.as_str()).unwrap_or(".").to_string();
        let limit = call.args.get("limit").and_then(|v| v.as_u64()).unwrap_or(100) as usize;

        debug!(symbol = %symbol, path = %path, "find_references tool");

        let pattern = format!(r"\b{}\b", regex::escape(&symbol));
        match super::grep::run_rg(&pattern, &path, None, true, limit, "content", 0).await {
            Ok(output) if output.trim().is_empty() => {
                ToolOutput::ok(&call.id, format!("(no references found for {symbol})"))
            }
            Ok(output) => ToolOutput::ok(&call.id, output),
            Err(e) => ToolOutput::err(&call.id, format!("find_references error: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tool::{Tool, ToolCall};

    fn call(args: Value) -> ToolCall {
        ToolCall { id: "fr1".into(), name: "find_references".into(), args }
    }

    fn tmp_file(content: &str) -> String {
        use std::sync::atomic::{AtomicU32, Ordering};
        static CTR: AtomicU32 = AtomicU32::new(0);
        let n = CTR.fetch_add(1, Ordering::Relaxed);
        let path = format!("/tmp/sven_find_ref_test_{}_{n}.rs", std::process::id());
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn finds_all_usages() {
        let path = tmp_file("let store = SessionStore::new();\nfn take(s: SessionStore) {}\n");
        let out = FindReferencesTool.execute(&call(json!({"symbol": "SessionStore", "path": path.clone()}))).await;
        assert!(!out.is_error, "{}", out.content);
        assert_eq!(out.content.lines().filter(|l| l.contains("SessionStore")).count(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn whole_word_excludes_substring_matches() {
        let path = tmp_file("let sessionstorekeeper = 1;\n");
        let out = FindReferencesTool.execute(&call(json!({"symbol": "store", "path": path.clone()}))).await;
        assert!(out.content.contains("no references"));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_symbol_is_error() {
        let out = FindReferencesTool.execute(&call(json!({}))).await;
        assert!(out.is_error);
    }
}
