// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::policy::ApprovalPolicy;
use crate::tool::{OutputCategory, SideEffectClass, Tool, ToolCall, ToolOutput};

/// No language server is wired in; definitions are located heuristically via
/// ripgrep over common declaration keywords across popular languages. Good
/// enough to jump straight to a symbol's declaration in most codebases.
fn definition_pattern(symbol: &str) -> String {
    let s = regex::escape(symbol);
    format!(
        r"^\s*(pub(\(.*\))?\s+)?(async\s+)?(fn|struct|enum|trait|impl|type|const|static|class|def|interface|function)\s+{s}\b"
    )
}

pub struct FindDefinitionTool;

#[async_trait]
impl Tool for FindDefinitionTool {
    fn name(&self) -> &str {
        "find_definition"
    }

    fn description(&self) -> &str {
        "Locate where a symbol (function, struct, class, trait, type...) is declared.\n\
         Heuristic: greps for common declaration keywords followed by the exact symbol name.\n\
         Works without a language server; may miss macro-generated or dynamically \
         dispatched definitions. Narrow with path= when the symbol is common."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": { "type": "string", "description": "Exact symbol name to find the definition of" },
                "path": { "type": "string", "description": "File or directory to search in (default: current directory)" },
                "limit": { "type": "integer", "description": "Maximum number of matches to return (default 20)" }
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
        let limit = call.args.get("limit").and_then(|v| v.as_u64()).unwrap_or(20) as usize;

        debug!(symbol = %symbol, path = %path, "find_definition tool");

        let pattern = definition_pattern(&symbol);
        match super::grep::run_rg(&pattern, &path, None, true, limit, "content", 0).await {
            Ok(output) if output.trim().is_empty() => {
                ToolOutput::ok(&call.id, format!("(no definition found for {symbol})"))
            }
            Ok(output) => ToolOutput::ok(&call.id, output),
            Err(e) => ToolOutput::err(&call.id, format!("find_definition error: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tool::{Tool, ToolCall};

    fn call(args: Value) -> ToolCall {
        ToolCall { id: "fd1".into(), name: "find_definition".into(), args }
    }

    fn tmp_file(content: &str) -> String {
        use std::sync::atomic::{AtomicU32, Ordering};
        static CTR: AtomicU32 = AtomicU32::new(0);
        let n = CTR.fetch_add(1, Ordering::Relaxed);
        let path = format!("/tmp/sven_find_def_test_{}_{n}.rs", std::process::id());
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn pattern_matches_fn_and_struct() {
        let p = definition_pattern("foo");
        let re = regex::Regex::new(&p).unwrap();
        assert!(re.is_match("pub fn foo() {"));
        assert!(re.is_match("struct foo {"));
        assert!(!re.is_match("let foo = bar();"));
    }

    #[tokio::test]
    async fn finds_struct_definition() {
        let path = tmp_file("pub struct SessionStore {\n    items: Vec<u8>,\n}\n");
        let out = FindDefinitionTool.execute(&call(json!({"symbol": "SessionStore", "path": path.clone()}))).await;
        assert!(!out.is_error, "{}", out.content);
        assert!(out.content.contains("SessionStore"));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn no_match_reports_not_found() {
        let out = FindDefinitionTool.execute(&call(json!({"symbol": "Xyzzy12345", "path": "/tmp"}))).await;
        assert!(!out.is_error);
        assert!(out.content.contains("no definition found"));
    }

    #[tokio::test]
    async fn missing_symbol_is_error() {
        let out = FindDefinitionTool.execute(&call(json!({}))).await;
        assert!(out.is_error);
    }
}
