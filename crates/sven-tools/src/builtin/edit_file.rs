// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::policy::ApprovalPolicy;
use crate::tool::{OutputCategory, SideEffectClass, Tool, ToolCall, ToolOutput};

pub struct EditFileTool;

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Edit a file in place. Three ways to target the edit, tried in this order:\n\
         1. `range` as a string: '-S +E' or 'S-E' (1-indexed, inclusive) or '-N' (first N lines) —\n\
            replaces those lines with `new_content`.\n\
         2. `start_line` + `end_line` integers with `new_content` — same semantics, explicit form.\n\
         3. `old_string` + `new_string` — exact-substring replacement; fails if `old_string` is not\n\
            found or is not unique.\n\
         Out-of-bounds line numbers clamp to file bounds; start > end is an error.\n\
         The file is rewritten atomically (write to a temp file, then rename)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path to the file to edit" },
                "range": {
                    "type": "string",
                    "description": "Line range as '-S +E', 'S-E', or '-N' (1-indexed, inclusive)"
                },
                "start_line": { "type": "integer", "description": "1-indexed inclusive start line" },
                "end_line": { "type": "integer", "description": "1-indexed inclusive end line" },
                "new_content": { "type": "string", "description": "Replacement text for the targeted range" },
                "old_string": { "type": "string", "description": "Exact substring to replace (must be unique)" },
                "new_string": { "type": "string", "description": "Replacement for old_string" }
            },
            "required": ["path"],
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

        let original = match tokio::fs::read_to_string(&path).await {
            Ok(s) => s,
            Err(e) => return ToolOutput::err(&call.id, format!("read error: {e}")),
        };

        let plan = match resolve_edit(&call.args, &original) {
            Ok(p) => p,
            Err(e) => return ToolOutput::err(&call.id, e),
        };

        let new_text = match &plan {
            EditPlan::Range { start, end, new_content } => apply_range(&original, *start, *end, new_content),
            EditPlan::Substring { new_text } => new_text.clone(),
        };

        debug!(path = %path, "edit_file tool");

        match write_atomic(&path, &new_text).await {
            Ok(()) => ToolOutput::ok(&call.id, format!("edited {path} ({} bytes)", new_text.len())),
            Err(e) => ToolOutput::err(&call.id, format!("write error: {e}")),
        }
    }
}

enum EditPlan {
    Range { start: usize, end: usize, new_content: String },
    Substring { new_text: String },
}

/// Dispatches to the first applicable edit form, in precedence order:
/// (a) `range` string, (b) explicit `start_line`/`end_line`, (c) `old_string`/`new_string`.
fn resolve_edit(args: &Value, original: &str) -> Result<EditPlan, String> {
    let new_content = args.get("new_content").and_then(|v| v.as_str()).unwrap_or("").to_string();
    let total_lines = original.lines().count().max(1);

    if let Some(range) = args.get("range").and_then(|v| v.as_str()) {
        let (start, end) = parse_range(range, total_lines)?;
        return Ok(EditPlan::Range { start, end, new_content });
    }

    if let (Some(s), Some(e)) = (
        args.get("start_line").and_then(|v| v.as_u64()),
        args.get("end_line").and_then(|v| v.as_u64()),
    ) {
        let (start, end) = clamp_range(s as usize, e as usize, total_lines)?;
        return Ok(EditPlan::Range { start, end, new_content });
    }

    if let (Some(old), Some(new)) = (
        args.get("old_string").and_then(|v| v.as_str()),
        args.get("new_string").and_then(|v| v.as_str()),
    ) {
        let count = original.matches(old).count();
        if count == 0 {
            return Err(format!("old_string not found: {:?}", truncate_preview(old)));
        }
        if count > 1 {
            return Err(format!(
                "old_string is not unique ({count} occurrences); narrow the match: {:?}",
                truncate_preview(old)
            ));
        }
        return Ok(EditPlan::Substring { new_text: original.replacen(old, new, 1) });
    }

    Err("no valid edit parameters".to_string())
}

fn truncate_preview(s: &str) -> &str {
    let max = 80;
    if s.len() > max { &s[..max] } else { s }
}

/// Parses `-S +E`, `S-E`, or `-N` into a 1-indexed inclusive `(start, end)`,
/// clamped to `[1, total_lines]`.
fn parse_range(range: &str, total_lines: usize) -> Result<(usize, usize), String> {
    let range = range.trim();

    if let Some(rest) = range.strip_prefix('-') {
        if let Some(plus_idx) = rest.find('+') {
            let start: usize = rest[..plus_idx].trim().parse().map_err(|_| "invalid range".to_string())?;
            let end: usize = rest[plus_idx + 1..].trim().parse().map_err(|_| "invalid range".to_string())?;
            return clamp_range(start, end, total_lines);
        }
        let n: usize = rest.trim().parse().map_err(|_| "invalid range".to_string())?;
        return clamp_range(1, n, total_lines);
    }

    if let Some(dash_idx) = range.find('-') {
        let start: usize = range[..dash_idx].trim().parse().map_err(|_| "invalid range".to_string())?;
        let end: usize = range[dash_idx + 1..].trim().parse().map_err(|_| "invalid range".to_string())?;
        return clamp_range(start, end, total_lines);
    }

    Err(format!("unrecognized range syntax: {range:?}"))
}

fn clamp_range(start: usize, end: usize, total_lines: usize) -> Result<(usize, usize), String> {
    let start = start.max(1);
    let end = end.min(total_lines.max(1)).max(1);
    if start > end {
        return Err(format!("start line {start} is after end line {end}"));
    }
    Ok((start, end))
}

/// Replaces the 1-indexed inclusive line range `[start, end]` with `new_content`.
fn apply_range(original: &str, start: usize, end: usize, new_content: &str) -> String {
    let trailing_newline = original.ends_with('\n');
    let lines: Vec<&str> = original.lines().collect();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    out.extend_from_slice(&lines[..(start - 1).min(lines.len())]);
    let replacement_lines: Vec<&str> = new_content.lines().collect();
    out.extend_from_slice(&replacement_lines);
    if end < lines.len() {
        out.extend_from_slice(&lines[end..]);
    }
    let mut joined = out.join("\n");
    if trailing_newline && !joined.ends_with('\n') {
        joined.push('\n');
    }
    joined
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
        ToolCall { id: "e1".into(), name: "edit_file".into(), args }
    }

    fn tmp_file(content: &str) -> String {
        use std::sync::atomic::{AtomicU32, Ordering};
        static CTR: AtomicU32 = AtomicU32::new(0);
        let n = CTR.fetch_add(1, Ordering::Relaxed);
        let path = format!("/tmp/sven_edit_file_test_{}_{n}.txt", std::process::id());
        std::fs::write(&path, content).unwrap();
        path
    }

    // ── range string form ─────────────────────────────────────────────────

    #[tokio::test]
    async fn range_s_dash_e_replaces_inclusive_lines() {
        let path = tmp_file("a\nb\nc\nd\n");
        let out = EditFileTool
            .execute(&call(json!({ "path": path, "range": "2-3", "new_content": "B\nC" })))
            .await;
        assert!(!out.is_error, "{}", out.content);
        let result = std::fs::read_to_string(&path).unwrap();
        assert_eq!(result, "a\nB\nC\nd\n");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn range_minus_n_takes_first_n_lines() {
        let path = tmp_file("a\nb\nc\nd\n");
        let out = EditFileTool
            .execute(&call(json!({ "path": path, "range": "-2", "new_content": "X" })))
            .await;
        assert!(!out.is_error, "{}", out.content);
        let result = std::fs::read_to_string(&path).unwrap();
        assert_eq!(result, "X\nc\nd\n");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn range_minus_s_plus_e_form() {
        let path = tmp_file("a\nb\nc\nd\ne\n");
        let out = EditFileTool
            .execute(&call(json!({ "path": path, "range": "-2 +4", "new_content": "X" })))
            .await;
        assert!(!out.is_error, "{}", out.content);
        let result = std::fs::read_to_string(&path).unwrap();
        assert_eq!(result, "X\ne\n");
        let _ = std::fs::remove_file(&path);
    }

    // ── explicit start_line/end_line form ────────────────────────────────

    #[tokio::test]
    async fn start_end_line_replaces_range() {
        let path = tmp_file("a\nb\nc\n");
        let out = EditFileTool
            .execute(&call(json!({ "path": path, "start_line": 1, "end_line": 1, "new_content": "A" })))
            .await;
        assert!(!out.is_error, "{}", out.content);
        let result = std::fs::read_to_string(&path).unwrap();
        assert_eq!(result, "A\nb\nc\n");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn out_of_bounds_end_line_clamps() {
        let path = tmp_file("a\nb\n");
        let out = EditFileTool
            .execute(&call(json!({ "path": path, "start_line": 1, "end_line": 99, "new_content": "X" })))
            .await;
        assert!(!out.is_error, "{}", out.content);
        let result = std::fs::read_to_string(&path).unwrap();
        assert_eq!(result, "X\n");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn start_after_end_is_error() {
        let path = tmp_file("a\nb\nc\n");
        let out = EditFileTool
            .execute(&call(json!({ "path": path, "start_line": 3, "end_line": 1, "new_content": "X" })))
            .await;
        assert!(out.is_error);
        let _ = std::fs::remove_file(&path);
    }

    // ── old_string/new_string form ────────────────────────────────────────

    #[tokio::test]
    async fn old_string_new_string_replaces_unique_match() {
        let path = tmp_file("let x = 1;\nlet y = 2;\n");
        let out = EditFileTool
            .execute(&call(json!({ "path": path, "old_string": "let x = 1;", "new_string": "let x = 42;" })))
            .await;
        assert!(!out.is_error, "{}", out.content);
        let result = std::fs::read_to_string(&path).unwrap();
        assert_eq!(result, "let x = 42;\nlet y = 2;\n");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn old_string_not_found_is_error() {
        let path = tmp_file("hello\n");
        let out = EditFileTool
            .execute(&call(json!({ "path": path, "old_string": "goodbye", "new_string": "x" })))
            .await;
        assert!(out.is_error);
        assert!(out.content.contains("not found"));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn old_string_not_unique_is_error() {
        let path = tmp_file("dup\ndup\n");
        let out = EditFileTool
            .execute(&call(json!({ "path": path, "old_string": "dup", "new_string": "x" })))
            .await;
        assert!(out.is_error);
        assert!(out.content.contains("not unique"));
        let _ = std::fs::remove_file(&path);
    }

    // ── dispatcher precedence and failure ─────────────────────────────────

    #[tokio::test]
    async fn no_valid_params_is_error() {
        let path = tmp_file("hello\n");
        let out = EditFileTool.execute(&call(json!({ "path": path }))).await;
        assert!(out.is_error);
        assert!(out.content.contains("no valid edit parameters"));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn range_string_takes_precedence_over_start_end_line() {
        let path = tmp_file("a\nb\nc\n");
        let out = EditFileTool
            .execute(&call(json!({
                "path": path, "range": "1-1", "start_line": 2, "end_line": 2, "new_content": "A"
            })))
            .await;
        assert!(!out.is_error, "{}", out.content);
        let result = std::fs::read_to_string(&path).unwrap();
        assert_eq!(result, "A\nb\nc\n");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_file_is_error() {
        let out = EditFileTool
            .execute(&call(json!({
                "path": "/tmp/sven_no_such_edit_xyz.txt", "old_string": "a", "new_string": "b"
            })))
            .await;
        assert!(out.is_error);
        assert!(out.content.contains("read error"));
    }

    #[test]
    fn parse_range_rejects_garbage() {
        assert!(parse_range("banana", 10).is_err());
    }
}
