// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::policy::ApprovalPolicy;
use crate::tool::{SideEffectClass, Tool, ToolCall, ToolOutput};

/// Cross-session key/value memory, persisted to a JSON file
/// (default `~/.config/sven/memory.json`). Split into four tools matching
/// the side-effect table: retrieve/list are `Pure`, store/delete are
/// `Mutating`.
fn default_memory_path() -> String {
    let home = dirs::home_dir().map(|h| h.to_string_lossy().to_string()).unwrap_or_else(|| "/tmp".to_string());
    format!("{home}/.config/sven/memory.json")
}

async fn load_store(path: &str) -> HashMap<String, String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => HashMap::new(),
    }
}

async fn save_store(path: &str, store: &HashMap<String, String>) -> anyhow::Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let json = serde_json::to_string_pretty(store)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[derive(Default)]
pub struct MemoryStoreTool {
    pub memory_file: Option<String>,
}

impl MemoryStoreTool {
    fn path(&self) -> String {
        self.memory_file.clone().unwrap_or_else(default_memory_path)
    }
}

#[async_trait]
impl Tool for MemoryStoreTool {
    fn name(&self) -> &str {
        "memory:store"
    }

    fn description(&self) -> &str {
        "Persist a key/value pair to cross-session memory. Overwrites any existing value for the key."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "key": { "type": "string" },
                "value": { "type": "string" }
            },
            "required": ["key", "value"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::Mutating
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let key = match call.args.get("key").and_then(|v| v.as_str()) {
            Some(k) => k.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'key'"),
        };
        let value = match call.args.get("value").and_then(|v| v.as_str()) {
            Some(v) => v.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'value'"),
        };

        debug!(key = %key, "memory:store tool");

        let path = self.path();
        let mut store = load_store(&path).await;
        store.insert(key.clone(), value);
        match save_store(&path, &store).await {
            Ok(()) => ToolOutput::ok(&call.id, format!("stored {key}")),
            Err(e) => ToolOutput::err(&call.id, format!("save error: {e}")),
        }
    }
}

#[derive(Default)]
pub struct MemoryRetrieveTool {
    pub memory_file: Option<String>,
}

impl MemoryRetrieveTool {
    fn path(&self) -> String {
        self.memory_file.clone().unwrap_or_else(default_memory_path)
    }
}

#[async_trait]
impl Tool for MemoryRetrieveTool {
    fn name(&self) -> &str {
        "memory:retrieve"
    }

    fn description(&self) -> &str {
        "Retrieve a value previously stored with memory:store. Errors if the key is absent."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "key": { "type": "string" } },
            "required": ["key"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::Pure
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let key = match call.args.get("key").and_then(|v| v.as_str()) {
            Some(k) => k.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'key'"),
        };

        debug!(key = %key, "memory:retrieve tool");

        let store = load_store(&self.path()).await;
        match store.get(&key) {
            Some(v) => ToolOutput::ok(&call.id, v.clone()),
            None => ToolOutput::err(&call.id, format!("key not found: {key}")),
        }
    }
}

#[derive(Default)]
pub struct MemoryListTool {
    pub memory_file: Option<String>,
}

impl MemoryListTool {
    fn path(&self) -> String {
        self.memory_file.clone().unwrap_or_else(default_memory_path)
    }
}

#[async_trait]
impl Tool for MemoryListTool {
    fn name(&self) -> &str {
        "memory:list"
    }

    fn description(&self) -> &str {
        "List all keys currently stored in cross-session memory."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {}, "additionalProperties": false })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::Pure
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        debug!("memory:list tool");
        let store = load_store(&self.path()).await;
        if store.is_empty() {
            return ToolOutput::ok(&call.id, "(no keys stored)");
        }
        let mut keys: Vec<&str> = store.keys().map(String::as_str).collect();
        keys.sort();
        ToolOutput::ok(&call.id, keys.join("\n"))
    }
}

#[derive(Default)]
pub struct MemoryDeleteTool {
    pub memory_file: Option<String>,
}

impl MemoryDeleteTool {
    fn path(&self) -> String {
        self.memory_file.clone().unwrap_or_else(default_memory_path)
    }
}

#[async_trait]
impl Tool for MemoryDeleteTool {
    fn name(&self) -> &str {
        "memory:delete"
    }

    fn description(&self) -> &str {
        "Remove a key from cross-session memory. Errors if the key is absent."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "key": { "type": "string" } },
            "required": ["key"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::Mutating
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let key = match call.args.get("key").and_then(|v| v.as_str()) {
            Some(k) => k.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'key'"),
        };

        debug!(key = %key, "memory:delete tool");

        let path = self.path();
        let mut store = load_store(&path).await;
        if store.remove(&key).is_none() {
            return ToolOutput::err(&call.id, format!("key not found: {key}"));
        }
        match save_store(&path, &store).await {
            Ok(()) => ToolOutput::ok(&call.id, format!("deleted {key}")),
            Err(e) => ToolOutput::err(&call.id, format!("save error: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tool::{Tool, ToolCall};

    fn tmp_path() -> String {
        use std::sync::atomic::{AtomicU32, Ordering};
        static CTR: AtomicU32 = AtomicU32::new(0);
        let n = CTR.fetch_add(1, Ordering::Relaxed);
        format!("/tmp/sven_memory_test_{}_{n}.json", std::process::id())
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall { id: "mem1".into(), name: name.into(), args }
    }

    #[tokio::test]
    async fn store_then_retrieve() {
        let path = tmp_path();
        let store_tool = MemoryStoreTool { memory_file: Some(path.clone()) };
        let retrieve_tool = MemoryRetrieveTool { memory_file: Some(path.clone()) };

        store_tool.execute(&call("memory:store", json!({"key": "name", "value": "sven"}))).await;
        let out = retrieve_tool.execute(&call("memory:retrieve", json!({"key": "name"}))).await;
        assert!(!out.is_error, "{}", out.content);
        assert_eq!(out.content, "sven");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn retrieve_missing_key_is_error() {
        let path = tmp_path();
        let retrieve_tool = MemoryRetrieveTool { memory_file: Some(path.clone()) };
        let out = retrieve_tool.execute(&call("memory:retrieve", json!({"key": "missing"}))).await;
        assert!(out.is_error);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn list_returns_sorted_keys() {
        let path = tmp_path();
        let store_tool = MemoryStoreTool { memory_file: Some(path.clone()) };
        let list_tool = MemoryListTool { memory_file: Some(path.clone()) };

        store_tool.execute(&call("memory:store", json!({"key": "b", "value": "2"}))).await;
        store_tool.execute(&call("memory:store", json!({"key": "a", "value": "1"}))).await;
        let out = list_tool.execute(&call("memory:list", json!({}))).await;
        assert_eq!(out.content, "a\nb");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn delete_removes_key() {
        let path = tmp_path();
        let store_tool = MemoryStoreTool { memory_file: Some(path.clone()) };
        let delete_tool = MemoryDeleteTool { memory_file: Some(path.clone()) };
        let retrieve_tool = MemoryRetrieveTool { memory_file: Some(path.clone()) };

        store_tool.execute(&call("memory:store", json!({"key": "x", "value": "1"}))).await;
        delete_tool.execute(&call("memory:delete", json!({"key": "x"}))).await;
        let out = retrieve_tool.execute(&call("memory:retrieve", json!({"key": "x"}))).await;
        assert!(out.is_error);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn side_effect_classes_match_spec() {
        assert_eq!(MemoryStoreTool::default().side_effect(), SideEffectClass::Mutating);
        assert_eq!(MemoryDeleteTool::default().side_effect(), SideEffectClass::Mutating);
        assert_eq!(MemoryRetrieveTool::default().side_effect(), SideEffectClass::Pure);
        assert_eq!(MemoryListTool::default().side_effect(), SideEffectClass::Pure);
    }
}
