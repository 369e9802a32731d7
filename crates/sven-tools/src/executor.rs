// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::debug;

use crate::catalog::ToolRegistry;
use crate::tool::{SideEffectClass, ToolCall, ToolOutput};

const DEFAULT_CACHE_CAPACITY: usize = 256;
/// A batch of more than this many consecutive pure/read-only calls runs
/// concurrently; smaller batches run sequentially (spawning has overhead
/// that isn't worth it for one or two calls).
const PARALLEL_THRESHOLD: usize = 2;

fn cache_key(name: &str, args: &serde_json::Value) -> String {
    // serde_json's map serialization is insertion-ordered, not key-sorted, so
    // two semantically identical argument objects built in a different field
    // order would otherwise produce different cache keys. Re-serializing
    // through a BTreeMap canonicalizes key order before hashing.
    let canonical: serde_json::Value = match args {
        serde_json::Value::Object(map) => {
            let sorted: std::collections::BTreeMap<_, _> = map.iter().collect();
            serde_json::to_value(sorted).unwrap_or_else(|_| args.clone())
        }
        other => other.clone(),
    };
    format!("{name}|{canonical}")
}

/// Runs tool calls requested by a model turn: groups adjacent
/// pure/read-only calls for concurrent execution, runs mutating/external
/// calls strictly in order, and caches read-only results until the next
/// mutating or external call succeeds.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    cache: Mutex<LruCache<String, ToolOutput>>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self::with_capacity(registry, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(registry: Arc<ToolRegistry>, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self { registry, cache: Mutex::new(LruCache::new(cap)) }
    }

    /// Execute one tool call, consulting and maintaining the read cache.
    pub async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(tool) = self.registry.get(&call.name) else {
            return ToolOutput::err(&call.id, format!("unknown tool: {}", call.name));
        };
        let class = tool.side_effect();
        let key = cache_key(&call.name, &call.args);

        if !class.invalidates_cache() {
            if let Some(hit) = self.cache.lock().await.get(&key).cloned() {
                debug!(tool = %call.name, cache_hit = true, "tool executor cache hit");
                return ToolOutput { call_id: call.id.clone(), ..hit };
            }
        }

        let out = tool.execute(call).await;
        debug!(tool = %call.name, cache_hit = false, is_error = out.is_error, "tool executor dispatch");

        if class.invalidates_cache() {
            if !out.is_error {
                self.cache.lock().await.clear();
            }
        } else if !out.is_error {
            self.cache.lock().await.put(key, out.clone());
        }
        out
    }

    /// Execute a batch of tool calls from one model turn, preserving the
    /// caller's ordering in the returned `Vec`.
    ///
    /// Adjacent runs of `Pure`/`ReadOnly` calls longer than
    /// [`PARALLEL_THRESHOLD`] are dispatched concurrently via `tokio::spawn`
    /// and reassembled by original index; everything else — including
    /// `Mutating`/`External` calls and short read-only runs — executes
    /// strictly in order so side effects land in the sequence the model
    /// requested them.
    pub async fn execute_many(self: &Arc<Self>, calls: &[ToolCall]) -> Vec<ToolOutput> {
        let mut results: Vec<Option<ToolOutput>> = (0..calls.len()).map(|_| None).collect();
        let mut i = 0;
        while i < calls.len() {
            let class_of = |c: &ToolCall| {
                self.registry
                    .get(&c.name)
                    .map(|t| t.side_effect())
                    .unwrap_or(SideEffectClass::ReadOnly)
            };
            let run_start = i;
            while i < calls.len() && class_of(&calls[i]).is_parallelizable() {
                i += 1;
            }
            let run_len = i - run_start;

            if run_len > PARALLEL_THRESHOLD {
                let mut handles = Vec::with_capacity(run_len);
                for idx in run_start..i {
                    let executor = Arc::clone(self);
                    let call = calls[idx].clone();
                    handles.push((idx, tokio::spawn(async move { executor.execute(&call).await })));
                }
                for (idx, handle) in handles {
                    let out = handle.await.unwrap_or_else(|e| {
                        ToolOutput::err(&calls[idx].id, format!("tool task panicked: {e}"))
                    });
                    results[idx] = Some(out);
                }
            } else if run_len > 0 {
                for idx in run_start..i {
                    results[idx] = Some(self.execute(&calls[idx]).await);
                }
            } else {
                // Single mutating/external call — always sequential.
                results[i] = Some(self.execute(&calls[i]).await);
                i += 1;
            }
        }
        results.into_iter().map(|o| o.expect("every index filled")).collect()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
