// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sequence-indexed entry in a session's recurrence graph: a
/// schedule/process transition with a content-hash fingerprint of the
/// workspace at the moment it was recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    /// `NNNN-SsPp`: 4-digit sequence number, schedule id, process id.
    pub id: String,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub files_hash: String,
    pub actions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub schedule: u64,
    pub process: u64,
}

pub fn format_state_id(sequence: u64, schedule: u64, process: u64) -> String {
    format!("{sequence:04}-S{schedule}P{process}")
}
