// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SessionError;
use crate::session::Session;

const USF_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOrigin {
    Cli,
    Ide,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsfTask {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsfWorkspace {
    pub base_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsfOrchestration {
    pub flow_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsfStep {
    pub state_id: String,
    pub tool_id: String,
    pub files_hash: String,
    pub actions: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsfStats {
    pub step_count: usize,
}

/// Unified Session Format: the portable, tool-agnostic serialization of a
/// [`Session`] (spec §4.7). A USF document round-trips through
/// [`to_usf`]/[`from_usf`] modulo canonicalization of absent optionals (I7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedSession {
    pub version: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub origin: SessionOrigin,
    pub task: UsfTask,
    pub workspace: UsfWorkspace,
    pub orchestration: UsfOrchestration,
    pub steps: Vec<UsfStep>,
    pub checkpoints: Vec<String>,
    pub stats: UsfStats,
}

pub fn to_usf(session: &Session) -> UnifiedSession {
    let steps: Vec<UsfStep> = session
        .states
        .iter()
        .map(|s| UsfStep {
            state_id: s.id.clone(),
            tool_id: format!("schedule.S{}P{}", s.schedule, s.process),
            files_hash: s.files_hash.clone(),
            actions: s.actions.clone(),
            timestamp: s.created_at,
            success: true,
        })
        .collect();

    UnifiedSession {
        version: USF_VERSION.to_string(),
        session_id: session.id.clone(),
        created_at: session.created_at,
        updated_at: session.updated_at,
        origin: SessionOrigin::Cli,
        task: UsfTask {
            prompt: session.prompt.clone(),
        },
        workspace: UsfWorkspace {
            base_dir: session.base_dir.to_string_lossy().to_string(),
        },
        orchestration: UsfOrchestration {
            flow_code: session.flow_code.clone(),
        },
        checkpoints: session.states.last().map(|s| vec![s.id.clone()]).unwrap_or_default(),
        stats: UsfStats { step_count: steps.len() },
        steps,
    }
}

/// Reverses [`to_usf`]. Missing optional USF fields default to empty.
pub fn from_usf(usf: &UnifiedSession, base_dir: impl Into<PathBuf>) -> Session {
    let mut session = Session::new(base_dir);
    session.id = usf.session_id.clone();
    session.created_at = usf.created_at;
    session.updated_at = usf.updated_at;
    session.set_prompt(usf.task.prompt.clone());
    session.set_flow_code(usf.orchestration.flow_code.clone());

    let mut prev_id: Option<String> = None;
    let mut states = Vec::with_capacity(usf.steps.len());
    for (i, step) in usf.steps.iter().enumerate() {
        let (schedule, process) = parse_tool_id(&step.tool_id).unwrap_or((0, 0));
        states.push(crate::state::SessionState {
            id: step.state_id.clone(),
            prev: prev_id.clone(),
            next: None,
            files_hash: step.files_hash.clone(),
            actions: step.actions.clone(),
            created_at: step.timestamp,
            schedule,
            process,
        });
        prev_id = Some(step.state_id.clone());
        if i > 0 {
            let len = states.len();
            states[len - 2].next = Some(step.state_id.clone());
        }
    }
    session.states = states;
    session.notes = HashMap::new();
    session
}

fn parse_tool_id(tool_id: &str) -> Option<(u64, u64)> {
    let rest = tool_id.strip_prefix("schedule.S")?;
    let (sched, rest) = rest.split_once('P')?;
    Some((sched.parse().ok()?, rest.parse().ok()?))
}

pub fn validate_usf(usf: &UnifiedSession) -> Result<(), SessionError> {
    if usf.session_id.is_empty() {
        return Err(SessionError::Validation("usf session_id is empty".into()));
    }
    if usf.version.is_empty() {
        return Err(SessionError::Validation("usf version is empty".into()));
    }
    Ok(())
}

fn sessions_json_dir(config_dir: &Path) -> PathBuf {
    config_dir.join("sessions")
}

/// Writes `<config_dir>/sessions/<id>.json`, pretty-printed.
pub async fn save_usf(usf: &UnifiedSession, config_dir: &Path) -> Result<(), SessionError> {
    validate_usf(usf)?;
    let dir = sessions_json_dir(config_dir);
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(format!("{}.json", usf.session_id));
    let body = serde_json::to_string_pretty(usf)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

/// Legacy, pre-USF on-disk layout: `<base_dir>/sessions/<id>/...` as
/// written by [`Session::save`], with no `<config_dir>/sessions/<id>.json`
/// counterpart.
pub async fn convert_legacy_to_unified(base_dir: &Path, id: &str) -> Result<UnifiedSession, SessionError> {
    let session = Session::load(base_dir, id).await?;
    Ok(to_usf(&session))
}

/// Tries the Unified layout first, then falls back to converting a legacy
/// session directory.
pub async fn load_any_session(config_dir: &Path, base_dir: &Path, id: &str) -> Result<UnifiedSession, SessionError> {
    let unified_path = sessions_json_dir(config_dir).join(format!("{id}.json"));
    if let Ok(bytes) = tokio::fs::read(&unified_path).await {
        return Ok(serde_json::from_slice(&bytes)?);
    }
    convert_legacy_to_unified(base_dir, id).await
}

/// Always writes the Unified layout. If a colliding legacy session
/// directory exists, it is renamed aside (`.migrated_<id>`) rather than
/// overwritten.
pub async fn save_any_session(usf: &UnifiedSession, config_dir: &Path, base_dir: &Path) -> Result<(), SessionError> {
    let legacy_dir = base_dir.join("sessions").join(&usf.session_id);
    if legacy_dir.exists() {
        let migrated = base_dir.join("sessions").join(format!(".migrated_{}", usf.session_id));
        warn!(session_id = %usf.session_id, "migrating legacy session directory aside");
        tokio::fs::rename(&legacy_dir, &migrated).await?;
    }
    save_usf(usf, config_dir).await
}

/// Union of session ids visible via the Unified layout and the legacy
/// layout, deduplicated.
pub async fn list_all_sessions(config_dir: &Path, base_dir: &Path) -> Result<Vec<String>, SessionError> {
    let mut ids = std::collections::BTreeSet::new();

    let unified_dir = sessions_json_dir(config_dir);
    if let Ok(mut entries) = tokio::fs::read_dir(&unified_dir).await {
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.path().file_stem().and_then(|s| s.to_str()) {
                ids.insert(name.to_string());
            }
        }
    }

    for id in Session::list_sessions(base_dir).await? {
        ids.insert(id);
    }

    Ok(ids.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn to_usf_then_from_usf_round_trips_states_modulo_notes() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(dir.path());
        session.set_prompt("investigate flaky test");
        session.add_state(1, 1, vec!["read logs".into()]).await.unwrap();
        session.add_state(1, 2, vec!["patch retry".into()]).await.unwrap();

        let usf = to_usf(&session);
        validate_usf(&usf).unwrap();
        let restored = from_usf(&usf, dir.path());

        assert_eq!(restored.id, session.id);
        assert_eq!(restored.prompt, session.prompt);
        assert_eq!(restored.flow_code, session.flow_code);
        assert_eq!(restored.states.len(), session.states.len());
        assert_eq!(restored.states[0].schedule, session.states[0].schedule);
        assert_eq!(restored.states[0].process, session.states[0].process);
        assert_eq!(restored.states[0].next.as_deref(), Some(session.states[1].id.as_str()));
    }

    #[test]
    fn validate_usf_rejects_empty_session_id() {
        let mut usf = to_usf(&Session::new("."));
        usf.session_id = String::new();
        assert!(validate_usf(&usf).is_err());
    }

    #[tokio::test]
    async fn save_any_session_migrates_colliding_legacy_dir() {
        let base_dir = TempDir::new().unwrap();
        let config_dir = TempDir::new().unwrap();

        let mut legacy = Session::new(base_dir.path());
        legacy.add_state(1, 1, vec![]).await.unwrap();
        legacy.save().await.unwrap();

        let usf = to_usf(&legacy);
        save_any_session(&usf, config_dir.path(), base_dir.path()).await.unwrap();

        let migrated_dir = base_dir.path().join("sessions").join(format!(".migrated_{}", legacy.id));
        assert!(migrated_dir.exists());

        let loaded = load_any_session(config_dir.path(), base_dir.path(), &legacy.id).await.unwrap();
        assert_eq!(loaded.session_id, legacy.id);
    }
}
