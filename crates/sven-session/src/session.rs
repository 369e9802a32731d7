// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::flow;
use crate::hash::files_hash;
use crate::note::{Note, NoteDestination};
use crate::state::{format_state_id, SessionState};

const SESSIONS_DIR: &str = "sessions";

/// On-disk recurrence graph for one orchestration session: an ordered list
/// of [`SessionState`]s threaded by `prev`/`next`, the flow code summarising
/// schedule/process transitions (I5), and destination-keyed notes.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub prompt: String,
    pub flow_code: String,
    pub states: Vec<SessionState>,
    pub notes: HashMap<NoteDestination, Vec<Note>>,
    pub base_dir: PathBuf,
    sequence: AtomicU64,
    add_state_lock: Mutex<()>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionMeta {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Recurrence {
    flow_code: String,
    states: Vec<SessionState>,
}

impl Session {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            prompt: String::new(),
            flow_code: String::new(),
            states: Vec::new(),
            notes: HashMap::new(),
            base_dir: base_dir.into(),
            sequence: AtomicU64::new(0),
            add_state_lock: Mutex::new(()),
        }
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
        self.updated_at = Utc::now();
    }

    fn session_dir(&self) -> PathBuf {
        self.base_dir.join(SESSIONS_DIR).join(&self.id)
    }

    /// Records one state transition (I3/I4/I5). Sequence numbers are
    /// assigned under `add_state_lock` so concurrent callers can't race on
    /// the same sequence number or flow-code tail.
    pub async fn add_state(
        &mut self,
        schedule: u64,
        process: u64,
        actions: Vec<String>,
    ) -> Result<String, SessionError> {
        let _guard = self.add_state_lock.lock().await;

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format_state_id(sequence, schedule, process);

        let hash = files_hash(&self.base_dir, &self.base_dir.join(SESSIONS_DIR))
            .unwrap_or_else(|_| String::new());

        let prev_id = self.states.last().map(|s| s.id.clone());
        if let Some(prev) = self.states.last_mut() {
            prev.next = Some(id.clone());
        }

        let last_schedule = self.states.last().map(|s| s.schedule);
        self.flow_code = flow::append_state(&self.flow_code, last_schedule, schedule, process);

        let state = SessionState {
            id: id.clone(),
            prev: prev_id,
            next: None,
            files_hash: hash,
            actions,
            created_at: Utc::now(),
            schedule,
            process,
        };
        self.states.push(state);
        self.updated_at = Utc::now();

        debug!(state_id = %id, schedule, process, flow_code = %self.flow_code, "recorded session state");
        Ok(id)
    }

    pub fn add_note(&mut self, destination: NoteDestination, content: impl Into<String>, source: impl Into<String>) {
        self.notes
            .entry(destination)
            .or_default()
            .push(Note::new(content, source));
        self.updated_at = Utc::now();
    }

    pub fn get_state(&self, id: &str) -> Option<&SessionState> {
        self.states.iter().find(|s| s.id == id)
    }

    pub fn get_all_states(&self) -> &[SessionState] {
        &self.states
    }

    pub fn set_flow_code(&mut self, flow_code: impl Into<String>) {
        self.flow_code = flow_code.into();
    }

    pub fn get_flow_code(&self) -> &str {
        &self.flow_code
    }

    /// Marks the flow code with the terminal error marker and returns the
    /// id of the last recorded state, if any.
    pub fn freeze_state(&mut self) -> Option<String> {
        self.flow_code = flow::mark_error(&self.flow_code);
        self.states.last().map(|s| s.id.clone())
    }

    /// Materializes `meta.json`, `flow.code`, `states/recurrence.json`,
    /// one `states/<id>.state` per state, `notes/{orchestrator,agent,human}.json`,
    /// and `restore.sh` under `<base_dir>/sessions/<id>/`.
    pub async fn save(&self) -> Result<(), SessionError> {
        let dir = self.session_dir();
        tokio::fs::create_dir_all(dir.join("states")).await?;
        tokio::fs::create_dir_all(dir.join("notes")).await?;

        let meta = SessionMeta {
            id: self.id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            prompt: self.prompt.clone(),
        };
        write_atomic(&dir.join("meta.json"), &serde_json::to_string_pretty(&meta)?).await?;
        write_atomic(&dir.join("flow.code"), &self.flow_code).await?;

        let recurrence = Recurrence {
            flow_code: self.flow_code.clone(),
            states: self.states.clone(),
        };
        write_atomic(
            &dir.join("states").join("recurrence.json"),
            &serde_json::to_string_pretty(&recurrence)?,
        )
        .await?;

        for state in &self.states {
            let path = dir.join("states").join(format!("{}.state", state.id));
            write_atomic(&path, &serde_json::to_string_pretty(state)?).await?;
        }

        for dest in [NoteDestination::Orchestrator, NoteDestination::Agent, NoteDestination::Human] {
            let notes = self.notes.get(&dest).cloned().unwrap_or_default();
            let path = dir.join("notes").join(format!("{}.json", dest.as_str()));
            write_atomic(&path, &serde_json::to_string_pretty(&notes)?).await?;
        }

        write_atomic(&dir.join("restore.sh"), &crate::restore::render_script(&self.id)).await?;
        set_executable(&dir.join("restore.sh")).await?;

        Ok(())
    }

    /// `save()` plus an explicit recurrence rewrite, for callers that
    /// checkpoint mid-run rather than only at the end.
    pub async fn checkpoint(&self) -> Result<(), SessionError> {
        self.save().await
    }

    /// Loads a session, tolerantly rebuilding the state list from
    /// individual `.state` files when `recurrence.json` is missing or does
    /// not embed `states` (e.g. hand-edited or from an older layout).
    pub async fn load(base_dir: impl Into<PathBuf>, id: &str) -> Result<Self, SessionError> {
        let base_dir = base_dir.into();
        let dir = base_dir.join(SESSIONS_DIR).join(id);
        if !dir.exists() {
            return Err(SessionError::NotFound(id.to_string()));
        }

        let meta_bytes = tokio::fs::read(dir.join("meta.json")).await?;
        let meta: SessionMeta = serde_json::from_slice(&meta_bytes)?;

        let recurrence_path = dir.join("states").join("recurrence.json");
        let (flow_code, states) = match tokio::fs::read(&recurrence_path).await {
            Ok(bytes) => {
                let recurrence: Recurrence = serde_json::from_slice(&bytes)?;
                (recurrence.flow_code, recurrence.states)
            }
            Err(_) => {
                warn!(session_id = %id, "recurrence.json missing, rebuilding from state files");
                let flow_code = tokio::fs::read_to_string(dir.join("flow.code"))
                    .await
                    .unwrap_or_default();
                (flow_code, load_states_from_dir(&dir.join("states")).await?)
            }
        };

        let mut notes = HashMap::new();
        for dest in [NoteDestination::Orchestrator, NoteDestination::Agent, NoteDestination::Human] {
            let path = dir.join("notes").join(format!("{}.json", dest.as_str()));
            if let Ok(bytes) = tokio::fs::read(&path).await {
                let list: Vec<Note> = serde_json::from_slice(&bytes)?;
                notes.insert(dest, list);
            }
        }

        let sequence = states.len() as u64;
        Ok(Self {
            id: meta.id,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
            prompt: meta.prompt,
            flow_code,
            states,
            notes,
            base_dir,
            sequence: AtomicU64::new(sequence),
            add_state_lock: Mutex::new(()),
        })
    }

    pub async fn list_sessions(base_dir: impl AsRef<Path>) -> Result<Vec<String>, SessionError> {
        let dir = base_dir.as_ref().join(SESSIONS_DIR);
        let mut ids = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(_) => return Ok(ids),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn generate_summary(&self) -> String {
        format!(
            "session {} ({} states, flow {}): {}",
            self.id,
            self.states.len(),
            if self.flow_code.is_empty() { "-" } else { &self.flow_code },
            self.prompt,
        )
    }
}

async fn load_states_from_dir(states_dir: &Path) -> Result<Vec<SessionState>, SessionError> {
    let mut states = Vec::new();
    let mut entries = match tokio::fs::read_dir(states_dir).await {
        Ok(e) => e,
        Err(_) => return Ok(states),
    };
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("state") {
            let bytes = tokio::fs::read(&path).await?;
            states.push(serde_json::from_slice::<SessionState>(&bytes)?);
        }
    }
    states.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(states)
}

async fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(format!(".tmp-{}", Uuid::new_v4()));
    let tmp_path = PathBuf::from(tmp_name);
    tokio::fs::write(&tmp_path, content).await?;
    tokio::fs::rename(&tmp_path, path).await
}

#[cfg(unix)]
async fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o755);
    tokio::fs::set_permissions(path, perms).await
}

#[cfg(not(unix))]
async fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn add_state_links_prev_next_and_increments_sequence() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(dir.path());
        let a = session.add_state(1, 1, vec!["plan".into()]).await.unwrap();
        let b = session.add_state(1, 2, vec!["act".into()]).await.unwrap();

        assert_eq!(a, "0001-S1P1");
        assert_eq!(b, "0002-S1P2");
        assert_eq!(session.get_state(&a).unwrap().next.as_deref(), Some(b.as_str()));
        assert_eq!(session.get_state(&b).unwrap().prev.as_deref(), Some(a.as_str()));
    }

    #[tokio::test]
    async fn flow_code_omits_schedule_marker_when_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(dir.path());
        session.add_state(1, 1, vec![]).await.unwrap();
        session.add_state(1, 2, vec![]).await.unwrap();
        session.add_state(2, 1, vec![]).await.unwrap();
        assert_eq!(session.get_flow_code(), "S1P1P2S2P1");
    }

    #[tokio::test]
    async fn save_then_load_round_trips_states_and_flow_code() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(dir.path());
        session.set_prompt("fix the bug");
        session.add_state(1, 1, vec!["investigate".into()]).await.unwrap();
        session.add_note(NoteDestination::Human, "needs review", "orchestrator");
        session.save().await.unwrap();

        let loaded = Session::load(dir.path(), &session.id).await.unwrap();
        assert_eq!(loaded.prompt, "fix the bug");
        assert_eq!(loaded.flow_code, session.flow_code);
        assert_eq!(loaded.states.len(), 1);
        assert_eq!(loaded.notes.get(&NoteDestination::Human).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn load_rebuilds_from_state_files_when_recurrence_missing() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(dir.path());
        session.add_state(1, 1, vec![]).await.unwrap();
        session.save().await.unwrap();

        let recurrence_path = session.session_dir().join("states").join("recurrence.json");
        tokio::fs::remove_file(&recurrence_path).await.unwrap();

        let loaded = Session::load(dir.path(), &session.id).await.unwrap();
        assert_eq!(loaded.states.len(), 1);
    }

    #[tokio::test]
    async fn list_sessions_returns_sorted_ids() {
        let dir = TempDir::new().unwrap();
        let mut s1 = Session::new(dir.path());
        s1.save().await.unwrap();
        let mut s2 = Session::new(dir.path());
        s2.save().await.unwrap();

        let ids = Session::list_sessions(dir.path()).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&s1.id));
        assert!(ids.contains(&s2.id));
    }

    #[test]
    fn freeze_state_appends_error_marker() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(dir.path());
        session.set_flow_code("S1P1");
        session.freeze_state();
        assert_eq!(session.get_flow_code(), "S1P1X");
    }
}
