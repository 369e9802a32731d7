// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use sven_config::AgentMode;

use crate::policy::ApprovalPolicy;
use crate::tool::{SideEffectClass, Tool, ToolCall, ToolOutput};

/// Sent to the collaborator UI when the agent asks a clarifying question; the
/// UI sends the answer back via `answer_tx`. The loop treats this tool's
/// suspension as the `WaitingForUser` state transition: the call simply
/// blocks on `answer_rx` until a caller provides a response.
pub struct UserQuestionRequest {
    pub call_id: String,
    pub question: String,
    pub answer_tx: oneshot::Sender<String>,
}

/// Suspends the agent loop to ask the user a single free-form question.
pub struct AskUserTool {
    question_tx: Option<mpsc::Sender<UserQuestionRequest>>,
    force_headless: bool,
}

impl AskUserTool {
    pub fn new(question_tx: mpsc::Sender<UserQuestionRequest>) -> Self {
        Self { question_tx: Some(question_tx), force_headless: false }
    }

    /// Headless instance: always returns an error instead of blocking.
    /// Used when no UI collaborator is attached (batch runs, CI, tests).
    pub fn new_headless() -> Self {
        Self { question_tx: None, force_headless: true }
    }
}

#[async_trait]
impl Tool for AskUserTool {
    fn name(&self) -> &str {
        "ask_user"
    }

    fn description(&self) -> &str {
        "Suspend and ask the user a clarifying question; resumes with their reply appended \
         as the next message. Unavailable in headless/batch runs — returns an error there, \
         so prefer stating your assumption and proceeding when no collaborator is attached."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": { "type": "string", "description": "The question to ask the user" }
            },
            "required": ["question"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::External
    }
    fn modes(&self) -> &[AgentMode] {
        &[AgentMode::Agent, AgentMode::Plan]
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let question = match call.args.get("question").and_then(|v| v.as_str()) {
            Some(q) => q.to_string(),
            None => return ToolOutput::err(&call.id, "missing 'question'"),
        };

        debug!(question = %question, "ask_user tool");

        if self.force_headless {
            return ToolOutput::err(
                &call.id,
                format!(
                    "ask_user is unavailable in headless mode. Question was: \"{question}\"\n\
                     Proceed with your best judgement and state your assumption clearly."
                ),
            );
        }

        let tx = match &self.question_tx {
            Some(tx) => tx,
            None => return ToolOutput::err(&call.id, "no user-input channel attached"),
        };

        let (answer_tx, answer_rx) = oneshot::channel();
        let req = UserQuestionRequest { call_id: call.id.clone(), question, answer_tx };
        if tx.send(req).await.is_err() {
            return ToolOutput::err(&call.id, "user-input channel closed unexpectedly");
        }

        match answer_rx.await {
            Ok(answer) => ToolOutput::ok(&call.id, answer),
            Err(_) => ToolOutput::err(&call.id, "question was cancelled before the user responded"),
        }
    }
}
