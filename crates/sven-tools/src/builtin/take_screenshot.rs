// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use tracing::debug;

use sven_config::AgentMode;

use crate::policy::ApprovalPolicy;
use crate::tool::{SideEffectClass, Tool, ToolCall, ToolOutput, ToolOutputPart};

/// Captures a screenshot via whatever platform tool is available: `scrot` or
/// `import` (ImageMagick) on X11, `screencapture` on macOS. Classified
/// external since it talks to the display server rather than the workspace.
pub struct TakeScreenshotTool;

async fn capture(output_path: &str) -> std::io::Result<std::process::Output> {
    let candidates: &[(&str, &[&str])] = &[
        ("scrot", &["-o"]),
        ("import", &["-window", "root"]),
        ("screencapture", &["-x"]),
    ];

    for (bin, fixed_args) in candidates {
        let has_bin = tokio::process::Command::new("which")
            .arg(bin)
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false);
        if !has_bin {
            continue;
        }
        let mut args: Vec<&str> = fixed_args.to_vec();
        args.push(output_path);
        return tokio::process::Command::new(bin)
            .args(&args)
            .stdin(std::process::Stdio::null())
            .output()
            .await;
    }
    Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no screenshot backend found (scrot, import, screencapture)"))
}

#[async_trait]
impl Tool for TakeScreenshotTool {
    fn name(&self) -> &str {
        "take_screenshot"
    }

    fn description(&self) -> &str {
        "Capture the current screen and return it as an image for visual inspection.\n\
         Requires a display server and one of scrot/ImageMagick/screencapture installed; \
         errors in headless environments with no GUI."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {}, "additionalProperties": false })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Ask
    }
    fn side_effect(&self) -> SideEffectClass {
        SideEffectClass::External
    }
    fn modes(&self) -> &[AgentMode] {
        &[AgentMode::Agent]
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let path = format!("/tmp/sven_screenshot_{}_{}.png", std::process::id(), uuid::Uuid::new_v4());
        debug!(path = %path, "take_screenshot tool");

        let result = capture(&path).await;
        match result {
            Ok(output) if output.status.success() => {
                let bytes = match tokio::fs::read(&path).await {
                    Ok(b) => b,
                    Err(e) => return ToolOutput::err(&call.id, format!("screenshot captured but unreadable: {e}")),
                };
                let _ = tokio::fs::remove_file(&path).await;
                let b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
                ToolOutput::with_parts(
                    &call.id,
                    vec![
                        ToolOutputPart::Text("screenshot captured".to_string()),
                        ToolOutputPart::Image(format!("data:image/png;base64,{b64}")),
                    ],
                )
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                ToolOutput::err(&call.id, format!("screenshot tool exited with error: {stderr}"))
            }
            Err(e) => ToolOutput::err(&call.id, format!("screenshot error: {e}")),
        }
    }
}
