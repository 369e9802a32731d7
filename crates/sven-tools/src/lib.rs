// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
pub mod builtin;
pub mod catalog;
pub mod events;
pub mod executor;
pub mod policy;
pub mod tool;

pub use catalog::{ToolRegistry, ToolSchema};
pub use events::{TodoItem, ToolEvent};
pub use executor::ToolExecutor;
pub use policy::{ApprovalPolicy, ToolPolicy};
pub use tool::{OutputCategory, SideEffectClass, Tool, ToolCall, ToolOutput, ToolOutputPart};

// Reasoning / bookkeeping
pub use builtin::complete::CompleteTool;
pub use builtin::think::ThinkTool;

// Filesystem
pub use builtin::batch_read::BatchReadTool;
pub use builtin::delete::DeleteTool;
pub use builtin::edit_file::EditFileTool;
pub use builtin::glob_search::GlobSearchTool;
pub use builtin::list_directory::ListDirectoryTool;
pub use builtin::mkdir::MkdirTool;
pub use builtin::move_tool::MoveTool;
pub use builtin::multi_edit::MultiEditTool;
pub use builtin::read_file::ReadFileTool;
pub use builtin::search_files::SearchFilesTool;
pub use builtin::search_replace::SearchReplaceTool;
pub use builtin::write_file::WriteFileTool;

// Code search / navigation
pub use builtin::codebase_search::CodebaseSearchTool;
pub use builtin::find_definition::FindDefinitionTool;
pub use builtin::find_references::FindReferencesTool;
pub use builtin::grep::GrepTool;

// Git
pub use builtin::git::{GitCommitTool, GitDiffTool, GitStatusTool};

// Memory
pub use builtin::memory::{MemoryDeleteTool, MemoryListTool, MemoryRetrieveTool, MemoryStoreTool};

// Todo list
pub use builtin::todo::{
    TodoAddTool, TodoCompleteTool, TodoListTool, TodoRemoveTool, TodoState, TodoUpdateTool,
};

// Shell / build / test / lint
pub use builtin::build::BuildTool;
pub use builtin::lint::LintTool;
pub use builtin::run_command::RunCommandTool;
pub use builtin::run_tests::RunTestsTool;

// Web
pub use builtin::fetch_url::FetchUrlTool;
pub use builtin::web_search::WebSearchTool;

// External / collaborator
pub use builtin::ask_user::{AskUserTool, UserQuestionRequest};
pub use builtin::take_screenshot::TakeScreenshotTool;
