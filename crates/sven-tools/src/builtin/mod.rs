// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
pub mod ask_user;
pub mod batch_read;
pub mod build;
pub mod codebase_search;
pub mod complete;
pub mod delete;
pub mod edit_file;
pub mod fetch_url;
pub mod find_definition;
pub mod find_references;
pub mod git;
pub mod glob_search;
pub mod grep;
pub mod lint;
pub mod list_directory;
pub mod memory;
pub mod mkdir;
pub mod move_tool;
pub mod multi_edit;
pub mod read_file;
pub mod run_command;
pub mod search_files;
pub mod search_replace;
pub mod take_screenshot;
pub mod think;
pub mod todo;
pub mod web_search;
pub mod write_file;

// ─── OutputCategory contract tests ───────────────────────────────────────────
//
// Each builtin tool that overrides `output_category()` is verified here so
// that renames or copy-paste errors are caught at compile time with a clear
// failure message.  Tools that intentionally use the default (Generic) are
// also listed so that adding an override never silently goes un-reviewed.
#[cfg(test)]
mod output_category_tests {
    use crate::tool::OutputCategory;
    use crate::Tool;

    // ── HeadTail tools (terminal / process output) ────────────────────────────

    #[test]
    fn run_command_is_headtail_by_default_generic() {
        // run_command intentionally keeps the default truncation: it is a
        // free-form shell command, not a structured head/tail report.
        let t = super::run_command::RunCommandTool::default();
        assert_eq!(t.output_category(), OutputCategory::Generic);
    }

    #[test]
    fn run_tests_is_headtail() {
        let t = super::run_tests::RunTestsTool;
        assert_eq!(t.output_category(), OutputCategory::HeadTail);
    }

    #[test]
    fn build_is_headtail() {
        let t = super::build::BuildTool;
        assert_eq!(t.output_category(), OutputCategory::HeadTail);
    }

    #[test]
    fn git_diff_is_headtail() {
        let t = super::git::GitDiffTool;
        assert_eq!(t.output_category(), OutputCategory::HeadTail);
    }

    // ── MatchList tools (ordered result sets) ────────────────────────────────

    #[test]
    fn grep_tool_is_matchlist() {
        let t = super::grep::GrepTool;
        assert_eq!(t.output_category(), OutputCategory::MatchList);
    }

    #[test]
    fn codebase_search_is_matchlist() {
        let t = super::codebase_search::CodebaseSearchTool;
        assert_eq!(t.output_category(), OutputCategory::MatchList);
    }

    #[test]
    fn lint_is_matchlist() {
        let t = super::lint::LintTool;
        assert_eq!(t.output_category(), OutputCategory::MatchList);
    }

    #[test]
    fn glob_search_is_matchlist() {
        let t = super::glob_search::GlobSearchTool;
        assert_eq!(t.output_category(), OutputCategory::MatchList);
    }

    #[test]
    fn search_files_is_matchlist() {
        let t = super::search_files::SearchFilesTool;
        assert_eq!(t.output_category(), OutputCategory::MatchList);
    }

    #[test]
    fn find_definition_is_matchlist() {
        let t = super::find_definition::FindDefinitionTool;
        assert_eq!(t.output_category(), OutputCategory::MatchList);
    }

    #[test]
    fn find_references_is_matchlist() {
        let t = super::find_references::FindReferencesTool;
        assert_eq!(t.output_category(), OutputCategory::MatchList);
    }

    #[test]
    fn git_status_is_matchlist() {
        let t = super::git::GitStatusTool;
        assert_eq!(t.output_category(), OutputCategory::MatchList);
    }

    // ── FileContent tools (file reads) ────────────────────────────────────────

    #[test]
    fn read_file_is_filecontent() {
        let t = super::read_file::ReadFileTool;
        assert_eq!(t.output_category(), OutputCategory::FileContent);
    }

    #[test]
    fn batch_read_is_filecontent() {
        let t = super::batch_read::BatchReadTool;
        assert_eq!(t.output_category(), OutputCategory::FileContent);
    }

    // ── Generic tools (no override — hard truncation) ─────────────────────────

    #[test]
    fn write_file_is_generic() {
        let t = super::write_file::WriteFileTool;
        assert_eq!(t.output_category(), OutputCategory::Generic);
    }

    #[test]
    fn list_directory_is_generic() {
        let t = super::list_directory::ListDirectoryTool;
        assert_eq!(t.output_category(), OutputCategory::Generic);
    }

    #[test]
    fn edit_file_is_generic() {
        let t = super::edit_file::EditFileTool;
        assert_eq!(t.output_category(), OutputCategory::Generic);
    }

    #[test]
    fn delete_is_generic() {
        let t = super::delete::DeleteTool;
        assert_eq!(t.output_category(), OutputCategory::Generic);
    }

    #[test]
    fn fetch_url_is_generic() {
        let t = super::fetch_url::FetchUrlTool;
        assert_eq!(t.output_category(), OutputCategory::Generic);
    }

    #[test]
    fn web_search_is_generic() {
        let t = super::web_search::WebSearchTool { api_key: None };
        assert_eq!(t.output_category(), OutputCategory::Generic);
    }
}
