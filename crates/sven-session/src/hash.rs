// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::Path;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Content-hash fingerprint of a workspace: walks `workspace_root`
/// depth-first, skips dotfiles, `node_modules`, and `sessions_base_dir`,
/// sorts the remaining regular-file paths lexicographically, and feeds
/// `(relative_path_bytes ++ file_bytes)` of each into one SHA-256 hasher.
pub fn files_hash(workspace_root: &Path, sessions_base_dir: &Path) -> std::io::Result<String> {
    let mut paths: Vec<std::path::PathBuf> = WalkDir::new(workspace_root)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            if name.starts_with('.') || name == "node_modules" {
                return false;
            }
            e.path() != sessions_base_dir
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();
    paths.sort();

    let mut hasher = Sha256::new();
    for path in &paths {
        let rel = path.strip_prefix(workspace_root).unwrap_or(path);
        hasher.update(rel.to_string_lossy().as_bytes());
        let bytes = std::fs::read(path)?;
        hasher.update(&bytes);
    }
    Ok(hex::encode(hasher.finalize()))
}
