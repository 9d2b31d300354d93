// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-run temp workspace.
//
// Lives beside the destination so promotion is a rename on the same
// filesystem. Everything inside is removed when the workspace is dropped,
// whether the run succeeded or not.

use std::fs;
use std::path::{Path, PathBuf};

use kompakt_core::error::{KompaktError, Result};
use kompakt_core::types::RunId;
use tempfile::TempDir;
use tracing::{debug, warn};

pub struct RunWorkspace {
    dir: TempDir,
}

impl RunWorkspace {
    /// Create `.kompakt-<run>-XXXX` in the directory that will receive
    /// `destination`.
    pub fn create(run_id: RunId, destination: &Path) -> Result<Self> {
        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let dir = tempfile::Builder::new()
            .prefix(&format!(".kompakt-{}-", run_id.short()))
            .tempdir_in(&parent)
            .map_err(|e| KompaktError::io(&parent, e))?;
        debug!(path = %dir.path().display(), "workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a temp file named `name` inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Move `staged` to `destination`, replacing any existing file.
    pub fn promote(&self, staged: &Path, destination: &Path) -> Result<()> {
        if fs::rename(staged, destination).is_ok() {
            return Ok(());
        }
        // Rename fails across filesystems; copy instead.
        warn!(to = %destination.display(), "rename failed; copying output");
        fs::copy(staged, destination).map_err(|e| KompaktError::io(destination, e))?;
        if let Err(e) = fs::remove_file(staged) {
            debug!(error = %e, "staged copy left for workspace cleanup");
        }
        Ok(())
    }
}

/// Size of the file at `path`.
pub(crate) fn file_size(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| KompaktError::io(path, e))
}

/// A tool that reported success must have left a file behind.
pub(crate) fn ensure_output(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(KompaktError::MissingOutput {
            path: path.to_path_buf(),
        })
    }
}
