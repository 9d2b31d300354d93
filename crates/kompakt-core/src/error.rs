// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for kompakt.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::{RunKind, Stage};

/// Top-level error type for all kompakt operations.
#[derive(Debug, Error)]
pub enum KompaktError {
    // -- Engine errors --
    #[error("rendering engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("rendering engine failed with code {code} ({reason}): {detail}")]
    EngineInvocationFailed {
        code: i32,
        reason: String,
        detail: String,
    },

    // -- External optimizer tools --
    #[error("{tool} failed (exit code {exit_code:?}): {stderr}")]
    ExternalToolFailed {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("optimizer tools unavailable: {0}")]
    ToolsUnavailable(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    // -- Pipeline errors --
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<KompaktError>,
    },

    #[error("stage produced no output at {}", path.display())]
    MissingOutput { path: PathBuf },

    #[error("cancelled during {stage}")]
    Cancelled { stage: Stage },

    #[error("a {0} run is already in progress")]
    AlreadyRunning(RunKind),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("background worker failed: {0}")]
    Worker(String),

    // -- Storage / persistence --
    #[error("file I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KompaktError {
    /// I/O error tagged with the path it concerned.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wrap the error with the stage it occurred in. Already-staged and
    /// cancellation errors are returned unchanged.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            Self::Stage { .. } | Self::Cancelled { .. } => self,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error was raised in, if it was tagged with one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } | Self::Cancelled { stage } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, looking through stage wrappers.
    pub fn root(&self) -> &KompaktError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KompaktError>;
