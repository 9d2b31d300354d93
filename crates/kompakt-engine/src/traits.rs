// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trait seams between the pipeline and the external engines.
//
// The pipeline only ever talks to a `RenderEngine` (Ghostscript) and a
// `StructuralOptimizer` (mutool + qpdf). Tests substitute fakes that write
// files of a chosen size.

use std::path::{Path, PathBuf};

use kompakt_core::error::Result;

/// One external program call: executable, argument vector and the exit codes
/// that count as success. Arguments are never joined into a shell string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub expected_exit_codes: Vec<i32>,
}

impl EngineInvocation {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            expected_exit_codes: vec![0],
        }
    }

    pub fn accepts(&self, exit_code: i32) -> bool {
        self.expected_exit_codes.contains(&exit_code)
    }

    /// Program name for log fields.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// Captured result of an engine or tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Page renderer that rewrites PDFs (Ghostscript `pdfwrite`).
///
/// Calls block until the engine finishes. No implicit retry.
pub trait RenderEngine: Send + Sync {
    /// Short name for logs, e.g. `ghostscript (native)`.
    fn name(&self) -> &str;

    /// Run the engine with a full argument vector (without `argv[0]`).
    fn invoke(&self, args: &[String]) -> Result<EngineOutput>;

    /// Run a PostScript fragment with no output device.
    fn run_script(&self, script: &str) -> Result<EngineOutput>;

    /// Product and revision string.
    fn revision(&self) -> Result<String>;
}

/// Lossless structural rewriting (mutool clean + qpdf).
pub trait StructuralOptimizer: Send + Sync {
    /// Garbage-collect and deflate `input` into `output`.
    fn clean(&self, input: &Path, output: &Path) -> Result<()>;

    /// Recompress streams and generate object streams.
    fn optimize(&self, input: &Path, output: &Path) -> Result<()>;
}
