// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lossless optimizers: `mutool clean` and `qpdf`.

use std::path::{Path, PathBuf};

use kompakt_core::error::{KompaktError, Result};
use tracing::{info, instrument};

use crate::process;
use crate::traits::{EngineInvocation, StructuralOptimizer};

pub const CLEANER: &str = "mutool";
pub const OPTIMIZER: &str = "qpdf";

/// Directories searched before `PATH`: the configured directory, then a
/// `tools/` directory beside the running binary.
pub fn search_dirs(tools_dir: Option<&Path>) -> Vec<PathBuf> {
    tools_dir
        .map(Path::to_path_buf)
        .into_iter()
        .chain(process::beside_executable("tools"))
        .collect()
}

/// `mutool clean -g -z <in> <out>`
pub fn clean_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "clean".into(),
        "-g".into(),
        "-z".into(),
        input.to_string_lossy().into_owned(),
        output.to_string_lossy().into_owned(),
    ]
}

/// `qpdf <in> --compress-streams=y … <out>`
pub fn optimize_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        input.to_string_lossy().into_owned(),
        "--compress-streams=y".into(),
        "--decode-level=generalized".into(),
        "--recompress-flate".into(),
        "--compression-level=9".into(),
        "--optimize-images".into(),
        "--object-streams=generate".into(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Both optimizer executables, located together. Either one missing makes
/// the pair unavailable.
#[derive(Debug, Clone)]
pub struct OptimizerTools {
    mutool: PathBuf,
    qpdf: PathBuf,
}

impl OptimizerTools {
    pub fn new(mutool: impl Into<PathBuf>, qpdf: impl Into<PathBuf>) -> Self {
        Self {
            mutool: mutool.into(),
            qpdf: qpdf.into(),
        }
    }

    #[instrument(skip_all)]
    pub fn locate(tools_dir: Option<&Path>) -> Result<Self> {
        let dirs = search_dirs(tools_dir);
        let mutool = process::find_program(CLEANER, &dirs);
        let qpdf = process::find_program(OPTIMIZER, &dirs);

        match (mutool, qpdf) {
            (Some(mutool), Some(qpdf)) => {
                info!(mutool = %mutool.display(), qpdf = %qpdf.display(), "optimizer tools located");
                Ok(Self { mutool, qpdf })
            }
            (mutool, qpdf) => {
                let missing: Vec<&str> = [(CLEANER, mutool.is_none()), (OPTIMIZER, qpdf.is_none())]
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                Err(KompaktError::ToolsUnavailable(format!("{} not found", missing.join(" and "))))
            }
        }
    }

    pub fn mutool(&self) -> &Path {
        &self.mutool
    }

    pub fn qpdf(&self) -> &Path {
        &self.qpdf
    }

    fn run_tool(tool: &str, invocation: EngineInvocation) -> Result<()> {
        let output = process::run(&invocation).map_err(|e| match e {
            KompaktError::EngineUnavailable(detail) => KompaktError::ToolsUnavailable(detail),
            other => other,
        })?;
        if invocation.accepts(output.exit_code) {
            return Ok(());
        }
        Err(KompaktError::ExternalToolFailed {
            tool: tool.to_string(),
            exit_code: (output.exit_code != process::SIGNALLED).then_some(output.exit_code),
            stderr: output.stderr.trim().to_string(),
        })
    }
}

impl StructuralOptimizer for OptimizerTools {
    fn clean(&self, input: &Path, output: &Path) -> Result<()> {
        Self::run_tool(
            CLEANER,
            EngineInvocation::new(&self.mutool, clean_args(input, output)),
        )
    }

    fn optimize(&self, input: &Path, output: &Path) -> Result<()> {
        Self::run_tool(
            OPTIMIZER,
            EngineInvocation::new(&self.qpdf, optimize_args(input, output)),
        )
    }
}
