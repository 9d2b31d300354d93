// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge several PDFs into one with a single engine call.

use std::path::{Path, PathBuf};

use kompakt_core::error::{KompaktError, Result};
use kompakt_core::types::{MergeResult, RunId, Stage};
use kompakt_engine::args::merge_args;
use kompakt_engine::traits::RenderEngine;
use tracing::{info, instrument};

use crate::progress::{CancelToken, ProgressSink, report};
use crate::workspace::{RunWorkspace, ensure_output, file_size};

/// Concatenate `inputs`, in order, into `output`.
///
/// Needs at least two inputs. The output is staged and only replaces
/// `output` once the engine has produced it.
#[instrument(skip_all, fields(inputs = inputs.len(), output = %output.display()))]
pub fn merge_pdf_files(
    engine: &dyn RenderEngine,
    inputs: &[PathBuf],
    output: &Path,
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<MergeResult> {
    let run_id = RunId::new();
    if inputs.len() < 2 {
        return Err(KompaktError::InvalidRequest(format!(
            "merging needs at least two PDFs, got {}",
            inputs.len()
        )));
    }
    if inputs.iter().any(|p| p == output) {
        return Err(KompaktError::InvalidRequest(
            "merge output must not be one of the inputs".into(),
        ));
    }

    let mut input_total_bytes = 0u64;
    for input in inputs {
        input_total_bytes += file_size(input)?;
    }

    cancel.check(Stage::Merging)?;
    report(progress, Stage::Merging, 10, format!("merging {} files", inputs.len()));

    let workspace = RunWorkspace::create(run_id, output)?;
    let staged = workspace.file("merged.pdf");
    engine
        .invoke(&merge_args(inputs, &staged))
        .and_then(|_| ensure_output(&staged))
        .map_err(|e| e.in_stage(Stage::Merging))?;

    cancel.check(Stage::Finalizing)?;
    workspace
        .promote(&staged, output)
        .map_err(|e| e.in_stage(Stage::Finalizing))?;
    drop(workspace);

    let output_size_bytes = file_size(output)?;
    info!(%run_id, input_total_bytes, output_size_bytes, "merge finished");
    report(progress, Stage::Merging, 100, "merged");

    Ok(MergeResult {
        run_id,
        output_path: output.to_path_buf(),
        input_count: inputs.len(),
        input_total_bytes,
        output_size_bytes,
    })
}
