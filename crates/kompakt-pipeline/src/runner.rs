// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background runs with per-kind exclusion.
//
// Every run executes on a blocking worker. At most one compression (splits
// count as compressions) and one merge may be active; a second request of
// the same kind is refused before anything is spawned.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kompakt_core::config::AppConfig;
use kompakt_core::error::{KompaktError, Result};
use kompakt_core::types::{
    CompressionRequest, MergeResult, PartSize, PipelineResult, RunKind, SplitReport, Stage,
};
use kompakt_document::page_count;
use kompakt_document::split::{Splitter, pages_per_part};
use kompakt_engine::traits::{RenderEngine, StructuralOptimizer};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::merge::merge_pdf_files;
use crate::orchestrator::Orchestrator;
use crate::progress::{CancelToken, ProgressSink, report};
use crate::workspace::file_size;

/// Holds a run slot until dropped.
struct SlotGuard {
    flag: Arc<AtomicBool>,
}

impl SlotGuard {
    fn acquire(flag: &Arc<AtomicBool>, kind: RunKind) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| KompaktError::AlreadyRunning(kind))?;
        debug!(%kind, "run slot acquired");
        Ok(Self { flag: flag.clone() })
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A run in progress.
pub struct RunHandle<T> {
    join: JoinHandle<Result<T>>,
    cancel: CancelToken,
}

impl<T> RunHandle<T> {
    /// Ask the run to stop at its next stage boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for the run to finish.
    pub async fn join(self) -> Result<T> {
        self.join
            .await
            .map_err(|e| KompaktError::Worker(e.to_string()))?
    }
}

/// Spawns compression, split and merge runs.
///
/// Must be used from inside a Tokio runtime.
#[derive(Clone)]
pub struct JobRunner {
    engine: Arc<dyn RenderEngine>,
    tools: Option<Arc<dyn StructuralOptimizer>>,
    config: Arc<AppConfig>,
    compression_slot: Arc<AtomicBool>,
    merge_slot: Arc<AtomicBool>,
}

impl JobRunner {
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        tools: Option<Arc<dyn StructuralOptimizer>>,
        config: AppConfig,
    ) -> Self {
        Self {
            engine,
            tools,
            config: Arc::new(config),
            compression_slot: Arc::new(AtomicBool::new(false)),
            merge_slot: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self, kind: RunKind) -> bool {
        self.slot(kind).load(Ordering::Acquire)
    }

    fn slot(&self, kind: RunKind) -> &Arc<AtomicBool> {
        match kind {
            RunKind::Compression => &self.compression_slot,
            RunKind::Merge => &self.merge_slot,
        }
    }

    fn spawn<T, F>(&self, kind: RunKind, work: F) -> Result<RunHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(CancelToken) -> Result<T> + Send + 'static,
    {
        let guard = SlotGuard::acquire(self.slot(kind), kind)?;
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let join = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            work(token)
        });
        Ok(RunHandle { join, cancel })
    }

    /// Compress on a worker. When the request's split policy is enabled and
    /// the output is over its threshold, the output is split afterwards and
    /// the parts are listed in `split_into`.
    ///
    /// A failed or cancelled split never fails the run: the compressed output
    /// is already in place, so the split outcome is recorded on the result.
    pub fn compress(
        &self,
        request: CompressionRequest,
        progress: impl ProgressSink + 'static,
    ) -> Result<RunHandle<PipelineResult>> {
        let engine = self.engine.clone();
        let tools = self.tools.clone();
        let config = self.config.clone();
        self.spawn(RunKind::Compression, move |cancel| {
            let mut result = Orchestrator::new(engine.as_ref(), tools.as_deref(), &config)
                .with_progress(&progress)
                .with_cancel(cancel.clone())
                .compress(&request)?;

            if let (true, Some(rec)) = (request.split_policy.enabled, result.split_recommendation) {
                info!(threshold = rec.threshold_bytes, "output over threshold; splitting");
                let output_dir = request.output_path.parent().map(Path::to_path_buf);
                match split_pdf_file(
                    engine.as_ref(),
                    &config,
                    &result.output_path,
                    PartSize::TargetBytes(rec.part_size_bytes),
                    output_dir,
                    &progress,
                    &cancel,
                ) {
                    Ok(split) => {
                        if !split.is_complete() {
                            warn!(
                                failed = split.failures.len(),
                                cancelled = split.cancelled,
                                "split incomplete"
                            );
                        }
                        result.split_into = split.parts.clone();
                        result.split = Some(split);
                    }
                    Err(e) => {
                        warn!(error = %e, "split failed; compressed output kept");
                        result.split_error = Some(e.to_string());
                    }
                }
            }
            Ok(result)
        })
    }

    /// Split `input` on a worker. Shares the compression slot.
    pub fn split(
        &self,
        input: PathBuf,
        part_size: PartSize,
        output_dir: Option<PathBuf>,
        progress: impl ProgressSink + 'static,
    ) -> Result<RunHandle<SplitReport>> {
        let engine = self.engine.clone();
        let config = self.config.clone();
        self.spawn(RunKind::Compression, move |cancel| {
            split_pdf_file(
                engine.as_ref(),
                &config,
                &input,
                part_size,
                output_dir,
                &progress,
                &cancel,
            )
        })
    }

    /// Merge `inputs` into `output` on a worker.
    pub fn merge(
        &self,
        inputs: Vec<PathBuf>,
        output: PathBuf,
        progress: impl ProgressSink + 'static,
    ) -> Result<RunHandle<MergeResult>> {
        let engine = self.engine.clone();
        self.spawn(RunKind::Merge, move |cancel| {
            merge_pdf_files(engine.as_ref(), &inputs, &output, &progress, &cancel)
        })
    }
}

/// Count pages, size the parts and split `input`.
///
/// A cancellation before the first part is an error. Later ones return the
/// parts already written in a report marked `cancelled`.
#[instrument(skip_all, fields(input = %input.display(), ?part_size))]
pub fn split_pdf_file(
    engine: &dyn RenderEngine,
    config: &AppConfig,
    input: &Path,
    part_size: PartSize,
    output_dir: Option<PathBuf>,
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<SplitReport> {
    cancel.check(Stage::Splitting)?;
    let size = file_size(input)?;
    let count = page_count(engine, input, config.fallback_page_count)?;
    let per_part = pages_per_part(part_size, count.pages, size)?;
    info!(pages = count.pages, source = ?count.source, per_part, "split planned");

    let mut splitter = Splitter::new(engine);
    if let Some(dir) = output_dir {
        splitter = splitter.with_output_dir(dir);
    }
    let split = splitter.split_observed(input, count.pages, per_part, &mut |idx, total| {
        let percent = (idx * 100 / total.max(1)) as u8;
        report(progress, Stage::Splitting, percent, format!("part {} of {total}", idx + 1));
        if cancel.is_cancelled() {
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    })?;
    if split.cancelled {
        info!(written = split.parts.len(), "split cancelled");
        return Ok(split);
    }

    report(progress, Stage::Splitting, 100, "split finished");
    Ok(split)
}
