// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compression pipeline orchestrator.
//
// Classifies the input, picks one strategy and profile, runs the strategy's
// stages into a per-run workspace, applies the regression guard and only
// then promotes the staged output to the requested path.

use std::fs;
use std::path::Path;

use chrono::Utc;
use kompakt_core::config::AppConfig;
use kompakt_core::error::{KompaktError, Result};
use kompakt_core::types::{
    CompressionMode, CompressionProfile, CompressionRequest, DocumentType, PipelineResult, RunId,
    Stage, Strategy,
};
use kompakt_document::{
    aggressive_profile, classify, fixed_profile, is_layered, select_profile, select_strategy,
};
use kompakt_engine::args::compression_args;
use kompakt_engine::traits::{RenderEngine, StructuralOptimizer};
use tracing::{debug, info, instrument, warn};

use crate::guard::{self, RetryDecision};
use crate::progress::{CancelToken, NoProgress, ProgressSink, report};
use crate::workspace::{RunWorkspace, ensure_output, file_size};

static NO_PROGRESS: NoProgress = NoProgress;

/// Strategy and device parameters chosen for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub strategy: Strategy,
    /// Applied by every Ghostscript pass. The lossless strategy ignores it
    /// except as the base of a regression retry.
    pub profile: CompressionProfile,
}

impl Plan {
    fn profile_used(&self) -> Option<CompressionProfile> {
        (self.strategy != Strategy::Lossless).then_some(self.profile)
    }
}

/// Runs compression requests against one engine and optional optimizer.
pub struct Orchestrator<'a> {
    engine: &'a dyn RenderEngine,
    tools: Option<&'a dyn StructuralOptimizer>,
    config: &'a AppConfig,
    progress: &'a dyn ProgressSink,
    cancel: CancelToken,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        engine: &'a dyn RenderEngine,
        tools: Option<&'a dyn StructuralOptimizer>,
        config: &'a AppConfig,
    ) -> Self {
        Self {
            engine,
            tools,
            config,
            progress: &NO_PROGRESS,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    // -- Planning -------------------------------------------------------------

    /// Pick the strategy and profile for `request`.
    ///
    /// Explicit Lossless or Hybrid without the optimizer tools is an error;
    /// Auto silently falls back to Ghostscript only.
    pub fn plan(
        &self,
        request: &CompressionRequest,
        doc_type: DocumentType,
        layered: bool,
    ) -> Result<Plan> {
        let quality = request.image_quality;
        let scanned = request.optimize_for_scanned;
        let tools_available = self.tools.is_some();

        let strategy = match request.mode {
            CompressionMode::FixedProfile(device) => {
                return Ok(Plan {
                    strategy: Strategy::GhostscriptOnly,
                    profile: fixed_profile(device, quality, scanned),
                });
            }
            CompressionMode::Auto => {
                select_strategy(doc_type, layered, tools_available, quality, scanned)
            }
            CompressionMode::Lossless => Strategy::Lossless,
            CompressionMode::Hybrid => Strategy::Hybrid,
        };

        if strategy.requires_tools() && !tools_available {
            return Err(KompaktError::ToolsUnavailable(format!(
                "{} mode needs mutool and qpdf",
                request.mode
            )));
        }

        let mut profile = select_profile(doc_type, quality);
        if scanned {
            profile.downsample_color = true;
            profile.downsample_gray = true;
        }
        Ok(Plan { strategy, profile })
    }

    // -- Execution ------------------------------------------------------------

    /// Compress `request.input_path` into `request.output_path`.
    ///
    /// On error nothing is written to the output path and the run's temp
    /// files are gone.
    #[instrument(skip_all, fields(input = %request.input_path.display(), mode = %request.mode))]
    pub fn compress(&self, request: &CompressionRequest) -> Result<PipelineResult> {
        let run_id = RunId::new();
        let started_at = Utc::now();
        validate(request)?;

        self.cancel.check(Stage::Analyzing)?;
        report(self.progress, Stage::Analyzing, 0, "analyzing document");
        let input = request.input_path.as_path();
        let original_size = file_size(input).map_err(|e| e.in_stage(Stage::Analyzing))?;
        let document_type = classify(input, self.config.classify_scan_bytes);
        let layered = is_layered(input, self.config.layering_scan_bytes);
        let plan = self.plan(request, document_type, layered)?;
        info!(
            %run_id,
            %document_type,
            layered,
            strategy = %plan.strategy,
            device = %plan.profile.device,
            original_size,
            "plan selected"
        );
        report(
            self.progress,
            Stage::Analyzing,
            10,
            format!("{document_type}; {} strategy", plan.strategy),
        );

        let workspace = RunWorkspace::create(run_id, &request.output_path)?;
        let staged = workspace.file("output.pdf");
        self.execute(&plan, input, &workspace, &staged)?;

        let mut profile_used = plan.profile_used();
        let staged_size = file_size(&staged)?;
        let mut retry_attempted = false;

        if guard::should_retry(document_type, original_size, staged_size)
            == RetryDecision::RetryAggressive
        {
            self.cancel.check(Stage::Retrying)?;
            report(self.progress, Stage::Retrying, 80, "retrying with a stronger profile");
            retry_attempted = true;
            let aggressive = aggressive_profile(&plan.profile);
            if self.retry(input, &workspace, &staged, &aggressive, original_size, staged_size) {
                profile_used = Some(aggressive);
            }
        }

        self.cancel.check(Stage::Finalizing)?;
        report(self.progress, Stage::Finalizing, 90, "writing output");
        workspace
            .promote(&staged, &request.output_path)
            .map_err(|e| e.in_stage(Stage::Finalizing))?;
        drop(workspace);

        let final_size_bytes = file_size(&request.output_path)?;
        let outcome = guard::outcome(original_size, final_size_bytes);
        let split_recommendation =
            guard::split_suggestion(final_size_bytes, &request.split_policy, self.config);

        info!(
            %run_id,
            original_size,
            final_size = final_size_bytes,
            ?outcome,
            retry_attempted,
            "compression finished"
        );
        report(self.progress, Stage::Finalizing, 100, "done");

        Ok(PipelineResult {
            run_id,
            output_path: request.output_path.clone(),
            original_size_bytes: original_size,
            final_size_bytes,
            document_type,
            layered,
            profile_used,
            strategy_used: plan.strategy,
            retry_attempted,
            outcome,
            split_recommendation,
            split_into: Vec::new(),
            split: None,
            split_error: None,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn execute(&self, plan: &Plan, input: &Path, workspace: &RunWorkspace, staged: &Path) -> Result<()> {
        match plan.strategy {
            Strategy::GhostscriptOnly => {
                self.run_stage(Stage::Compressing, 0, 1, staged, || {
                    self.render(&plan.profile, input, staged)
                })
            }
            Strategy::Lossless => {
                let tools = self.require_tools()?;
                let cleaned = workspace.file("cleaned.pdf");
                self.run_stage(Stage::Cleaning, 0, 2, &cleaned, || tools.clean(input, &cleaned))?;
                self.run_stage(Stage::Optimizing, 1, 2, staged, || {
                    tools.optimize(&cleaned, staged)
                })
            }
            Strategy::Hybrid => {
                let tools = self.require_tools()?;
                let cleaned = workspace.file("cleaned.pdf");
                let compressed = workspace.file("compressed.pdf");
                self.run_stage(Stage::Cleaning, 0, 3, &cleaned, || tools.clean(input, &cleaned))?;
                self.run_stage(Stage::Compressing, 1, 3, &compressed, || {
                    self.render(&plan.profile, &cleaned, &compressed)
                })?;
                self.run_stage(Stage::Optimizing, 2, 3, staged, || {
                    tools.optimize(&compressed, staged)
                })
            }
        }
    }

    /// Check for cancellation, report, run `op` and confirm it wrote `output`.
    fn run_stage(
        &self,
        stage: Stage,
        step: usize,
        steps: usize,
        output: &Path,
        op: impl FnOnce() -> Result<()>,
    ) -> Result<()> {
        self.cancel.check(stage)?;
        let percent = 10 + (70 * step / steps.max(1)) as u8;
        report(self.progress, stage, percent, format!("{stage} started"));
        op().and_then(|()| ensure_output(output))
            .map_err(|e| e.in_stage(stage))?;
        debug!(%stage, "stage complete");
        Ok(())
    }

    fn render(&self, profile: &CompressionProfile, input: &Path, output: &Path) -> Result<()> {
        self.engine
            .invoke(&compression_args(profile, input, output))
            .map(|_| ())
    }

    fn require_tools(&self) -> Result<&'a dyn StructuralOptimizer> {
        self.tools
            .ok_or_else(|| KompaktError::ToolsUnavailable("mutool and qpdf not found".into()))
    }

    /// One aggressive pass from the original input. Returns whether its output
    /// replaced the staged one. Failures are logged, never raised.
    fn retry(
        &self,
        input: &Path,
        workspace: &RunWorkspace,
        staged: &Path,
        profile: &CompressionProfile,
        original_size: u64,
        previous_size: u64,
    ) -> bool {
        let retry_output = workspace.file("retry.pdf");
        let attempt = self
            .render(profile, input, &retry_output)
            .and_then(|()| ensure_output(&retry_output))
            .and_then(|()| file_size(&retry_output));

        match attempt {
            Ok(size) if guard::keep_retry(original_size, previous_size, size) => {
                match fs::rename(&retry_output, staged) {
                    Ok(()) => {
                        info!(previous_size, retry_size = size, "retry output kept");
                        true
                    }
                    Err(e) => {
                        warn!(error = %e, "could not adopt retry output");
                        false
                    }
                }
            }
            Ok(size) => {
                info!(previous_size, retry_size = size, "retry output discarded");
                false
            }
            Err(e) => {
                warn!(error = %e, "retry failed; keeping previous output");
                false
            }
        }
    }
}

fn validate(request: &CompressionRequest) -> Result<()> {
    if request.image_quality > 100 {
        return Err(KompaktError::InvalidRequest(format!(
            "image quality {} is outside 0-100",
            request.image_quality
        )));
    }
    if !request.input_path.is_file() {
        return Err(KompaktError::io(
            &request.input_path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "input PDF not found"),
        ));
    }
    if request.input_path == request.output_path {
        return Err(KompaktError::InvalidRequest(
            "output path must differ from the input path".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEngine, FakeTools, Step, write_input};
    use kompakt_core::types::{DeviceSetting, MIB, Outcome, ProgressEvent, SplitPolicy};
    use std::sync::Mutex;

    const KB: usize = 1024;

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(".kompakt-"))
            .collect()
    }

    fn request(dir: &Path, content: &[u8], len: usize) -> CompressionRequest {
        let input = dir.join("in.pdf");
        write_input(&input, content, len);
        CompressionRequest::new(input, dir.join("out.pdf"))
    }

    #[test]
    fn scanned_document_without_tools() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), b"%PDF-1.4 BI ID EI BI ID EI", 8 * MIB as usize);
        let engine = FakeEngine::writing(MIB as usize);
        let config = AppConfig::default();

        let result = Orchestrator::new(&engine, None, &config).compress(&req).unwrap();

        assert_eq!(result.document_type, DocumentType::Scanned);
        assert_eq!(result.strategy_used, Strategy::GhostscriptOnly);
        let profile = result.profile_used.unwrap();
        assert_eq!(profile.device, DeviceSetting::Screen);
        assert!(profile.use_dct_encode);
        assert_eq!(profile.jpeg_quality, 75);
        assert_eq!(result.outcome, Outcome::Reduced);
        assert_eq!(result.final_size_bytes, MIB);
        assert!(result.split_recommendation.is_none());
        assert!(!result.retry_attempted);

        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains(&"-dPDFSETTINGS=/screen".to_string()));
        assert!(calls[0].contains(&"-dColorImageFilter=/DCTEncode".to_string()));
        assert!(calls[0].contains(&"-dJPEGQ=75".to_string()));
        assert_eq!(fs::metadata(&req.output_path).unwrap().len(), MIB);
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn layered_document_goes_lossless_without_engine() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), b"%PDF-1.5 << /OCProperties << /OCGs [] >> >>", 40 * KB);
        let engine = FakeEngine::writing(KB);
        let tools = FakeTools::new(35 * KB, 30 * KB);
        let config = AppConfig::default();

        let result = Orchestrator::new(&engine, Some(&tools), &config)
            .compress(&req)
            .unwrap();

        assert!(result.layered);
        assert_eq!(result.strategy_used, Strategy::Lossless);
        assert!(result.profile_used.is_none());
        assert_eq!(engine.call_count(), 0);
        assert_eq!(*tools.calls.lock().unwrap(), vec!["clean", "optimize"]);
        assert_eq!(result.final_size_bytes, 30 * KB as u64);
    }

    #[test]
    fn hybrid_runs_three_stages_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), b"%PDF-1.4 plain", 50 * KB);
        req.mode = CompressionMode::Hybrid;
        let engine = FakeEngine::writing(20 * KB);
        let tools = FakeTools::new(45 * KB, 18 * KB);
        let config = AppConfig::default();

        let result = Orchestrator::new(&engine, Some(&tools), &config)
            .compress(&req)
            .unwrap();

        assert_eq!(result.strategy_used, Strategy::Hybrid);
        assert_eq!(engine.call_count(), 1);
        // The engine reads the cleaned copy, not the original.
        let args = &engine.calls.lock().unwrap()[0];
        assert!(args.last().unwrap().ends_with("cleaned.pdf"));
        assert_eq!(result.final_size_bytes, 18 * KB as u64);
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn tool_failure_aborts_with_stage_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), b"%PDF-1.4", 10 * KB);
        req.mode = CompressionMode::Lossless;
        let engine = FakeEngine::writing(KB);
        let mut tools = FakeTools::new(9 * KB, 8 * KB);
        tools.fail_optimize = true;
        let config = AppConfig::default();

        let err = Orchestrator::new(&engine, Some(&tools), &config)
            .compress(&req)
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Optimizing));
        assert!(matches!(err.root(), KompaktError::ExternalToolFailed { .. }));
        assert!(!req.output_path.exists());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn explicit_lossless_needs_tools() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), b"%PDF-1.4", KB);
        let engine = FakeEngine::writing(KB);
        let config = AppConfig::default();

        for mode in [CompressionMode::Lossless, CompressionMode::Hybrid] {
            req.mode = mode;
            let err = Orchestrator::new(&engine, None, &config)
                .compress(&req)
                .unwrap_err();
            assert!(matches!(err, KompaktError::ToolsUnavailable(_)));
        }
        assert_eq!(engine.call_count(), 0);
    }

    #[test]
    fn fixed_profile_is_one_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), b"%PDF-1.4", 10 * KB);
        req.mode = CompressionMode::FixedProfile(DeviceSetting::Prepress);
        let engine = FakeEngine::writing(5 * KB);
        let tools = FakeTools::new(KB, KB);
        let config = AppConfig::default();

        let result = Orchestrator::new(&engine, Some(&tools), &config)
            .compress(&req)
            .unwrap();
        assert_eq!(result.strategy_used, Strategy::GhostscriptOnly);
        assert_eq!(result.profile_used.unwrap().device, DeviceSetting::Prepress);
        assert!(tools.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn scanned_growth_retries_exactly_once_and_keeps_smaller() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), b"%PDF-1.4 /Producer (TWAIN)", 10 * KB);
        let engine = FakeEngine::scripted(vec![Step::Write(12 * KB), Step::Write(4 * KB)], Step::Fail);
        let config = AppConfig::default();

        let result = Orchestrator::new(&engine, None, &config).compress(&req).unwrap();

        assert!(result.retry_attempted);
        assert_eq!(engine.call_count(), 2);
        assert_eq!(result.final_size_bytes, 4 * KB as u64);
        assert_eq!(result.outcome, Outcome::Reduced);
        let used = result.profile_used.unwrap();
        assert_eq!(used.device, DeviceSetting::Screen);
        assert_eq!(used.color_image_resolution, 120);
    }

    #[test]
    fn larger_retry_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), b"%PDF-1.4 scanner", 10 * KB);
        let engine = FakeEngine::scripted(vec![Step::Write(11 * KB)], Step::Write(13 * KB));
        let config = AppConfig::default();

        let result = Orchestrator::new(&engine, None, &config).compress(&req).unwrap();

        assert!(result.retry_attempted);
        assert_eq!(engine.call_count(), 2);
        assert_eq!(result.final_size_bytes, 11 * KB as u64);
        assert_eq!(result.outcome, Outcome::NoSizeGain);
        assert_eq!(result.profile_used.unwrap().color_image_resolution, 150);
    }

    #[test]
    fn failed_retry_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), b"%PDF-1.4 scanner", 10 * KB);
        let engine = FakeEngine::scripted(vec![Step::Write(10 * KB)], Step::Fail);
        let config = AppConfig::default();

        let result = Orchestrator::new(&engine, None, &config).compress(&req).unwrap();
        assert!(result.retry_attempted);
        assert_eq!(result.outcome, Outcome::NoSizeGain);
        assert!(req.output_path.is_file());
    }

    #[test]
    fn non_scanned_growth_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), b"%PDF-1.4", 10 * KB);
        let engine = FakeEngine::writing(12 * KB);
        let config = AppConfig::default();

        let result = Orchestrator::new(&engine, None, &config).compress(&req).unwrap();
        assert!(!result.retry_attempted);
        assert_eq!(engine.call_count(), 1);
        assert_eq!(result.outcome, Outcome::NoSizeGain);
    }

    #[test]
    fn reported_success_without_output_is_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), b"%PDF-1.4", 10 * KB);
        let engine = FakeEngine::scripted(Vec::new(), Step::NoOutput);
        let config = AppConfig::default();

        let err = Orchestrator::new(&engine, None, &config)
            .compress(&req)
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Compressing));
        assert!(matches!(err.root(), KompaktError::MissingOutput { .. }));
    }

    #[test]
    fn cancellation_between_stages() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), b"%PDF-1.4", 10 * KB);
        let engine = FakeEngine::writing(5 * KB);
        let config = AppConfig::default();
        let token = CancelToken::new();
        let on_event = {
            let token = token.clone();
            move |e: ProgressEvent| {
                if e.stage == Stage::Compressing {
                    token.cancel();
                }
            }
        };

        let err = Orchestrator::new(&engine, None, &config)
            .with_progress(&on_event)
            .with_cancel(token)
            .compress(&req)
            .unwrap_err();

        assert!(matches!(
            err,
            KompaktError::Cancelled {
                stage: Stage::Finalizing
            }
        ));
        assert_eq!(engine.call_count(), 1);
        assert!(!req.output_path.exists());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), b"%PDF-1.4", KB);
        let engine = FakeEngine::writing(KB);
        let config = AppConfig::default();
        let token = CancelToken::new();
        token.cancel();

        let err = Orchestrator::new(&engine, None, &config)
            .with_cancel(token)
            .compress(&req)
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Analyzing));
        assert_eq!(engine.call_count(), 0);
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_100() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), b"%PDF-1.4", 10 * KB);
        req.mode = CompressionMode::Hybrid;
        let engine = FakeEngine::writing(5 * KB);
        let tools = FakeTools::new(9 * KB, 4 * KB);
        let config = AppConfig::default();
        let seen = Mutex::new(Vec::new());
        let sink = |e: ProgressEvent| seen.lock().unwrap().push((e.stage, e.percent));

        Orchestrator::new(&engine, Some(&tools), &config)
            .with_progress(&sink)
            .compress(&req)
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(seen.last(), Some(&(Stage::Finalizing, 100)));
        let stages: Vec<Stage> = seen.iter().map(|(s, _)| *s).collect();
        for stage in [Stage::Cleaning, Stage::Compressing, Stage::Optimizing] {
            assert!(stages.contains(&stage));
        }
    }

    #[test]
    fn large_output_suggests_split() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), b"%PDF-1.4", 4 * MIB as usize);
        req.split_policy = SplitPolicy {
            enabled: true,
            max_part_size_mb: 1,
        };
        let engine = FakeEngine::writing(2 * MIB as usize);
        let config = AppConfig::default();

        let result = Orchestrator::new(&engine, None, &config).compress(&req).unwrap();
        let rec = result.split_recommendation.unwrap();
        assert_eq!(rec.threshold_bytes, MIB);
        assert_eq!(rec.part_size_bytes, MIB);
        assert!(result.split_into.is_empty());
    }

    #[test]
    fn optimize_for_scanned_forces_downsampling() {
        let engine = FakeEngine::writing(KB);
        let tools = FakeTools::new(KB, KB);
        let config = AppConfig::default();
        let orchestrator = Orchestrator::new(&engine, Some(&tools), &config);
        let mut req = CompressionRequest::new("a.pdf", "b.pdf");
        req.optimize_for_scanned = true;

        let plan = orchestrator.plan(&req, DocumentType::General, false).unwrap();
        assert_eq!(plan.strategy, Strategy::Hybrid);
        assert!(plan.profile.downsample_color && plan.profile.downsample_gray);
    }

    #[test]
    fn invalid_requests() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::writing(KB);
        let config = AppConfig::default();
        let orchestrator = Orchestrator::new(&engine, None, &config);

        let missing = CompressionRequest::new(dir.path().join("none.pdf"), dir.path().join("o.pdf"));
        assert!(matches!(
            orchestrator.compress(&missing),
            Err(KompaktError::Io { .. })
        ));

        let mut same = request(dir.path(), b"%PDF", KB);
        same.output_path = same.input_path.clone();
        assert!(matches!(
            orchestrator.compress(&same),
            Err(KompaktError::InvalidRequest(_))
        ));

        let mut loud = request(dir.path(), b"%PDF", KB);
        loud.image_quality = 101;
        assert!(matches!(
            orchestrator.compress(&loud),
            Err(KompaktError::InvalidRequest(_))
        ));
        assert_eq!(engine.call_count(), 0);
    }
}
