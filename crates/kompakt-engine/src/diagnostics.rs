// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Installation diagnostics.
//
// Checks, in order: native Ghostscript library → gs executable → engine
// revision → mutool → qpdf → temp directory. Unlike a pipeline run the steps
// are independent, so every step runs and the report says which capabilities
// are usable.

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use kompakt_core::config::AppConfig;
use serde::Serialize;
use tracing::{info, instrument};

use crate::ghostscript::{self, GhostscriptAdapter};
use crate::native::GhostscriptLibrary;
use crate::process;
use crate::tools;
use crate::traits::RenderEngine;

/// Result of a single diagnostic step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    /// Step name shown to the user.
    pub name: String,
    pub passed: bool,
    /// What was found, or what went wrong.
    pub detail: String,
    /// What to do if the step failed.
    pub fix: Option<String>,
}

impl StepResult {
    fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
            fix: None,
        }
    }

    fn fail(name: &str, detail: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
            fix: Some(fix.into()),
        }
    }
}

/// Full diagnostic report.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub steps: Vec<StepResult>,
    /// Ghostscript can run, natively or as a process.
    pub engine_ready: bool,
    /// mutool and qpdf were both found.
    pub lossless_ready: bool,
    pub summary: String,
    pub generated_at: DateTime<Utc>,
}

const STEP_LIBRARY: &str = "Ghostscript library";
const STEP_EXECUTABLE: &str = "Ghostscript executable";
const STEP_REVISION: &str = "Ghostscript revision";
const STEP_CLEANER: &str = "mutool";
const STEP_OPTIMIZER: &str = "qpdf";
const STEP_TEMP: &str = "Temp directory";

/// Run every check against the installation described by `config`.
#[instrument(skip_all)]
pub fn run_diagnostics(config: &AppConfig) -> DiagnosticReport {
    let gs_dirs = ghostscript::search_dirs(config);
    let mut steps = Vec::new();

    let library = GhostscriptLibrary::locate(&gs_dirs);
    steps.push(match &library {
        Ok(lib) => StepResult::pass(STEP_LIBRARY, format!("loaded {}", lib.path().display())),
        Err(e) => StepResult::fail(
            STEP_LIBRARY,
            e.to_string(),
            "Optional. Install the Ghostscript shared library for in-process runs.",
        ),
    });

    let executable = process::find_program(ghostscript::EXECUTABLE, &gs_dirs);
    steps.push(match &executable {
        Some(path) => StepResult::pass(STEP_EXECUTABLE, path.display().to_string()),
        None => StepResult::fail(
            STEP_EXECUTABLE,
            format!("{} not found in configured directories or PATH", ghostscript::EXECUTABLE),
            "Install Ghostscript or set ghostscript_dir in config.json.",
        ),
    });

    let adapter = GhostscriptAdapter::new(library.ok(), executable);
    steps.push(match adapter.and_then(|a| a.revision()) {
        Ok(revision) => StepResult::pass(STEP_REVISION, revision),
        Err(e) => StepResult::fail(
            STEP_REVISION,
            e.to_string(),
            "Reinstall Ghostscript; the installation did not answer a version query.",
        ),
    });

    let tool_dirs = tools::search_dirs(config.tools_dir.as_deref());
    for (step, program) in [(STEP_CLEANER, tools::CLEANER), (STEP_OPTIMIZER, tools::OPTIMIZER)] {
        steps.push(match process::find_program(program, &tool_dirs) {
            Some(path) => StepResult::pass(step, path.display().to_string()),
            None => StepResult::fail(
                step,
                format!("{program} not found"),
                "Needed for lossless and hybrid modes. Install it or set tools_dir in config.json.",
            ),
        });
    }

    steps.push(check_temp_dir(std::env::temp_dir()));

    let report = build_report(steps);
    info!(
        engine_ready = report.engine_ready,
        lossless_ready = report.lossless_ready,
        "diagnostics finished"
    );
    report
}

fn check_temp_dir(base: PathBuf) -> StepResult {
    let probe = tempfile::Builder::new()
        .prefix(".kompakt-probe-")
        .tempfile_in(&base)
        .and_then(|mut f| f.write_all(b"%PDF-1.4\n").map(|_| f));
    match probe {
        Ok(_) => StepResult::pass(STEP_TEMP, format!("{} is writable", base.display())),
        Err(e) => StepResult::fail(
            STEP_TEMP,
            format!("cannot write to {}: {e}", base.display()),
            "Free some disk space or point TMPDIR at a writable directory.",
        ),
    }
}

fn passed(steps: &[StepResult], name: &str) -> bool {
    steps.iter().any(|s| s.name == name && s.passed)
}

fn build_report(steps: Vec<StepResult>) -> DiagnosticReport {
    let engine_ready = passed(&steps, STEP_REVISION);
    let lossless_ready = passed(&steps, STEP_CLEANER) && passed(&steps, STEP_OPTIMIZER);
    let temp_ok = passed(&steps, STEP_TEMP);

    let summary = match (engine_ready, lossless_ready, temp_ok) {
        (_, _, false) => "Temporary files cannot be written; nothing will work.",
        (true, true, true) => "Everything looks good. All compression modes are available.",
        (true, false, true) => "Ghostscript works. Lossless and hybrid modes are unavailable.",
        (false, true, true) => "Only lossless mode is available: Ghostscript is missing.",
        (false, false, true) => "No compression engine is installed.",
    }
    .to_string();

    DiagnosticReport {
        steps,
        engine_ready,
        lossless_ready,
        summary,
        generated_at: Utc::now(),
    }
}

/// Plain-text rendering of a report, for terminals and bug reports.
pub fn render_text(report: &DiagnosticReport) -> String {
    let mut text = format!(
        "kompakt diagnostics\nDate: {}\n\n",
        report.generated_at.format("%d %b %Y, %H:%M UTC")
    );
    for (idx, step) in report.steps.iter().enumerate() {
        let mark = if step.passed { "ok " } else { "FAIL" };
        text.push_str(&format!("{:>2}. [{mark}] {}: {}\n", idx + 1, step.name, step.detail));
        if let Some(fix) = &step.fix {
            text.push_str(&format!("           {fix}\n"));
        }
    }
    text.push('\n');
    text.push_str(&report.summary);
    text.push('\n');
    text
}
