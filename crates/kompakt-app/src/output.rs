// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text rendering of results. `--json` bypasses all of this.

use std::fmt::Write;

use kompakt_core::human_errors::HumanError;
use kompakt_core::types::{
    MergeResult, Outcome, PipelineResult, ProgressEvent, SplitReport, format_size,
};
use kompakt_document::PageCount;
use kompakt_pipeline::ProbeReport;

use crate::services::app_services::Classification;

pub fn compression(result: &PipelineResult) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Output:    {}", result.output_path.display());
    let _ = writeln!(
        text,
        "Document:  {}{}",
        result.document_type,
        if result.layered { " (layered)" } else { "" }
    );
    let _ = write!(text, "Strategy:  {}", result.strategy_used);
    if let Some(profile) = &result.profile_used {
        let _ = write!(text, ", {} preset, JPEG quality {}", profile.device, profile.jpeg_quality);
    }
    text.push('\n');
    let _ = writeln!(
        text,
        "Size:      {} -> {} ({:.1}% smaller)",
        format_size(result.original_size_bytes),
        format_size(result.final_size_bytes),
        result.reduction_percent()
    );
    if result.retry_attempted {
        text.push_str("Retried once with a stronger profile.\n");
    }
    if result.outcome == Outcome::NoSizeGain {
        text.push_str("The output is not smaller than the original.\n");
    }
    if let Some(report) = &result.split {
        let _ = writeln!(text, "Split into {} parts:", report.parts.len());
        text.push_str(&split_parts(report));
    } else if let Some(error) = &result.split_error {
        let _ = writeln!(text, "Split failed: {error}");
    } else if let Some(rec) = &result.split_recommendation {
        let _ = writeln!(
            text,
            "Larger than {}; consider splitting into parts of {}.",
            format_size(rec.threshold_bytes),
            format_size(rec.part_size_bytes)
        );
    }
    let elapsed = result.finished_at - result.started_at;
    let _ = writeln!(text, "Took {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);
    text
}

pub fn merge(result: &MergeResult) -> String {
    format!(
        "Merged {} files ({}) into {} ({})\n",
        result.input_count,
        format_size(result.input_total_bytes),
        result.output_path.display(),
        format_size(result.output_size_bytes)
    )
}

pub fn split(report: &SplitReport) -> String {
    let mut text = format!(
        "{} pages, {} per part, {} parts written\n",
        report.total_pages,
        report.pages_per_part,
        report.parts.len()
    );
    text.push_str(&split_parts(report));
    text
}

fn split_parts(report: &SplitReport) -> String {
    let mut text = String::new();
    for part in &report.parts {
        let _ = writeln!(text, "  {}", part.display());
    }
    for failure in &report.failures {
        let _ = writeln!(
            text,
            "  part {} (pages {}) failed: {}",
            failure.part, failure.range, failure.error
        );
    }
    if report.cancelled {
        text.push_str("  cancelled; remaining parts were not written\n");
    }
    text
}

pub fn pages(count: &PageCount) -> String {
    format!("{} ({:?})\n", count.pages, count.source)
}

pub fn classification(report: &Classification) -> String {
    let mut text = format!(
        "{}: {}, {}{}\nAuto strategy: {}",
        report.path.display(),
        format_size(report.size_bytes),
        report.document_type,
        if report.layered { ", layered" } else { "" },
        report.strategy
    );
    if let Some(profile) = &report.profile {
        let _ = write!(text, " with the {} preset", profile.device);
    }
    text.push('\n');
    if let Some(pdf) = &report.pdf {
        let _ = writeln!(
            text,
            "PDF {}, {} pages{}",
            pdf.version,
            pdf.pages,
            if pdf.encrypted { ", encrypted" } else { "" }
        );
    }
    text
}

pub fn probe(report: &ProbeReport) -> String {
    let mut text = format!("Original: {}\n", format_size(report.original_size_bytes));
    for preset in &report.presets {
        let marker = if report.best == Some(preset.device) { "*" } else { " " };
        match (preset.size_bytes, &preset.error) {
            (Some(size), _) => {
                let _ = writeln!(text, "{marker} {:<9} {}", preset.device.name(), format_size(size));
            }
            (None, Some(error)) => {
                let _ = writeln!(text, "{marker} {:<9} failed: {error}", preset.device.name());
            }
            (None, None) => {}
        }
    }
    text
}

pub fn progress(event: &ProgressEvent) -> String {
    format!("[{:>3}%] {}: {}", event.percent, event.stage, event.message)
}

pub fn error(human: &HumanError) -> String {
    format!("error: {}\n  {}", human.message, human.suggestion)
}
