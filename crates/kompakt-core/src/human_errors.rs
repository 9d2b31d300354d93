// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language error messages for the command-line front end.
//
// Every technical error is mapped to a short explanation and a suggestion.
// Four severity levels tell the caller how to present it.

use crate::error::KompaktError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Busy resource or interrupted run; trying again may work.
    Transient,
    /// The user must change something (install a tool, fix a path).
    ActionRequired,
    /// Retrying will not help: the input itself is the problem.
    Permanent,
    /// The program itself misbehaved.
    Internal,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    /// Whether running the same command again could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    fn new(message: impl Into<String>, suggestion: impl Into<String>, retriable: bool, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable,
            severity,
        }
    }
}

/// Convert a `KompaktError` into a `HumanError`.
pub fn humanize_error(err: &KompaktError) -> HumanError {
    match err {
        // -- Engine --
        KompaktError::EngineUnavailable(_) => HumanError::new(
            "Ghostscript could not be found.",
            "Install Ghostscript, or set ghostscript_dir in the configuration to the folder that contains it.",
            false,
            Severity::ActionRequired,
        ),

        KompaktError::EngineInvocationFailed { reason, .. } => humanize_engine_reason(reason),

        // -- Optimizer tools --
        KompaktError::ExternalToolFailed { tool, .. } => HumanError::new(
            format!("{tool} could not process this PDF."),
            "The file may be damaged or use features the tool does not support. Try the ghostscript-only mode.",
            false,
            Severity::Permanent,
        ),

        KompaktError::ToolsUnavailable(_) => HumanError::new(
            "The lossless optimizers are not installed.",
            "Install mutool and qpdf, or set tools_dir in the configuration. Auto mode works without them.",
            false,
            Severity::ActionRequired,
        ),

        // -- Document --
        KompaktError::Pdf(_) => HumanError::new(
            "There is a problem with this PDF file.",
            "The file may be damaged or encrypted. Check that it opens in a PDF viewer.",
            false,
            Severity::Permanent,
        ),

        // -- Pipeline --
        KompaktError::Stage { source, .. } => humanize_error(source),

        KompaktError::MissingOutput { .. } => HumanError::new(
            "A step reported success but wrote no file.",
            "Check there is free disk space beside the output file, then try again.",
            true,
            Severity::Transient,
        ),

        KompaktError::Cancelled { .. } => HumanError::new(
            "The run was cancelled.",
            "Nothing was written. Start it again when ready.",
            true,
            Severity::Transient,
        ),

        KompaktError::AlreadyRunning(kind) => HumanError::new(
            format!("Another {kind} is still running."),
            "Wait for it to finish, then try again.",
            true,
            Severity::Transient,
        ),

        KompaktError::InvalidRequest(detail) => HumanError::new(
            "The request could not be carried out.",
            detail.clone(),
            false,
            Severity::ActionRequired,
        ),

        KompaktError::Worker(_) => HumanError::new(
            "The background worker stopped unexpectedly.",
            "Try again. If this keeps happening, please report it.",
            true,
            Severity::Internal,
        ),

        // -- Storage --
        KompaktError::Io { path, source } => match source.kind() {
            std::io::ErrorKind::NotFound => HumanError::new(
                format!("{} could not be found.", path.display()),
                "Check the path and try again.",
                false,
                Severity::ActionRequired,
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::new(
                format!("Permission denied for {}.", path.display()),
                "Check the file permissions, or write the output somewhere else.",
                false,
                Severity::ActionRequired,
            ),
            _ => HumanError::new(
                format!("Reading or writing {} failed.", path.display()),
                "Try again. If this keeps happening, the disk may be full.",
                true,
                Severity::Transient,
            ),
        },

        KompaktError::Config(detail) => HumanError::new(
            "The configuration file has a problem.",
            format!("Fix or delete config.json. ({detail})"),
            false,
            Severity::ActionRequired,
        ),

        KompaktError::Serialization(_) => HumanError::new(
            "Internal data could not be encoded.",
            "Try again. If this keeps happening, please report it.",
            false,
            Severity::Internal,
        ),
    }
}

/// Map a Ghostscript failure reason to a message.
fn humanize_engine_reason(reason: &str) -> HumanError {
    let lower = reason.to_ascii_lowercase();

    if lower.contains("out of memory") {
        HumanError::new(
            "Ghostscript ran out of memory.",
            "Close other programs, or split the document and compress the parts.",
            true,
            Severity::Transient,
        )
    } else if lower.contains("file access") || lower.contains("file not found") {
        HumanError::new(
            "Ghostscript could not open a file.",
            "Check the input exists and the output folder is writable.",
            false,
            Severity::ActionRequired,
        )
    } else if lower.contains("interrupt") {
        HumanError::new("Ghostscript was interrupted.", "Run the command again.", true, Severity::Transient)
    } else if lower.contains("syntax") || lower.contains("undefined") || lower.contains("type") {
        HumanError::new(
            "Ghostscript could not read this PDF.",
            "The file may be damaged. Try the lossless mode, which does not re-render pages.",
            false,
            Severity::Permanent,
        )
    } else {
        HumanError::new(
            "Ghostscript reported an error.",
            format!("Try a different compression mode. ({reason})"),
            true,
            Severity::Transient,
        )
    }
}
