// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the kompakt compression pipeline.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One mebibyte, the unit used by every size threshold in the pipeline.
pub const MIB: u64 = 1024 * 1024;

/// Unique identifier for a compression, split, or merge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, used in temp directory names.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Heuristic document class derived from the raw bytes of a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Image-heavy pages, or produced by a scanner driver.
    Scanned,
    /// Many text-show operators and font references.
    Text,
    /// Both text and inline images in noticeable amounts.
    Mixed,
    /// Nothing stood out.
    General,
    /// The file does not exist.
    Unknown,
    /// The file exists but could not be read.
    AnalysisFailed,
}

impl DocumentType {
    /// Label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Scanned => "Scanned Document",
            Self::Text => "Text Document",
            Self::Mixed => "Mixed Content",
            Self::General => "General Document",
            Self::Unknown => "Unknown",
            Self::AnalysisFailed => "Analysis Failed",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Ghostscript `PDFSETTINGS` preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceSetting {
    Screen,
    Ebook,
    Printer,
    Prepress,
    Default,
}

impl DeviceSetting {
    /// Presets tried, in order, when probing for the smallest output.
    pub const PROBE_ORDER: [DeviceSetting; 4] =
        [Self::Screen, Self::Ebook, Self::Printer, Self::Prepress];

    /// Value passed to `-dPDFSETTINGS=`.
    pub fn pdf_settings(&self) -> &'static str {
        match self {
            Self::Screen => "/screen",
            Self::Ebook => "/ebook",
            Self::Printer => "/printer",
            Self::Prepress => "/prepress",
            Self::Default => "/default",
        }
    }

    pub fn name(&self) -> &'static str {
        &self.pdf_settings()[1..]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim_start_matches('/').to_ascii_lowercase().as_str() {
            "screen" => Some(Self::Screen),
            "ebook" => Some(Self::Ebook),
            "printer" => Some(Self::Printer),
            "prepress" => Some(Self::Prepress),
            "default" => Some(Self::Default),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Device parameters handed to the rendering engine.
///
/// Resolution fields only take effect when the matching downsample flag is
/// set; the argument builder never emits them otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionProfile {
    pub device: DeviceSetting,
    pub color_image_resolution: u32,
    pub gray_image_resolution: u32,
    /// JPEG quality, 0–100.
    pub jpeg_quality: u8,
    pub use_auto_filter: bool,
    pub use_dct_encode: bool,
    pub downsample_color: bool,
    pub downsample_gray: bool,
}

impl Default for CompressionProfile {
    fn default() -> Self {
        Self {
            device: DeviceSetting::Default,
            color_image_resolution: 300,
            gray_image_resolution: 300,
            jpeg_quality: 75,
            use_auto_filter: true,
            use_dct_encode: false,
            downsample_color: false,
            downsample_gray: false,
        }
    }
}

/// What the caller asked the pipeline to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompressionMode {
    /// Classify the document and pick strategy and profile automatically.
    #[default]
    Auto,
    /// Clean + recompress only; images are never re-encoded.
    Lossless,
    /// Clean + Ghostscript + recompress.
    Hybrid,
    /// Single Ghostscript pass with a named preset.
    FixedProfile(DeviceSetting),
}

impl CompressionMode {
    /// Parse a mode name: `auto`, `lossless`, `hybrid`, or a preset name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "lossless" => Some(Self::Lossless),
            "hybrid" => Some(Self::Hybrid),
            other => DeviceSetting::from_name(other).map(Self::FixedProfile),
        }
    }
}

impl std::fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Lossless => f.write_str("lossless"),
            Self::Hybrid => f.write_str("hybrid"),
            Self::FixedProfile(device) => write!(f, "fixed ({device})"),
        }
    }
}

/// The stage sequence actually executed for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    GhostscriptOnly,
    Lossless,
    Hybrid,
}

impl Strategy {
    /// Whether the strategy needs the external cleaner and optimizer.
    pub fn requires_tools(&self) -> bool {
        !matches!(self, Self::GhostscriptOnly)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::GhostscriptOnly => "ghostscript-only",
            Self::Lossless => "lossless",
            Self::Hybrid => "hybrid",
        })
    }
}

/// Caller-side splitting preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPolicy {
    pub enabled: bool,
    pub max_part_size_mb: u64,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_part_size_mb: 5,
        }
    }
}

/// A single compression request, borrowed read-only by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub mode: CompressionMode,
    /// Image quality slider, 0–100.
    pub image_quality: u8,
    pub optimize_for_scanned: bool,
    pub split_policy: SplitPolicy,
}

impl CompressionRequest {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            mode: CompressionMode::Auto,
            image_quality: 75,
            optimize_for_scanned: false,
            split_policy: SplitPolicy::default(),
        }
    }

    /// `<dir>/<stem>.compress.pdf` beside the input.
    pub fn default_output_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        input.with_file_name(format!("{stem}.compress.pdf"))
    }
}

/// Whether the run actually shrank the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Reduced,
    /// Output is not smaller than the input. The output is kept; the caller
    /// decides whether to use it.
    NoSizeGain,
}

/// Signal that the result is large enough to be worth splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRecommendation {
    pub threshold_bytes: u64,
    pub part_size_bytes: u64,
}

/// Structured result of one compression run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: RunId,
    pub output_path: PathBuf,
    pub original_size_bytes: u64,
    pub final_size_bytes: u64,
    pub document_type: DocumentType,
    pub layered: bool,
    /// `None` for the lossless strategy, which never applies a device profile.
    pub profile_used: Option<CompressionProfile>,
    pub strategy_used: Strategy,
    /// Whether the regression guard ran its aggressive retry.
    pub retry_attempted: bool,
    pub outcome: Outcome,
    pub split_recommendation: Option<SplitRecommendation>,
    /// Part files produced by a caller-driven split, in page order.
    pub split_into: Vec<PathBuf>,
    /// The full split outcome when one ran, including failed parts.
    pub split: Option<SplitReport>,
    /// Set when the split stopped with an error. The compressed output is
    /// still complete.
    pub split_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineResult {
    /// Size reduction in percent; negative when the output grew.
    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.original_size_bytes, self.final_size_bytes)
    }
}

/// Result of merging several PDFs into one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
    pub run_id: RunId,
    pub output_path: PathBuf,
    pub input_count: usize,
    pub input_total_bytes: u64,
    pub output_size_bytes: u64,
}

/// How a split should size its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartSize {
    PagesPerPart(u32),
    /// Approximate byte budget per part, mapped to a page count.
    TargetBytes(u64),
}

/// Inclusive, 1-indexed page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub first: u32,
    pub last: u32,
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// A part the splitter could not produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartFailure {
    /// 1-indexed part number.
    pub part: u32,
    pub range: PageRange,
    pub error: String,
}

/// Parts produced by a split, plus the ones that failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitReport {
    pub total_pages: u32,
    pub pages_per_part: u32,
    pub parts: Vec<PathBuf>,
    pub failures: Vec<PartFailure>,
    /// Stopped before every part was attempted.
    pub cancelled: bool,
}

impl SplitReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// Pipeline stages, used for progress events and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Analyzing,
    Cleaning,
    Compressing,
    Optimizing,
    Retrying,
    Finalizing,
    Splitting,
    Merging,
    Probing,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Analyzing => "analyze",
            Self::Cleaning => "clean",
            Self::Compressing => "compress",
            Self::Optimizing => "optimize",
            Self::Retrying => "retry",
            Self::Finalizing => "finalize",
            Self::Splitting => "split",
            Self::Merging => "merge",
            Self::Probing => "probe",
        })
    }
}

/// Coarse progress milestone emitted by a running pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    /// Percentage complete (0–100).
    pub percent: u8,
    pub message: String,
}

/// Kinds of run that are mutually exclusive with themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunKind {
    Compression,
    Merge,
}

impl std::fmt::Display for RunKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Compression => "compression",
            Self::Merge => "merge",
        })
    }
}

/// Size reduction in percent; negative when `after` is larger.
pub fn reduction_percent(before: u64, after: u64) -> f64 {
    if before == 0 {
        return 0.0;
    }
    (1.0 - after as f64 / before as f64) * 100.0
}

/// Human-readable byte count, e.g. `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut len = bytes as f64;
    let mut order = 0;
    while len >= 1024.0 && order < UNITS.len() - 1 {
        order += 1;
        len /= 1024.0;
    }
    let number = format!("{len:.2}");
    let number = number.trim_end_matches('0').trim_end_matches('.');
    format!("{number} {}", UNITS[order])
}
