// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Byte-pattern document classifier.
//
// Never parses the PDF. A bounded prefix of the file is treated as one
// character per byte and scanned for operator and marker substrings. Streams
// that are compressed (or encrypted) hide their operators, so such files
// usually land in `General`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use kompakt_core::types::{DocumentType, MIB};
use serde::Serialize;
use tracing::{debug, instrument, warn};

/// Producer strings that betray a scanner driver.
pub const SCANNER_MARKERS: [&str; 4] = ["scanner", "scan", "twain", "wia"];

/// Optional-content (layer) markers.
pub const LAYER_MARKERS: [&[u8]; 2] = [b"/OCProperties", b"/OCG"];

const SCANNED_MIN_BYTES: u64 = 5 * MIB;
const TEXT_MIN_TEXT_OPS: usize = 50;
const TEXT_MIN_FONTS: usize = 5;
const MIXED_MIN_TEXT_OPS: usize = 10;
const MIXED_MIN_IMAGE_OPS: usize = 2;

/// Counts gathered from one scan of the file prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    /// `BT` + `Tj`
    pub text_ops: usize,
    /// `BI` + `ID`
    pub image_ops: usize,
    /// `Font`
    pub font_refs: usize,
    pub scanner_marker: bool,
}

/// Non-overlapping, ASCII case-insensitive occurrences of `needle`.
pub fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    if needle.is_empty() || haystack.len() < needle.len() {
        return 0;
    }
    let mut count = 0;
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if haystack[i..i + needle.len()].eq_ignore_ascii_case(needle) {
            count += 1;
            i += needle.len();
        } else {
            i += 1;
        }
    }
    count
}

fn contains_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle))
}

/// Gather operator counts from raw bytes.
pub fn analyze(content: &[u8]) -> ContentStats {
    ContentStats {
        text_ops: count_occurrences(content, b"BT") + count_occurrences(content, b"Tj"),
        image_ops: count_occurrences(content, b"BI") + count_occurrences(content, b"ID"),
        font_refs: count_occurrences(content, b"Font"),
        scanner_marker: SCANNER_MARKERS
            .iter()
            .any(|m| contains_ignore_case(content, m.as_bytes())),
    }
}

/// Apply the classification rules, first match wins.
pub fn classify_stats(stats: &ContentStats, file_size: u64) -> DocumentType {
    let image_heavy = stats.text_ops < 2 * stats.image_ops;
    if (file_size > SCANNED_MIN_BYTES && image_heavy) || stats.scanner_marker {
        DocumentType::Scanned
    } else if stats.text_ops > TEXT_MIN_TEXT_OPS && stats.font_refs > TEXT_MIN_FONTS {
        DocumentType::Text
    } else if stats.text_ops > MIXED_MIN_TEXT_OPS && stats.image_ops > MIXED_MIN_IMAGE_OPS {
        DocumentType::Mixed
    } else {
        DocumentType::General
    }
}

fn read_prefix(path: &Path, limit: u64) -> std::io::Result<(Vec<u8>, u64)> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let mut buf = Vec::with_capacity(size.min(limit) as usize);
    file.take(limit).read_to_end(&mut buf)?;
    Ok((buf, size))
}

/// Classify the PDF at `path`, inspecting at most `scan_bytes` bytes.
///
/// `Unknown` when the file does not exist, `AnalysisFailed` when it cannot be
/// read.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn classify(path: &Path, scan_bytes: u64) -> DocumentType {
    if !path.exists() {
        debug!("input missing");
        return DocumentType::Unknown;
    }
    match read_prefix(path, scan_bytes) {
        Ok((content, size)) => {
            let stats = analyze(&content);
            let doc_type = classify_stats(&stats, size);
            debug!(?stats, size, %doc_type, "classified");
            doc_type
        }
        Err(e) => {
            warn!(error = %e, "classification failed");
            DocumentType::AnalysisFailed
        }
    }
}

/// Whether the first `scan_bytes` of the file declare optional content.
/// Read errors count as "not layered".
#[instrument(skip_all, fields(path = %path.display()))]
pub fn is_layered(path: &Path, scan_bytes: u64) -> bool {
    match read_prefix(path, scan_bytes) {
        Ok((content, _)) => LAYER_MARKERS
            .iter()
            .any(|m| content.windows(m.len()).any(|w| w == *m)),
        Err(e) => {
            debug!(error = %e, "layer check skipped");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_is_non_overlapping_and_case_insensitive() {
        assert_eq!(count_occurrences(b"aaaa", b"aa"), 2);
        assert_eq!(count_occurrences(b"BT bt Bt", b"BT"), 3);
        assert_eq!(count_occurrences(b"x", b"xy"), 0);
        assert_eq!(count_occurrences(b"abc", b""), 0);
    }

    #[test]
    fn scanner_marker_wins_regardless_of_size() {
        let stats = analyze(b"/Producer (Canon SCANNER driver) BT Tj");
        assert!(stats.scanner_marker);
        assert_eq!(classify_stats(&stats, 1024), DocumentType::Scanned);
    }

    #[test]
    fn large_image_heavy_file_is_scanned() {
        let stats = ContentStats {
            text_ops: 3,
            image_ops: 2,
            ..ContentStats::default()
        };
        assert_eq!(classify_stats(&stats, 6 * MIB), DocumentType::Scanned);
        // Same content in a small file is not.
        assert_eq!(classify_stats(&stats, MIB), DocumentType::General);
    }

    #[test]
    fn text_rule() {
        let stats = ContentStats {
            text_ops: 51,
            font_refs: 6,
            ..ContentStats::default()
        };
        assert_eq!(classify_stats(&stats, MIB), DocumentType::Text);
        let fewer_fonts = ContentStats {
            font_refs: 5,
            ..stats
        };
        assert_eq!(classify_stats(&fewer_fonts, MIB), DocumentType::General);
    }

    #[test]
    fn mixed_rule() {
        let stats = ContentStats {
            text_ops: 11,
            image_ops: 3,
            ..ContentStats::default()
        };
        assert_eq!(classify_stats(&stats, MIB), DocumentType::Mixed);
    }

    #[test]
    fn missing_file_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            classify(&dir.path().join("absent.pdf"), MIB),
            DocumentType::Unknown
        );
    }

    #[test]
    fn directory_cannot_be_analysed() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(classify(dir.path(), MIB), DocumentType::AnalysisFailed);
    }

    #[test]
    fn file_classification_uses_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.pdf");
        let body = "BT /F1 Font Tj ET\n".repeat(60);
        std::fs::write(&path, &body).unwrap();
        assert_eq!(classify(&path, MIB), DocumentType::Text);
        // A window too small to see enough operators.
        assert_eq!(classify(&path, 64), DocumentType::General);
    }

    #[test]
    fn layer_markers() {
        let dir = tempfile::tempdir().unwrap();
        let layered = dir.path().join("layered.pdf");
        std::fs::write(&layered, b"<< /Type /Catalog /OCProperties << >> >>").unwrap();
        let plain = dir.path().join("plain.pdf");
        std::fs::write(&plain, b"<< /Type /Catalog >>").unwrap();

        assert!(is_layered(&layered, MIB));
        assert!(!is_layered(&plain, MIB));
        assert!(!is_layered(&dir.path().join("absent.pdf"), MIB));
    }
}
