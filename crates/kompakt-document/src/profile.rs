// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compression profile and strategy selection. All functions here are pure.

use kompakt_core::types::{CompressionProfile, DeviceSetting, DocumentType, Strategy};
use tracing::warn;

/// Quality at or above which Auto mode prefers the lossless strategy.
pub const LOSSLESS_QUALITY: u8 = 90;

fn scan_resolution(quality: u8) -> u32 {
    (2 * quality as u32).max(150)
}

/// Device parameters for a classified document at the given quality (0–100).
pub fn select_profile(doc_type: DocumentType, quality: u8) -> CompressionProfile {
    let quality = quality.min(100);
    match doc_type {
        DocumentType::Scanned => CompressionProfile {
            device: DeviceSetting::Screen,
            color_image_resolution: scan_resolution(quality),
            gray_image_resolution: scan_resolution(quality),
            jpeg_quality: quality,
            use_auto_filter: false,
            use_dct_encode: true,
            downsample_color: true,
            downsample_gray: true,
        },
        DocumentType::Text => CompressionProfile {
            device: DeviceSetting::Ebook,
            color_image_resolution: 300,
            gray_image_resolution: 300,
            jpeg_quality: quality.max(80),
            use_auto_filter: true,
            use_dct_encode: false,
            downsample_color: false,
            downsample_gray: false,
        },
        DocumentType::Mixed => CompressionProfile {
            device: DeviceSetting::Printer,
            color_image_resolution: 200,
            gray_image_resolution: 200,
            jpeg_quality: quality,
            use_auto_filter: true,
            use_dct_encode: true,
            downsample_color: true,
            downsample_gray: true,
        },
        DocumentType::General | DocumentType::Unknown | DocumentType::AnalysisFailed => {
            CompressionProfile::default()
        }
    }
}

/// Strategy for Auto mode. Earlier rules dominate later ones.
pub fn select_strategy(
    doc_type: DocumentType,
    layered: bool,
    tools_available: bool,
    quality: u8,
    optimize_for_scanned: bool,
) -> Strategy {
    if layered {
        if tools_available {
            return Strategy::Lossless;
        }
        warn!("layered document without optimizer tools; Ghostscript may flatten its layers");
        return Strategy::GhostscriptOnly;
    }
    if !tools_available {
        return Strategy::GhostscriptOnly;
    }
    if doc_type == DocumentType::Text {
        return Strategy::Lossless;
    }
    if doc_type == DocumentType::Scanned || optimize_for_scanned {
        return Strategy::Hybrid;
    }
    if quality >= LOSSLESS_QUALITY {
        Strategy::Lossless
    } else {
        Strategy::Hybrid
    }
}

/// A named preset at the given quality. With `optimize_for_scanned` images
/// are re-encoded as JPEG and downsampled like a scanned document.
pub fn fixed_profile(device: DeviceSetting, quality: u8, optimize_for_scanned: bool) -> CompressionProfile {
    let quality = quality.min(100);
    let base = CompressionProfile {
        device,
        color_image_resolution: 300,
        gray_image_resolution: 300,
        jpeg_quality: quality,
        use_auto_filter: true,
        use_dct_encode: false,
        downsample_color: false,
        downsample_gray: false,
    };
    if !optimize_for_scanned {
        return base;
    }
    CompressionProfile {
        color_image_resolution: scan_resolution(quality),
        gray_image_resolution: scan_resolution(quality),
        use_auto_filter: false,
        use_dct_encode: true,
        downsample_color: true,
        downsample_gray: true,
        ..base
    }
}

/// The stronger profile used for the single regression retry.
pub fn aggressive_profile(base: &CompressionProfile) -> CompressionProfile {
    CompressionProfile {
        device: DeviceSetting::Screen,
        color_image_resolution: 120,
        gray_image_resolution: 120,
        jpeg_quality: base.jpeg_quality.min(60),
        use_auto_filter: false,
        use_dct_encode: true,
        downsample_color: true,
        downsample_gray: true,
    }
}
