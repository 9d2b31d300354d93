// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preset probe: compress with every named preset and report which one
// produced the smallest file. Outputs are thrown away.

use std::path::Path;

use kompakt_core::error::{KompaktError, Result};
use kompakt_core::types::{DeviceSetting, Stage};
use kompakt_document::fixed_profile;
use kompakt_engine::args::compression_args;
use kompakt_engine::traits::RenderEngine;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::progress::{CancelToken, ProgressSink, report};
use crate::workspace::{ensure_output, file_size};

/// Outcome of one preset.
#[derive(Debug, Clone, Serialize)]
pub struct PresetSize {
    pub device: DeviceSetting,
    pub size_bytes: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub original_size_bytes: u64,
    pub presets: Vec<PresetSize>,
    /// Smallest successful preset; the earlier one wins a tie.
    pub best: Option<DeviceSetting>,
}

/// Try every preset in [`DeviceSetting::PROBE_ORDER`] on `input`.
#[instrument(skip_all, fields(input = %input.display(), quality))]
pub fn probe_presets(
    engine: &dyn RenderEngine,
    input: &Path,
    quality: u8,
    optimize_for_scanned: bool,
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<ProbeReport> {
    let original_size_bytes = file_size(input)?;
    let scratch = tempfile::Builder::new()
        .prefix(".kompakt-probe-")
        .tempdir()
        .map_err(|e| KompaktError::io(std::env::temp_dir(), e))?;

    let mut presets = Vec::with_capacity(DeviceSetting::PROBE_ORDER.len());
    let mut best: Option<(DeviceSetting, u64)> = None;

    for (i, device) in DeviceSetting::PROBE_ORDER.into_iter().enumerate() {
        cancel.check(Stage::Probing)?;
        report(
            progress,
            Stage::Probing,
            10 + 20 * i as u8,
            format!("testing {device}"),
        );

        let output = scratch.path().join(format!("{device}.pdf"));
        let profile = fixed_profile(device, quality, optimize_for_scanned);
        let attempt = engine
            .invoke(&compression_args(&profile, input, &output))
            .and_then(|_| ensure_output(&output))
            .and_then(|()| file_size(&output));

        match attempt {
            Ok(size) => {
                info!(%device, size, "preset result");
                if best.is_none_or(|(_, smallest)| size < smallest) {
                    best = Some((device, size));
                }
                presets.push(PresetSize {
                    device,
                    size_bytes: Some(size),
                    error: None,
                });
            }
            Err(e) => {
                warn!(%device, error = %e, "preset failed");
                presets.push(PresetSize {
                    device,
                    size_bytes: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    report(progress, Stage::Probing, 100, "probe finished");
    Ok(ProbeReport {
        original_size_bytes,
        presets,
        best: best.map(|(device, _)| device),
    })
}
