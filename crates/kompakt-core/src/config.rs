// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{KompaktError, Result};
use crate::types::MIB;

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the Ghostscript library or executable. Searched
    /// before the conventional `ghostscript/` directory and `PATH`.
    pub ghostscript_dir: Option<PathBuf>,
    /// Directory holding `mutool` and `qpdf`.
    pub tools_dir: Option<PathBuf>,
    /// Try the in-process Ghostscript library before spawning `gs`.
    pub prefer_in_process: bool,
    /// Quality slider value used when the caller gives none (0–100).
    pub default_image_quality: u8,
    /// Size above which a split is recommended when the caller has no policy.
    pub default_split_threshold_mb: u64,
    /// Part size suggested alongside that recommendation.
    pub default_part_size_mb: u64,
    /// Page count assumed when neither the engine nor the parser can tell.
    pub fallback_page_count: u32,
    /// Bytes of the input the classifier inspects.
    pub classify_scan_bytes: u64,
    /// Bytes of the input inspected for optional-content markers.
    pub layering_scan_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ghostscript_dir: None,
            tools_dir: None,
            prefer_in_process: true,
            default_image_quality: 75,
            default_split_threshold_mb: 20,
            default_part_size_mb: 5,
            fallback_page_count: 10,
            classify_scan_bytes: 16 * MIB,
            layering_scan_bytes: 4 * MIB,
        }
    }
}

impl AppConfig {
    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.default_image_quality > 100 {
            return Err(KompaktError::Config(format!(
                "default_image_quality must be 0-100, got {}",
                self.default_image_quality
            )));
        }
        if self.default_part_size_mb == 0 || self.default_split_threshold_mb == 0 {
            return Err(KompaktError::Config(
                "split threshold and part size must be non-zero".into(),
            ));
        }
        if self.fallback_page_count == 0 {
            return Err(KompaktError::Config("fallback_page_count must be non-zero".into()));
        }
        if self.classify_scan_bytes == 0 || self.layering_scan_bytes == 0 {
            return Err(KompaktError::Config("scan windows must be non-zero".into()));
        }
        Ok(())
    }

    pub fn split_threshold_bytes(&self) -> u64 {
        self.default_split_threshold_mb.saturating_mul(MIB)
    }

    pub fn part_size_bytes(&self) -> u64 {
        self.default_part_size_mb.saturating_mul(MIB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.split_threshold_bytes(), 20 * MIB);
        assert_eq!(config.part_size_bytes(), 5 * MIB);
    }

    #[test]
    fn huge_sizes_saturate() {
        let config = AppConfig {
            default_split_threshold_mb: u64::MAX,
            default_part_size_mb: u64::MAX / 2,
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.split_threshold_bytes(), u64::MAX);
        assert_eq!(config.part_size_bytes(), u64::MAX);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "tools_dir": "/opt/tools", "fallback_page_count": 3 }"#)
                .unwrap();
        assert_eq!(config.tools_dir, Some(PathBuf::from("/opt/tools")));
        assert_eq!(config.fallback_page_count, 3);
        assert!(config.prefer_in_process);
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let config = AppConfig {
            default_image_quality: 101,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(KompaktError::Config(_))));
    }
}
