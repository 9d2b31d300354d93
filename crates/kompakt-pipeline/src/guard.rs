// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Regression guard and split suggestion.
//
// Decides whether a run that failed to shrink its input earns one more pass
// with the aggressive profile, whether that pass is worth keeping, and
// whether the final output is large enough to suggest splitting.

use kompakt_core::config::AppConfig;
use kompakt_core::types::{DocumentType, MIB, Outcome, SplitPolicy, SplitRecommendation};
use tracing::{debug, info};

/// Result of evaluating a finished strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Keep the output as it is.
    Accept,
    /// Output did not shrink a scanned document; run the aggressive profile
    /// once from the original input.
    RetryAggressive,
}

/// Only scanned documents are retried, and only when the output is not
/// smaller than the input.
pub fn should_retry(doc_type: DocumentType, original_size: u64, output_size: u64) -> RetryDecision {
    if output_size < original_size {
        return RetryDecision::Accept;
    }
    if doc_type != DocumentType::Scanned {
        debug!(%doc_type, "no size gain; retry reserved for scanned documents");
        return RetryDecision::Accept;
    }
    info!(
        original_size,
        output_size, "scanned document grew; retrying with aggressive profile"
    );
    RetryDecision::RetryAggressive
}

/// The retry output replaces the previous one only when it is smaller than
/// both the previous output and the original.
pub fn keep_retry(original_size: u64, previous_size: u64, retry_size: u64) -> bool {
    retry_size < previous_size && retry_size < original_size
}

pub fn outcome(original_size: u64, final_size: u64) -> Outcome {
    if final_size < original_size {
        Outcome::Reduced
    } else {
        Outcome::NoSizeGain
    }
}

/// Suggest splitting when `final_size` exceeds the threshold: the policy's
/// part size when splitting is enabled, otherwise the configured default.
pub fn split_suggestion(
    final_size: u64,
    policy: &SplitPolicy,
    config: &AppConfig,
) -> Option<SplitRecommendation> {
    let (threshold_bytes, part_size_bytes) = if policy.enabled {
        let policy_bytes = policy.max_part_size_mb.saturating_mul(MIB);
        (policy_bytes, policy_bytes)
    } else {
        (config.split_threshold_bytes(), config.part_size_bytes())
    };
    if threshold_bytes == 0 || final_size <= threshold_bytes {
        return None;
    }
    Some(SplitRecommendation {
        threshold_bytes,
        part_size_bytes,
    })
}
