// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stand-in engine for machines without Ghostscript.
//
// Lossless runs and page counting through the PDF parser still work; anything
// that needs rendering fails with `EngineUnavailable`.

use kompakt_core::error::{KompaktError, Result};

use crate::traits::{EngineOutput, RenderEngine};

/// Engine returned when Ghostscript could not be located.
#[derive(Debug, Clone)]
pub struct UnavailableEngine {
    reason: String,
}

impl UnavailableEngine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl RenderEngine for UnavailableEngine {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn invoke(&self, _args: &[String]) -> Result<EngineOutput> {
        tracing::warn!("RenderEngine::invoke called without Ghostscript");
        Err(KompaktError::EngineUnavailable(self.reason.clone()))
    }

    fn run_script(&self, _script: &str) -> Result<EngineOutput> {
        Err(KompaktError::EngineUnavailable(self.reason.clone()))
    }

    fn revision(&self) -> Result<String> {
        Err(KompaktError::EngineUnavailable(self.reason.clone()))
    }
}
