// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kompakt_core::error::{KompaktError, Result};
use kompakt_core::types::{ProgressEvent, Stage};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Receives coarse progress milestones from a running pipeline.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards every event.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        // A dropped receiver only means nobody is watching.
        if self.send(event).is_err() {
            debug!("progress receiver closed");
        }
    }
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

pub(crate) fn report(sink: &dyn ProgressSink, stage: Stage, percent: u8, message: impl Into<String>) {
    sink.emit(ProgressEvent {
        stage,
        percent: percent.min(100),
        message: message.into(),
    });
}

/// Shared flag polled between stages. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` if cancellation was requested before `stage`.
    pub fn check(&self, stage: Stage) -> Result<()> {
        if self.is_cancelled() {
            debug!(%stage, "cancelled");
            return Err(KompaktError::Cancelled { stage });
        }
        Ok(())
    }
}
