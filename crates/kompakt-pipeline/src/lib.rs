// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// kompakt-pipeline: runs compression, merge, split and probe requests
// against the engine adapters.

pub mod guard;
pub mod merge;
pub mod orchestrator;
pub mod probe;
pub mod progress;
pub mod runner;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use merge::merge_pdf_files;
pub use orchestrator::{Orchestrator, Plan};
pub use probe::{PresetSize, ProbeReport, probe_presets};
pub use progress::{CancelToken, NoProgress, ProgressSink};
pub use runner::{JobRunner, RunHandle, split_pdf_file};
