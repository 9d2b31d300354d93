// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// kompakt engine adapters.
//
// Ghostscript is reached in-process through libgs when possible and as a
// `gs` process otherwise. The lossless optimizers (`mutool`, `qpdf`) are
// always separate processes. Callers only see the traits in `traits`.

pub mod args;
pub mod codes;
pub mod diagnostics;
pub mod ghostscript;
pub mod native;
pub mod process;
pub mod stub;
pub mod tools;
pub mod traits;

pub use ghostscript::{GhostscriptAdapter, NativeEngine};
pub use stub::UnavailableEngine;
pub use tools::OptimizerTools;
pub use traits::{EngineInvocation, EngineOutput, RenderEngine, StructuralOptimizer};
