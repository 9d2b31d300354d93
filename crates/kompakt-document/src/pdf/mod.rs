// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: best-effort structural reads through `lopdf`.

pub mod reader;

#[cfg(test)]
pub(crate) mod fixtures;

pub use reader::{PdfInfo, PdfReader, read_info};
