// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// kompakt-document: what kind of PDF is this, and how should it be squeezed?
//
// Provides the byte-pattern classifier, profile and strategy selection, the
// page-count query and the page-range splitter.

pub mod classify;
pub mod pages;
pub mod pdf;
pub mod profile;
pub mod split;

pub use classify::{classify, is_layered};
pub use pages::{PageCount, PageCountSource, page_count};
pub use pdf::reader::{PdfInfo, PdfReader, read_info};
pub use profile::{aggressive_profile, fixed_profile, select_profile, select_strategy};
pub use split::Splitter;
