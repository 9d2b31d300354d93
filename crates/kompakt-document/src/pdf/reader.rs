// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open an existing document with `lopdf` and answer structural
// questions the byte classifier cannot (page count, encryption).

use std::path::Path;

use kompakt_core::error::{KompaktError, Result};
use lopdf::Document;
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Structural facts about a PDF the parser could open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfInfo {
    /// Header version, e.g. `1.5`.
    pub version: String,
    pub encrypted: bool,
    pub pages: u32,
}

/// Read-only view of a parsed PDF.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            KompaktError::Pdf(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the page tree.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Whether the trailer references an encryption dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.document.trailer.get(b"Encrypt").is_ok()
    }

    /// PDF header version, e.g. `1.5`.
    pub fn version(&self) -> &str {
        &self.document.version
    }

    pub fn info(&self) -> PdfInfo {
        PdfInfo {
            version: self.version().to_string(),
            encrypted: self.is_encrypted(),
            pages: self.page_count(),
        }
    }
}

/// Parse `path` and summarise it; `None` when the parser cannot open it.
pub fn read_info(path: &Path) -> Option<PdfInfo> {
    match PdfReader::open(path) {
        Ok(reader) => Some(reader.info()),
        Err(e) => {
            debug!(error = %e, "PDF structure not readable");
            None
        }
    }
}
