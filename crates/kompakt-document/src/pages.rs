// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-count query with fallbacks: engine script, then the PDF parser, then a
// fixed default.

use std::path::Path;

use kompakt_core::error::{KompaktError, Result};
use kompakt_engine::args::page_count_script;
use kompakt_engine::traits::RenderEngine;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::pdf::PdfReader;

/// Where a page count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageCountSource {
    Engine,
    Parser,
    /// Neither worked; the configured default was used.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageCount {
    pub pages: u32,
    pub source: PageCountSource,
}

/// Last non-empty line of engine output parsed as a positive integer.
pub fn parse_page_count(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|l| !l.is_empty())
        .and_then(|l| l.parse::<u32>().ok())
        .filter(|&n| n > 0)
}

/// Count the pages of `path`.
///
/// Fails only when the file does not exist; every other problem degrades to
/// the next source and finally to `fallback`.
#[instrument(skip_all, fields(path = %path.display(), engine = engine.name()))]
pub fn page_count(engine: &dyn RenderEngine, path: &Path, fallback: u32) -> Result<PageCount> {
    if !path.is_file() {
        return Err(KompaktError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "input PDF not found"),
        ));
    }

    match engine.run_script(&page_count_script(path)) {
        Ok(output) => match parse_page_count(&output.stdout) {
            Some(pages) => {
                debug!(pages, "page count from engine");
                return Ok(PageCount {
                    pages,
                    source: PageCountSource::Engine,
                });
            }
            None => debug!(stdout = %output.stdout.trim(), "engine page count unparsable"),
        },
        Err(e) => debug!(error = %e, "engine page count failed"),
    }

    match PdfReader::open(path).map(|r| r.page_count()) {
        Ok(pages) if pages > 0 => {
            debug!(pages, "page count from parser");
            return Ok(PageCount {
                pages,
                source: PageCountSource::Parser,
            });
        }
        Ok(_) => debug!("parser found an empty page tree"),
        Err(e) => debug!(error = %e, "parser page count failed"),
    }

    warn!(pages = fallback, "page count unknown; using default");
    Ok(PageCount {
        pages: fallback,
        source: PageCountSource::Fallback,
    })
}
