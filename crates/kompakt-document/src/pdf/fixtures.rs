// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small generated PDFs for unit tests.

use std::path::Path;

use lopdf::{Document, Object, Stream, dictionary};

/// A valid PDF with `pages` blank A4 pages, each with a tiny text stream.
pub(crate) fn sample_pdf(pages: u32) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for n in 0..pages {
        let content = format!("BT /F1 12 Tf 72 720 Td (page {}) Tj ET", n + 1);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Write `sample_pdf(pages)` to `path`.
pub(crate) fn write_sample_pdf(path: &Path, pages: u32) {
    let mut doc = sample_pdf(pages);
    doc.save(path).expect("write sample PDF");
}
