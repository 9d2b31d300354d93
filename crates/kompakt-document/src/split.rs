// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range splitter.
//
// Each part is one independent engine call. A failed part is recorded and
// its siblings still run.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use kompakt_core::error::{KompaktError, Result};
use kompakt_core::types::{PageRange, PartFailure, PartSize, SplitReport};
use kompakt_engine::args::split_args;
use kompakt_engine::traits::RenderEngine;
use tracing::{info, instrument, warn};

/// Inclusive ranges covering `1..=total_pages` in chunks of `pages_per_part`.
pub fn plan_parts(total_pages: u32, pages_per_part: u32) -> Vec<PageRange> {
    if total_pages == 0 || pages_per_part == 0 {
        return Vec::new();
    }
    (0..total_pages.div_ceil(pages_per_part))
        .map(|i| PageRange {
            first: i * pages_per_part + 1,
            last: ((i + 1) * pages_per_part).min(total_pages),
        })
        .collect()
}

/// `<dir>/<stem>.part<index>.pdf`, with `index` starting at 1.
pub fn part_path(input: &Path, output_dir: Option<&Path>, index: usize) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let name = format!("{stem}.part{index}.pdf");
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// Pages per part for a requested part size.
///
/// `TargetBytes` assumes every page weighs the same, so real parts can be
/// larger or smaller than the target.
pub fn pages_per_part(part_size: PartSize, total_pages: u32, file_size: u64) -> Result<u32> {
    match part_size {
        PartSize::PagesPerPart(0) | PartSize::TargetBytes(0) => Err(KompaktError::InvalidRequest(
            "part size must be greater than zero".into(),
        )),
        PartSize::PagesPerPart(n) => Ok(n),
        PartSize::TargetBytes(target) => {
            let bytes_per_page = (file_size / u64::from(total_pages.max(1))).max(1);
            let pages = (target / bytes_per_page).clamp(1, u64::from(total_pages.max(1)));
            Ok(pages as u32)
        }
    }
}

/// Drives the engine once per page range.
pub struct Splitter<'a> {
    engine: &'a dyn RenderEngine,
    output_dir: Option<PathBuf>,
}

impl<'a> Splitter<'a> {
    pub fn new(engine: &'a dyn RenderEngine) -> Self {
        Self {
            engine,
            output_dir: None,
        }
    }

    /// Write parts into `dir` instead of beside the input.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Split `input` into parts of `pages_per_part` pages.
    pub fn split(&self, input: &Path, total_pages: u32, pages_per_part: u32) -> Result<SplitReport> {
        self.split_observed(input, total_pages, pages_per_part, &mut |_, _| ControlFlow::Continue(()))
    }

    /// As [`Splitter::split`], calling `observer(part_index, part_count)`
    /// before each part. `Break` stops before that part; the report then
    /// holds only the parts already written and is marked `cancelled`.
    #[instrument(skip_all, fields(input = %input.display(), total_pages, pages_per_part))]
    pub fn split_observed(
        &self,
        input: &Path,
        total_pages: u32,
        pages_per_part: u32,
        observer: &mut dyn FnMut(usize, usize) -> ControlFlow<()>,
    ) -> Result<SplitReport> {
        if total_pages == 0 || pages_per_part == 0 {
            return Err(KompaktError::InvalidRequest(format!(
                "cannot split {total_pages} pages into parts of {pages_per_part}"
            )));
        }

        let ranges = plan_parts(total_pages, pages_per_part);
        info!(parts = ranges.len(), "splitting");

        let mut report = SplitReport {
            total_pages,
            pages_per_part,
            ..SplitReport::default()
        };

        for (idx, range) in ranges.iter().enumerate() {
            if observer(idx, ranges.len()).is_break() {
                info!(done = idx, "split stopped early");
                report.cancelled = true;
                break;
            }
            let part = idx as u32 + 1;
            let output = part_path(input, self.output_dir.as_deref(), idx + 1);
            match self.write_part(input, &output, *range) {
                Ok(()) => report.parts.push(output),
                Err(e) => {
                    warn!(part, %range, error = %e, "part failed");
                    report.failures.push(PartFailure {
                        part,
                        range: *range,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            written = report.parts.len(),
            failed = report.failures.len(),
            "split finished"
        );
        Ok(report)
    }

    fn write_part(&self, input: &Path, output: &Path, range: PageRange) -> Result<()> {
        self.engine.invoke(&split_args(input, output, range))?;
        if !output.is_file() {
            return Err(KompaktError::MissingOutput {
                path: output.to_path_buf(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kompakt_engine::args::output_file;
    use kompakt_engine::traits::EngineOutput;
    use std::sync::Mutex;

    /// Writes each requested part unless its first page is in `fail_first`.
    struct PartEngine {
        fail_first: Vec<u32>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl PartEngine {
        fn new(fail_first: Vec<u32>) -> Self {
            Self {
                fail_first,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl RenderEngine for PartEngine {
        fn name(&self) -> &str {
            "parts"
        }
        fn invoke(&self, args: &[String]) -> Result<EngineOutput> {
            self.calls.lock().unwrap().push(args.to_vec());
            let first: u32 = args
                .iter()
                .find_map(|a| a.strip_prefix("-dFirstPage="))
                .and_then(|v| v.parse().ok())
                .unwrap();
            if self.fail_first.contains(&first) {
                return Err(KompaktError::EngineInvocationFailed {
                    code: -12,
                    reason: "input/output error".into(),
                    detail: String::new(),
                });
            }
            std::fs::write(output_file(args).unwrap(), b"%PDF-1.4 part").unwrap();
            Ok(EngineOutput::default())
        }
        fn run_script(&self, _script: &str) -> Result<EngineOutput> {
            unreachable!()
        }
        fn revision(&self) -> Result<String> {
            Ok("parts".into())
        }
    }

    #[test]
    fn ninety_five_pages_in_tens() {
        let ranges = plan_parts(95, 10);
        assert_eq!(ranges.len(), 10);
        assert_eq!(ranges[0], PageRange { first: 1, last: 10 });
        assert_eq!(ranges[9], PageRange { first: 91, last: 95 });
        // Contiguous and complete.
        for pair in ranges.windows(2) {
            assert_eq!(pair[1].first, pair[0].last + 1);
        }
    }

    #[test]
    fn degenerate_plans() {
        assert!(plan_parts(0, 10).is_empty());
        assert!(plan_parts(10, 0).is_empty());
        assert_eq!(plan_parts(3, 10), vec![PageRange { first: 1, last: 3 }]);
    }

    #[test]
    fn part_names() {
        assert_eq!(
            part_path(Path::new("/d/report.pdf"), None, 2),
            PathBuf::from("/d/report.part2.pdf")
        );
        assert_eq!(
            part_path(Path::new("/d/report.pdf"), Some(Path::new("/out")), 1),
            PathBuf::from("/out/report.part1.pdf")
        );
    }

    #[test]
    fn target_bytes_maps_to_pages() {
        // 100 pages, 10 MB: 100 KB per page, 1 MB target → 10 pages.
        assert_eq!(
            pages_per_part(PartSize::TargetBytes(1_000_000), 100, 10_000_000).unwrap(),
            10
        );
        // Target smaller than a page still yields one page per part.
        assert_eq!(pages_per_part(PartSize::TargetBytes(10), 100, 10_000_000).unwrap(), 1);
        // Target bigger than the file yields a single part.
        assert_eq!(
            pages_per_part(PartSize::TargetBytes(u64::MAX), 100, 10_000_000).unwrap(),
            100
        );
        assert!(pages_per_part(PartSize::PagesPerPart(0), 100, 1).is_err());
    }

    #[test]
    fn failed_part_does_not_stop_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("big.pdf");
        std::fs::write(&input, b"%PDF").unwrap();
        let engine = PartEngine::new(vec![11]);

        let report = Splitter::new(&engine).split(&input, 25, 10).unwrap();
        assert_eq!(report.parts.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].part, 2);
        assert_eq!(report.failures[0].range, PageRange { first: 11, last: 20 });
        assert!(dir.path().join("big.part1.pdf").is_file());
        assert!(dir.path().join("big.part3.pdf").is_file());
        assert!(!report.is_complete());
        assert_eq!(engine.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn observer_can_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("big.pdf");
        std::fs::write(&input, b"%PDF").unwrap();
        let engine = PartEngine::new(vec![]);

        let report = Splitter::new(&engine)
            .split_observed(&input, 30, 10, &mut |idx, _| {
                if idx == 1 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(report.parts.len(), 1);
        assert!(report.cancelled);
        assert!(!report.is_complete());
        assert_eq!(engine.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn zero_pages_is_rejected() {
        let engine = PartEngine::new(vec![]);
        assert!(matches!(
            Splitter::new(&engine).split(Path::new("x.pdf"), 0, 10),
            Err(KompaktError::InvalidRequest(_))
        ));
    }
}
