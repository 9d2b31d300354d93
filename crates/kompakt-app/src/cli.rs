// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use kompakt_core::AppConfig;
use kompakt_core::types::{CompressionMode, CompressionRequest, MIB, PartSize, SplitPolicy};

#[derive(Parser, Debug)]
#[command(name = "kompakt")]
#[command(
    author,
    version,
    about = "Shrink PDFs with Ghostscript, mutool and qpdf"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to config.json in the data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compress a PDF
    Compress(CompressArgs),

    /// Merge PDFs, in the order given, into one file
    Merge {
        /// Input PDFs (at least two)
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,

        /// Output PDF
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Split a PDF into page-range parts
    Split {
        input: PathBuf,

        /// Pages per part
        #[arg(long, conflicts_with = "size_mb")]
        pages: Option<u32>,

        /// Approximate part size in MB
        #[arg(long)]
        size_mb: Option<u64>,

        /// Directory for the parts (defaults to the input's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Print the page count of a PDF
    Pages { input: PathBuf },

    /// Show how Auto mode would treat a PDF
    Classify { input: PathBuf },

    /// Compress with every preset and report the smallest
    Probe {
        input: PathBuf,

        /// Image quality (0-100)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
        quality: Option<u8>,

        /// Re-encode images as JPEG and downsample them
        #[arg(long)]
        scanned: bool,
    },

    /// Check the Ghostscript and optimizer installation
    Doctor,

    /// Print the effective configuration
    Config {
        /// Write it to the configuration file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug)]
pub struct CompressArgs {
    pub input: PathBuf,

    /// Output PDF (defaults to <input>.compress.pdf)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// auto, lossless, hybrid, or a preset: screen, ebook, printer, prepress, default
    #[arg(short, long, default_value = "auto", value_parser = parse_mode)]
    pub mode: CompressionMode,

    /// Image quality (0-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: Option<u8>,

    /// Re-encode images as JPEG and downsample them
    #[arg(long)]
    pub scanned: bool,

    /// Split the output into parts of this many MB when it is larger
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub split_mb: Option<u64>,
}

impl CompressArgs {
    pub fn request(&self, config: &AppConfig) -> CompressionRequest {
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| CompressionRequest::default_output_path(&self.input));
        let mut request = CompressionRequest::new(&self.input, output);
        request.mode = self.mode;
        request.image_quality = self.quality.unwrap_or(config.default_image_quality);
        request.optimize_for_scanned = self.scanned;
        if let Some(mb) = self.split_mb {
            request.split_policy = SplitPolicy {
                enabled: true,
                max_part_size_mb: mb,
            };
        }
        request
    }
}

fn parse_mode(name: &str) -> Result<CompressionMode, String> {
    CompressionMode::parse(name).ok_or_else(|| {
        format!("unknown mode '{name}' (expected auto, lossless, hybrid, screen, ebook, printer, prepress or default)")
    })
}

/// Part sizing for `split`: explicit pages, explicit MB, or the configured
/// default part size.
pub fn part_size(pages: Option<u32>, size_mb: Option<u64>, config: &AppConfig) -> PartSize {
    match (pages, size_mb) {
        (Some(pages), _) => PartSize::PagesPerPart(pages),
        (None, Some(mb)) => PartSize::TargetBytes(mb.saturating_mul(MIB)),
        (None, None) => PartSize::TargetBytes(config.part_size_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kompakt_core::types::DeviceSetting;
    use std::path::Path;

    #[test]
    fn compress_defaults() {
        let cli = Cli::try_parse_from(["kompakt", "compress", "/d/in.pdf"]).unwrap();
        let Command::Compress(args) = cli.command else {
            panic!("expected compress");
        };
        let request = args.request(&AppConfig::default());
        assert_eq!(request.mode, CompressionMode::Auto);
        assert_eq!(request.image_quality, 75);
        assert_eq!(request.output_path, Path::new("/d/in.compress.pdf"));
        assert!(!request.split_policy.enabled);
    }

    #[test]
    fn compress_with_preset_and_split() {
        let cli = Cli::try_parse_from([
            "kompakt", "compress", "in.pdf", "-m", "ebook", "-q", "40", "--split-mb", "3", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        let Command::Compress(args) = cli.command else {
            panic!("expected compress");
        };
        let request = args.request(&AppConfig::default());
        assert_eq!(request.mode, CompressionMode::FixedProfile(DeviceSetting::Ebook));
        assert_eq!(request.image_quality, 40);
        assert_eq!(
            request.split_policy,
            SplitPolicy {
                enabled: true,
                max_part_size_mb: 3
            }
        );
    }

    #[test]
    fn bad_mode_and_quality_are_rejected() {
        assert!(Cli::try_parse_from(["kompakt", "compress", "in.pdf", "-m", "tiny"]).is_err());
        assert!(Cli::try_parse_from(["kompakt", "compress", "in.pdf", "-q", "101"]).is_err());
    }

    #[test]
    fn merge_needs_two_inputs() {
        assert!(Cli::try_parse_from(["kompakt", "merge", "a.pdf", "-o", "m.pdf"]).is_err());
        let cli = Cli::try_parse_from(["kompakt", "merge", "a.pdf", "b.pdf", "c.pdf", "-o", "m.pdf"])
            .unwrap();
        match cli.command {
            Command::Merge { inputs, output } => {
                assert_eq!(inputs.len(), 3);
                assert_eq!(output, PathBuf::from("m.pdf"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn split_sizing() {
        let config = AppConfig::default();
        assert_eq!(part_size(Some(10), None, &config), PartSize::PagesPerPart(10));
        assert_eq!(part_size(None, Some(2), &config), PartSize::TargetBytes(2 * MIB));
        assert_eq!(part_size(None, None, &config), PartSize::TargetBytes(5 * MIB));
        assert!(
            Cli::try_parse_from(["kompakt", "split", "a.pdf", "--pages", "2", "--size-mb", "1"])
                .is_err()
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["kompakt", "doctor", "-vv", "--config", "/etc/k.json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/k.json")));
    }
}
