// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ghostscript argument vectors.
//
// Every builder returns the arguments without `argv[0]`; the native adapter
// prepends one, the process adapter passes them straight to `gs`.

use std::path::{Path, PathBuf};

use kompakt_core::types::{CompressionProfile, DeviceSetting, PageRange};

/// Flags added to every compression pass regardless of profile.
pub const FIXED_FLAGS: [&str; 4] = [
    "-dDetectDuplicateImages=true",
    "-dAutoRotatePages=/None",
    "-dConvertCMYKImagesToRGB=true",
    "-dCompressFonts=true",
];

const OUTPUT_PREFIX: &str = "-sOutputFile=";

fn batch_header() -> Vec<String> {
    vec![
        "-sDEVICE=pdfwrite".into(),
        "-dNOPAUSE".into(),
        "-dBATCH".into(),
        "-dQUIET".into(),
    ]
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Arguments for one `pdfwrite` pass of `input` into `output` using `profile`.
///
/// Resolution flags are only emitted when the matching downsample flag is set.
pub fn compression_args(profile: &CompressionProfile, input: &Path, output: &Path) -> Vec<String> {
    let mut args = vec![
        "-sDEVICE=pdfwrite".to_string(),
        "-dCompatibilityLevel=1.4".to_string(),
        format!("-dPDFSETTINGS={}", profile.device.pdf_settings()),
        "-dNOPAUSE".to_string(),
        "-dBATCH".to_string(),
        "-dQUIET".to_string(),
    ];

    if profile.downsample_color {
        args.push("-dDownsampleColorImages=true".into());
        args.push(format!("-dColorImageResolution={}", profile.color_image_resolution));
    }
    if profile.downsample_gray {
        args.push("-dDownsampleGrayImages=true".into());
        args.push(format!("-dGrayImageResolution={}", profile.gray_image_resolution));
    }

    if profile.use_dct_encode {
        args.push("-dAutoFilterColorImages=false".into());
        args.push("-dColorImageFilter=/DCTEncode".into());
        args.push("-dAutoFilterGrayImages=false".into());
        args.push("-dGrayImageFilter=/DCTEncode".into());
    } else if profile.use_auto_filter {
        args.push("-dAutoFilterColorImages=true".into());
        args.push("-dAutoFilterGrayImages=true".into());
    }

    args.push(format!("-dJPEGQ={}", profile.jpeg_quality));
    args.extend(FIXED_FLAGS.iter().map(|f| f.to_string()));

    if profile.device == DeviceSetting::Screen {
        args.push("-dSubsetFonts=true".into());
    }

    args.push(format!("{OUTPUT_PREFIX}{}", path_arg(output)));
    args.push(path_arg(input));
    args
}

/// Arguments concatenating `inputs`, in order, into `output`.
pub fn merge_args(inputs: &[PathBuf], output: &Path) -> Vec<String> {
    let mut args = batch_header();
    args.push(format!("{OUTPUT_PREFIX}{}", path_arg(output)));
    args.extend(inputs.iter().map(|p| path_arg(p)));
    args
}

/// Arguments extracting the inclusive page `range` of `input` into `output`.
pub fn split_args(input: &Path, output: &Path, range: PageRange) -> Vec<String> {
    let mut args = batch_header();
    args.push(format!("-dFirstPage={}", range.first));
    args.push(format!("-dLastPage={}", range.last));
    args.push(format!("{OUTPUT_PREFIX}{}", path_arg(output)));
    args.push(path_arg(input));
    args
}

/// Process arguments for running a PostScript fragment with no device.
pub fn script_args(script: &str) -> Vec<String> {
    vec![
        "-q".into(),
        "-dNODISPLAY".into(),
        "-dNOSAFER".into(),
        "-dBATCH".into(),
        "-dNOPAUSE".into(),
        "-c".into(),
        script.into(),
    ]
}

/// PostScript that prints the page count of the PDF at `path`.
pub fn page_count_script(path: &Path) -> String {
    format!(
        "({}) (r) file runpdfbegin pdfpagecount = flush",
        escape_ps_string(&path.to_string_lossy())
    )
}

/// Escape a value for use inside a PostScript `( )` string literal.
pub fn escape_ps_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// The `-sOutputFile=` target of an argument vector, if present.
pub fn output_file(args: &[String]) -> Option<PathBuf> {
    args.iter()
        .find_map(|a| a.strip_prefix(OUTPUT_PREFIX))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CompressionProfile {
        CompressionProfile {
            device: DeviceSetting::Printer,
            color_image_resolution: 200,
            gray_image_resolution: 150,
            jpeg_quality: 70,
            use_auto_filter: true,
            use_dct_encode: false,
            downsample_color: false,
            downsample_gray: false,
        }
    }

    fn has(args: &[String], flag: &str) -> bool {
        args.iter().any(|a| a == flag)
    }

    #[test]
    fn no_resolution_without_downsampling() {
        let args = compression_args(&profile(), Path::new("in.pdf"), Path::new("out.pdf"));
        assert!(!args.iter().any(|a| a.contains("ImageResolution")));
        assert!(!args.iter().any(|a| a.starts_with("-dDownsample")));
        assert!(has(&args, "-dAutoFilterColorImages=true"));
        assert!(has(&args, "-dPDFSETTINGS=/printer"));
    }

    #[test]
    fn downsampling_is_gated_per_channel() {
        let p = CompressionProfile {
            downsample_gray: true,
            ..profile()
        };
        let args = compression_args(&p, Path::new("in.pdf"), Path::new("out.pdf"));
        assert!(has(&args, "-dGrayImageResolution=150"));
        assert!(!args.iter().any(|a| a.starts_with("-dColorImageResolution")));
    }

    #[test]
    fn dct_replaces_auto_filter() {
        let p = CompressionProfile {
            use_dct_encode: true,
            ..profile()
        };
        let args = compression_args(&p, Path::new("in.pdf"), Path::new("out.pdf"));
        assert!(has(&args, "-dAutoFilterColorImages=false"));
        assert!(has(&args, "-dGrayImageFilter=/DCTEncode"));
        assert!(!has(&args, "-dAutoFilterColorImages=true"));
    }

    #[test]
    fn fixed_flags_and_screen_fonts() {
        let p = CompressionProfile {
            device: DeviceSetting::Screen,
            ..profile()
        };
        let args = compression_args(&p, Path::new("in.pdf"), Path::new("out.pdf"));
        for flag in FIXED_FLAGS {
            assert!(has(&args, flag));
        }
        assert!(has(&args, "-dSubsetFonts=true"));
        assert!(has(&args, "-dJPEGQ=70"));
        assert_eq!(args.last().map(String::as_str), Some("in.pdf"));
        assert_eq!(output_file(&args), Some(PathBuf::from("out.pdf")));

        let other = compression_args(&profile(), Path::new("in.pdf"), Path::new("out.pdf"));
        assert!(!has(&other, "-dSubsetFonts=true"));
    }

    #[test]
    fn split_range_flags() {
        let args = split_args(
            Path::new("big.pdf"),
            Path::new("big.part2.pdf"),
            PageRange { first: 11, last: 20 },
        );
        assert!(has(&args, "-dFirstPage=11"));
        assert!(has(&args, "-dLastPage=20"));
        assert_eq!(output_file(&args), Some(PathBuf::from("big.part2.pdf")));
    }

    #[test]
    fn merge_keeps_input_order() {
        let inputs = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
        let args = merge_args(&inputs, Path::new("ab.pdf"));
        let n = args.len();
        assert_eq!(&args[n - 2..], &["a.pdf".to_string(), "b.pdf".to_string()]);
    }

    #[test]
    fn script_escapes_path() {
        let script = page_count_script(Path::new("/tmp/a (copy)\\x.pdf"));
        assert_eq!(
            script,
            "(/tmp/a \\(copy\\)\\\\x.pdf) (r) file runpdfbegin pdfpagecount = flush"
        );
    }
}
