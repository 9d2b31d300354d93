// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ghostscript return codes (`ierrors.h`).
//
// Zero and `Quit` are success. Every other negative value is a failure with a
// named class. Exit codes of the `gs` process are not from this table: there
// 0 is success and anything else is a failure.

use kompakt_core::error::{KompaktError, Result};

pub const QUIT: i32 = -101;
pub const FATAL: i32 = -100;
pub const NEED_INPUT: i32 = -106;

/// (code, PostScript name, reason shown to the user)
const TABLE: &[(i32, &str, &str)] = &[
    (-1, "unknownerror", "unknown error"),
    (-2, "dictfull", "dictionary full"),
    (-3, "dictstackoverflow", "dictionary stack overflow"),
    (-4, "dictstackunderflow", "dictionary stack underflow"),
    (-5, "execstackoverflow", "execution stack overflow"),
    (-6, "interrupt", "interrupted"),
    (-7, "invalidaccess", "invalid access"),
    (-8, "invalidexit", "invalid exit"),
    (-9, "invalidfileaccess", "invalid file access"),
    (-10, "invalidfont", "invalid font"),
    (-11, "invalidrestore", "invalid restore"),
    (-12, "ioerror", "input/output error"),
    (-13, "limitcheck", "implementation limit exceeded"),
    (-14, "nocurrentpoint", "no current point"),
    (-15, "rangecheck", "value out of range"),
    (-16, "stackoverflow", "operand stack overflow"),
    (-17, "stackunderflow", "operand stack underflow"),
    (-18, "syntaxerror", "syntax error"),
    (-19, "timeout", "timed out"),
    (-20, "typecheck", "type mismatch"),
    (-21, "undefined", "undefined name"),
    (-22, "undefinedfilename", "file not found"),
    (-23, "undefinedresult", "undefined result"),
    (-24, "unmatchedmark", "unmatched mark"),
    (-25, "VMerror", "out of memory"),
    (-26, "configurationerror", "configuration error"),
    (-27, "undefinedresource", "undefined resource"),
    (-28, "unregistered", "unregistered operator"),
    (-29, "invalidcontext", "invalid context"),
    (-30, "invalidid", "invalid identifier"),
    (FATAL, "Fatal", "fatal interpreter error"),
    (QUIT, "Quit", "quit"),
    (-102, "InterpreterExit", "interpreter exited"),
    (-103, "RemapColor", "colour remap requested"),
    (-104, "ExecStackUnderflow", "execution stack underflow"),
    (-105, "VMreclaim", "memory reclaim requested"),
    (NEED_INPUT, "NeedInput", "more input needed"),
    (-107, "NeedFile", "file needed"),
    (-110, "Info", "informational"),
    (-111, "handled", "already handled"),
];

/// Whether a library return code means the call succeeded.
pub fn is_success(code: i32) -> bool {
    code == 0 || code == QUIT
}

/// PostScript error name for a code, e.g. `VMerror`.
pub fn name(code: i32) -> &'static str {
    lookup(code).map(|&(_, name, _)| name).unwrap_or("unknown")
}

/// Human-readable reason for a code.
pub fn reason(code: i32) -> String {
    match lookup(code) {
        Some((_, _, reason)) => (*reason).to_string(),
        None if code > 0 => format!("unexpected positive code {code}"),
        None => format!("unrecognised error code {code}"),
    }
}

/// Turn a library return code into a result, attaching `detail` (usually the
/// captured stderr) on failure.
pub fn check(code: i32, detail: &str) -> Result<()> {
    if is_success(code) {
        return Ok(());
    }
    Err(KompaktError::EngineInvocationFailed {
        code,
        reason: reason(code),
        detail: detail.trim().to_string(),
    })
}

fn lookup(code: i32) -> Option<&'static (i32, &'static str, &'static str)> {
    TABLE.iter().find(|(c, _, _)| *c == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_quit_succeed() {
        assert!(is_success(0));
        assert!(is_success(QUIT));
        assert!(!is_success(-25));
        assert!(!is_success(FATAL));
    }

    #[test]
    fn named_classes() {
        assert_eq!(name(-25), "VMerror");
        assert_eq!(reason(-25), "out of memory");
        assert_eq!(name(-9), "invalidfileaccess");
        assert_eq!(name(-22), "undefinedfilename");
        assert_eq!(name(-5), "execstackoverflow");
        assert_eq!(name(-999), "unknown");
    }

    #[test]
    fn check_carries_detail() {
        assert!(check(QUIT, "").is_ok());
        match check(-12, "  disk gone \n") {
            Err(KompaktError::EngineInvocationFailed { code, reason, detail }) => {
                assert_eq!(code, -12);
                assert_eq!(reason, "input/output error");
                assert_eq!(detail, "disk gone");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
