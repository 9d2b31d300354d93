// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External process runner shared by the Ghostscript and optimizer adapters.
//
// Output is read line by line as the child produces it; stderr is drained on
// a helper thread so a chatty child cannot fill one pipe while we block on the
// other. Every line is logged at debug level under the program's name.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use kompakt_core::error::{KompaktError, Result};
use tracing::{debug, instrument};

use crate::traits::{EngineInvocation, EngineOutput};

/// Exit code recorded when the child was killed by a signal.
pub const SIGNALLED: i32 = -1;

/// Run `invocation` to completion and capture its output.
///
/// A non-accepted exit code is not an error here; callers map it to their
/// own error variant. Failing to start the program is.
#[instrument(skip_all, fields(program = %invocation.program_name()))]
pub fn run(invocation: &EngineInvocation) -> Result<EngineOutput> {
    debug!(args = ?invocation.args, "spawning");

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(&invocation.program, e))?;

    let program = invocation.program_name();

    let stderr_reader = child.stderr.take().map(|pipe| {
        let program = program.clone();
        std::thread::spawn(move || collect_lines(pipe, &program, "stderr"))
    });

    let stdout = match child.stdout.take() {
        Some(pipe) => collect_lines(pipe, &program, "stdout"),
        None => String::new(),
    };

    let stderr = match stderr_reader {
        Some(handle) => handle.join().unwrap_or_default(),
        None => String::new(),
    };

    let status = child
        .wait()
        .map_err(|e| KompaktError::io(&invocation.program, e))?;
    let exit_code = status.code().unwrap_or(SIGNALLED);
    debug!(exit_code, "process finished");

    Ok(EngineOutput {
        exit_code,
        stdout,
        stderr,
    })
}

fn collect_lines(pipe: impl Read, program: &str, stream: &str) -> String {
    let mut collected = String::new();
    let reader = BufReader::new(pipe);
    for line in reader.split(b'\n') {
        let Ok(bytes) = line else { break };
        let line = String::from_utf8_lossy(&bytes);
        let line = line.trim_end_matches('\r');
        debug!(target: "kompakt_engine::process", program, stream, "{line}");
        collected.push_str(line);
        collected.push('\n');
    }
    collected
}

fn spawn_error(program: &Path, err: std::io::Error) -> KompaktError {
    if err.kind() == std::io::ErrorKind::NotFound {
        KompaktError::EngineUnavailable(format!("{} not found", program.display()))
    } else {
        KompaktError::io(program, err)
    }
}

// -- Program lookup --

/// Directory `sub` next to the running executable, if it exists.
pub fn beside_executable(sub: &str) -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?.join(sub);
    dir.is_dir().then_some(dir)
}

/// Find `name` (platform executable suffix added) in `dirs`, then on `PATH`.
pub fn find_program(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let file_name = format!("{name}{}", std::env::consts::EXE_SUFFIX);
    let path_dirs = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect::<Vec<_>>())
        .unwrap_or_default();

    dirs.iter()
        .chain(path_dirs.iter())
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}
