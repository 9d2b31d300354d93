// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ghostscript adapter: in-process library first, `gs` process second.

use std::path::{Path, PathBuf};

use kompakt_core::config::AppConfig;
use kompakt_core::error::{KompaktError, Result};
use tracing::{debug, info, instrument, warn};

use crate::args;
use crate::native::GhostscriptLibrary;
use crate::process;
use crate::traits::{EngineInvocation, EngineOutput, RenderEngine};

/// Executable name without platform suffix.
#[cfg(target_os = "windows")]
pub const EXECUTABLE: &str = "gswin64c";
#[cfg(not(target_os = "windows"))]
pub const EXECUTABLE: &str = "gs";

/// Directories searched before `PATH`: the configured directory, then a
/// `ghostscript/` directory beside the running binary (and its `bin/`).
pub fn search_dirs(config: &AppConfig) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = &config.ghostscript_dir {
        dirs.push(dir.clone());
        dirs.push(dir.join("bin"));
    }
    if let Some(dir) = process::beside_executable("ghostscript") {
        dirs.push(dir.join("bin"));
        dirs.push(dir);
    }
    dirs
}

/// The in-process half of the adapter.
pub trait NativeEngine: Send + Sync + std::fmt::Debug {
    /// Where the library was loaded from.
    fn path(&self) -> &Path;
    fn invoke(&self, args: &[String]) -> Result<EngineOutput>;
    fn run_script(&self, script: &str) -> Result<EngineOutput>;
    fn revision(&self) -> Result<String>;
}

impl NativeEngine for GhostscriptLibrary {
    fn path(&self) -> &Path {
        GhostscriptLibrary::path(self)
    }

    fn invoke(&self, args: &[String]) -> Result<EngineOutput> {
        GhostscriptLibrary::invoke(self, args)
    }

    fn run_script(&self, script: &str) -> Result<EngineOutput> {
        GhostscriptLibrary::run_script(self, script)
    }

    fn revision(&self) -> Result<String> {
        GhostscriptLibrary::revision(self)
    }
}

/// `RenderEngine` over a native libgs and/or the `gs` executable.
///
/// Native failures of any kind (busy lock included) fall back once to the
/// executable when one was found.
#[derive(Debug)]
pub struct GhostscriptAdapter {
    native: Option<Box<dyn NativeEngine>>,
    executable: Option<PathBuf>,
}

impl GhostscriptAdapter {
    pub fn new(native: Option<GhostscriptLibrary>, executable: Option<PathBuf>) -> Result<Self> {
        Self::with_native(
            native.map(|lib| Box::new(lib) as Box<dyn NativeEngine>),
            executable,
        )
    }

    /// As [`GhostscriptAdapter::new`] with any in-process implementation.
    pub fn with_native(
        native: Option<Box<dyn NativeEngine>>,
        executable: Option<PathBuf>,
    ) -> Result<Self> {
        if native.is_none() && executable.is_none() {
            return Err(KompaktError::EngineUnavailable(
                "neither libgs nor a gs executable was found".into(),
            ));
        }
        Ok(Self { native, executable })
    }

    /// Find Ghostscript the way the configuration asks.
    #[instrument(skip_all)]
    pub fn locate(config: &AppConfig) -> Result<Self> {
        let dirs = search_dirs(config);

        let native = if config.prefer_in_process {
            match GhostscriptLibrary::locate(&dirs) {
                Ok(lib) => Some(lib),
                Err(e) => {
                    debug!(error = %e, "in-process Ghostscript unavailable");
                    None
                }
            }
        } else {
            None
        };
        let executable = process::find_program(EXECUTABLE, &dirs);

        info!(
            library = ?native.as_ref().map(|l| l.path().to_path_buf()),
            executable = ?executable,
            "Ghostscript located"
        );
        Self::new(native, executable)
    }

    pub fn library_path(&self) -> Option<&Path> {
        self.native.as_deref().map(NativeEngine::path)
    }

    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    fn spawn(&self, args: Vec<String>) -> Result<EngineOutput> {
        let Some(program) = &self.executable else {
            return Err(KompaktError::EngineUnavailable("no gs executable".into()));
        };
        let invocation = EngineInvocation::new(program, args);
        let output = process::run(&invocation)?;
        if invocation.accepts(output.exit_code) {
            Ok(output)
        } else {
            Err(KompaktError::EngineInvocationFailed {
                code: output.exit_code,
                reason: format!("{} exited with status {}", invocation.program_name(), output.exit_code),
                detail: output.stderr.trim().to_string(),
            })
        }
    }

    /// Try the native library, then the process, logging the fallback.
    fn dispatch(
        &self,
        native_call: impl FnOnce(&dyn NativeEngine) -> Result<EngineOutput>,
        process_args: impl FnOnce() -> Vec<String>,
    ) -> Result<EngineOutput> {
        if let Some(lib) = self.native.as_deref() {
            match native_call(lib) {
                Ok(output) => return Ok(output),
                Err(e) if self.executable.is_some() => {
                    warn!(error = %e, "in-process Ghostscript failed; falling back to gs process");
                }
                Err(e) => return Err(e),
            }
        }
        self.spawn(process_args())
    }
}

impl RenderEngine for GhostscriptAdapter {
    fn name(&self) -> &str {
        if self.native.is_some() {
            "ghostscript (native)"
        } else {
            "ghostscript (process)"
        }
    }

    #[instrument(skip_all, fields(output = ?args::output_file(argv)))]
    fn invoke(&self, argv: &[String]) -> Result<EngineOutput> {
        self.dispatch(|lib| lib.invoke(argv), || argv.to_vec())
    }

    fn run_script(&self, script: &str) -> Result<EngineOutput> {
        self.dispatch(|lib| lib.run_script(script), || args::script_args(script))
    }

    fn revision(&self) -> Result<String> {
        if let Some(lib) = self.native.as_deref() {
            match lib.revision() {
                Ok(rev) => return Ok(rev),
                Err(e) => debug!(error = %e, "native revision query failed"),
            }
        }
        let output = self.spawn(vec!["--version".into()])?;
        Ok(format!("Ghostscript {}", output.stdout.trim()))
    }
}
