// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fake engine and optimizer used by the pipeline tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex};

use kompakt_core::error::{KompaktError, Result};
use kompakt_engine::args::output_file;
use kompakt_engine::traits::{EngineOutput, RenderEngine, StructuralOptimizer};

/// What the fake does for one call.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    /// Write this many bytes to the output.
    Write(usize),
    /// Report an engine error.
    Fail,
    /// Report success without writing anything.
    NoOutput,
}

/// Blocks callers until opened.
#[derive(Clone, Default)]
pub(crate) struct Gate(Arc<(Mutex<bool>, Condvar)>);

impl Gate {
    pub(crate) fn open(&self) {
        let (lock, cvar) = &*self.0;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    fn wait(&self) {
        let (lock, cvar) = &*self.0;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
    }
}

fn write_bytes(path: &Path, len: usize) {
    let mut body = b"%PDF-1.4\n".to_vec();
    body.resize(len.max(body.len()), b'x');
    body.truncate(len);
    std::fs::write(path, body).unwrap();
}

/// Render engine that writes files of scripted sizes to `-sOutputFile=`.
pub(crate) struct FakeEngine {
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
    pub(crate) calls: Mutex<Vec<Vec<String>>>,
    page_count: Option<u32>,
    gate: Option<Gate>,
}

impl FakeEngine {
    /// Every call writes `len` bytes.
    pub(crate) fn writing(len: usize) -> Self {
        Self::scripted(Vec::new(), Step::Write(len))
    }

    /// Calls follow `steps` in order, then repeat `fallback`.
    pub(crate) fn scripted(steps: Vec<Step>, fallback: Step) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
            page_count: None,
            gate: None,
        }
    }

    pub(crate) fn with_pages(mut self, pages: u32) -> Self {
        self.page_count = Some(pages);
        self
    }

    pub(crate) fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl RenderEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn invoke(&self, args: &[String]) -> Result<EngineOutput> {
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        self.calls.lock().unwrap().push(args.to_vec());
        let step = self.steps.lock().unwrap().pop_front().unwrap_or(self.fallback);
        match step {
            Step::Write(len) => write_bytes(&output_file(args).unwrap(), len),
            Step::Fail => {
                return Err(KompaktError::EngineInvocationFailed {
                    code: -100,
                    reason: "fatal error".into(),
                    detail: String::new(),
                });
            }
            Step::NoOutput => {}
        }
        Ok(EngineOutput::default())
    }

    fn run_script(&self, _script: &str) -> Result<EngineOutput> {
        match self.page_count {
            Some(pages) => Ok(EngineOutput {
                exit_code: 0,
                stdout: format!("{pages}\n"),
                stderr: String::new(),
            }),
            None => Err(KompaktError::EngineUnavailable("fake has no scripts".into())),
        }
    }

    fn revision(&self) -> Result<String> {
        Ok("fake 1.0".into())
    }
}

/// Optimizer writing fixed sizes; either stage can be made to fail.
pub(crate) struct FakeTools {
    pub(crate) clean_len: usize,
    pub(crate) optimize_len: usize,
    pub(crate) fail_clean: bool,
    pub(crate) fail_optimize: bool,
    pub(crate) calls: Mutex<Vec<&'static str>>,
}

impl FakeTools {
    pub(crate) fn new(clean_len: usize, optimize_len: usize) -> Self {
        Self {
            clean_len,
            optimize_len,
            fail_clean: false,
            fail_optimize: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failure(tool: &str) -> KompaktError {
        KompaktError::ExternalToolFailed {
            tool: tool.into(),
            exit_code: Some(2),
            stderr: "broken xref".into(),
        }
    }
}

impl StructuralOptimizer for FakeTools {
    fn clean(&self, _input: &Path, output: &Path) -> Result<()> {
        self.calls.lock().unwrap().push("clean");
        if self.fail_clean {
            return Err(Self::failure("mutool"));
        }
        write_bytes(output, self.clean_len);
        Ok(())
    }

    fn optimize(&self, _input: &Path, output: &Path) -> Result<()> {
        self.calls.lock().unwrap().push("optimize");
        if self.fail_optimize {
            return Err(Self::failure("qpdf"));
        }
        write_bytes(output, self.optimize_len);
        Ok(())
    }
}

/// Write `len` bytes of `content`-prefixed filler to `path`.
pub(crate) fn write_input(path: &Path, content: &[u8], len: usize) {
    let mut body = content.to_vec();
    if body.len() < len {
        body.resize(len, b' ');
    }
    std::fs::write(path, body).unwrap();
}
