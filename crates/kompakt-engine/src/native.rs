// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process Ghostscript through the `gsapi_*` C interface of libgs.
//
// The library is loaded at runtime, so a machine with only the `gs`
// executable still works. Ghostscript supports a single interpreter instance
// per process: every call takes `NATIVE_LOCK`, and a caller that finds it
// held gets `EngineUnavailable` immediately so the adapter can spawn `gs`
// instead of waiting.

use std::ffi::{CStr, CString, c_char, c_int, c_long, c_void};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, TryLockError};

use kompakt_core::error::{KompaktError, Result};
use libloading::Library;
use tracing::{debug, instrument, warn};

use crate::codes;
use crate::traits::EngineOutput;

/// `GS_ARG_ENCODING_UTF8` from `iapi.h`.
const ARG_ENCODING_UTF8: c_int = 1;

/// Library file names tried, most specific first.
#[cfg(target_os = "windows")]
pub const LIBRARY_NAMES: &[&str] = &["gsdll64.dll", "gsdll32.dll"];
#[cfg(target_os = "macos")]
pub const LIBRARY_NAMES: &[&str] = &["libgs.10.dylib", "libgs.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const LIBRARY_NAMES: &[&str] = &["libgs.so.10", "libgs.so.9", "libgs.so"];

static NATIVE_LOCK: Mutex<()> = Mutex::new(());

// ---------------------------------------------------------------------------
// C interface
// ---------------------------------------------------------------------------

type StdinFn = unsafe extern "C" fn(*mut c_void, *mut c_char, c_int) -> c_int;
type StdoutFn = unsafe extern "C" fn(*mut c_void, *const c_char, c_int) -> c_int;
type PollFn = unsafe extern "C" fn(*mut c_void) -> c_int;

type NewInstanceFn = unsafe extern "C" fn(*mut *mut c_void, *mut c_void) -> c_int;
type DeleteInstanceFn = unsafe extern "C" fn(*mut c_void);
type SetStdioFn =
    unsafe extern "C" fn(*mut c_void, Option<StdinFn>, Option<StdoutFn>, Option<StdoutFn>) -> c_int;
type SetPollFn = unsafe extern "C" fn(*mut c_void, Option<PollFn>) -> c_int;
type SetArgEncodingFn = unsafe extern "C" fn(*mut c_void, c_int) -> c_int;
type InitWithArgsFn = unsafe extern "C" fn(*mut c_void, c_int, *mut *mut c_char) -> c_int;
type RunStringFn = unsafe extern "C" fn(*mut c_void, *const c_char, c_int, *mut c_int) -> c_int;
type ExitFn = unsafe extern "C" fn(*mut c_void) -> c_int;
type RevisionFn = unsafe extern "C" fn(*mut GsapiRevision, c_int) -> c_int;

#[repr(C)]
struct GsapiRevision {
    product: *const c_char,
    copyright: *const c_char,
    revision: c_long,
    revisiondate: c_long,
}

/// Resolved entry points. The function pointers stay valid for as long as
/// `_library` is alive, which is the lifetime of this struct.
struct Api {
    new_instance: NewInstanceFn,
    delete_instance: DeleteInstanceFn,
    set_stdio: SetStdioFn,
    set_poll: Option<SetPollFn>,
    set_arg_encoding: SetArgEncodingFn,
    init_with_args: InitWithArgsFn,
    run_string: RunStringFn,
    exit: ExitFn,
    revision: RevisionFn,
    _library: Library,
}

impl Api {
    fn resolve(library: Library) -> std::result::Result<Self, libloading::Error> {
        // SAFETY: each symbol is looked up with the signature published in
        // Ghostscript's `iapi.h`; the pointers are copied out and kept next to
        // the `Library` that owns them.
        unsafe {
            let new_instance = *library.get::<NewInstanceFn>(b"gsapi_new_instance\0")?;
            let delete_instance = *library.get::<DeleteInstanceFn>(b"gsapi_delete_instance\0")?;
            let set_stdio = *library.get::<SetStdioFn>(b"gsapi_set_stdio\0")?;
            let set_poll = library.get::<SetPollFn>(b"gsapi_set_poll\0").ok().map(|s| *s);
            let set_arg_encoding = *library.get::<SetArgEncodingFn>(b"gsapi_set_arg_encoding\0")?;
            let init_with_args = *library.get::<InitWithArgsFn>(b"gsapi_init_with_args\0")?;
            let run_string = *library.get::<RunStringFn>(b"gsapi_run_string\0")?;
            let exit = *library.get::<ExitFn>(b"gsapi_exit\0")?;
            let revision = *library.get::<RevisionFn>(b"gsapi_revision\0")?;
            Ok(Self {
                new_instance,
                delete_instance,
                set_stdio,
                set_poll,
                set_arg_encoding,
                init_with_args,
                run_string,
                exit,
                revision,
                _library: library,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// Interpreter output collected through the stdio callbacks. Its address is
/// the caller handle registered with the instance.
#[derive(Default)]
struct Capture {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

unsafe extern "C" fn stdin_eof(_handle: *mut c_void, _buf: *mut c_char, _len: c_int) -> c_int {
    0
}

unsafe extern "C" fn capture_stdout(handle: *mut c_void, buf: *const c_char, len: c_int) -> c_int {
    // SAFETY: `handle` is the `Capture` owned by the live `GsInstance`, and
    // Ghostscript guarantees `buf` holds `len` bytes.
    unsafe { append(handle, buf, len, |c| &mut c.stdout) }
}

unsafe extern "C" fn capture_stderr(handle: *mut c_void, buf: *const c_char, len: c_int) -> c_int {
    // SAFETY: as for `capture_stdout`.
    unsafe { append(handle, buf, len, |c| &mut c.stderr) }
}

unsafe fn append(
    handle: *mut c_void,
    buf: *const c_char,
    len: c_int,
    pick: fn(&mut Capture) -> &mut Vec<u8>,
) -> c_int {
    if handle.is_null() || buf.is_null() || len <= 0 {
        return len.max(0);
    }
    // SAFETY: caller contract above.
    unsafe {
        let capture = &mut *(handle as *mut Capture);
        let bytes = std::slice::from_raw_parts(buf as *const u8, len as usize);
        pick(capture).extend_from_slice(bytes);
    }
    len
}

/// Poll callback: always "keep going".
unsafe extern "C" fn poll_continue(_handle: *mut c_void) -> c_int {
    0
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

/// One interpreter instance. Dropping it runs `gsapi_exit` (when the
/// interpreter was initialised) and `gsapi_delete_instance`; failures are
/// logged and swallowed. Release is idempotent.
struct GsInstance<'a> {
    api: &'a Api,
    raw: *mut c_void,
    initialised: bool,
    capture: Box<Capture>,
    _lock: MutexGuard<'static, ()>,
}

impl<'a> GsInstance<'a> {
    fn create(api: &'a Api) -> Result<Self> {
        let lock = match NATIVE_LOCK.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                return Err(KompaktError::EngineUnavailable(
                    "native Ghostscript instance busy".into(),
                ));
            }
        };

        let mut capture = Box::<Capture>::default();
        let handle = capture.as_mut() as *mut Capture as *mut c_void;
        let mut raw: *mut c_void = std::ptr::null_mut();

        // SAFETY: `raw` is a valid out-pointer; `handle` outlives the instance
        // because both live in the returned `GsInstance`.
        let code = unsafe { (api.new_instance)(&mut raw, handle) };
        if code < 0 || raw.is_null() {
            return Err(KompaktError::EngineInvocationFailed {
                code,
                reason: codes::reason(code),
                detail: "gsapi_new_instance failed".into(),
            });
        }

        let mut instance = Self {
            api,
            raw,
            initialised: false,
            capture,
            _lock: lock,
        };

        // SAFETY: `raw` is a fresh instance; callbacks match `iapi.h`.
        unsafe {
            if let Some(set_poll) = api.set_poll {
                set_poll(instance.raw, Some(poll_continue));
            }
            let code = (api.set_arg_encoding)(instance.raw, ARG_ENCODING_UTF8);
            codes::check(code, "gsapi_set_arg_encoding failed")?;
            let code = (api.set_stdio)(
                instance.raw,
                Some(stdin_eof),
                Some(capture_stdout),
                Some(capture_stderr),
            );
            codes::check(code, "gsapi_set_stdio failed")?;
        }

        Ok(instance)
    }

    fn init(&mut self, args: &[String]) -> Result<()> {
        let owned = std::iter::once("gs")
            .chain(args.iter().map(String::as_str))
            .map(|a| {
                CString::new(a).map_err(|_| {
                    KompaktError::InvalidRequest(format!("argument contains NUL byte: {a:?}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let mut argv: Vec<*mut c_char> = owned.iter().map(|a| a.as_ptr() as *mut c_char).collect();

        self.initialised = true;
        // SAFETY: `argv` points into `owned`, which outlives the call.
        let code = unsafe { (self.api.init_with_args)(self.raw, argv.len() as c_int, argv.as_mut_ptr()) };
        codes::check(code, &self.stderr_text())
    }

    fn run_string(&mut self, script: &str) -> Result<()> {
        let source = CString::new(script)
            .map_err(|_| KompaktError::InvalidRequest("script contains NUL byte".into()))?;
        let mut exit_code: c_int = 0;
        // SAFETY: `source` is NUL-terminated and outlives the call.
        let code = unsafe { (self.api.run_string)(self.raw, source.as_ptr(), 0, &mut exit_code) };
        codes::check(code, &self.stderr_text())
    }

    fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.capture.stderr).into_owned()
    }

    fn into_output(mut self, exit_code: i32) -> EngineOutput {
        self.release();
        EngineOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&self.capture.stdout).into_owned(),
            stderr: self.stderr_text(),
        }
    }

    fn release(&mut self) {
        if self.raw.is_null() {
            return;
        }
        // SAFETY: `raw` came from `gsapi_new_instance` and is nulled below, so
        // exit and delete run once.
        unsafe {
            if self.initialised {
                let code = (self.api.exit)(self.raw);
                if !codes::is_success(code) {
                    warn!(code, reason = %codes::reason(code), "gsapi_exit failed");
                }
            }
            (self.api.delete_instance)(self.raw);
        }
        self.raw = std::ptr::null_mut();
    }
}

impl Drop for GsInstance<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------------------------------------------------------------------
// Library handle
// ---------------------------------------------------------------------------

/// A loaded libgs.
pub struct GhostscriptLibrary {
    api: Api,
    path: PathBuf,
}

impl std::fmt::Debug for GhostscriptLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhostscriptLibrary").field("path", &self.path).finish()
    }
}

impl GhostscriptLibrary {
    /// Load the library at `path` (or a bare name for the system loader).
    pub fn load(path: &Path) -> Result<Self> {
        // SAFETY: loading libgs runs no initialisers with preconditions.
        let library = unsafe { Library::new(path) }.map_err(|e| {
            KompaktError::EngineUnavailable(format!("cannot load {}: {e}", path.display()))
        })?;
        let api = Api::resolve(library).map_err(|e| {
            KompaktError::EngineUnavailable(format!("{} lacks gsapi: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loaded Ghostscript library");
        Ok(Self {
            api,
            path: path.to_path_buf(),
        })
    }

    /// Search `dirs` for a known library name, then ask the system loader.
    pub fn locate(dirs: &[PathBuf]) -> Result<Self> {
        let in_dirs = dirs
            .iter()
            .flat_map(|dir| LIBRARY_NAMES.iter().map(move |name| dir.join(name)))
            .filter(|candidate| candidate.is_file());
        let system = LIBRARY_NAMES.iter().map(PathBuf::from);

        let mut last_error = None;
        for candidate in in_dirs.chain(system) {
            match Self::load(&candidate) {
                Ok(lib) => return Ok(lib),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error
            .unwrap_or_else(|| KompaktError::EngineUnavailable("no Ghostscript library found".into())))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the interpreter with `args` (without `argv[0]`).
    #[instrument(skip_all, fields(library = %self.path.display()))]
    pub fn invoke(&self, args: &[String]) -> Result<EngineOutput> {
        let mut instance = GsInstance::create(&self.api)?;
        instance.init(args)?;
        Ok(instance.into_output(0))
    }

    /// Run a PostScript fragment with no output device.
    #[instrument(skip_all, fields(library = %self.path.display()))]
    pub fn run_script(&self, script: &str) -> Result<EngineOutput> {
        let mut instance = GsInstance::create(&self.api)?;
        let args = ["-q", "-dNODISPLAY", "-dNOSAFER", "-dNOPAUSE"].map(String::from);
        instance.init(&args)?;
        instance.run_string(script)?;
        Ok(instance.into_output(0))
    }

    /// Product name and dotted revision, e.g. `GPL Ghostscript 10.03.1`.
    pub fn revision(&self) -> Result<String> {
        let mut rev = GsapiRevision {
            product: std::ptr::null(),
            copyright: std::ptr::null(),
            revision: 0,
            revisiondate: 0,
        };
        // SAFETY: `rev` matches `gsapi_revision_t` and its size is passed in.
        let code = unsafe { (self.api.revision)(&mut rev, std::mem::size_of::<GsapiRevision>() as c_int) };
        if code != 0 {
            return Err(KompaktError::EngineInvocationFailed {
                code,
                reason: "revision structure size mismatch".into(),
                detail: String::new(),
            });
        }
        let product = if rev.product.is_null() {
            "Ghostscript".to_string()
        } else {
            // SAFETY: Ghostscript returns a static NUL-terminated string.
            unsafe { CStr::from_ptr(rev.product) }.to_string_lossy().into_owned()
        };
        Ok(format!("{product} {}", dotted_revision(rev.revision as i64)))
    }
}

/// `10031` → `10.03.1`.
fn dotted_revision(revision: i64) -> String {
    format!(
        "{}.{:02}.{}",
        revision / 1000,
        (revision % 1000) / 10,
        revision % 10
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_formatting() {
        assert_eq!(dotted_revision(10031), "10.03.1");
        assert_eq!(dotted_revision(9561), "9.56.1");
    }

    #[test]
    fn missing_library_is_unavailable() {
        let err = GhostscriptLibrary::load(Path::new("/nonexistent/libgs-kompakt.so")).unwrap_err();
        assert!(matches!(err, KompaktError::EngineUnavailable(_)));
    }

    #[test]
    fn capture_callbacks_append() {
        let mut capture = Capture::default();
        let handle = &mut capture as *mut Capture as *mut c_void;
        let text = b"page 1\n";
        // SAFETY: handle and buffer are valid for the duration of the calls.
        unsafe {
            assert_eq!(capture_stdout(handle, text.as_ptr() as *const c_char, 7), 7);
            assert_eq!(capture_stderr(handle, text.as_ptr() as *const c_char, 4), 4);
            assert_eq!(capture_stdout(std::ptr::null_mut(), text.as_ptr() as *const c_char, 7), 7);
        }
        assert_eq!(capture.stdout, b"page 1\n");
        assert_eq!(capture.stderr, b"page");
    }
}
