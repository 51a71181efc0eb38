mod analyzer;
pub mod config;
pub mod error;
pub mod f0;
mod report;
pub mod stats;
pub mod wav;

use std::ffi::CStr;
#[cfg(unix)]
use std::ffi::OsStr;
use std::path::PathBuf;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::{Once, OnceLock};

use libc::{self, c_char, c_int, c_void};
use tracing::error;
use tracing_subscriber::EnvFilter;

pub use analyzer::PitchAnalyzer;
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, Result};
pub use report::AnalysisResult;
pub use stats::PitchSummary;

/// Installs a stderr subscriber filtered by `RUST_LOG`, unless the host already set one.
pub fn init_logging(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn ffi_analyzer() -> &'static PitchAnalyzer {
    static LOGGING: Once = Once::new();
    static ANALYZER: OnceLock<PitchAnalyzer> = OnceLock::new();
    LOGGING.call_once(|| init_logging("warn"));
    ANALYZER.get_or_init(|| PitchAnalyzer::new(AnalyzerConfig::from_env()))
}

/// Converts a C path without altering its bytes where the platform allows it.
#[cfg(unix)]
fn c_path(file_name: &CStr) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(file_name.to_bytes()))
}

#[cfg(not(unix))]
fn c_path(file_name: &CStr) -> PathBuf {
    PathBuf::from(file_name.to_string_lossy().into_owned())
}

unsafe fn analyze_c_path(file_name: *const c_char) -> AnalysisResult {
    if file_name.is_null() {
        let err = AnalysisError::FileNotFound(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "null file name",
        ));
        error!(status = err.status(), "{err}");
        return AnalysisResult::failure(&err);
    }
    let path = c_path(CStr::from_ptr(file_name));
    panic::catch_unwind(AssertUnwindSafe(|| ffi_analyzer().report(&path))).unwrap_or_else(|_| {
        let err = AnalysisError::NoSpeech("analysis panicked".into());
        error!(path = %path.display(), status = err.status(), "{err}");
        AnalysisResult::failure(&err)
    })
}

/// Copies `json` with a trailing NUL into a new `malloc`ed buffer.
unsafe fn malloc_c_string(json: &str) -> *mut c_char {
    let buf = libc::malloc(json.len() + 1) as *mut c_char;
    if !buf.is_null() {
        libc::memcpy(buf as *mut c_void, json.as_ptr() as *const c_void, json.len());
        *buf.add(json.len()) = 0;
    }
    buf
}

/// Analyzes the WAV file `file_name` and writes the JSON result into `dst`.
///
/// `dst` is allocated by the caller and must be large enough to hold the result with its
/// trailing NUL. Returns `0` on success, the status code of the failure otherwise, or
/// `EINVAL` if `dst` is null.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn PitchAnalyzer(file_name: *const c_char, dst: *mut c_char) -> c_int {
    if dst.is_null() {
        return libc::EINVAL;
    }
    let result = analyze_c_path(file_name);
    let json = result.to_json();
    ptr::copy_nonoverlapping(json.as_ptr() as *const c_char, dst, json.len());
    *dst.add(json.len()) = 0;
    result.status
}

/// Analyzes the WAV file `file_name` and returns the JSON result in a new buffer.
///
/// The buffer is owned by the caller and released with [`PitchAnalyzerFree`] (or `free`).
/// Failures are reported through the `status` field of the JSON, never by the pointer.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn PitchAnalyzer2(file_name: *const c_char) -> *mut c_char {
    let result = analyze_c_path(file_name);
    let buf = malloc_c_string(&result.to_json());
    if !buf.is_null() {
        return buf;
    }
    let err = AnalysisError::Allocation("cannot allocate result buffer".into());
    error!(status = err.status(), "{err}");
    malloc_c_string(&AnalysisResult::failure(&err).to_json())
}

/// Releases a buffer returned by [`PitchAnalyzer2`].
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn PitchAnalyzerFree(buf: *mut c_char) {
    if !buf.is_null() {
        libc::free(buf as *mut c_void);
    }
}
