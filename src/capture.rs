//! Capture what a closure writes to the process's stdout and stderr

use std::io::Write as _;

use crate::drain::Drain;
use crate::macros::debug;

/// Text written to stdout and stderr during [`capture_output`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
}

/// Only one capture may own the process's standard handles at a time
static CAPTURE_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

thread_local! {
    /// Set while this thread runs a capture action
    static CAPTURING: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// Run `action` with the process's stdout and stderr redirected into memory
///
/// The OS-level handles are redirected, so this sees everything written to them: writes through
/// [`std::io::stdout`] and [`std::io::stderr`], C libraries, and child processes that inherit
/// the handles.
///
/// **NOTE:** libtest intercepts `print!`, `println!`, `eprint!` and `eprintln!` before they
/// reach the OS handles unless the test binary runs with `--nocapture`.  Write through
/// [`std::io::stdout`] / [`std::io::stderr`] in the action instead.
///
/// Captures in the same process are serialized.  Anything another thread writes while the
/// action runs is captured as well.
///
/// Captures can't be nested: calling `capture_output` from within an action returns an
/// [`Error`][crate::Error].  An action must not wait on another thread that starts a capture;
/// that thread blocks until the action returns.
///
/// If `action` panics, the original handles are restored and then the panic resumes.
///
/// ```rust
/// use std::io::Write;
///
/// let captured = capbox::capture_output(|| {
///     write!(std::io::stdout(), "Hello").unwrap();
///     write!(std::io::stderr(), "World").unwrap();
/// })
/// .unwrap();
/// assert_eq!(captured.stdout, "Hello");
/// assert_eq!(captured.stderr, "World");
/// ```
pub fn capture_output<F>(action: F) -> crate::Result<Captured>
where
    F: FnOnce(),
{
    if CAPTURING.with(|c| c.get()) {
        return Err("capture_output cannot be nested".into());
    }
    let _lock = CAPTURE_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let _capturing = Capturing::enter();

    let _ = std::io::stdout().flush();

    let (stdout_reader, stdout_writer) =
        os_pipe::pipe().map_err(|e| format!("Failed to create stdout pipe: {e}"))?;
    let (stderr_reader, stderr_writer) =
        os_pipe::pipe().map_err(|e| format!("Failed to create stderr pipe: {e}"))?;

    // Both drains run while the action does; a full pipe would otherwise block it forever.
    let stdout = Drain::spawn("stdout", stdout_reader)?;
    let stderr = Drain::spawn("stderr", stderr_reader)?;

    debug!("Redirecting stdout and stderr");
    let result = {
        let _redirect = Redirect::new(stdout_writer, stderr_writer)
            .map_err(|e| format!("Failed to redirect stdout and stderr: {e}"))?;
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(action))
    };
    debug!("Restored stdout and stderr");

    let stdout = stdout.finish();
    let stderr = stderr.finish();
    match result {
        Ok(()) => Ok(Captured {
            stdout: stdout?,
            stderr: stderr?,
        }),
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Marks the current thread as capturing until dropped
struct Capturing;

impl Capturing {
    fn enter() -> Self {
        CAPTURING.with(|c| c.set(true));
        Self
    }
}

impl Drop for Capturing {
    fn drop(&mut self) {
        CAPTURING.with(|c| c.set(false));
    }
}

/// Scoped redirection of stdout and stderr into pipes
///
/// Dropping restores the original handles and then closes the write ends, so readers see
/// end-of-stream.
struct Redirect {
    _stdout: imp::Redirected,
    _stderr: imp::Redirected,
    _writers: (os_pipe::PipeWriter, os_pipe::PipeWriter),
}

impl Redirect {
    fn new(stdout: os_pipe::PipeWriter, stderr: os_pipe::PipeWriter) -> std::io::Result<Self> {
        let redirected_stdout = imp::redirect_stdout(&stdout)?;
        let redirected_stderr = imp::redirect_stderr(&stderr)?;
        Ok(Self {
            _stdout: redirected_stdout,
            _stderr: redirected_stderr,
            _writers: (stdout, stderr),
        })
    }
}

impl Drop for Redirect {
    fn drop(&mut self) {
        // Buffered output belongs to the capture, not to whatever stdout becomes next.
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }
}

#[cfg(unix)]
mod imp {
    use std::os::fd::AsFd as _;
    use std::os::fd::AsRawFd as _;
    use std::os::fd::OwnedFd;
    use std::os::fd::RawFd;

    /// A standard descriptor pointing somewhere else until dropped
    pub(super) struct Redirected {
        target: RawFd,
        original: OwnedFd,
    }

    pub(super) fn redirect_stdout(to: &os_pipe::PipeWriter) -> std::io::Result<Redirected> {
        let original = std::io::stdout().as_fd().try_clone_to_owned()?;
        Redirected::new(libc::STDOUT_FILENO, original, to.as_raw_fd())
    }

    pub(super) fn redirect_stderr(to: &os_pipe::PipeWriter) -> std::io::Result<Redirected> {
        let original = std::io::stderr().as_fd().try_clone_to_owned()?;
        Redirected::new(libc::STDERR_FILENO, original, to.as_raw_fd())
    }

    impl Redirected {
        fn new(target: RawFd, original: OwnedFd, to: RawFd) -> std::io::Result<Self> {
            dup2(to, target)?;
            Ok(Self { target, original })
        }
    }

    impl Drop for Redirected {
        fn drop(&mut self) {
            let _ = dup2(self.original.as_raw_fd(), self.target);
        }
    }

    fn dup2(src: RawFd, dst: RawFd) -> std::io::Result<()> {
        loop {
            // SAFETY: `src` is owned by the caller for the duration of the call and `dst` is a
            // standard descriptor; `dup2` atomically replaces it.
            let ret = unsafe { libc::dup2(src, dst) };
            if ret != -1 {
                return Ok(());
            }
            let err = std::io::Error::last_os_error();
            if err.kind() != std::io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

#[cfg(windows)]
mod imp {
    use std::os::windows::io::AsRawHandle as _;

    use windows_sys::Win32::Foundation::HANDLE;
    use windows_sys::Win32::Foundation::INVALID_HANDLE_VALUE;
    use windows_sys::Win32::System::Console::GetStdHandle;
    use windows_sys::Win32::System::Console::SetStdHandle;
    use windows_sys::Win32::System::Console::STD_ERROR_HANDLE;
    use windows_sys::Win32::System::Console::STD_HANDLE;
    use windows_sys::Win32::System::Console::STD_OUTPUT_HANDLE;

    /// A standard handle pointing somewhere else until dropped
    pub(super) struct Redirected {
        target: STD_HANDLE,
        original: HANDLE,
    }

    pub(super) fn redirect_stdout(to: &os_pipe::PipeWriter) -> std::io::Result<Redirected> {
        Redirected::new(STD_OUTPUT_HANDLE, to.as_raw_handle() as HANDLE)
    }

    pub(super) fn redirect_stderr(to: &os_pipe::PipeWriter) -> std::io::Result<Redirected> {
        Redirected::new(STD_ERROR_HANDLE, to.as_raw_handle() as HANDLE)
    }

    impl Redirected {
        fn new(target: STD_HANDLE, to: HANDLE) -> std::io::Result<Self> {
            // SAFETY: querying and replacing a standard handle has no memory safety
            // requirements; `to` outlives the redirection.
            let original = unsafe { GetStdHandle(target) };
            if original == INVALID_HANDLE_VALUE {
                return Err(std::io::Error::last_os_error());
            }
            if unsafe { SetStdHandle(target, to) } == 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(Self { target, original })
        }
    }

    impl Drop for Redirected {
        fn drop(&mut self) {
            // SAFETY: see `Redirected::new`
            unsafe {
                SetStdHandle(self.target, self.original);
            }
        }
    }
}

#[cfg(not(any(unix, windows)))]
mod imp {
    pub(super) enum Redirected {}

    pub(super) fn redirect_stdout(_to: &os_pipe::PipeWriter) -> std::io::Result<Redirected> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "redirecting stdout is not supported on this platform",
        ))
    }

    pub(super) fn redirect_stderr(_to: &os_pipe::PipeWriter) -> std::io::Result<Redirected> {
        redirect_stdout(_to)
    }
}
