//! Observe closures that exit the process
//!
//! A closure calling [`std::process::exit`] would take the test binary down with it.  Instead,
//! [`CrashTest`] re-runs the current test in a child process, where the closure is free to exit,
//! and hands the child's exit status and output to a verifier in the parent.
//!
//! ```rust,no_run
//! #[test]
//! fn exits_with_code() {
//!     capbox::crash_test(
//!         || {
//!             print!("Ping");
//!             eprint!("Pong");
//!             std::process::exit(33);
//!         },
//!         |output| {
//!             output
//!                 .assert_code(33)
//!                 .assert_stdout_eq("Ping")
//!                 .assert_stderr_eq("Pong");
//!         },
//!     )
//!     .unwrap();
//! }
//! ```

#[cfg(feature = "color")]
use anstream::panic;
use std::io::Write as _;

use crate::drain::Drain;
use crate::macros::debug;

/// Set in the environment of a re-run test, naming the case to execute
///
/// Reserved for [`CrashTest`]; do not set it by hand.
pub const CRASH_TEST_ENV: &str = "CAPBOX_CRASH_TEST";

/// Case label used when none is given, see [`CrashTest::case`]
pub const DEFAULT_CASE: &str = "default";

/// Written by the child right before the action runs
///
/// Everything the test harness printed earlier is dropped by the parent.
const BOUNDARY: &str = "<<capbox: crash test action starts here>>\n";

/// Run a closure that exits the process and verify how it exited
#[derive(Clone, Debug)]
pub struct CrashTest {
    case: String,
    test_name: Option<String>,
    timeout: Option<std::time::Duration>,
}

/// # Builder API
impl CrashTest {
    pub fn new() -> Self {
        Self {
            case: DEFAULT_CASE.to_owned(),
            test_name: None,
            timeout: None,
        }
    }

    /// Distinguish several crash tests within one test function
    ///
    /// The child re-runs the whole test function; only the case with a matching label runs its
    /// action there, the others are skipped.
    pub fn case(mut self, label: impl Into<String>) -> Self {
        self.case = label.into();
        self
    }

    /// Name of the running test, as passed to the test binary's filter
    ///
    /// Defaults to the name of the current thread, which is how libtest labels the thread running
    /// a test (e.g. `crash::exits_with_code`).
    pub fn test_name(mut self, name: impl Into<String>) -> Self {
        self.test_name = Some(name.into());
        self
    }

    /// Kill the child if it hasn't exited after `timeout`
    ///
    /// A killed child is reported like any other signal termination.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl CrashTest {
    /// Run `action` in a child process and pass how it exited to `verify`
    ///
    /// In the child, `action` must end the process; if it returns, the child panics.  The child
    /// never calls `verify`.
    ///
    /// Errors are failures to launch or observe the child, not verification failures.
    pub fn run<A, V>(self, action: A, verify: V) -> crate::Result<()>
    where
        A: FnOnce(),
        V: FnOnce(CrashOutput),
    {
        match std::env::var_os(CRASH_TEST_ENV) {
            None => {
                let output = self.output()?;
                verify(output);
                Ok(())
            }
            Some(case) if case == self.case.as_str() => self.exec(action),
            Some(_case) => {
                debug!(
                    "Skipping crash case `{}`, re-running `{}`",
                    self.case,
                    _case.to_string_lossy()
                );
                Ok(())
            }
        }
    }

    fn exec<A>(&self, action: A) -> !
    where
        A: FnOnce(),
    {
        for mut stream in [
            Box::new(std::io::stdout()) as Box<dyn std::io::Write>,
            Box::new(std::io::stderr()),
        ] {
            let _ = stream.write_all(BOUNDARY.as_bytes());
            let _ = stream.flush();
        }

        action();

        panic!(
            "crash case `{}` returned: the action must exit the process",
            self.case
        );
    }

    fn output(&self) -> crate::Result<CrashOutput> {
        let test_name = match self.test_name.as_deref() {
            Some(name) => name.to_owned(),
            None => current_test_name()?,
        };
        let exe = std::env::current_exe()
            .map_err(|e| format!("Failed to locate the test binary: {e}"))?;

        let mut cmd = std::process::Command::new(exe);
        cmd.arg(&test_name)
            .args(["--exact", "--nocapture", "--test-threads=1", "-q"])
            .env(CRASH_TEST_ENV, &self.case)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        debug!("Re-running `{}`: {:?}", test_name, cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| format!("Failed to spawn crash test `{test_name}`: {e}"))?;
        let stdout = child.stdout.take().map(|s| Drain::spawn("stdout", s));
        let stderr = child.stderr.take().map(|s| Drain::spawn("stderr", s));

        let status = wait(child, self.timeout)
            .map_err(|e| format!("Failed to wait for crash test `{test_name}`: {e}"))?;
        debug!("`{}` exited: {}", test_name, display_exit_status(status));

        let stdout = stdout
            .transpose()?
            .map(Drain::finish)
            .transpose()?
            .unwrap_or_default();
        let stderr = stderr
            .transpose()?
            .map(Drain::finish)
            .transpose()?
            .unwrap_or_default();

        Ok(CrashOutput {
            status,
            stdout: strip_preamble(stdout),
            stderr: strip_preamble(stderr),
        })
    }
}

impl Default for CrashTest {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `action` in a child process and pass how it exited to `verify`
///
/// See [`CrashTest`] for customizing the case label, test name, or timeout.
pub fn crash_test<A, V>(action: A, verify: V) -> crate::Result<()>
where
    A: FnOnce(),
    V: FnOnce(CrashOutput),
{
    CrashTest::new().run(action, verify)
}

fn current_test_name() -> crate::Result<String> {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) if name != "main" => Ok(name.to_owned()),
        _ => Err(
            "Unable to detect the running test's name; set it with `CrashTest::test_name`".into(),
        ),
    }
}

fn strip_preamble(text: String) -> String {
    match text.split_once(BOUNDARY) {
        Some((_preamble, action)) => action.to_owned(),
        None => text,
    }
}

fn wait(
    mut child: std::process::Child,
    timeout: Option<std::time::Duration>,
) -> std::io::Result<std::process::ExitStatus> {
    if let Some(timeout) = timeout {
        wait_timeout::ChildExt::wait_timeout(&mut child, timeout)
            .transpose()
            .unwrap_or_else(|| {
                let _ = child.kill();
                child.wait()
            })
    } else {
        child.wait()
    }
}

/// How the child of a [`CrashTest`] exited
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrashOutput {
    pub status: std::process::ExitStatus,
    /// What the action wrote to stdout
    pub stdout: String,
    /// What the action wrote to stderr
    pub stderr: String,
}

impl CrashOutput {
    /// Exit code, or the negated signal number if the child was killed by a signal
    ///
    /// Exit codes follow the platform: on Unix only the low 8 bits survive, so
    /// `exit(289)` is seen as `33`.
    pub fn code(&self) -> i32 {
        match (self.status.code(), self.signal()) {
            (Some(code), _) => code,
            (None, Some(signal)) => -signal,
            (None, None) => i32::MIN,
        }
    }

    /// Signal that terminated the child, if any
    #[cfg(unix)]
    pub fn signal(&self) -> Option<i32> {
        use std::os::unix::process::ExitStatusExt;

        self.status.signal()
    }

    /// Signal that terminated the child, if any
    #[cfg(not(unix))]
    pub fn signal(&self) -> Option<i32> {
        None
    }

    /// Ensure the child exited with `expected`
    #[track_caller]
    pub fn assert_code(&self, expected: i32) -> &Self {
        if self.status.code() != Some(expected) {
            let palette = crate::report::Palette::color();
            let desc = format!(
                "Expected {}, was {}",
                palette.info(expected),
                palette.error(display_exit_status(self.status))
            );

            use std::fmt::Write;
            let mut buf = String::new();
            let _ = writeln!(&mut buf, "{desc}");
            let _ = self.write_stdout(&mut buf);
            let _ = self.write_stderr(&mut buf);
            panic!("{}", buf);
        }
        self
    }

    /// Ensure the child was killed by a signal rather than exiting
    #[track_caller]
    pub fn assert_interrupted(&self) -> &Self {
        if self.status.code().is_some() {
            let palette = crate::report::Palette::color();
            let desc = format!(
                "Expected {}, was {}",
                palette.info("interrupted"),
                palette.error(display_exit_status(self.status))
            );

            use std::fmt::Write;
            let mut buf = String::new();
            let _ = writeln!(&mut buf, "{desc}");
            let _ = self.write_stdout(&mut buf);
            let _ = self.write_stderr(&mut buf);
            panic!("{}", buf);
        }
        self
    }

    /// Ensure the action wrote exactly `expected` to stdout
    #[track_caller]
    pub fn assert_stdout_eq(&self, expected: &str) -> &Self {
        self.assert_stream_eq("stdout", expected, &self.stdout)
    }

    /// Ensure the action wrote exactly `expected` to stderr
    #[track_caller]
    pub fn assert_stderr_eq(&self, expected: &str) -> &Self {
        self.assert_stream_eq("stderr", expected, &self.stderr)
    }

    #[track_caller]
    fn assert_stream_eq(&self, name: &str, expected: &str, actual: &str) -> &Self {
        if expected != actual {
            let palette = crate::report::Palette::color();
            let mut buf = String::new();
            let _ = crate::report::write_diff(
                &mut buf,
                expected,
                actual,
                None,
                Some(&name),
                palette,
            );
            panic!("{}", buf);
        }
        self
    }

    fn write_stdout(&self, writer: &mut dyn std::fmt::Write) -> Result<(), std::fmt::Error> {
        if !self.stdout.is_empty() {
            writeln!(writer, "stdout:")?;
            writeln!(writer, "```")?;
            writeln!(writer, "{}", self.stdout)?;
            writeln!(writer, "```")?;
        }
        Ok(())
    }

    fn write_stderr(&self, writer: &mut dyn std::fmt::Write) -> Result<(), std::fmt::Error> {
        if !self.stderr.is_empty() {
            writeln!(writer, "stderr:")?;
            writeln!(writer, "```")?;
            writeln!(writer, "{}", self.stderr)?;
            writeln!(writer, "```")?;
        }
        Ok(())
    }
}

/// Converts an [`std::process::ExitStatus`]  to a human-readable value
pub fn display_exit_status(status: std::process::ExitStatus) -> String {
    #[cfg(unix)]
    fn detailed_exit_status(status: std::process::ExitStatus) -> Option<String> {
        use std::os::unix::process::ExitStatusExt;

        let signal = status.signal()?;
        let name = match signal as libc::c_int {
            libc::SIGABRT => ", SIGABRT: process abort signal",
            libc::SIGALRM => ", SIGALRM: alarm clock",
            libc::SIGFPE => ", SIGFPE: erroneous arithmetic operation",
            libc::SIGHUP => ", SIGHUP: hangup",
            libc::SIGILL => ", SIGILL: illegal instruction",
            libc::SIGINT => ", SIGINT: terminal interrupt signal",
            libc::SIGKILL => ", SIGKILL: kill",
            libc::SIGPIPE => ", SIGPIPE: write on a pipe with no one to read",
            libc::SIGQUIT => ", SIGQUIT: terminal quit signal",
            libc::SIGSEGV => ", SIGSEGV: invalid memory reference",
            libc::SIGTERM => ", SIGTERM: termination signal",
            libc::SIGBUS => ", SIGBUS: access to undefined memory",
            #[cfg(not(target_os = "haiku"))]
            libc::SIGSYS => ", SIGSYS: bad system call",
            libc::SIGTRAP => ", SIGTRAP: trace/breakpoint trap",
            _ => "",
        };
        Some(format!("signal: {signal}{name}"))
    }

    #[cfg(windows)]
    fn detailed_exit_status(status: std::process::ExitStatus) -> Option<String> {
        use windows_sys::Win32::Foundation::*;

        let extra = match status.code()? as NTSTATUS {
            STATUS_ACCESS_VIOLATION => "STATUS_ACCESS_VIOLATION",
            STATUS_INVALID_HANDLE => "STATUS_INVALID_HANDLE",
            STATUS_NO_MEMORY => "STATUS_NO_MEMORY",
            STATUS_ILLEGAL_INSTRUCTION => "STATUS_ILLEGAL_INSTRUCTION",
            STATUS_FLOAT_DIVIDE_BY_ZERO => "STATUS_FLOAT_DIVIDE_BY_ZERO",
            STATUS_INTEGER_DIVIDE_BY_ZERO => "STATUS_INTEGER_DIVIDE_BY_ZERO",
            STATUS_INTEGER_OVERFLOW => "STATUS_INTEGER_OVERFLOW",
            STATUS_STACK_OVERFLOW => "STATUS_STACK_OVERFLOW",
            STATUS_DLL_NOT_FOUND => "STATUS_DLL_NOT_FOUND",
            STATUS_CONTROL_C_EXIT => "STATUS_CONTROL_C_EXIT",
            STATUS_HEAP_CORRUPTION => "STATUS_HEAP_CORRUPTION",
            STATUS_STACK_BUFFER_OVERRUN => "STATUS_STACK_BUFFER_OVERRUN",
            _ => return None,
        };
        Some(extra.to_owned())
    }

    #[cfg(not(any(unix, windows)))]
    fn detailed_exit_status(_status: std::process::ExitStatus) -> Option<String> {
        None
    }

    if let Some(extra) = detailed_exit_status(status) {
        format!("{} ({})", basic_exit_status(status), extra)
    } else {
        basic_exit_status(status)
    }
}

fn basic_exit_status(status: std::process::ExitStatus) -> String {
    if let Some(code) = status.code() {
        code.to_string()
    } else {
        "interrupted".to_owned()
    }
}
