#[cfg(feature = "color")]
use anstream::panic;

use crate::config::Config;
use crate::macros::eprintln;
use crate::report::Palette;

/// Chained assertions for a test
///
/// Failures are collected and reported when the `Assert` is dropped (or [`Assert::finish`] is
/// called), so one failed check doesn't hide the next.  With [`Assert::fatal`], the first
/// failure panics instead.
///
/// # Examples
///
/// ```rust
/// use capbox::Assert;
///
/// Assert::new()
///     .eq(3, 1 + 2)
///     .msg("the greeting")
///     .matches(r"^[a-z]+\[[0-9]+\]$", "adam[23]")
///     .it("sub test", |a| {
///         a.is_true(1 < 2).is_none(&None::<i32>);
///     });
/// ```
///
/// Low-level failures (a fixture that can't be read, an invalid regex, a process that can't be
/// spawned) are not assertion failures: they panic right away.
pub struct Assert {
    config: Config,
    palette: Palette,
    name: Option<String>,
    state: std::cell::RefCell<State>,
}

#[derive(Default)]
struct State {
    message: Option<String>,
    skipped: bool,
    raised: bool,
    finished: bool,
    failures: Vec<String>,
}

/// # Customize Behavior
impl Assert {
    /// Behavior read from the `CAPBOX_*` environment variables, see [`Config::from_env`]
    pub fn new() -> Self {
        Self::with_config(Config::from_env())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            palette: Palette::color(),
            name: None,
            state: Default::default(),
        }
    }

    /// Show a backtrace with every failure
    pub fn stack(mut self, yes: bool) -> Self {
        self.config = self.config.clone().stack(yes);
        self
    }

    /// Panic on the first failure
    pub fn fatal(mut self, yes: bool) -> Self {
        self.config = self.config.clone().fatal(yes);
        self
    }

    /// Only evaluate assertions when running on `os`
    ///
    /// Values are those of [`std::env::consts::OS`], or [`ALL_OS`][crate::ALL_OS].
    pub fn os(mut self, os: &str) -> Self {
        self.config = self.config.clone().os(os);
        self
    }

    /// Override the color palette
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `/`-separated path of sub-test names, `None` at the top level
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// # Assertions
impl Assert {
    /// Use `message` instead of `Error:` if the next assertion fails
    ///
    /// ```rust
    /// # use capbox::Assert;
    /// Assert::new()
    ///     .msg(format_args!("{} is different of {}", "a", "b"))
    ///     .ne("a", "b");
    /// ```
    pub fn msg(&self, message: impl std::fmt::Display) -> &Self {
        self.state.borrow_mut().message = Some(message.to_string());
        self
    }

    #[track_caller]
    pub fn eq<E, A>(&self, expected: E, actual: A) -> &Self
    where
        E: PartialEq<A> + std::fmt::Debug,
        A: std::fmt::Debug,
    {
        self.check(|| {
            (expected != actual).then(|| {
                format!(
                    "Exp: {}\nGot: {}",
                    self.palette.info(ValueDebug(&expected)),
                    self.palette.error(ValueDebug(&actual))
                )
            })
        })
    }

    #[track_caller]
    pub fn ne<E, A>(&self, expected: E, actual: A) -> &Self
    where
        E: PartialEq<A> + std::fmt::Debug,
        A: std::fmt::Debug,
    {
        self.check(|| {
            (expected == actual)
                .then(|| format!("Equal: {}", self.palette.error(ValueDebug(&expected))))
        })
    }

    /// Compare floats with an absolute tolerance
    #[track_caller]
    pub fn eq_f_abs(&self, expected: f64, actual: f64, epsilon: f64) -> &Self {
        self.check(|| {
            (!crate::float::compare_abs(expected, actual, epsilon)).then(|| {
                format!(
                    "Exp: {}\nGot: {} with an absolute tolerance: {}",
                    self.palette.info(expected),
                    self.palette.error(actual),
                    epsilon
                )
            })
        })
    }

    /// Compare floats with a tolerance relative to the larger magnitude
    #[track_caller]
    pub fn eq_f_rel(&self, expected: f64, actual: f64, epsilon: f64) -> &Self {
        self.check(|| {
            (!crate::float::compare_rel(expected, actual, epsilon)).then(|| {
                format!(
                    "Exp: {}\nGot: {} with a relative tolerance: {}",
                    self.palette.info(expected),
                    self.palette.error(actual),
                    epsilon
                )
            })
        })
    }

    #[track_caller]
    pub fn is_true(&self, value: bool) -> &Self {
        self.check(|| (!value).then(|| "Not true".to_owned()))
    }

    #[track_caller]
    pub fn is_false(&self, value: bool) -> &Self {
        self.check(|| value.then(|| "Not false".to_owned()))
    }

    /// Compare slices, pointing at the first differing item
    ///
    /// ```text
    /// Exp: ["aaa", "bbb", "ccc", "ddd"]
    /// Got: ["aaa", "bbc", "ccc", "ddd"]
    ///              ┗━━━┛
    /// ```
    #[track_caller]
    pub fn eq_slice<T>(&self, expected: &[T], actual: &[T]) -> &Self
    where
        T: PartialEq + std::fmt::Debug,
    {
        self.check(|| {
            if expected.len() != actual.len() {
                return Some(format!(
                    "Expected size: {}, got size: {}",
                    expected.len(),
                    actual.len()
                ));
            }
            let index = expected.iter().zip(actual).position(|(e, a)| e != a)?;
            Some(slice_mismatch(expected, actual, index))
        })
    }

    #[track_caller]
    pub fn is_none<T>(&self, value: &Option<T>) -> &Self
    where
        T: std::fmt::Debug,
    {
        self.check(|| {
            value
                .as_ref()
                .map(|v| format!("None expected: {}", self.palette.error(ValueDebug(v))))
        })
    }

    #[track_caller]
    pub fn is_some<T>(&self, value: &Option<T>) -> &Self {
        self.check(|| value.is_none().then(|| "Some expected".to_owned()))
    }

    /// Ensure `result` is an error whose message is `expected`
    ///
    /// ```rust
    /// # use capbox::Assert;
    /// let result = "3.x".parse::<f64>();
    /// Assert::new().err(&result, "invalid float literal");
    /// ```
    #[track_caller]
    pub fn err<T, E>(&self, result: &Result<T, E>, expected: impl std::fmt::Display) -> &Self
    where
        E: std::fmt::Display,
    {
        self.check(|| match result {
            Ok(_) => Some(format!(
                "Expected error with message: {}",
                self.palette.info(&expected)
            )),
            Err(err) => {
                let expected = expected.to_string();
                let actual = err.to_string();
                (expected != actual).then(|| {
                    format!(
                        "Error message mismatch\nExp: {}\nGot: {}",
                        self.palette.info(expected),
                        self.palette.error(actual)
                    )
                })
            }
        })
    }

    /// Ensure `text` matches the regular expression `pattern`
    ///
    /// An invalid `pattern` panics.
    #[track_caller]
    pub fn matches(&self, pattern: &str, text: &str) -> &Self {
        self.check(|| {
            let re = regex::Regex::new(pattern)
                .unwrap_or_else(|e| crate::Error::new(format!("Invalid regex: {e}")).panic());
            (!re.is_match(text)).then(|| {
                format!(
                    "Regex ({}) mismatch: {}",
                    self.palette.info(pattern),
                    self.palette.error(text)
                )
            })
        })
    }

    /// Compare `actual` with the content of the file at `path`
    ///
    /// Line endings are normalized.  An unreadable file panics.
    #[track_caller]
    pub fn eq_file(&self, actual: &str, path: impl AsRef<std::path::Path>) -> &Self {
        let path = path.as_ref();
        self.check(|| {
            let expected = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
                .unwrap_or_else(|e| crate::Error::new(e).panic());
            self.text_mismatch(&expected, actual, &path.display())
        })
    }

    /// Compare `actual` with the template at `path` rendered with `data`
    ///
    /// Surrounding whitespace is trimmed on both sides and line endings are normalized.  See
    /// [`render_file`][crate::template::render_file] for the template syntax.  A template that
    /// can't be read or rendered panics.
    #[track_caller]
    pub fn eq_template<T>(
        &self,
        actual: &str,
        path: impl AsRef<std::path::Path>,
        data: &T,
    ) -> &Self
    where
        T: serde::Serialize,
    {
        let path = path.as_ref();
        self.check(|| {
            let expected = crate::template::render_file(path, data).unwrap_or_else(|e| e.panic());
            self.text_mismatch(expected.trim(), actual.trim(), &path.display())
        })
    }

    #[track_caller]
    pub fn is_file(&self, path: impl AsRef<std::path::Path>) -> &Self {
        let path = path.as_ref();
        self.check(|| {
            (!crate::fs::is_file(path))
                .then(|| format!("Not a file: {}", self.palette.error(path.display())))
        })
    }

    #[track_caller]
    pub fn is_dir(&self, path: impl AsRef<std::path::Path>) -> &Self {
        let path = path.as_ref();
        self.check(|| {
            (!crate::fs::is_dir(path))
                .then(|| format!("Not a directory: {}", self.palette.error(path.display())))
        })
    }

    #[track_caller]
    pub fn not_exists(&self, path: impl AsRef<std::path::Path>) -> &Self {
        let path = path.as_ref();
        self.check(|| {
            crate::fs::exists(path)
                .then(|| format!("Expected not exists: {}", self.palette.error(path.display())))
        })
    }

    /// Turn every later assertion and sub-test into a no-op
    pub fn skip(&self, reason: impl std::fmt::Display) -> &Self {
        eprintln!(
            "--- {} {}: {}",
            self.palette.warn("SKIP:"),
            self.label(),
            reason
        );
        self.state.borrow_mut().skipped = true;
        self
    }

    /// Report collected failures now instead of on drop
    #[track_caller]
    pub fn finish(&self) {
        self.report();
    }
}

/// # Sub-tests
impl Assert {
    /// Run `test` as a named sub-test
    ///
    /// A panic inside `test` fails the sub-test; the caller carries on.
    pub fn it<F>(&self, name: &str, test: F) -> &Self
    where
        F: FnOnce(&Assert),
    {
        self.sub_test(name, |a| test(a))
    }

    /// Run `test` as a named sub-test inside a fresh temporary directory
    ///
    /// The directory is removed afterwards unless `CAPBOX_TMP_DISABLE` is set.
    pub fn it_tmp<F>(&self, name: &str, test: F) -> &Self
    where
        F: FnOnce(&Assert, &std::path::Path),
    {
        self.it_env(name, std::iter::empty(), test)
    }

    /// Like [`Assert::it_tmp`] with `fixtures` copied into the temporary directory first
    ///
    /// ```rust,no_run
    /// use capbox::fs::Fixture;
    ///
    /// capbox::Assert::new().it_env(
    ///     "sub test with fixtures",
    ///     [
    ///         Fixture::new("tests/fixtures/a", "a"),
    ///         Fixture::new("tests/fixtures/ipsum.txt", "a/ipsum.txt"),
    ///     ],
    ///     |a, dir| {
    ///         a.is_file(dir.join("a/ipsum.txt"));
    ///     },
    /// );
    /// ```
    pub fn it_env<I, F>(&self, name: &str, fixtures: I, test: F) -> &Self
    where
        I: IntoIterator<Item = crate::fs::Fixture>,
        F: FnOnce(&Assert, &std::path::Path),
    {
        let keep_tmp = self.config.keep_tmp;
        self.sub_test(name, |a| {
            crate::fs::tmp_dir(keep_tmp, |dir| {
                for fixture in fixtures {
                    crate::fs::copy(&fixture.source, dir.join(&fixture.dest))
                        .unwrap_or_else(|e| e.panic());
                }
                test(a, dir);
            })
            .unwrap_or_else(|e| e.panic());
        })
    }

    /// Run `action` with stdout and stderr captured, then `verify` what it wrote
    ///
    /// See [`capture_output`][crate::capture_output] for what is captured.
    ///
    /// ```rust
    /// use std::io::Write;
    ///
    /// capbox::Assert::new().capture(
    ///     "sub test capture",
    ///     || {
    ///         write!(std::io::stdout(), "Hello").unwrap();
    ///         write!(std::io::stderr(), "World").unwrap();
    ///     },
    ///     |a, stdout, stderr| {
    ///         a.eq("Hello", stdout).eq("World", stderr);
    ///     },
    /// );
    /// ```
    pub fn capture<A, V>(&self, name: &str, action: A, verify: V) -> &Self
    where
        A: FnOnce(),
        V: FnOnce(&Assert, &str, &str),
    {
        self.sub_test(name, |a| {
            let captured = crate::capture_output(action).unwrap_or_else(|e| e.panic());
            verify(a, &captured.stdout, &captured.stderr);
        })
    }

    /// Run `action`, which must exit the process, in a child process and `verify` how it exited
    ///
    /// The sub-test's path (e.g. `exit/code 33`) labels the crash case, so several can live in one
    /// test function.  See [`CrashTest`][crate::CrashTest].
    ///
    /// ```rust,no_run
    /// capbox::Assert::new().crash(
    ///     "sub test crash",
    ///     || {
    ///         print!("Ping");
    ///         eprint!("Pong");
    ///         std::process::exit(33);
    ///     },
    ///     |a, output| {
    ///         a.eq(33, output.code())
    ///             .eq("Ping", output.stdout.as_str())
    ///             .eq("Pong", output.stderr.as_str());
    ///     },
    /// );
    /// ```
    pub fn crash<A, V>(&self, name: &str, action: A, verify: V) -> &Self
    where
        A: FnOnce(),
        V: FnOnce(&Assert, &crate::CrashOutput),
    {
        self.sub_test(name, |a| {
            crate::CrashTest::new()
                .case(a.label())
                .run(action, |output| verify(a, &output))
                .unwrap_or_else(|e| e.panic());
        })
    }
}

impl Assert {
    fn child(&self, name: &str) -> Self {
        let name = match self.name.as_deref() {
            Some(parent) => format!("{parent}/{name}"),
            None => name.to_owned(),
        };
        Self {
            config: self.config.clone(),
            palette: self.palette,
            name: Some(name),
            state: Default::default(),
        }
    }

    fn label(&self) -> String {
        match self.name.as_deref() {
            Some(name) => name.to_owned(),
            None => std::thread::current()
                .name()
                .unwrap_or("<unnamed>")
                .to_owned(),
        }
    }

    fn is_skipped(&self) -> bool {
        self.state.borrow().skipped
    }

    fn sub_test<F>(&self, name: &str, test: F) -> &Self
    where
        F: FnOnce(&Assert),
    {
        if self.is_skipped() {
            return self;
        }

        let child = self.child(name);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| test(&child)));

        let (mut failures, raised) = {
            let mut state = child.state.borrow_mut();
            state.finished = true;
            (std::mem::take(&mut state.failures), state.raised)
        };
        if let Err(panic) = result {
            // A fatal failure was already recorded before it panicked
            if !raised {
                failures.push(format!(
                    "[{}] panicked: {}",
                    child.label(),
                    panic_message(&*panic)
                ));
            }
        }
        if !failures.is_empty() {
            eprintln!("--- {} {}", self.palette.error("FAIL:"), child.label());
            self.state.borrow_mut().failures.extend(failures);
        }
        self
    }

    #[track_caller]
    fn check<F>(&self, check: F) -> &Self
    where
        F: FnOnce() -> Option<String>,
    {
        let message = self.state.borrow_mut().message.take();
        if self.is_skipped() || !self.config.is_active() {
            return self;
        }
        if let Some(details) = check() {
            self.fail(message.as_deref(), &details);
        }
        self
    }

    #[track_caller]
    fn fail(&self, message: Option<&str>, details: &str) {
        use std::fmt::Write as _;

        let location = std::panic::Location::caller();
        let mut text = String::new();
        let _ = write!(
            &mut text,
            "[{}] {}\n{}\n{}",
            self.label(),
            self.palette.hint(location),
            message.unwrap_or("Error:"),
            details
        );
        if self.config.stack {
            let _ = write!(
                &mut text,
                "\n\nBacktrace:\n{}",
                crate::error::Backtrace::capture()
            );
        }

        if self.config.fatal {
            {
                let mut state = self.state.borrow_mut();
                state.raised = true;
                state.failures.push(text.clone());
            }
            panic!("{}", text);
        }

        eprintln!("{}", text);
        self.state.borrow_mut().failures.push(text);
    }

    /// A diff of the line-normalized texts, `None` when they match
    fn text_mismatch(
        &self,
        expected: &str,
        actual: &str,
        expected_name: &dyn std::fmt::Display,
    ) -> Option<String> {
        let expected = normalize_lines(expected);
        let actual = normalize_lines(actual);
        if expected == actual {
            return None;
        }
        let mut buf = String::new();
        crate::report::write_diff(
            &mut buf,
            &expected,
            &actual,
            Some(expected_name),
            Some(&"actual"),
            self.palette,
        )
        .ok()?;
        Some(buf)
    }

    #[track_caller]
    fn report(&self) {
        let failures = {
            let mut state = self.state.borrow_mut();
            if state.finished {
                return;
            }
            state.finished = true;
            std::mem::take(&mut state.failures)
        };
        if failures.is_empty() {
            return;
        }

        let mut buf = format!(
            "{} assertion{} failed:\n",
            failures.len(),
            if failures.len() == 1 { "" } else { "s" }
        );
        for failure in failures {
            buf.push('\n');
            buf.push_str(&failure);
            buf.push('\n');
        }
        panic!("{}", buf);
    }
}

impl Default for Assert {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Assert {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        self.report();
    }
}

impl std::fmt::Debug for Assert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assert")
            .field("config", &self.config)
            .field("name", &self.name)
            .field("failures", &self.state.borrow().failures.len())
            .finish()
    }
}

/// `Debug` through a `Display` bound, so values can be styled
struct ValueDebug<'d, D: ?Sized>(&'d D);

impl<D: std::fmt::Debug + ?Sized> std::fmt::Display for ValueDebug<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.0, f)
    }
}

fn normalize_lines(text: &str) -> String {
    normalize_line_endings::normalized(text.chars()).collect()
}

fn slice_mismatch<T: std::fmt::Debug>(expected: &[T], actual: &[T], index: usize) -> String {
    const EXP: &str = "Exp: [";

    let items: Vec<_> = expected.iter().map(|e| format!("{e:?}")).collect();
    let start = EXP.chars().count()
        + items[..index]
            .iter()
            .map(|i| i.chars().count() + ", ".len())
            .sum::<usize>();
    let width = items[index].chars().count();
    let marker = match width {
        0 | 1 => "┃".to_owned(),
        _ => format!("┗{}┛", "━".repeat(width - 2)),
    };

    format!(
        "{EXP}{}]\nGot: {:?}\n{}{}",
        items.join(", "),
        actual,
        " ".repeat(start),
        marker
    )
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn plain() -> Assert {
        Assert::with_config(Config::new()).palette(Palette::plain())
    }

    fn failures(a: &Assert) -> Vec<String> {
        a.state.borrow().failures.clone()
    }

    fn forget(a: Assert) {
        a.state.borrow_mut().finished = true;
    }

    #[test]
    fn passing_checks_record_nothing() {
        let a = plain();
        a.eq(3, 3)
            .ne("a", "b")
            .eq_f_abs(1.0, 1.05, 0.1)
            .eq_f_rel(1000.0, 1001.0, 0.01)
            .is_true(true)
            .is_false(false)
            .eq_slice(&["a", "b"], &["a", "b"])
            .is_none(&None::<i32>)
            .is_some(&Some(1))
            .err(&"x".parse::<i32>(), "invalid digit found in string")
            .matches(r"^[a-z]+\[[0-9]+\]$", "adam[23]");
        assert!(failures(&a).is_empty());
    }

    #[test]
    fn failure_uses_default_header() {
        let a = plain();
        a.eq("not", "equal");
        let failures = failures(&a);
        assert_eq!(failures.len(), 1);
        assert!(
            failures[0].ends_with("\nError:\nExp: \"not\"\nGot: \"equal\""),
            "{}",
            failures[0]
        );
        forget(a);
    }

    #[test]
    fn custom_message_applies_once() {
        let a = plain();
        a.msg("Equal failed").eq(1, 2).eq(3, 4);
        let failures = failures(&a);
        assert_eq!(failures.len(), 2);
        assert!(failures[0].contains("\nEqual failed\nExp: 1\nGot: 2"));
        assert!(failures[1].contains("\nError:\nExp: 3\nGot: 4"));
        forget(a);
    }

    #[test]
    fn failure_points_at_caller() {
        let a = plain();
        let line = line!() + 1;
        a.is_true(false);
        let failures = failures(&a);
        assert!(
            failures[0].contains(&format!("src/assert.rs:{line}:")),
            "{}",
            failures[0]
        );
        forget(a);
    }

    #[test]
    fn slice_size_mismatch() {
        let a = plain();
        a.eq_slice(&["a", "c"], &["a", "b", "c"]);
        assert!(failures(&a)[0].ends_with("Expected size: 2, got size: 3"));
        forget(a);
    }

    #[test]
    fn slice_marker_under_first_difference() {
        let rendered = slice_mismatch(
            &["aaa", "bbb", "ccc", "ddd"],
            &["aaa", "bbc", "ccc", "ddd"],
            1,
        );
        assert_eq!(
            rendered,
            "\
Exp: [\"aaa\", \"bbb\", \"ccc\", \"ddd\"]
Got: [\"aaa\", \"bbc\", \"ccc\", \"ddd\"]
             ┗━━━┛"
        );
    }

    #[test]
    fn error_checks() {
        let a = plain();
        let ok: Result<(), std::num::ParseIntError> = Ok(());
        a.err(&ok, "boom");
        a.err(&"x".parse::<i32>(), "boom");
        let failures = failures(&a);
        assert!(failures[0].ends_with("Expected error with message: boom"));
        assert!(failures[1]
            .ends_with("Error message mismatch\nExp: boom\nGot: invalid digit found in string"));
        forget(a);
    }

    #[test]
    fn option_checks() {
        let a = plain();
        a.is_none(&Some(3)).is_some(&None::<i32>);
        let failures = failures(&a);
        assert!(failures[0].ends_with("None expected: 3"));
        assert!(failures[1].ends_with("Some expected"));
        forget(a);
    }

    #[test]
    #[should_panic(expected = "Invalid regex")]
    fn invalid_regex_panics() {
        plain().matches("(", "text");
    }

    #[test]
    fn other_os_is_ignored() {
        let a = plain().os("plan9");
        a.eq(1, 2).is_true(false).is_file("this-should-never-exist");
        assert!(failures(&a).is_empty());
    }

    #[test]
    fn skip_disables_later_checks() {
        let a = plain();
        a.eq(1, 2).skip("not today").eq(3, 4).it("sub", |a| {
            a.is_true(false);
        });
        assert_eq!(failures(&a).len(), 1);
        forget(a);
    }

    #[test]
    #[should_panic(expected = "Not true")]
    fn fatal_panics_immediately() {
        let a = plain().fatal(true);
        a.is_true(false);
        unreachable!("fatal failure should have panicked");
    }

    #[test]
    fn stack_appends_backtrace() {
        let a = plain().stack(true);
        a.is_true(false);
        assert!(failures(&a)[0].contains("\n\nBacktrace:\n"));
        forget(a);
    }

    #[test]
    fn sub_test_failures_bubble_up() {
        let a = plain();
        a.it("first", |a| {
            a.eq(1, 2);
        })
        .it("second", |a| {
            a.eq(1, 1);
        })
        .it("third", |a| {
            a.it("nested", |a| {
                a.is_true(false);
            });
        });
        let failures = failures(&a);
        assert_eq!(failures.len(), 2);
        assert!(failures[0].starts_with("[first] "), "{}", failures[0]);
        assert!(failures[1].starts_with("[third/nested] "), "{}", failures[1]);
        forget(a);
    }

    #[test]
    fn sub_test_panic_is_contained() {
        let a = plain();
        let mut after = false;
        a.it("boom", |_| std::panic!("kaboom"));
        a.it("after", |_| after = true);
        assert!(after);
        assert_eq!(failures(&a), vec!["[boom] panicked: kaboom".to_owned()]);
        forget(a);
    }

    #[test]
    fn fatal_sub_test_records_once() {
        let a = plain().fatal(true);
        a.it("fatal", |a| {
            a.eq(1, 2).eq(3, 4);
        });
        let failures = failures(&a);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("Exp: 1\nGot: 2"));
        forget(a);
    }

    #[test]
    #[should_panic(expected = "2 assertions failed")]
    fn drop_reports_failures() {
        let a = plain();
        a.eq(1, 2).eq(3, 4);
    }

    #[test]
    fn finish_ends_a_chain() {
        plain()
            .eq(1, 1)
            .is_true(true)
            .it("sub", |a| {
                a.is_false(false);
            })
            .finish();
    }

    #[test]
    #[should_panic(expected = "1 assertion failed")]
    fn finish_at_end_of_chain_reports() {
        plain().eq(1, 1).is_true(false).finish();
    }

    #[test]
    fn finish_reports_once() {
        let a = plain();
        a.eq(1, 2);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| a.finish()));
        assert!(result.is_err());
        assert!(failures(&a).is_empty());
        // Already reported, dropping must not panic again
        drop(a);
    }

    #[test]
    fn finish_without_failures() {
        let a = plain();
        a.eq(1, 1);
        a.finish();
    }
}
