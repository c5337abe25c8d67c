/// Failure to set up or evaluate a check
///
/// Returned by the low-level helpers ([`capture_output`][crate::capture_output],
/// [`CrashTest::run`][crate::CrashTest::run], [`copy`][crate::fs::copy], ...) when the
/// test environment itself is broken: a pipe or process can't be created, a path can't be
/// read, a template can't be rendered.
#[derive(Clone, Debug)]
pub struct Error {
    inner: String,
    backtrace: Option<Backtrace>,
}

impl Error {
    pub fn new(inner: impl std::fmt::Display) -> Self {
        Self::with_string(inner.to_string())
    }

    fn with_string(inner: String) -> Self {
        Self {
            inner,
            backtrace: Backtrace::new(),
        }
    }

    pub fn message(&self) -> &str {
        &self.inner
    }

    #[track_caller]
    pub(crate) fn panic(self) -> ! {
        panic!("{self}")
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.inner)?;
        if let Some(backtrace) = self.backtrace.as_ref() {
            writeln!(f)?;
            writeln!(f, "Backtrace:")?;
            writeln!(f, "{backtrace}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl<'s> From<&'s str> for Error {
    fn from(other: &'s str) -> Self {
        Self::with_string(other.to_owned())
    }
}

impl<'s> From<&'s String> for Error {
    fn from(other: &'s String) -> Self {
        Self::with_string(other.clone())
    }
}

impl From<String> for Error {
    fn from(other: String) -> Self {
        Self::with_string(other)
    }
}

impl From<std::io::Error> for Error {
    fn from(other: std::io::Error) -> Self {
        Self::with_string(other.to_string())
    }
}

#[derive(Clone)]
pub(crate) struct Backtrace(backtrace::Backtrace);

impl Backtrace {
    #[cfg(feature = "debug")]
    fn new() -> Option<Self> {
        Some(Self::capture())
    }

    #[cfg(not(feature = "debug"))]
    fn new() -> Option<Self> {
        None
    }

    pub(crate) fn capture() -> Self {
        Self(backtrace::Backtrace::new())
    }
}

impl std::fmt::Debug for Backtrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Backtrace")
    }
}

impl std::fmt::Display for Backtrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `backtrace::Backtrace` uses `Debug` instead of `Display`
        write!(f, "{:?}", self.0)
    }
}
