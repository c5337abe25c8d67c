/// Show a backtrace with every failure
pub const STACK_ENV: &str = "CAPBOX_STACK";
/// Abort the test on the first failure
pub const FATAL_ENV: &str = "CAPBOX_FATAL";
/// Only evaluate assertions on this operating system
pub const OS_ENV: &str = "CAPBOX_OS";
/// Keep temporary directories for inspection
pub const TMP_DISABLE_ENV: &str = "CAPBOX_TMP_DISABLE";

/// Matches every operating system, see [`Config::os`]
pub const ALL_OS: &str = "all";

/// Behavior of an [`Assert`][crate::Assert]
///
/// [`Config::new`] ignores the environment; [`Config::from_env`] is the one place the
/// `CAPBOX_*` variables are read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub(crate) stack: bool,
    pub(crate) fatal: bool,
    pub(crate) os: String,
    pub(crate) keep_tmp: bool,
}

impl Config {
    pub fn new() -> Self {
        Default::default()
    }

    /// Defaults overridden by `CAPBOX_STACK`, `CAPBOX_FATAL`, `CAPBOX_OS` and
    /// `CAPBOX_TMP_DISABLE`
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Some(stack) = flag_with_env_var(STACK_ENV) {
            config.stack = stack;
        }
        if let Some(fatal) = flag_with_env_var(FATAL_ENV) {
            config.fatal = fatal;
        }
        if let Some(os) = std::env::var_os(OS_ENV).and_then(|v| v.into_string().ok()) {
            if !os.is_empty() {
                config.os = os;
            }
        }
        if let Some(keep_tmp) = flag_with_env_var(TMP_DISABLE_ENV) {
            config.keep_tmp = keep_tmp;
        }
        config
    }

    /// Show a backtrace with every failure
    pub fn stack(mut self, yes: bool) -> Self {
        self.stack = yes;
        self
    }

    /// Panic on the first failure instead of collecting them
    pub fn fatal(mut self, yes: bool) -> Self {
        self.fatal = yes;
        self
    }

    /// Only evaluate assertions when running on `os`
    ///
    /// Values are those of [`std::env::consts::OS`], or [`ALL_OS`].
    pub fn os(mut self, os: impl Into<String>) -> Self {
        self.os = os.into();
        self
    }

    /// Keep temporary directories instead of deleting them
    pub fn keep_tmp(mut self, yes: bool) -> Self {
        self.keep_tmp = yes;
        self
    }

    pub fn is_stack(&self) -> bool {
        self.stack
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn is_keep_tmp(&self) -> bool {
        self.keep_tmp
    }

    /// Whether assertions run on the current operating system
    pub fn is_active(&self) -> bool {
        self.os == ALL_OS || self.os == std::env::consts::OS
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stack: false,
            fatal: false,
            os: ALL_OS.to_owned(),
            keep_tmp: false,
        }
    }
}

pub(crate) fn flag_with_env_var(var: impl AsRef<std::ffi::OsStr>) -> Option<bool> {
    let var = var.as_ref();
    let value = std::env::var_os(var)?;
    Some(flag_with_env_value(value))
}

pub(crate) fn flag_with_env_value(value: impl AsRef<std::ffi::OsStr>) -> bool {
    matches!(value.as_ref().to_str(), Some("true" | "t" | "1"))
}
