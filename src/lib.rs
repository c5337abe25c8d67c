//! # Fluent assertions with stream capture and crash tests
//!
//! `capbox` is for when a test needs to:
//! - Check many things and see every failure, not only the first
//! - Observe what code writes to the process's stdout and stderr
//! - Observe code that calls [`std::process::exit`]
//! - Work inside a throwaway directory seeded with fixtures
//!
//! # Examples
//!
//! [`Assert`] chains checks and sub-tests:
//! ```rust
//! use std::io::Write;
//!
//! capbox::Assert::new()
//!     .eq(3, 1 + 2)
//!     .matches(r"^v[0-9]+\.[0-9]+$", "v1.2")
//!     .capture(
//!         "greets",
//!         || {
//!             write!(std::io::stdout(), "Hello").unwrap();
//!         },
//!         |a, stdout, stderr| {
//!             a.eq("Hello", stdout).eq("", stderr);
//!         },
//!     )
//!     .it_tmp("scratch space", |a, dir| {
//!         std::fs::write(dir.join("out.txt"), "data").unwrap();
//!         a.is_file(dir.join("out.txt"));
//!     });
//! ```
//!
//! [`capture_output`] and [`crash_test`] are the building blocks, usable on their own:
//! ```rust,no_run
//! #[test]
//! fn exits_with_code() {
//!     capbox::crash_test(
//!         || std::process::exit(33),
//!         |output| {
//!             output.assert_code(33);
//!         },
//!     )
//!     .unwrap();
//! }
//! ```
//!
//! # Environment
//!
//! [`Assert::new`] reads:
//! - `CAPBOX_STACK`: show a backtrace with every failure
//! - `CAPBOX_FATAL`: panic on the first failure
//! - `CAPBOX_OS`: only evaluate assertions on this operating system
//! - `CAPBOX_TMP_DISABLE`: keep temporary directories
//!
//! Flags are enabled by `true`, `t` or `1`.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod assert;
mod capture;
mod config;
mod crash;
mod drain;
mod error;
mod float;
mod macros;

pub mod fs;
pub mod report;
pub mod template;

pub use assert::Assert;
pub use capture::capture_output;
pub use capture::Captured;
pub use config::Config;
pub use config::ALL_OS;
pub use config::FATAL_ENV;
pub use config::OS_ENV;
pub use config::STACK_ENV;
pub use config::TMP_DISABLE_ENV;
pub use crash::crash_test;
pub use crash::display_exit_status;
pub use crash::CrashOutput;
pub use crash::CrashTest;
pub use crash::CRASH_TEST_ENV;
pub use crash::DEFAULT_CASE;
pub use error::Error;
pub use float::compare_abs;
pub use float::compare_rel;

pub type Result<T, E = Error> = std::result::Result<T, E>;
