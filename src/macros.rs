#[cfg(feature = "color")]
#[allow(unused_imports)]
pub(crate) use anstream::eprint;
#[cfg(feature = "color")]
pub(crate) use anstream::eprintln;
#[cfg(not(feature = "color"))]
#[allow(unused_imports)]
pub(crate) use std::eprint;
#[cfg(not(feature = "color"))]
pub(crate) use std::eprintln;

/// Feature-flag controlled additional test debug information
#[cfg(feature = "debug")]
macro_rules! debug {
    ($($arg:tt)*) => ({
        $crate::macros::eprint!("[{:>w$}] \t", module_path!(), w = 28);
        $crate::macros::eprintln!($($arg)*);
    })
}

/// Feature-flag controlled additional test debug information
#[cfg(not(feature = "debug"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

pub(crate) use debug;
