//! Utilities to report failures to the test author

mod color;
mod diff;

pub use color::Palette;
pub(crate) use color::Style;
pub use color::Styled;
pub use diff::write_diff;
