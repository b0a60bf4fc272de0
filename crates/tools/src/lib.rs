//! Headless drivers shared by the `simulate` and `fuzz` binaries.

pub mod autoplay;
pub mod summary;
