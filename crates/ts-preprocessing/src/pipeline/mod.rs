//! Pipeline module.
//!
//! This module provides the format-aware [`Preprocessor`] and the
//! [`SourceFormat`] it dispatches on.

mod format;
mod preprocessor;

pub use format::SourceFormat;
pub use preprocessor::{Preprocessor, Stage};
