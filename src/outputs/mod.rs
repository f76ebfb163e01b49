//! Output generation for the run's [`ResultSet`](crate::models::ResultSet).
//!
//! The pipeline's only artifact is one JSON document. It goes to stdout unless
//! an output path is given, so downstream tools can either pipe it or pick up
//! a file.
//!
//! # Submodules
//!
//! - [`json`]: Serializes and writes the result set

pub mod json;
