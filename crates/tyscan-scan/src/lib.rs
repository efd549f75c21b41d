//! Scan orchestration for the tyscan type scanner.
//!
//! This crate drives the pipeline around the resolution engine:
//!
//! - expand package patterns and select packages out of the frontend
//!   export (`patterns`),
//! - attach declaration comments into the package registry (`attach`),
//! - notify registered processors of every resolved type (`process`),
//! - walk declarations and run the fixpoint load pass (`orchestrate`).

pub mod attach;
pub mod error;
pub mod orchestrate;
pub mod patterns;
pub mod process;

pub use attach::{Attacher, LazyDocs};
pub use error::ScanError;
pub use orchestrate::{ScanConfig, ScanOutput, Scanner};
pub use patterns::{Pattern, select_packages};
pub use process::{Processor, ProcessorChain};

#[cfg(test)]
#[path = "tests/orchestrate_tests.rs"]
mod orchestrate_tests;
