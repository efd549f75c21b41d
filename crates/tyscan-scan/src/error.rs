//! Scan error taxonomy.
//!
//! Only three failures terminate a scan: a bad configuration, a discovery
//! that matches nothing, and a processor error. Everything else recovers
//! locally: resolution drops the affected composite, loader failures are
//! captured on their entity, dependency-doc failures leave docs empty.

use std::fmt;

/// A fatal scan failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanError {
    /// Invalid pattern or unknown scan-mode flag; no scan is performed.
    Config(String),
    /// No pattern resolved to a package.
    Discovery(String),
    /// A processor rejected an entity; the scan is aborted.
    Processor { name: String, message: String },
}

impl ScanError {
    /// Process exit code for CLI surfaces.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScanError::Config(_) => 1,
            ScanError::Discovery(_) => 2,
            ScanError::Processor { .. } => 3,
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Config(message) => write!(f, "configuration error: {message}"),
            ScanError::Discovery(message) => write!(f, "discovery error: {message}"),
            ScanError::Processor { name, message } => {
                write!(f, "processor {name} failed: {message}")
            }
        }
    }
}

impl std::error::Error for ScanError {}
