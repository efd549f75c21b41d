//! Common types and utilities for the tyscan type scanner.
//!
//! This crate provides foundational types used across all tyscan crates:
//! - Scan-mode bitset (`ScanMode`)
//! - Documentation comments (`Comment`, `Placement`)
//! - Centralized limits and thresholds

// Scan-mode selection flags
pub mod mode;
pub use mode::ScanMode;

// Centralized limits and thresholds
pub mod limits;

// Documentation comment model
pub mod comments;
pub use comments::{Comment, Placement};
