//! Documentation comment model.
//!
//! Comments are not part of the raw type descriptors, so they are extracted
//! from the syntactic declarations separately and attached to catalog
//! entities during lazy load.

use serde::{Deserialize, Serialize};

/// Where a comment was found relative to the declaration it documents.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Directly above the declaration (or its group).
    Above,
    /// Trailing on the same line.
    Inline,
    /// The package-level comment.
    Package,
    /// Attached to the import block.
    Imports,
    /// A file-level comment not attached to any declaration.
    File,
    /// Provenance could not be determined.
    Unknown,
}

/// A single documentation comment attached to an entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment text with markers stripped.
    pub text: String,
    /// Where the comment was found.
    pub placement: Placement,
}

impl Comment {
    pub fn new(text: impl Into<String>, placement: Placement) -> Self {
        Comment {
            text: text.into(),
            placement,
        }
    }

    /// A comment found above a declaration.
    pub fn above(text: impl Into<String>) -> Self {
        Self::new(text, Placement::Above)
    }

    /// A trailing same-line comment.
    pub fn inline(text: impl Into<String>) -> Self {
        Self::new(text, Placement::Inline)
    }

    /// A package-level comment.
    pub fn package(text: impl Into<String>) -> Self {
        Self::new(text, Placement::Package)
    }
}
