//! Frontend data model for the tyscan type scanner.
//!
//! The scanner itself does not parse or type-check source; an upstream
//! frontend does, and hands over its results in the form defined here:
//!
//! - **Raw type descriptors** (`TypeDesc`) stored in an arena (`TypeTable`)
//!   addressed by `Ty` handles. The arena is cycle-capable: a named node is
//!   allocated first and its underlying shape patched in afterwards, so
//!   self-referential declarations are representable.
//! - **Parsed packages** (`Package`, `SourceFile`, `Decl`) carrying just
//!   enough syntax for comment attachment: declaration groups, per-spec
//!   doc and line comments, member comments, receiver names.
//! - The **export root** (`FrontendExport`) bundling both; it round-trips
//!   through `serde`, so a frontend written in any language can hand its
//!   results to the scanner as JSON.

pub mod desc;
pub mod syntax;
pub mod table;

pub use desc::{
    BasicKind, ChanDir, FieldDesc, MethodDesc, NamedDesc, ParamDesc, TypeDesc, UnionTermDesc,
};
pub use syntax::{
    Decl, FrontendExport, FuncDecl, GroupDecl, MemberDoc, Package, SourceFile, TypeDecl,
    ValueSpec, is_exported,
};
pub use table::{Ty, TypeTable};
