//! Canonical identifiers.
//!
//! Id rules, applied once per raw descriptor:
//! - predeclared basics use their predeclared name (`int`, `error`, ...);
//!   untyped constant kinds normalize to their typed equivalents first;
//! - named declarations use `<package-path>.<simple-name>`;
//! - unnamed composites get `__unnamed_<kind>__<n>__` from a per-kind
//!   monotonic counter local to one resolver.

use std::sync::atomic::{AtomicU32, Ordering};

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use tyscan_front::BasicKind;

/// Predeclared basic kinds by canonical name, interned once per process.
static PREDECLARED: Lazy<FxHashMap<&'static str, BasicKind>> = Lazy::new(|| {
    use BasicKind::*;
    let kinds = [
        Bool, Int, Int8, Int16, Int32, Int64, Uint, Uint8, Uint16, Uint32, Uint64, Uintptr,
        Float32, Float64, Complex64, Complex128, String, UnsafePointer, Byte, Rune, Error,
        Comparable, Any,
    ];
    kinds.into_iter().map(|k| (k.name(), k)).collect()
});

/// The basic kind for a predeclared name, if any. Universe-scope names
/// reported as named declarations (`error`, `comparable`, ...) resolve
/// through this instead of minting package-qualified ids.
pub fn predeclared_kind(name: &str) -> Option<BasicKind> {
    PREDECLARED.get(name).copied()
}

/// Kinds that can occur without a name and need generated ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnnamedKind {
    Pointer,
    Slice,
    Array,
    Map,
    Chan,
    Struct,
    Interface,
    Func,
    Union,
}

impl UnnamedKind {
    fn tag(self) -> &'static str {
        match self {
            UnnamedKind::Pointer => "pointer",
            UnnamedKind::Slice => "slice",
            UnnamedKind::Array => "array",
            UnnamedKind::Map => "map",
            UnnamedKind::Chan => "chan",
            UnnamedKind::Struct => "struct",
            UnnamedKind::Interface => "interface",
            UnnamedKind::Func => "func",
            UnnamedKind::Union => "union",
        }
    }
}

/// Per-kind monotonic counters for generated ids.
#[derive(Debug, Default)]
pub struct UnnamedCounters {
    pointer: AtomicU32,
    slice: AtomicU32,
    array: AtomicU32,
    map: AtomicU32,
    chan: AtomicU32,
    strukt: AtomicU32,
    interface: AtomicU32,
    func: AtomicU32,
    union: AtomicU32,
}

impl UnnamedCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next generated id for `kind`. Counters start at 1.
    pub fn next(&self, kind: UnnamedKind) -> String {
        let counter = match kind {
            UnnamedKind::Pointer => &self.pointer,
            UnnamedKind::Slice => &self.slice,
            UnnamedKind::Array => &self.array,
            UnnamedKind::Map => &self.map,
            UnnamedKind::Chan => &self.chan,
            UnnamedKind::Struct => &self.strukt,
            UnnamedKind::Interface => &self.interface,
            UnnamedKind::Func => &self.func,
            UnnamedKind::Union => &self.union,
        };
        let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("__unnamed_{}__{}__", kind.tag(), n)
    }
}

/// Canonical id of a named declaration.
pub fn named_id(pkg: &str, name: &str) -> String {
    if pkg.is_empty() {
        name.to_string()
    } else {
        format!("{pkg}.{name}")
    }
}
