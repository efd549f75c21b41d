//! Raw type descriptors.
//!
//! `TypeDesc` is the open set of type shapes an upstream type-checker can
//! report. Descriptors reference each other through `Ty` handles into the
//! owning `TypeTable`, never by nesting, which keeps the set serializable
//! and lets mutually-referential declarations share nodes.

use serde::{Deserialize, Serialize};

use crate::table::Ty;

/// Predeclared basic kinds, including the untyped constant kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    /// Alias kind for `uint8` with its own display name.
    Byte,
    /// Alias kind for `int32` with its own display name.
    Rune,
    /// The predeclared `error` interface, catalogued as a basic.
    Error,
    /// The reserved constraint `comparable`, catalogued as a basic.
    Comparable,
    /// The empty-interface constraint `any`, catalogued as a basic.
    Any,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    /// The canonical predeclared name.
    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::Byte => "byte",
            BasicKind::Rune => "rune",
            BasicKind::Error => "error",
            BasicKind::Comparable => "comparable",
            BasicKind::Any => "any",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedComplex => "untyped complex",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    /// Normalize an untyped constant kind to its typed equivalent.
    /// Typed kinds are returned unchanged.
    pub fn normalize(self) -> Self {
        match self {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Rune,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedComplex => BasicKind::Complex128,
            BasicKind::UntypedString => BasicKind::String,
            BasicKind::UntypedNil => BasicKind::UnsafePointer,
            other => other,
        }
    }

    /// Whether this kind is one of the untyped constant kinds.
    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedComplex
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }
}

/// Channel direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A function or method parameter/result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamDesc {
    /// May be empty for unnamed results.
    pub name: String,
    pub ty: Ty,
    /// Set by the frontend only on the final parameter.
    #[serde(default)]
    pub variadic: bool,
}

impl ParamDesc {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        ParamDesc {
            name: name.into(),
            ty,
            variadic: false,
        }
    }

    pub fn variadic(name: impl Into<String>, ty: Ty) -> Self {
        ParamDesc {
            name: name.into(),
            ty,
            variadic: true,
        }
    }
}

/// A struct field as reported by the frontend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDesc {
    pub name: String,
    pub ty: Ty,
    /// Raw struct-tag string; empty when absent.
    #[serde(default)]
    pub tag: String,
    /// Whether this field is an embedded declaration.
    #[serde(default)]
    pub embedded: bool,
}

impl FieldDesc {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        FieldDesc {
            name: name.into(),
            ty,
            tag: String::new(),
            embedded: false,
        }
    }

    pub fn tagged(name: impl Into<String>, ty: Ty, tag: impl Into<String>) -> Self {
        FieldDesc {
            name: name.into(),
            ty,
            tag: tag.into(),
            embedded: false,
        }
    }

    pub fn embedded(name: impl Into<String>, ty: Ty) -> Self {
        FieldDesc {
            name: name.into(),
            ty,
            tag: String::new(),
            embedded: true,
        }
    }
}

/// A method of a named type or interface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodDesc {
    pub name: String,
    /// Must point at a `TypeDesc::Signature`.
    pub sig: Ty,
    /// Whether the declared receiver is a pointer.
    #[serde(default)]
    pub pointer_recv: bool,
}

impl MethodDesc {
    pub fn new(name: impl Into<String>, sig: Ty) -> Self {
        MethodDesc {
            name: name.into(),
            sig,
            pointer_recv: false,
        }
    }

    pub fn pointer(name: impl Into<String>, sig: Ty) -> Self {
        MethodDesc {
            name: name.into(),
            sig,
            pointer_recv: true,
        }
    }
}

/// One term of a constraint union, e.g. `~int` in `~int | ~float64`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnionTermDesc {
    pub ty: Ty,
    /// `true` for approximation terms (`~T`): any type whose underlying
    /// type equals the term.
    #[serde(default)]
    pub approx: bool,
}

/// A named declaration: `type Name <underlying>`, possibly parametric,
/// possibly an instantiation of a parametric origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedDesc {
    /// Package path of the declaring package.
    pub pkg: String,
    pub name: String,
    /// The declared underlying shape. `None` until the frontend patches it
    /// in; a descriptor that still lacks it at scan time is dropped with a
    /// warning.
    pub underlying: Option<Ty>,
    /// Type parameters of a parametric declaration, each a
    /// `TypeDesc::TypeParam`.
    #[serde(default)]
    pub type_params: Vec<Ty>,
    /// Concrete type arguments; non-empty exactly when this is an
    /// instantiation.
    #[serde(default)]
    pub type_args: Vec<Ty>,
    /// The parametric origin when this is an instantiation.
    #[serde(default)]
    pub origin: Option<Ty>,
    /// Declared methods, pointer-receiver methods included.
    #[serde(default)]
    pub methods: Vec<MethodDesc>,
    /// Typed-nil hazard marker: the frontend observed a nil declaration
    /// dressed as a non-null named type.
    #[serde(default)]
    pub invalid: bool,
}

/// A raw type descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDesc {
    Basic(BasicKind),
    Named(NamedDesc),
    /// A transparent alias declaration: `type Name = Target`.
    Alias {
        pkg: String,
        name: String,
        target: Ty,
    },
    Pointer {
        elem: Ty,
    },
    Slice {
        elem: Ty,
    },
    Array {
        elem: Ty,
        len: u64,
    },
    Map {
        key: Ty,
        value: Ty,
    },
    Chan {
        elem: Ty,
        dir: ChanDir,
    },
    Struct {
        fields: Vec<FieldDesc>,
    },
    Interface {
        #[serde(default)]
        embeds: Vec<Ty>,
        #[serde(default)]
        methods: Vec<MethodDesc>,
    },
    Signature {
        #[serde(default)]
        params: Vec<ParamDesc>,
        #[serde(default)]
        results: Vec<ParamDesc>,
        #[serde(default)]
        variadic: bool,
        /// Type parameters of a generic function, each a
        /// `TypeDesc::TypeParam`. Empty for ordinary signatures and for
        /// methods (whose parameters belong to the receiver's declaration).
        #[serde(default)]
        type_params: Vec<Ty>,
    },
    /// A type parameter bound inside a parametric declaration.
    TypeParam {
        index: u32,
        name: String,
        constraint: Ty,
    },
    /// A constraint term set.
    Union {
        terms: Vec<UnionTermDesc>,
    },
}

impl TypeDesc {
    /// Short kind tag used for generated ids and log lines.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDesc::Basic(_) => "basic",
            TypeDesc::Named(_) => "named",
            TypeDesc::Alias { .. } => "alias",
            TypeDesc::Pointer { .. } => "pointer",
            TypeDesc::Slice { .. } => "slice",
            TypeDesc::Array { .. } => "array",
            TypeDesc::Map { .. } => "map",
            TypeDesc::Chan { .. } => "chan",
            TypeDesc::Struct { .. } => "struct",
            TypeDesc::Interface { .. } => "interface",
            TypeDesc::Signature { .. } => "func",
            TypeDesc::TypeParam { .. } => "type_parameter",
            TypeDesc::Union { .. } => "union",
        }
    }
}
