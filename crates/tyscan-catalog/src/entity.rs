//! Catalog entities.
//!
//! Every catalogued declaration satisfies one contract: a canonical id, a
//! display name, a kind tag, package provenance, comments, and a lazy-load
//! slot. Kind-specific state hangs off `EntityData`.
//!
//! Mutation discipline: after an entity is interned it is append-only.
//! Fields, methods, and embeds are appended under interior locks by the
//! entity's single-fire loader; concurrent readers see at minimum the
//! skeleton (id, name, kind, package) and possibly an incomplete member
//! list, never a torn one.

use std::sync::{Arc, RwLock};

use smallvec::SmallVec;
use tyscan_common::Comment;
use tyscan_front::ChanDir;

use crate::loader::{LoadPlan, LoadSlot, LoadState};

/// Length value carried by slices: an unbounded sequence.
pub const SLICE_LEN: i64 = -1;

/// Entity kind tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Basic,
    Pointer,
    Slice,
    Array,
    Map,
    Chan,
    Alias,
    Interface,
    Struct,
    Function,
    Method,
    Constant,
    Variable,
    TypeParameter,
    Union,
    Instantiated,
}

impl EntityKind {
    /// Serialized tag string.
    pub fn tag(self) -> &'static str {
        match self {
            EntityKind::Basic => "basic",
            EntityKind::Pointer => "pointer",
            EntityKind::Slice => "slice",
            EntityKind::Array => "array",
            EntityKind::Map => "map",
            EntityKind::Chan => "chan",
            EntityKind::Alias => "alias",
            EntityKind::Interface => "interface",
            EntityKind::Struct => "struct",
            EntityKind::Function => "func",
            EntityKind::Method => "method",
            EntityKind::Constant => "const",
            EntityKind::Variable => "var",
            EntityKind::TypeParameter => "type_parameter",
            EntityKind::Union => "union",
            EntityKind::Instantiated => "instantiated",
        }
    }
}

/// Reference to another type: by id for interned named entities, inline
/// for unnamed composites (which are never cached globally).
#[derive(Clone, Debug)]
pub enum TypeRef {
    Named(String),
    Inline(Arc<Entity>),
}

impl TypeRef {
    /// The id of the referenced entity.
    pub fn id(&self) -> &str {
        match self {
            TypeRef::Named(id) => id,
            TypeRef::Inline(entity) => &entity.id,
        }
    }

    pub fn named(entity: &Arc<Entity>) -> Self {
        TypeRef::Named(entity.id.clone())
    }

    pub fn inline(entity: Arc<Entity>) -> Self {
        TypeRef::Inline(entity)
    }

    /// Reference an entity the way the serializer expects: named entities
    /// by id, unnamed ones inline.
    pub fn to(entity: &Arc<Entity>) -> Self {
        if entity.named {
            TypeRef::Named(entity.id.clone())
        } else {
            TypeRef::Inline(Arc::clone(entity))
        }
    }
}

/// A struct field, plain or promoted.
#[derive(Clone, Debug)]
pub struct Field {
    /// `<parent-id>#<field-name>`.
    pub id: String,
    pub name: String,
    pub ty: TypeRef,
    /// Raw struct-tag string.
    pub tag: String,
    /// Id of the owning struct.
    pub parent: String,
    /// For promoted fields: the embedded occurrence the field came from.
    pub promoted_from: Option<TypeRef>,
    pub exported: bool,
}

/// A function or method parameter/result.
#[derive(Clone, Debug)]
pub struct Param {
    /// Empty for unnamed results.
    pub name: String,
    pub ty: TypeRef,
    /// Set only on the final parameter.
    pub variadic: bool,
}

/// Signature state for functions and methods.
#[derive(Clone, Debug, Default)]
pub struct FuncData {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub variadic: bool,
    /// Canonical signature string, package-path qualified.
    pub structure: String,
    /// Receiver type; present exactly for methods.
    pub receiver: Option<TypeRef>,
    pub pointer_receiver: bool,
    /// For promoted methods: the embedded occurrence they came from.
    pub promoted_from: Option<TypeRef>,
}

/// One bound type argument of an instantiated generic.
#[derive(Clone, Debug)]
pub struct TypeArg {
    /// The type parameter's name.
    pub name: String,
    pub index: u32,
    pub ty: TypeRef,
}

/// One term of a constraint union.
#[derive(Clone, Debug)]
pub struct UnionTerm {
    pub ty: TypeRef,
    /// `true` for approximation terms (`~T`).
    pub approximation: bool,
}

/// Kind-specific entity state.
#[derive(Debug)]
pub enum EntityData {
    Basic {
        /// For named basics (`type MyInt int`): the predeclared basic.
        underlying: Option<TypeRef>,
    },
    Pointer {
        elem: TypeRef,
        /// Folded chain depth, always >= 1.
        depth: u32,
    },
    /// Slices and fixed-length arrays; `len` is `SLICE_LEN` for slices.
    Sequence {
        elem: TypeRef,
        len: i64,
    },
    Map {
        key: TypeRef,
        value: TypeRef,
    },
    Chan {
        elem: TypeRef,
        dir: ChanDir,
    },
    Alias {
        underlying: TypeRef,
    },
    Interface {
        embeds: RwLock<Vec<TypeRef>>,
    },
    Struct {
        embeds: RwLock<Vec<TypeRef>>,
        fields: RwLock<Vec<Field>>,
    },
    Func(Box<FuncData>),
    Const {
        /// The literal value as written in source.
        value: String,
        value_type: TypeRef,
        /// Enum-like owner, when enum grouping is on.
        parent: Option<TypeRef>,
    },
    Var {
        value_type: TypeRef,
    },
    TypeParam {
        index: u32,
        constraint: TypeRef,
    },
    Union {
        terms: Vec<UnionTerm>,
    },
    Instantiated {
        /// The parametric declaration.
        origin: TypeRef,
        type_args: SmallVec<[TypeArg; 2]>,
    },
}

/// A catalogued entity.
#[derive(Debug)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    /// Whether this entity comes from an explicit named declaration.
    pub named: bool,
    /// Path of the declaring package; `None` for predeclared types and
    /// unnamed composites.
    pub package: Option<String>,
    pub files: Vec<String>,
    pub exported: bool,
    /// Import hops from the scanned roots.
    pub distance: u32,
    comments: RwLock<Vec<Comment>>,
    /// Methods attach to their parent entity, never to a store.
    methods: RwLock<Vec<Arc<Entity>>>,
    /// Type parameters of a parametric declaration. Appended right after
    /// interning, so a constraint that references the declaration itself
    /// hits the cache instead of recursing.
    type_params: RwLock<Vec<Arc<Entity>>>,
    pub data: EntityData,
    load: LoadSlot,
}

impl Entity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: EntityKind,
        data: EntityData,
    ) -> Self {
        Entity {
            id: id.into(),
            name: name.into(),
            kind,
            named: false,
            package: None,
            files: Vec::new(),
            exported: false,
            distance: 0,
            comments: RwLock::new(Vec::new()),
            methods: RwLock::new(Vec::new()),
            type_params: RwLock::new(Vec::new()),
            data,
            load: LoadSlot::new(),
        }
    }

    pub fn with_named(mut self, named: bool) -> Self {
        self.named = named;
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    pub fn with_exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    pub fn with_distance(mut self, distance: u32) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_type_params(self, type_params: Vec<Arc<Entity>>) -> Self {
        *self.type_params.write().unwrap_or_else(|e| e.into_inner()) = type_params;
        self
    }

    pub fn with_plan(self, plan: LoadPlan) -> Self {
        self.load.install(plan);
        self
    }

    // ------------------------------------------------------------------
    // Lazy-load protocol
    // ------------------------------------------------------------------

    /// Install a load plan after construction (used when an entity must be
    /// interned before its loader can be described). No-op once a plan is
    /// installed or the slot fired.
    pub fn install_plan(&self, plan: LoadPlan) -> bool {
        self.load.install(plan)
    }

    /// Claim the load plan for execution; `None` when there is nothing to
    /// do (no plan, already fired, or firing elsewhere).
    pub fn begin_load(&self) -> Option<LoadPlan> {
        self.load.begin()
    }

    /// Report the outcome of a claimed load.
    pub fn finish_load(&self, result: Result<(), String>) {
        self.load.finish(result)
    }

    pub fn load_state(&self) -> LoadState {
        self.load.state()
    }

    /// Whether the loader has fired at least once.
    pub fn loaded(&self) -> bool {
        self.load.fired()
    }

    // ------------------------------------------------------------------
    // Append-only mutation
    // ------------------------------------------------------------------

    /// Attach comments; appended in order.
    pub fn add_comments(&self, comments: impl IntoIterator<Item = Comment>) {
        let mut guard = self.comments.write().unwrap_or_else(|e| e.into_inner());
        guard.extend(comments);
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.comments
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Attach a method entity to this parent.
    pub fn add_method(&self, method: Arc<Entity>) {
        let mut guard = self.methods.write().unwrap_or_else(|e| e.into_inner());
        guard.push(method);
    }

    pub fn methods(&self) -> Vec<Arc<Entity>> {
        self.methods
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Append an embedded occurrence. No-op on kinds without embeds.
    pub fn add_embed(&self, embed: TypeRef) {
        match &self.data {
            EntityData::Interface { embeds } | EntityData::Struct { embeds, .. } => {
                embeds
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(embed);
            }
            _ => {}
        }
    }

    pub fn embeds(&self) -> Vec<TypeRef> {
        match &self.data {
            EntityData::Interface { embeds } | EntityData::Struct { embeds, .. } => embeds
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            _ => Vec::new(),
        }
    }

    /// Append a field. No-op on kinds without fields.
    pub fn add_field(&self, field: Field) {
        if let EntityData::Struct { fields, .. } = &self.data {
            fields
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .push(field);
        }
    }

    pub fn fields(&self) -> Vec<Field> {
        match &self.data {
            EntityData::Struct { fields, .. } => fields
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            _ => Vec::new(),
        }
    }

    /// Append a resolved type parameter.
    pub fn add_type_param(&self, param: Arc<Entity>) {
        self.type_params
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(param);
    }

    pub fn type_params(&self) -> Vec<Arc<Entity>> {
        self.type_params
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Member id of the form `<parent-id>#<member-name>`.
    pub fn member_id(parent_id: &str, member: &str) -> String {
        format!("{parent_id}#{member}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(id: &str) -> Arc<Entity> {
        Arc::new(Entity::new(
            id,
            id,
            EntityKind::Basic,
            EntityData::Basic { underlying: None },
        ))
    }

    #[test]
    fn test_type_ref_prefers_id_for_named() {
        let named = Arc::new(
            Entity::new(
                "pkg.T",
                "T",
                EntityKind::Struct,
                EntityData::Struct {
                    embeds: RwLock::new(Vec::new()),
                    fields: RwLock::new(Vec::new()),
                },
            )
            .with_named(true),
        );
        assert!(matches!(TypeRef::to(&named), TypeRef::Named(id) if id == "pkg.T"));

        let unnamed = basic("__unnamed_basic__1__");
        assert!(matches!(TypeRef::to(&unnamed), TypeRef::Inline(_)));
    }

    #[test]
    fn test_append_only_members() {
        let parent = Arc::new(
            Entity::new(
                "pkg.S",
                "S",
                EntityKind::Struct,
                EntityData::Struct {
                    embeds: RwLock::new(Vec::new()),
                    fields: RwLock::new(Vec::new()),
                },
            )
            .with_named(true),
        );
        parent.add_field(Field {
            id: Entity::member_id(&parent.id, "X"),
            name: "X".to_string(),
            ty: TypeRef::Named("int".to_string()),
            tag: String::new(),
            parent: parent.id.clone(),
            promoted_from: None,
            exported: true,
        });
        assert_eq!(parent.fields().len(), 1);
        assert_eq!(parent.fields()[0].id, "pkg.S#X");

        let m = basic("int");
        parent.add_method(m);
        assert_eq!(parent.methods().len(), 1);
    }

    #[test]
    fn test_member_id_shape() {
        assert_eq!(Entity::member_id("pkg.S", "Get"), "pkg.S#Get");
    }
}
