//! The resolution engine.
//!
//! `Resolver::resolve` is the entry point: raw descriptor in, catalog
//! entity out. Dispatch follows the descriptor's underlying shape; named
//! declarations intern into the types store, unnamed composites are built
//! inline and never cached. Struct and interface skeletons are cached
//! *before* their members resolve, which is what terminates cycles like
//! `type Node struct { Next *Node }` and self-referential constraints.
//! Named cycles that cannot be broken by skeleton interning (a named
//! pointer whose element chain reaches itself, an alias loop) are caught
//! by an in-progress guard and dropped with a warning.

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{debug, warn};

use tyscan_catalog::{
    Catalog, Entity, EntityData, EntityKind, LoadPlan, PackageEntity, TypeRef,
};
use tyscan_common::{ScanMode, limits::MAX_POINTER_DEPTH};
use tyscan_front::{
    BasicKind, FrontendExport, FuncDecl, TypeDesc, Ty, is_exported,
};

use crate::docs::DocProvider;
use crate::ident::{UnnamedCounters, UnnamedKind, named_id};
use crate::print::TypePrinter;
use crate::signature::process_signature;

/// Transforms raw type descriptors into catalog entities.
pub struct Resolver<'a> {
    pub(crate) export: &'a FrontendExport,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) mode: ScanMode,
    pub(crate) include_unexported: bool,
    pub(crate) docs: Option<&'a dyn DocProvider>,
    pub(crate) counters: UnnamedCounters,
    /// Named descriptors currently being constructed; re-entry means a
    /// cycle skeleton interning cannot break.
    in_progress: RwLock<FxHashSet<Ty>>,
}

impl<'a> Resolver<'a> {
    pub fn new(export: &'a FrontendExport, catalog: Arc<Catalog>, mode: ScanMode) -> Self {
        Resolver {
            export,
            catalog,
            mode,
            include_unexported: false,
            docs: None,
            counters: UnnamedCounters::new(),
            in_progress: RwLock::new(FxHashSet::default()),
        }
    }

    pub fn with_include_unexported(mut self, include: bool) -> Self {
        self.include_unexported = include;
        self
    }

    pub fn with_doc_provider(mut self, docs: &'a dyn DocProvider) -> Self {
        self.docs = Some(docs);
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn printer(&self) -> TypePrinter<'a> {
        TypePrinter::new(&self.export.table)
    }

    // ------------------------------------------------------------------
    // Entry point
    // ------------------------------------------------------------------

    /// Resolve a raw descriptor to a catalog entity. `None` means the
    /// shape was dropped with a warning; parents continue without it.
    pub fn resolve(&self, ty: Ty) -> Option<Arc<Entity>> {
        let Some(desc) = self.export.table.get(ty) else {
            warn!(?ty, "descriptor handle outside the frontend table");
            return None;
        };
        match desc {
            TypeDesc::Basic(kind) => Some(self.basic_singleton(kind.normalize())),
            TypeDesc::Named(_) => self.resolve_named(ty),
            TypeDesc::Alias { .. } => self.resolve_alias(ty),
            TypeDesc::TypeParam {
                index,
                name,
                constraint,
            } => self.resolve_type_param(*index, name.clone(), *constraint),
            TypeDesc::Union { .. } => self.resolve_union(ty),
            TypeDesc::Pointer { .. } => self.resolve_unnamed_pointer(ty),
            TypeDesc::Slice { elem } => self.resolve_sequence(ty, *elem, None),
            TypeDesc::Array { elem, len } => self.resolve_sequence(ty, *elem, Some(*len)),
            TypeDesc::Map { key, value } => self.resolve_map(ty, *key, *value),
            TypeDesc::Chan { elem, dir } => {
                let (elem, dir) = (*elem, *dir);
                let elem = self.resolve_element(elem)?;
                let entity = self.unnamed(ty, UnnamedKind::Chan, EntityKind::Chan, EntityData::Chan {
                    elem,
                    dir,
                });
                Some(Arc::new(entity))
            }
            TypeDesc::Struct { .. } => self.resolve_unnamed_struct(ty),
            TypeDesc::Interface { .. } => self.resolve_unnamed_interface(ty),
            TypeDesc::Signature { .. } => self.resolve_unnamed_signature(ty),
        }
    }

    // ------------------------------------------------------------------
    // Predeclared basics
    // ------------------------------------------------------------------

    /// The interned singleton for a predeclared basic. Untyped kinds must
    /// be normalized by the caller.
    pub fn basic_singleton(&self, kind: BasicKind) -> Arc<Entity> {
        let id = kind.name();
        if let Some(existing) = self.catalog.types.get(id) {
            return existing;
        }
        let entity = Arc::new(Entity::new(
            id,
            id,
            EntityKind::Basic,
            EntityData::Basic { underlying: None },
        ));
        self.catalog.types.set(id, Arc::clone(&entity));
        entity
    }

    /// Reference an already-resolved entity the way children should be
    /// recorded: interned entities by id, unnamed composites inline.
    pub(crate) fn make_ref(&self, entity: &Arc<Entity>) -> TypeRef {
        if entity.named || self.catalog.types.contains(&entity.id) {
            TypeRef::Named(entity.id.clone())
        } else {
            TypeRef::Inline(Arc::clone(entity))
        }
    }

    // ------------------------------------------------------------------
    // Pointer folding
    // ------------------------------------------------------------------

    /// Unwrap a pointer chain, returning the innermost non-pointer
    /// descriptor and the measured depth.
    pub(crate) fn fold_pointer(&self, mut ty: Ty) -> (Ty, u32) {
        let mut depth = 0u32;
        while depth < MAX_POINTER_DEPTH {
            match self.export.table.get(ty) {
                Some(TypeDesc::Pointer { elem }) => {
                    depth += 1;
                    ty = *elem;
                }
                _ => break,
            }
        }
        (ty, depth)
    }

    /// Resolve a type position applying the element rule: pointer chains
    /// fold into a single inline pointer carrying the depth.
    pub(crate) fn resolve_element(&self, ty: Ty) -> Option<TypeRef> {
        let (base, depth) = self.fold_pointer(ty);
        let base_entity = self.resolve(base)?;
        let base_ref = self.make_ref(&base_entity);
        if depth == 0 {
            return Some(base_ref);
        }
        let entity = self.unnamed(
            ty,
            UnnamedKind::Pointer,
            EntityKind::Pointer,
            EntityData::Pointer {
                elem: base_ref,
                depth,
            },
        );
        Some(TypeRef::Inline(Arc::new(entity)))
    }

    // ------------------------------------------------------------------
    // Named declarations
    // ------------------------------------------------------------------

    fn resolve_named(&self, ty: Ty) -> Option<Arc<Entity>> {
        let Some(TypeDesc::Named(named)) = self.export.table.get(ty) else {
            return None;
        };

        // Typed-nil hazard: a nil declaration dressed as a named type.
        if named.invalid {
            warn!(pkg = %named.pkg, name = %named.name, "typed-nil descriptor dropped");
            return None;
        }

        if !named.type_args.is_empty() {
            return crate::generics::resolve_instantiated(self, ty, named);
        }

        // Predeclared names reported as named declarations (`comparable`,
        // `any`, `error` from the universe scope) are basics.
        if named.pkg.is_empty()
            && let Some(kind) = crate::ident::predeclared_kind(&named.name)
        {
            return Some(self.basic_singleton(kind));
        }

        let id = named_id(&named.pkg, &named.name);
        if let Some(existing) = self.catalog.types.get(&id) {
            return Some(existing);
        }

        let _guard = self.enter(ty, &id)?;

        let Some(underlying) = named.underlying else {
            warn!(%id, "named descriptor without underlying shape");
            return None;
        };
        let (underlying_ty, underlying_desc) = self.underlying_shape(underlying)?;

        let (files, distance) = self.package_info(&named.pkg);
        let exported = is_exported(&named.name);
        let base = |kind: EntityKind, data: EntityData| {
            Entity::new(id.as_str(), named.name.as_str(), kind, data)
                .with_named(true)
                .with_package(named.pkg.as_str())
                .with_files(files.clone())
                .with_exported(exported)
                .with_distance(distance)
        };

        let entity = match underlying_desc {
            TypeDesc::Basic(kind) => {
                let singleton = self.basic_singleton(kind.normalize());
                base(EntityKind::Basic, EntityData::Basic {
                    underlying: Some(self.make_ref(&singleton)),
                })
                .with_plan(LoadPlan::Expand { origin: ty })
            }
            TypeDesc::Pointer { .. } => {
                let (elem_ty, depth) = self.fold_pointer(underlying_ty);
                let elem_entity = self.resolve(elem_ty)?;
                base(EntityKind::Pointer, EntityData::Pointer {
                    elem: self.make_ref(&elem_entity),
                    depth,
                })
                .with_plan(LoadPlan::Expand { origin: ty })
            }
            TypeDesc::Slice { elem } => {
                let elem = self.resolve_element(*elem)?;
                base(EntityKind::Slice, EntityData::Sequence { elem, len: -1 })
                    .with_plan(LoadPlan::Expand { origin: ty })
            }
            TypeDesc::Array { elem, len } => {
                let len = *len as i64;
                let elem = self.resolve_element(*elem)?;
                base(EntityKind::Array, EntityData::Sequence { elem, len })
                    .with_plan(LoadPlan::Expand { origin: ty })
            }
            TypeDesc::Map { key, value } => {
                let (key, value) = (*key, *value);
                let key = self.resolve_element(key)?;
                let value = self.resolve_element(value)?;
                base(EntityKind::Map, EntityData::Map { key, value })
                    .with_plan(LoadPlan::Expand { origin: ty })
            }
            TypeDesc::Chan { elem, dir } => {
                let (elem, dir) = (*elem, *dir);
                let elem = self.resolve_element(elem)?;
                base(EntityKind::Chan, EntityData::Chan { elem, dir })
                    .with_plan(LoadPlan::Expand { origin: ty })
            }
            TypeDesc::Struct { .. } => {
                // Cache the skeleton first; members wait for the loader.
                let entity = Arc::new(base(EntityKind::Struct, EntityData::Struct {
                    embeds: RwLock::new(Vec::new()),
                    fields: RwLock::new(Vec::new()),
                }));
                self.catalog.types.set(id.clone(), Arc::clone(&entity));
                if !self.attach_type_params(&entity, &named.type_params) {
                    // Partial resolution: undo the interning.
                    self.catalog.types.delete(&id);
                    return None;
                }
                entity.install_plan(LoadPlan::Expand { origin: ty });
                debug!(%id, "interned struct skeleton");
                return Some(entity);
            }
            TypeDesc::Interface { .. } => {
                let entity = Arc::new(base(EntityKind::Interface, EntityData::Interface {
                    embeds: RwLock::new(Vec::new()),
                }));
                self.catalog.types.set(id.clone(), Arc::clone(&entity));
                if !self.attach_type_params(&entity, &named.type_params) {
                    self.catalog.types.delete(&id);
                    return None;
                }
                entity.install_plan(LoadPlan::Expand { origin: ty });
                debug!(%id, "interned interface skeleton");
                return Some(entity);
            }
            TypeDesc::Signature { .. } => {
                let data = process_signature(self, underlying_ty)?;
                let entity = base(EntityKind::Function, EntityData::Func(Box::new(data)))
                    .with_plan(LoadPlan::Expand { origin: ty });
                let entity = Arc::new(entity);
                self.catalog.types.set(id.clone(), Arc::clone(&entity));
                if !self.attach_type_params(&entity, &named.type_params) {
                    self.catalog.types.delete(&id);
                    return None;
                }
                return Some(entity);
            }
            other => {
                warn!(%id, shape = other.kind_name(), "unsupported underlying shape");
                return None;
            }
        };

        let entity = Arc::new(entity);
        self.catalog.types.set(id.clone(), Arc::clone(&entity));
        if !self.attach_type_params(&entity, &named.type_params) {
            self.catalog.types.delete(&id);
            return None;
        }
        debug!(%id, kind = entity.kind.tag(), "interned named type");
        Some(entity)
    }

    /// Resolve and append a declaration's type parameters. Returns `false`
    /// when one of them fails, so the caller can roll back.
    fn attach_type_params(&self, entity: &Arc<Entity>, params: &[Ty]) -> bool {
        for param in params {
            match self.resolve(*param) {
                Some(resolved) => entity.add_type_param(resolved),
                None => {
                    warn!(id = %entity.id, "type parameter failed to resolve");
                    return false;
                }
            }
        }
        true
    }

    /// Follow `Named`/`Alias` underlying chains to a structural shape.
    fn underlying_shape(&self, mut ty: Ty) -> Option<(Ty, &'a TypeDesc)> {
        for _ in 0..MAX_POINTER_DEPTH {
            match self.export.table.get(ty)? {
                TypeDesc::Named(inner) => ty = inner.underlying?,
                TypeDesc::Alias { target, .. } => ty = *target,
                desc => return Some((ty, desc)),
            }
        }
        warn!(?ty, "underlying chain does not terminate");
        None
    }

    fn resolve_alias(&self, ty: Ty) -> Option<Arc<Entity>> {
        let Some(TypeDesc::Alias { pkg, name, target }) = self.export.table.get(ty) else {
            return None;
        };
        let id = named_id(pkg, name);
        if let Some(existing) = self.catalog.types.get(&id) {
            return Some(existing);
        }
        let _guard = self.enter(ty, &id)?;

        let underlying = self.resolve_element(*target)?;
        let (files, distance) = self.package_info(pkg);
        let entity = Arc::new(
            Entity::new(id.as_str(), name.as_str(), EntityKind::Alias, EntityData::Alias { underlying })
                .with_named(true)
                .with_package(pkg.as_str())
                .with_files(files)
                .with_exported(is_exported(name))
                .with_distance(distance)
                .with_plan(LoadPlan::Expand { origin: ty }),
        );
        self.catalog.types.set(id.clone(), Arc::clone(&entity));
        Some(entity)
    }

    // ------------------------------------------------------------------
    // Type parameters, constraints, unions
    // ------------------------------------------------------------------

    fn resolve_type_param(&self, index: u32, name: String, constraint: Ty) -> Option<Arc<Entity>> {
        let constraint_entity = self.resolve(constraint)?;
        let constraint = self.make_ref(&constraint_entity);
        Some(Arc::new(Entity::new(
            name.clone(),
            name,
            EntityKind::TypeParameter,
            EntityData::TypeParam { index, constraint },
        )))
    }

    fn resolve_union(&self, ty: Ty) -> Option<Arc<Entity>> {
        let Some(TypeDesc::Union { terms }) = self.export.table.get(ty) else {
            return None;
        };
        let mut resolved = Vec::with_capacity(terms.len());
        for term in terms {
            let entity = self.resolve(term.ty)?;
            resolved.push(tyscan_catalog::UnionTerm {
                ty: self.make_ref(&entity),
                approximation: term.approx,
            });
        }
        Some(Arc::new(self.unnamed(
            ty,
            UnnamedKind::Union,
            EntityKind::Union,
            EntityData::Union { terms: resolved },
        )))
    }

    // ------------------------------------------------------------------
    // Unnamed composites
    // ------------------------------------------------------------------

    /// Common construction for inline (never cached) composites.
    fn unnamed(
        &self,
        ty: Ty,
        unnamed: UnnamedKind,
        kind: EntityKind,
        data: EntityData,
    ) -> Entity {
        let id = self.counters.next(unnamed);
        let name = self.printer().print(ty);
        Entity::new(id, name, kind, data)
    }

    fn resolve_unnamed_pointer(&self, ty: Ty) -> Option<Arc<Entity>> {
        let (base, depth) = self.fold_pointer(ty);
        let base_entity = self.resolve(base)?;
        Some(Arc::new(self.unnamed(
            ty,
            UnnamedKind::Pointer,
            EntityKind::Pointer,
            EntityData::Pointer {
                elem: self.make_ref(&base_entity),
                depth,
            },
        )))
    }

    fn resolve_sequence(&self, ty: Ty, elem: Ty, len: Option<u64>) -> Option<Arc<Entity>> {
        let elem = self.resolve_element(elem)?;
        let (unnamed, kind, len) = match len {
            Some(len) => (UnnamedKind::Array, EntityKind::Array, len as i64),
            None => (UnnamedKind::Slice, EntityKind::Slice, -1),
        };
        Some(Arc::new(self.unnamed(
            ty,
            unnamed,
            kind,
            EntityData::Sequence { elem, len },
        )))
    }

    fn resolve_map(&self, ty: Ty, key: Ty, value: Ty) -> Option<Arc<Entity>> {
        let key = self.resolve_element(key)?;
        let value = self.resolve_element(value)?;
        Some(Arc::new(self.unnamed(
            ty,
            UnnamedKind::Map,
            EntityKind::Map,
            EntityData::Map { key, value },
        )))
    }

    fn resolve_unnamed_struct(&self, ty: Ty) -> Option<Arc<Entity>> {
        let entity = Arc::new(self.unnamed(
            ty,
            UnnamedKind::Struct,
            EntityKind::Struct,
            EntityData::Struct {
                embeds: RwLock::new(Vec::new()),
                fields: RwLock::new(Vec::new()),
            },
        ));
        // No loader ever fires for inline entities; fill eagerly. An
        // anonymous shape cannot reach itself without passing through a
        // named declaration, so this cannot recurse unboundedly.
        if let Err(message) = self.fill_struct(&entity, ty) {
            warn!(%message, "anonymous struct dropped");
            return None;
        }
        Some(entity)
    }

    fn resolve_unnamed_interface(&self, ty: Ty) -> Option<Arc<Entity>> {
        let entity = Arc::new(self.unnamed(
            ty,
            UnnamedKind::Interface,
            EntityKind::Interface,
            EntityData::Interface {
                embeds: RwLock::new(Vec::new()),
            },
        ));
        if let Err(message) = self.fill_interface(&entity, ty) {
            warn!(%message, "anonymous interface dropped");
            return None;
        }
        Some(entity)
    }

    fn resolve_unnamed_signature(&self, ty: Ty) -> Option<Arc<Entity>> {
        let data = process_signature(self, ty)?;
        Some(Arc::new(self.unnamed(
            ty,
            UnnamedKind::Func,
            EntityKind::Function,
            EntityData::Func(Box::new(data)),
        )))
    }

    // ------------------------------------------------------------------
    // Values and package-level functions
    // ------------------------------------------------------------------

    /// Resolve one declared constant into the values store.
    pub fn resolve_const(
        &self,
        pkg: &Arc<PackageEntity>,
        name: &str,
        ty: Option<Ty>,
        value: &str,
    ) -> Option<Arc<Entity>> {
        let Some(ty) = ty else {
            warn!(pkg = %pkg.path, %name, "constant without a declared type dropped");
            return None;
        };
        let value_entity = self.resolve(ty)?;
        let value_ref = self.make_ref(&value_entity);

        // Enum-like grouping: a constant typed by a named in-package type
        // records that type as its parent.
        let parent = if self.mode.contains(ScanMode::ENUMS)
            && matches!(
                self.export.table.get(ty),
                Some(TypeDesc::Named(n)) if n.pkg == pkg.path && n.type_args.is_empty()
            ) {
            Some(value_ref.clone())
        } else {
            None
        };

        let id = named_id(&pkg.path, name);
        let entity = Arc::new(
            Entity::new(id.as_str(), name, EntityKind::Constant, EntityData::Const {
                value: value.to_string(),
                value_type: value_ref,
                parent,
            })
            .with_named(true)
            .with_package(pkg.path.as_str())
            .with_files(pkg.files.clone())
            .with_exported(is_exported(name))
            .with_distance(pkg.distance)
            .with_plan(LoadPlan::Comments),
        );
        self.catalog.values.set(id.clone(), Arc::clone(&entity));
        Some(entity)
    }

    /// Resolve one declared variable into the values store.
    pub fn resolve_var(
        &self,
        pkg: &Arc<PackageEntity>,
        name: &str,
        ty: Option<Ty>,
    ) -> Option<Arc<Entity>> {
        let Some(ty) = ty else {
            warn!(pkg = %pkg.path, %name, "variable without a declared type dropped");
            return None;
        };
        let value_entity = self.resolve(ty)?;
        let id = named_id(&pkg.path, name);
        let entity = Arc::new(
            Entity::new(id.as_str(), name, EntityKind::Variable, EntityData::Var {
                value_type: self.make_ref(&value_entity),
            })
            .with_named(true)
            .with_package(pkg.path.as_str())
            .with_files(pkg.files.clone())
            .with_exported(is_exported(name))
            .with_distance(pkg.distance)
            .with_plan(LoadPlan::Comments),
        );
        self.catalog.values.set(id.clone(), Arc::clone(&entity));
        Some(entity)
    }

    /// Resolve a package-level function into the types store. Methods are
    /// not resolved here; they belong to their parent types.
    pub fn resolve_func(&self, pkg: &Arc<PackageEntity>, decl: &FuncDecl) -> Option<Arc<Entity>> {
        debug_assert!(decl.recv.is_none());
        let data = process_signature(self, decl.sig)?;
        let id = named_id(&pkg.path, &decl.name);
        let entity = Arc::new(
            Entity::new(id.as_str(), decl.name.as_str(), EntityKind::Function, EntityData::Func(Box::new(data)))
                .with_named(true)
                .with_package(pkg.path.as_str())
                .with_files(pkg.files.clone())
                .with_exported(is_exported(&decl.name))
                .with_distance(pkg.distance)
                .with_plan(LoadPlan::Comments),
        );
        self.catalog.types.set(id.clone(), Arc::clone(&entity));
        if let Some(TypeDesc::Signature { type_params, .. }) = self.export.table.get(decl.sig)
            && !self.attach_type_params(&entity, type_params)
        {
            self.catalog.types.delete(&id);
            return None;
        }
        Some(entity)
    }

    // ------------------------------------------------------------------
    // Support
    // ------------------------------------------------------------------

    /// Files and distance of the declaring package, when registered.
    pub(crate) fn package_info(&self, path: &str) -> (Vec<String>, u32) {
        match self.catalog.packages.get(path) {
            Some(pkg) => (pkg.files.clone(), pkg.distance),
            None => (Vec::new(), 0),
        }
    }

    fn enter(&self, ty: Ty, id: &str) -> Option<ProgressGuard<'_, 'a>> {
        let inserted = self
            .in_progress
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(ty);
        if !inserted {
            warn!(%id, "named cycle not breakable by interning; dropped");
            return None;
        }
        Some(ProgressGuard { resolver: self, ty })
    }
}

/// Removes the in-progress marker when a named resolution unwinds.
struct ProgressGuard<'r, 'a> {
    resolver: &'r Resolver<'a>,
    ty: Ty,
}

impl Drop for ProgressGuard<'_, '_> {
    fn drop(&mut self) {
        self.resolver
            .in_progress
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.ty);
    }
}

/// A type argument pair used by the instantiation handler.
pub(crate) type TypeArgs = SmallVec<[tyscan_catalog::TypeArg; 2]>;
