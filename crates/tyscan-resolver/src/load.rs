//! Loader execution.
//!
//! The orchestrator's fixpoint pass calls `Resolver::fire` for every
//! interned entity. A fire claims the entity's single-shot plan, attaches
//! comments, and runs the kind-specific expansion. Loaders do not fire
//! the loaders of child types; the two sanctioned exceptions are the
//! alias cascade and embedded-member promotion, neither of which can
//! cycle (alias loops are rejected at resolution, by-value embedding is
//! acyclic, and a self-embedded pointer hits the single-fire guard and
//! simply finds no members yet).

use std::sync::Arc;

use tracing::warn;

use tyscan_catalog::{Entity, EntityData, EntityKind, Field, LoadPlan, TypeRef};
use tyscan_common::ScanMode;
use tyscan_front::{MethodDesc, NamedDesc, TypeDesc, Ty, is_exported};

use crate::ident::UnnamedKind;
use crate::resolve::Resolver;
use crate::signature::process_signature;

impl Resolver<'_> {
    /// Fire an entity's loader. No-op when it already fired or is firing
    /// on another thread; a failure is captured on the entity and the
    /// scan continues.
    pub fn fire(&self, entity: &Arc<Entity>) {
        let Some(plan) = entity.begin_load() else {
            return;
        };
        let result = self.execute_plan(entity, &plan);
        if let Err(message) = &result {
            warn!(id = %entity.id, %message, "loader failed");
        }
        entity.finish_load(result);
    }

    fn execute_plan(&self, entity: &Arc<Entity>, plan: &LoadPlan) -> Result<(), String> {
        self.attach_comments(entity);
        let LoadPlan::Expand { origin } = plan else {
            return Ok(());
        };
        match entity.kind {
            EntityKind::Struct => {
                self.extract_methods(entity, *origin)?;
                self.fill_struct(entity, *origin)
            }
            EntityKind::Interface => self.fill_interface(entity, *origin),
            EntityKind::Alias => {
                // Cascade into the underlying type's loader.
                if let EntityData::Alias {
                    underlying: TypeRef::Named(id),
                } = &entity.data
                    && let Some(underlying) = self.catalog.types.get(id)
                {
                    self.fire(&underlying);
                }
                Ok(())
            }
            // Named basics, pointers, sequences, maps, chans, and named
            // function types only have methods to expand.
            _ => self.extract_methods(entity, *origin),
        }
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    /// Attach comments recorded in the package registry for this entity.
    /// In-package comments are gated on the comments bit, dependency docs
    /// on the docs bit (loading them on first need).
    pub(crate) fn attach_comments(&self, entity: &Entity) {
        let Some(path) = entity.package.as_deref() else {
            return;
        };
        if entity.distance == 0 {
            if !self.mode.contains(ScanMode::COMMENTS) {
                return;
            }
        } else {
            if !self.mode.contains(ScanMode::DOCS) {
                return;
            }
            if let Some(docs) = self.docs {
                docs.ensure_package_docs(path);
            }
        }
        let Some(pkg) = self.catalog.packages.get(path) else {
            return;
        };
        entity.add_comments(pkg.get_comments(&entity.name));
    }

    fn member_comments(&self, parent: &Entity, member: &str) -> Vec<tyscan_common::Comment> {
        let Some(path) = parent.package.as_deref() else {
            return Vec::new();
        };
        let allowed = if parent.distance == 0 {
            self.mode.contains(ScanMode::COMMENTS)
        } else {
            self.mode.contains(ScanMode::DOCS)
        };
        if !allowed {
            return Vec::new();
        }
        match self.catalog.packages.get(path) {
            Some(pkg) => pkg.get_comments(&format!("{}.{}", parent.name, member)),
            None => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Method extraction
    // ------------------------------------------------------------------

    /// Extract declared methods of a named type onto its entity.
    fn extract_methods(&self, entity: &Arc<Entity>, origin: Ty) -> Result<(), String> {
        if !self.mode.contains(ScanMode::METHODS) {
            return Ok(());
        }
        let Some(TypeDesc::Named(named)) = self.export.table.get(origin) else {
            // Unnamed origins have no method set.
            return Ok(());
        };
        for method in &named.methods {
            if let Some(built) = self.method_entity(entity, method, true) {
                entity.add_method(built);
            }
        }
        Ok(())
    }

    /// Build one method entity attached to `parent`. Returns `None` for
    /// skipped (unexported) or unresolvable methods.
    fn method_entity(
        &self,
        parent: &Arc<Entity>,
        method: &MethodDesc,
        with_receiver: bool,
    ) -> Option<Arc<Entity>> {
        if !self.include_unexported && !is_exported(&method.name) {
            return None;
        }
        let mut data = process_signature(self, method.sig).or_else(|| {
            warn!(parent = %parent.id, method = %method.name, "method signature dropped");
            None
        })?;
        if with_receiver {
            data.receiver = Some(TypeRef::Named(parent.id.clone()));
            data.pointer_receiver = method.pointer_recv;
        }
        let id = Entity::member_id(&parent.id, &method.name);
        let entity = Entity::new(
            id.as_str(),
            method.name.as_str(),
            EntityKind::Method,
            EntityData::Func(Box::new(data)),
        )
        .with_named(true)
        .with_files(parent.files.clone())
        .with_exported(is_exported(&method.name))
        .with_distance(parent.distance);
        let entity = match parent.package.as_deref() {
            Some(path) => entity.with_package(path),
            None => entity,
        };
        entity.add_comments(self.member_comments(parent, &method.name));
        Some(Arc::new(entity))
    }

    // ------------------------------------------------------------------
    // Interface expansion
    // ------------------------------------------------------------------

    /// Append embeds and method declarations of an interface.
    pub(crate) fn fill_interface(&self, entity: &Arc<Entity>, origin: Ty) -> Result<(), String> {
        let (embeds, methods) = self.interface_parts(origin)?;

        for embed in embeds {
            match self.resolve(embed) {
                Some(resolved) => entity.add_embed(self.make_ref(&resolved)),
                None => warn!(id = %entity.id, "interface embed dropped"),
            }
        }
        if self.mode.contains(ScanMode::METHODS) {
            for method in &methods {
                if let Some(built) = self.method_entity(entity, method, false) {
                    entity.add_method(built);
                }
            }
        }
        Ok(())
    }

    fn interface_parts(&self, origin: Ty) -> Result<(Vec<Ty>, Vec<MethodDesc>), String> {
        let mut ty = origin;
        // A named origin points at its declaration; walk to the shape.
        loop {
            match self.export.table.get(ty) {
                Some(TypeDesc::Interface { embeds, methods }) => {
                    return Ok((embeds.clone(), methods.clone()));
                }
                Some(TypeDesc::Named(NamedDesc {
                    underlying: Some(underlying),
                    ..
                })) => ty = *underlying,
                Some(TypeDesc::Alias { target, .. }) => ty = *target,
                _ => return Err("interface origin lost its shape".to_string()),
            }
        }
    }

    // ------------------------------------------------------------------
    // Struct expansion
    // ------------------------------------------------------------------

    /// Append fields of a struct: plain fields directly, embedded
    /// declarations as promoted copies of the embedded type's members.
    pub(crate) fn fill_struct(&self, entity: &Arc<Entity>, origin: Ty) -> Result<(), String> {
        if !self.mode.contains(ScanMode::FIELDS) {
            return Ok(());
        }
        let fields = self.struct_fields(origin)?;

        for field in &fields {
            let (base, depth) = self.fold_pointer(field.ty);
            if field.embedded {
                let Some(embedded) = self.resolve(base) else {
                    warn!(id = %entity.id, field = %field.name, "embedded type dropped");
                    continue;
                };
                let base_ref = self.make_ref(&embedded);
                let embed_ref = if depth > 0 {
                    TypeRef::Inline(Arc::new(Entity::new(
                        self.counters.next(UnnamedKind::Pointer),
                        self.printer().print(field.ty),
                        EntityKind::Pointer,
                        EntityData::Pointer {
                            elem: base_ref,
                            depth,
                        },
                    )))
                } else {
                    base_ref
                };
                entity.add_embed(embed_ref.clone());
                self.promote_members(entity, &embedded, &embed_ref);
            } else {
                if !self.include_unexported && !is_exported(&field.name) {
                    continue;
                }
                let Some(ty) = self.resolve_element(field.ty) else {
                    warn!(id = %entity.id, field = %field.name, "field type dropped");
                    continue;
                };
                entity.add_field(Field {
                    id: Entity::member_id(&entity.id, &field.name),
                    name: field.name.clone(),
                    ty,
                    tag: field.tag.clone(),
                    parent: entity.id.clone(),
                    promoted_from: None,
                    exported: is_exported(&field.name),
                });
            }
        }
        Ok(())
    }

    fn struct_fields(&self, origin: Ty) -> Result<Vec<tyscan_front::FieldDesc>, String> {
        let mut ty = origin;
        loop {
            match self.export.table.get(ty) {
                Some(TypeDesc::Struct { fields }) => return Ok(fields.clone()),
                Some(TypeDesc::Named(NamedDesc {
                    underlying: Some(underlying),
                    ..
                })) => ty = *underlying,
                Some(TypeDesc::Alias { target, .. }) => ty = *target,
                _ => return Err("struct origin lost its shape".to_string()),
            }
        }
    }

    /// Copy the embedded entity's fields and methods onto the embedding
    /// struct as promoted members. The embedded occurrence itself is not
    /// emitted as a plain field. Members shadowed by a declaration on the
    /// embedding struct are skipped.
    fn promote_members(&self, entity: &Arc<Entity>, embedded: &Arc<Entity>, embed_ref: &TypeRef) {
        // The embedded type's own members must exist before they can be
        // copied; its loader is single-fire, so a self-referential embed
        // finds an empty member list instead of recursing.
        self.fire(embedded);

        let own_fields: Vec<String> = entity.fields().iter().map(|f| f.name.clone()).collect();
        for field in embedded.fields() {
            if own_fields.contains(&field.name) {
                continue;
            }
            entity.add_field(Field {
                id: Entity::member_id(&entity.id, &field.name),
                name: field.name.clone(),
                ty: field.ty.clone(),
                tag: field.tag.clone(),
                parent: entity.id.clone(),
                promoted_from: Some(embed_ref.clone()),
                exported: field.exported,
            });
        }

        let own_methods: Vec<String> =
            entity.methods().iter().map(|m| m.name.clone()).collect();
        for method in embedded.methods() {
            if own_methods.contains(&method.name) {
                continue;
            }
            let EntityData::Func(data) = &method.data else {
                continue;
            };
            let mut data = (**data).clone();
            data.promoted_from = Some(embed_ref.clone());
            data.receiver = Some(TypeRef::Named(entity.id.clone()));
            let promoted = Entity::new(
                Entity::member_id(&entity.id, &method.name),
                method.name.as_str(),
                EntityKind::Method,
                EntityData::Func(Box::new(data)),
            )
            .with_named(true)
            .with_files(entity.files.clone())
            .with_exported(method.exported)
            .with_distance(entity.distance);
            let promoted = match entity.package.as_deref() {
                Some(path) => promoted.with_package(path),
                None => promoted,
            };
            promoted.add_comments(method.comments());
            entity.add_method(Arc::new(promoted));
        }
    }
}
