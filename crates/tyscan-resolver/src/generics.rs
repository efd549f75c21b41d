//! Generic instantiation.
//!
//! An instantiated parametric type resolves to an `Instantiated` entity:
//! the origin is resolved (and interned) first, then each concrete
//! argument, and the entity records the ordered `(param, index, concrete)`
//! triples. The origin keeps its type-parameter placeholders in memory so
//! one parametric declaration serves every instantiation; parameter
//! substitution happens during serialization as a tree rewrite.
//!
//! A concrete argument may itself be an instantiation; nothing here
//! special-cases that.

use std::sync::Arc;

use tracing::warn;

use tyscan_catalog::{Entity, EntityData, EntityKind, LoadPlan, TypeArg, TypeRef};
use tyscan_front::{NamedDesc, TypeDesc, Ty, is_exported};

use crate::resolve::{Resolver, TypeArgs};

/// Resolve an instantiation (`origin` + ordered concrete args).
pub(crate) fn resolve_instantiated(
    resolver: &Resolver<'_>,
    ty: Ty,
    named: &NamedDesc,
) -> Option<Arc<Entity>> {
    let printer = resolver.printer();
    let printed_args: Vec<String> = named.type_args.iter().map(|a| printer.print(*a)).collect();
    let id = format!(
        "{}.{}[{}]",
        named.pkg,
        named.name,
        printed_args.join(",")
    );
    if let Some(existing) = resolver.catalog.types.get(&id) {
        return Some(existing);
    }

    let Some(origin_ty) = named.origin else {
        warn!(%id, "instantiation without an origin descriptor");
        return None;
    };
    // Intern the parametric definition first.
    let origin = resolver.resolve(origin_ty)?;

    let param_names = origin_param_names(resolver, origin_ty);
    let mut args = TypeArgs::new();
    for (index, arg_ty) in named.type_args.iter().enumerate() {
        let concrete = resolver.resolve(*arg_ty)?;
        let name = param_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("T{index}"));
        args.push(TypeArg {
            name,
            index: index as u32,
            ty: resolver.make_ref(&concrete),
        });
    }

    let (files, distance) = resolver.package_info(&named.pkg);
    let display = format!("{}[{}]", named.name, printed_args.join(", "));
    let entity = Arc::new(
        Entity::new(
            id.as_str(),
            display.as_str(),
            EntityKind::Instantiated,
            EntityData::Instantiated {
                origin: TypeRef::Named(origin.id.clone()),
                type_args: args,
            },
        )
        .with_named(true)
        .with_package(named.pkg.as_str())
        .with_files(files)
        .with_exported(is_exported(&named.name))
        .with_distance(distance)
        .with_plan(LoadPlan::Comments),
    );
    resolver.catalog.types.set(id, Arc::clone(&entity));
    Some(entity)
}

/// Names of the origin's type parameters, in declaration order.
fn origin_param_names(resolver: &Resolver<'_>, origin: Ty) -> Vec<String> {
    let Some(TypeDesc::Named(named)) = resolver.export.table.get(origin) else {
        return Vec::new();
    };
    named
        .type_params
        .iter()
        .filter_map(|tp| match resolver.export.table.get(*tp) {
            Some(TypeDesc::TypeParam { name, .. }) => Some(name.clone()),
            _ => None,
        })
        .collect()
}
