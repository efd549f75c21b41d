use std::sync::Arc;

use serde_json::json;
use tyscan_catalog::{Catalog, EntityData, EntityKind, PackageEntity, Serializer};
use tyscan_common::ScanMode;
use tyscan_front::{
    BasicKind, FieldDesc, FrontendExport, MethodDesc, Package, ParamDesc, TypeTable, Ty,
    UnionTermDesc,
};

use crate::Resolver;

const PKG: &str = "example.com/demo";

fn export_with(table: TypeTable) -> FrontendExport {
    FrontendExport::new(table, vec![Package::new(PKG, "demo")])
}

fn catalog_with_pkg() -> Arc<Catalog> {
    let catalog = Arc::new(Catalog::new());
    catalog.packages.set(
        PKG,
        Arc::new(PackageEntity::new(PKG, "demo").with_files(vec!["demo.go".to_string()])),
    );
    catalog
}

/// type GenericStruct[T any] struct { Value T }
/// func (g *GenericStruct[T]) GetValue() T
fn generic_struct(table: &mut TypeTable) -> (Ty, Ty) {
    let any = table.basic(BasicKind::Any);
    let origin = table.declare_named(PKG, "GenericStruct");
    let t = table.type_param(0, "T", any);
    let body = table.strukt(vec![FieldDesc::new("Value", t)]);
    table.set_underlying(origin, body);
    table.set_type_params(origin, vec![t]);
    let get_sig = table.signature(vec![], vec![ParamDesc::new("", t)]);
    table.add_method(origin, MethodDesc::pointer("GetValue", get_sig));
    (origin, t)
}

#[test]
fn test_parametric_origin_carries_type_params() {
    let mut table = TypeTable::new();
    let (origin, _) = generic_struct(&mut table);

    let export = export_with(table);
    let catalog = catalog_with_pkg();
    let resolver = Resolver::new(&export, Arc::clone(&catalog), ScanMode::DEFAULT);

    let entity = resolver.resolve(origin).unwrap();
    assert_eq!(entity.kind, EntityKind::Struct);
    let params = entity.type_params();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name, "T");
    assert_eq!(params[0].kind, EntityKind::TypeParameter);
    let EntityData::TypeParam { index, constraint } = &params[0].data else {
        panic!("expected type param data");
    };
    assert_eq!(*index, 0);
    assert_eq!(constraint.id(), "any");
}

#[test]
fn test_instantiation_records_origin_and_args() {
    let mut table = TypeTable::new();
    let (origin, _) = generic_struct(&mut table);
    let string = table.basic(BasicKind::String);
    let inst = table.instantiate(origin, vec![string]);

    let export = export_with(table);
    let catalog = catalog_with_pkg();
    let resolver = Resolver::new(&export, Arc::clone(&catalog), ScanMode::DEFAULT);

    let entity = resolver.resolve(inst).unwrap();
    assert_eq!(entity.kind, EntityKind::Instantiated);
    assert_eq!(entity.id, "example.com/demo.GenericStruct[string]");
    assert_eq!(entity.name, "GenericStruct[string]");
    let EntityData::Instantiated { origin, type_args } = &entity.data else {
        panic!("expected instantiated data");
    };
    assert_eq!(origin.id(), "example.com/demo.GenericStruct");
    assert_eq!(type_args.len(), 1);
    assert_eq!(type_args[0].name, "T");
    assert_eq!(type_args[0].index, 0);
    assert_eq!(type_args[0].ty.id(), "string");

    // The parametric definition was interned alongside.
    assert!(catalog.types.contains("example.com/demo.GenericStruct"));
}

#[test]
fn test_one_origin_serves_all_instantiations() {
    let mut table = TypeTable::new();
    let (origin, _) = generic_struct(&mut table);
    let string = table.basic(BasicKind::String);
    let int = table.basic(BasicKind::Int);
    let inst_s = table.instantiate(origin, vec![string]);
    let inst_i = table.instantiate(origin, vec![int]);

    let export = export_with(table);
    let catalog = catalog_with_pkg();
    let resolver = Resolver::new(&export, Arc::clone(&catalog), ScanMode::DEFAULT);

    let a = resolver.resolve(inst_s).unwrap();
    let b = resolver.resolve(inst_i).unwrap();
    assert_ne!(a.id, b.id);

    let origin_a = catalog.types.get("example.com/demo.GenericStruct").unwrap();
    let origin_entity = resolver.resolve(origin).unwrap();
    assert!(Arc::ptr_eq(&origin_a, &origin_entity));
    // Origin keeps its placeholder, unsubstituted.
    let fields_origin = {
        resolver.fire(&origin_entity);
        origin_entity.fields()
    };
    assert_eq!(fields_origin[0].ty.id(), "T");
}

#[test]
fn test_substitution_during_serialization() {
    // type Alias = GenericStruct[string] — serialization must show the
    // instantiation with Value: string and GetValue() string.
    let mut table = TypeTable::new();
    let (origin, _) = generic_struct(&mut table);
    let string = table.basic(BasicKind::String);
    let inst = table.instantiate(origin, vec![string]);
    let alias = table.alias(PKG, "Alias", inst);

    let export = export_with(table);
    let catalog = catalog_with_pkg();
    let resolver = Resolver::new(&export, Arc::clone(&catalog), ScanMode::DEFAULT);

    let alias_entity = resolver.resolve(alias).unwrap();
    // Expand everything the way the fixpoint pass would.
    loop {
        let ids = catalog.types.keys_sorted();
        let mut fired = false;
        for id in ids {
            let entity = catalog.types.get(&id).unwrap();
            if !entity.loaded() {
                resolver.fire(&entity);
                fired = true;
            }
        }
        if !fired {
            break;
        }
    }

    let serializer = Serializer::new(&catalog);
    let alias_value = serializer.entity(&alias_entity);
    assert_eq!(alias_value["kind"], "alias");
    assert_eq!(
        alias_value["underlying"],
        json!({"$ref": "example.com/demo.GenericStruct[string]"})
    );

    let inst_entity = catalog
        .types
        .get("example.com/demo.GenericStruct[string]")
        .unwrap();
    let value = serializer.entity(&inst_entity);
    assert_eq!(value["kind"], "instantiated");
    assert_eq!(value["origin"], "example.com/demo.GenericStruct");
    assert_eq!(value["type_args"][0]["name"], "T");
    assert_eq!(value["type_args"][0]["index"], 0);
    assert_eq!(value["type_args"][0]["type"], json!({"$ref": "string"}));

    // Field type substituted from T to string.
    assert_eq!(value["fields"][0]["name"], "Value");
    assert_eq!(value["fields"][0]["type"], json!({"$ref": "string"}));

    // Method result substituted as well.
    let methods = value["methods"].as_array().unwrap();
    let get_value = methods
        .iter()
        .find(|m| m["name"] == "GetValue")
        .expect("GetValue method present");
    assert_eq!(get_value["results"][0]["type"], json!({"$ref": "string"}));
    assert_eq!(get_value["pointer_receiver"], true);
}

#[test]
fn test_constrained_generic_union_terms() {
    // type Numeric interface { ~int | ~float64 }
    // type ConstrainedGeneric[T Numeric] struct { Value T }
    let mut table = TypeTable::new();
    let int = table.basic(BasicKind::Int);
    let f64t = table.basic(BasicKind::Float64);
    let union = table.union(vec![
        UnionTermDesc {
            ty: int,
            approx: true,
        },
        UnionTermDesc {
            ty: f64t,
            approx: true,
        },
    ]);
    let origin = table.declare_named(PKG, "ConstrainedGeneric");
    let t = table.type_param(0, "T", union);
    let body = table.strukt(vec![FieldDesc::new("Value", t)]);
    table.set_underlying(origin, body);
    table.set_type_params(origin, vec![t]);

    let export = export_with(table);
    let catalog = catalog_with_pkg();
    let resolver = Resolver::new(&export, Arc::clone(&catalog), ScanMode::DEFAULT);

    let entity = resolver.resolve(origin).unwrap();
    let params = entity.type_params();
    assert_eq!(params.len(), 1);
    let EntityData::TypeParam { constraint, .. } = &params[0].data else {
        panic!("expected type param data");
    };
    let tyscan_catalog::TypeRef::Inline(union_entity) = constraint else {
        panic!("union constraints inline");
    };
    let EntityData::Union { terms } = &union_entity.data else {
        panic!("expected union data");
    };
    assert_eq!(terms.len(), 2);
    assert!(terms.iter().all(|t| t.approximation));
    assert_eq!(terms[0].ty.id(), "int");
    assert_eq!(terms[1].ty.id(), "float64");
}

#[test]
fn test_nested_instantiation() {
    // type Box[T any] struct { Item T }
    // Box[Box[int]]
    let mut table = TypeTable::new();
    let any = table.basic(BasicKind::Any);
    let box_origin = table.declare_named(PKG, "Box");
    let t = table.type_param(0, "T", any);
    let body = table.strukt(vec![FieldDesc::new("Item", t)]);
    table.set_underlying(box_origin, body);
    table.set_type_params(box_origin, vec![t]);

    let int = table.basic(BasicKind::Int);
    let inner = table.instantiate(box_origin, vec![int]);
    let outer = table.instantiate(box_origin, vec![inner]);

    let export = export_with(table);
    let catalog = catalog_with_pkg();
    let resolver = Resolver::new(&export, Arc::clone(&catalog), ScanMode::DEFAULT);

    let entity = resolver.resolve(outer).unwrap();
    assert_eq!(
        entity.id,
        "example.com/demo.Box[example.com/demo.Box[int]]"
    );
    let EntityData::Instantiated { type_args, .. } = &entity.data else {
        panic!("expected instantiated data");
    };
    assert_eq!(type_args[0].ty.id(), "example.com/demo.Box[int]");
    assert!(catalog.types.contains("example.com/demo.Box[int]"));
}

#[test]
fn test_self_referential_constraint_terminates() {
    // type Ordered[T Ordered[T]] interface { Less(T) bool } (curiously
    // recurring constraint) must not recurse forever.
    let mut table = TypeTable::new();
    let origin = table.declare_named(PKG, "Ordered");
    let bool_ty = table.basic(BasicKind::Bool);
    let t = table.type_param(0, "T", origin);
    let less_sig = table.signature(vec![ParamDesc::new("other", t)], vec![ParamDesc::new(
        "", bool_ty,
    )]);
    let iface = table.interface(vec![], vec![MethodDesc::new("Less", less_sig)]);
    table.set_underlying(origin, iface);
    table.set_type_params(origin, vec![t]);

    let export = export_with(table);
    let catalog = catalog_with_pkg();
    let resolver = Resolver::new(&export, Arc::clone(&catalog), ScanMode::DEFAULT);

    let entity = resolver.resolve(origin).unwrap();
    let params = entity.type_params();
    assert_eq!(params.len(), 1);
    let EntityData::TypeParam { constraint, .. } = &params[0].data else {
        panic!("expected type param data");
    };
    assert_eq!(constraint.id(), "example.com/demo.Ordered");
}
