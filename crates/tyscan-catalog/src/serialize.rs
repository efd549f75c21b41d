//! Structural serialization of the catalog.
//!
//! Layout rules:
//! - Named children serialize as references (`{"$ref": id}`); unnamed
//!   composites serialize inline at each occurrence.
//! - Key insertion order is fixed by this module and `serde_json` keeps
//!   it, so the same catalog always serializes to the same bytes.
//! - Instantiated generics copy their origin's shape parts and rewrite
//!   the copied tree, replacing every `type_parameter` node bound by the
//!   instantiation with the concrete argument's serialization. The
//!   in-memory origin keeps its placeholders; substitution is a pure tree
//!   rewrite performed here.

use serde_json::{Map, Value, json};
use tracing::warn;

use crate::entity::{Entity, EntityData, EntityKind, Field, Param, TypeArg, TypeRef};
use crate::store::Catalog;

/// Catalog serializer.
pub struct Serializer<'a> {
    catalog: &'a Catalog,
}

impl<'a> Serializer<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Serializer { catalog }
    }

    /// Serialize the whole catalog: types sorted by id, values and
    /// packages in insertion order.
    pub fn snapshot(&self) -> Value {
        let mut types = Map::new();
        for id in self.catalog.types.keys_sorted() {
            if let Some(entity) = self.catalog.types.get(&id) {
                types.insert(id, self.entity(&entity));
            }
        }

        let mut values = Map::new();
        self.catalog.values.range(|id, entity| {
            values.insert(id.to_string(), self.entity(entity));
            true
        });

        let mut packages = Map::new();
        self.catalog.packages.range(|path, package| {
            packages.insert(path.to_string(), package.serialize());
            true
        });

        json!({
            "types": Value::Object(types),
            "values": Value::Object(values),
            "packages": Value::Object(packages),
        })
    }

    /// Full serialization of one entity.
    pub fn entity(&self, entity: &Entity) -> Value {
        let mut map = self.envelope(entity);
        match &entity.data {
            EntityData::Basic { underlying } => {
                map.insert("underlying".into(), self.opt_ref(underlying.as_ref()));
            }
            EntityData::Pointer { elem, depth } => {
                map.insert("element".into(), self.type_ref(elem));
                map.insert("depth".into(), json!(depth));
            }
            EntityData::Sequence { elem, len } => {
                map.insert("element".into(), self.type_ref(elem));
                map.insert("length".into(), json!(len));
            }
            EntityData::Map { key, value } => {
                map.insert("key".into(), self.type_ref(key));
                map.insert("value".into(), self.type_ref(value));
            }
            EntityData::Chan { elem, dir } => {
                map.insert("element".into(), self.type_ref(elem));
                map.insert("direction".into(), json!(dir));
            }
            EntityData::Alias { underlying } => {
                map.insert("underlying".into(), self.type_ref(underlying));
            }
            EntityData::Interface { .. } => {
                self.put_composite(&mut map, entity, false);
            }
            EntityData::Struct { .. } => {
                self.put_composite(&mut map, entity, true);
            }
            EntityData::Func(func) => {
                map.insert(
                    "parameters".into(),
                    Value::Array(func.params.iter().map(|p| self.param(p)).collect()),
                );
                map.insert(
                    "results".into(),
                    Value::Array(func.results.iter().map(|p| self.param(p)).collect()),
                );
                map.insert("variadic".into(), json!(func.variadic));
                map.insert("structure".into(), json!(func.structure));
                self.put_type_params(&mut map, entity);
                if entity.kind == EntityKind::Method {
                    map.insert(
                        "receiver".into(),
                        func.receiver
                            .as_ref()
                            .map_or(Value::Null, |r| self.type_ref(r)),
                    );
                    map.insert("pointer_receiver".into(), json!(func.pointer_receiver));
                    map.insert(
                        "promoted_from".into(),
                        self.opt_ref(func.promoted_from.as_ref()),
                    );
                }
            }
            EntityData::Const {
                value,
                value_type,
                parent,
            } => {
                map.insert("value".into(), json!(value));
                map.insert("value_type".into(), self.type_ref(value_type));
                map.insert("parent".into(), self.opt_ref(parent.as_ref()));
            }
            EntityData::Var { value_type } => {
                map.insert("value_type".into(), self.type_ref(value_type));
            }
            EntityData::TypeParam { index, constraint } => {
                map.insert("index".into(), json!(index));
                map.insert("constraint".into(), self.type_ref(constraint));
            }
            EntityData::Union { terms } => {
                let terms: Vec<Value> = terms
                    .iter()
                    .map(|t| {
                        json!({
                            "type": self.type_ref(&t.ty),
                            "approximation": t.approximation,
                        })
                    })
                    .collect();
                map.insert("terms".into(), Value::Array(terms));
            }
            EntityData::Instantiated { origin, type_args } => {
                return self.instantiated(entity, origin, type_args);
            }
        }
        Value::Object(map)
    }

    /// Reference-or-inline serialization of a type position.
    pub fn type_ref(&self, type_ref: &TypeRef) -> Value {
        match type_ref {
            TypeRef::Named(id) => json!({"$ref": id}),
            TypeRef::Inline(entity) => self.entity(entity),
        }
    }

    fn opt_ref(&self, type_ref: Option<&TypeRef>) -> Value {
        type_ref.map_or(Value::Null, |r| self.type_ref(r))
    }

    fn envelope(&self, entity: &Entity) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("id".into(), json!(entity.id));
        map.insert("name".into(), json!(entity.name));
        map.insert("kind".into(), json!(entity.kind.tag()));
        map.insert("named".into(), json!(entity.named));
        map.insert("exported".into(), json!(entity.exported));
        map.insert(
            "package".into(),
            entity.package.as_deref().map_or(Value::Null, |p| json!(p)),
        );
        map.insert("distance".into(), json!(entity.distance));
        map.insert("files".into(), json!(entity.files));
        let comments: Vec<Value> = entity
            .comments()
            .iter()
            .map(|c| json!({"text": c.text, "placement": c.placement}))
            .collect();
        map.insert("comments".into(), Value::Array(comments));
        map
    }

    fn put_composite(&self, map: &mut Map<String, Value>, entity: &Entity, with_fields: bool) {
        let embeds: Vec<Value> = entity.embeds().iter().map(|e| self.type_ref(e)).collect();
        map.insert("embeds".into(), Value::Array(embeds));
        if with_fields {
            let fields: Vec<Value> = entity.fields().iter().map(|f| self.field(f)).collect();
            map.insert("fields".into(), Value::Array(fields));
        }
        let methods: Vec<Value> = entity
            .methods()
            .iter()
            .map(|m| self.entity(m))
            .collect();
        map.insert("methods".into(), Value::Array(methods));
        self.put_type_params(map, entity);
    }

    fn put_type_params(&self, map: &mut Map<String, Value>, entity: &Entity) {
        let params: Vec<Value> = entity
            .type_params()
            .iter()
            .map(|p| self.entity(p))
            .collect();
        map.insert("type_params".into(), Value::Array(params));
    }

    fn field(&self, field: &Field) -> Value {
        json!({
            "id": field.id,
            "name": field.name,
            "type": self.type_ref(&field.ty),
            "tag": field.tag,
            "parent": field.parent,
            "promoted_from": self.opt_ref(field.promoted_from.as_ref()),
            "exported": field.exported,
        })
    }

    fn param(&self, param: &Param) -> Value {
        let mut map = Map::new();
        map.insert("name".into(), json!(param.name));
        map.insert("type".into(), self.type_ref(&param.ty));
        if param.variadic {
            map.insert("variadic".into(), json!(true));
        }
        Value::Object(map)
    }

    /// Serialize an instantiated generic: copy the origin's shape parts,
    /// then rewrite bound type parameters to the concrete arguments.
    fn instantiated(&self, entity: &Entity, origin: &TypeRef, type_args: &[TypeArg]) -> Value {
        let mut map = self.envelope(entity);
        map.insert("origin".into(), json!(origin.id()));

        let mut substitution: Vec<(String, Value)> = Vec::with_capacity(type_args.len());
        let mut args = Vec::with_capacity(type_args.len());
        for arg in type_args {
            let concrete = self.type_ref(&arg.ty);
            substitution.push((arg.name.clone(), concrete.clone()));
            args.push(json!({
                "name": arg.name,
                "index": arg.index,
                "type": concrete,
            }));
        }
        map.insert("type_args".into(), Value::Array(args));

        let origin_entity = match origin {
            TypeRef::Named(id) => self.catalog.types.get(id),
            TypeRef::Inline(entity) => {
                warn!(origin = origin.id(), "instantiated generic with inline origin");
                Some(std::sync::Arc::clone(entity))
            }
        };
        let Some(origin_entity) = origin_entity else {
            warn!(
                origin = origin.id(),
                "origin of instantiated generic not in catalog"
            );
            return Value::Object(map);
        };

        // Copy the origin's shape parts, leaving out its envelope.
        let origin_value = self.entity(&origin_entity);
        if let Value::Object(origin_map) = origin_value {
            for (key, value) in origin_map {
                match key.as_str() {
                    "fields" | "methods" | "embeds" | "element" | "key" | "value"
                    | "underlying" | "parameters" | "results" | "variadic" | "structure"
                    | "length" | "direction" | "depth" => {
                        map.insert(key, substitute(value, &substitution));
                    }
                    _ => {}
                }
            }
        }

        Value::Object(map)
    }
}

/// Rewrite a serialized tree: every object node with
/// `kind == "type_parameter"` whose id is bound in `substitution` is
/// replaced wholesale by the bound concrete serialization.
pub fn substitute(value: Value, substitution: &[(String, Value)]) -> Value {
    match value {
        Value::Object(map) => {
            if map.get("kind").and_then(Value::as_str) == Some("type_parameter")
                && let Some(id) = map.get("id").and_then(Value::as_str)
                && let Some((_, concrete)) = substitution.iter().find(|(name, _)| name == id)
            {
                return concrete.clone();
            }
            let rewritten: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, substitute(v, substitution)))
                .collect();
            Value::Object(rewritten)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| substitute(v, substitution))
                .collect(),
        ),
        other => other,
    }
}
