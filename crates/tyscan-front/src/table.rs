//! Type descriptor arena.
//!
//! `TypeTable` owns every `TypeDesc` the frontend produced; descriptors
//! refer to each other by `Ty` handle. Allocation is append-only and
//! handles stay stable, so a named node can be allocated before its
//! underlying shape exists and patched once the shape is built. That is
//! what makes cyclic declarations (`type Node struct { Next *Node }`)
//! representable in a flat, serializable arena.

use serde::{Deserialize, Serialize};

use crate::desc::{
    BasicKind, ChanDir, FieldDesc, MethodDesc, NamedDesc, ParamDesc, TypeDesc, UnionTermDesc,
};

/// Handle of a descriptor in a `TypeTable`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ty(pub u32);

/// Arena of raw type descriptors.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TypeTable {
    nodes: Vec<TypeDesc>,
}

impl TypeTable {
    pub fn new() -> Self {
        TypeTable { nodes: Vec::new() }
    }

    /// Number of descriptors in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a descriptor. Returns `None` for a handle from another table.
    pub fn get(&self, ty: Ty) -> Option<&TypeDesc> {
        self.nodes.get(ty.0 as usize)
    }

    /// Allocate a descriptor and return its handle.
    pub fn alloc(&mut self, desc: TypeDesc) -> Ty {
        let ty = Ty(self.nodes.len() as u32);
        self.nodes.push(desc);
        ty
    }

    /// Replace the descriptor at `ty` wholesale.
    pub fn patch(&mut self, ty: Ty, desc: TypeDesc) {
        self.nodes[ty.0 as usize] = desc;
    }

    // ------------------------------------------------------------------
    // Construction helpers. These are the programmatic frontend API: a
    // checker integration (or a test fixture) builds its descriptor graph
    // through them instead of assembling `TypeDesc` values by hand.
    // ------------------------------------------------------------------

    pub fn basic(&mut self, kind: BasicKind) -> Ty {
        self.alloc(TypeDesc::Basic(kind))
    }

    pub fn pointer(&mut self, elem: Ty) -> Ty {
        self.alloc(TypeDesc::Pointer { elem })
    }

    pub fn slice(&mut self, elem: Ty) -> Ty {
        self.alloc(TypeDesc::Slice { elem })
    }

    pub fn array(&mut self, elem: Ty, len: u64) -> Ty {
        self.alloc(TypeDesc::Array { elem, len })
    }

    pub fn map(&mut self, key: Ty, value: Ty) -> Ty {
        self.alloc(TypeDesc::Map { key, value })
    }

    pub fn chan(&mut self, elem: Ty, dir: ChanDir) -> Ty {
        self.alloc(TypeDesc::Chan { elem, dir })
    }

    pub fn strukt(&mut self, fields: Vec<FieldDesc>) -> Ty {
        self.alloc(TypeDesc::Struct { fields })
    }

    pub fn interface(&mut self, embeds: Vec<Ty>, methods: Vec<MethodDesc>) -> Ty {
        self.alloc(TypeDesc::Interface { embeds, methods })
    }

    pub fn signature(&mut self, params: Vec<ParamDesc>, results: Vec<ParamDesc>) -> Ty {
        self.generic_signature(params, results, Vec::new())
    }

    pub fn generic_signature(
        &mut self,
        params: Vec<ParamDesc>,
        results: Vec<ParamDesc>,
        type_params: Vec<Ty>,
    ) -> Ty {
        let variadic = params.last().is_some_and(|p| p.variadic);
        self.alloc(TypeDesc::Signature {
            params,
            results,
            variadic,
            type_params,
        })
    }

    pub fn type_param(&mut self, index: u32, name: impl Into<String>, constraint: Ty) -> Ty {
        self.alloc(TypeDesc::TypeParam {
            index,
            name: name.into(),
            constraint,
        })
    }

    pub fn union(&mut self, terms: Vec<UnionTermDesc>) -> Ty {
        self.alloc(TypeDesc::Union { terms })
    }

    pub fn alias(&mut self, pkg: impl Into<String>, name: impl Into<String>, target: Ty) -> Ty {
        self.alloc(TypeDesc::Alias {
            pkg: pkg.into(),
            name: name.into(),
            target,
        })
    }

    /// Allocate a named declaration whose underlying shape is not known
    /// yet. Patch it in later with `set_underlying`.
    pub fn declare_named(&mut self, pkg: impl Into<String>, name: impl Into<String>) -> Ty {
        self.alloc(TypeDesc::Named(NamedDesc {
            pkg: pkg.into(),
            name: name.into(),
            underlying: None,
            type_params: Vec::new(),
            type_args: Vec::new(),
            origin: None,
            methods: Vec::new(),
            invalid: false,
        }))
    }

    /// Allocate a named declaration with its underlying shape.
    pub fn named(&mut self, pkg: impl Into<String>, name: impl Into<String>, underlying: Ty) -> Ty {
        let ty = self.declare_named(pkg, name);
        self.set_underlying(ty, underlying);
        ty
    }

    /// Patch the underlying shape of a named declaration.
    ///
    /// # Panics
    /// Panics if `ty` is not a `Named` descriptor; that is a frontend bug,
    /// not an input condition.
    pub fn set_underlying(&mut self, ty: Ty, underlying: Ty) {
        match &mut self.nodes[ty.0 as usize] {
            TypeDesc::Named(named) => named.underlying = Some(underlying),
            other => panic!("set_underlying on non-named descriptor {}", other.kind_name()),
        }
    }

    /// Attach type parameters to a parametric named declaration.
    pub fn set_type_params(&mut self, ty: Ty, params: Vec<Ty>) {
        match &mut self.nodes[ty.0 as usize] {
            TypeDesc::Named(named) => named.type_params = params,
            other => panic!("set_type_params on non-named descriptor {}", other.kind_name()),
        }
    }

    /// Attach a method to a named declaration.
    pub fn add_method(&mut self, ty: Ty, method: MethodDesc) {
        match &mut self.nodes[ty.0 as usize] {
            TypeDesc::Named(named) => named.methods.push(method),
            other => panic!("add_method on non-named descriptor {}", other.kind_name()),
        }
    }

    /// Allocate an instantiation of a parametric named declaration with the
    /// given ordered concrete arguments.
    pub fn instantiate(&mut self, origin: Ty, args: Vec<Ty>) -> Ty {
        let TypeDesc::Named(base) = &self.nodes[origin.0 as usize] else {
            panic!("instantiate on non-named descriptor");
        };
        let desc = NamedDesc {
            pkg: base.pkg.clone(),
            name: base.name.clone(),
            underlying: base.underlying,
            type_params: base.type_params.clone(),
            type_args: args,
            origin: Some(origin),
            methods: base.methods.clone(),
            invalid: false,
        };
        self.alloc(TypeDesc::Named(desc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_get() {
        let mut table = TypeTable::new();
        let int = table.basic(BasicKind::Int);
        assert_eq!(table.get(int), Some(&TypeDesc::Basic(BasicKind::Int)));
        assert!(table.get(Ty(99)).is_none());
    }

    #[test]
    fn test_cyclic_named_patch() {
        // type Node struct { Next *Node }
        let mut table = TypeTable::new();
        let node = table.declare_named("pkg", "Node");
        let ptr = table.pointer(node);
        let body = table.strukt(vec![FieldDesc::new("Next", ptr)]);
        table.set_underlying(node, body);

        let TypeDesc::Named(named) = table.get(node).unwrap() else {
            panic!("expected named");
        };
        assert_eq!(named.underlying, Some(body));
    }

    #[test]
    fn test_signature_variadic_from_last_param() {
        let mut table = TypeTable::new();
        let int = table.basic(BasicKind::Int);
        let sig = table.signature(
            vec![ParamDesc::new("a", int), ParamDesc::variadic("rest", int)],
            vec![],
        );
        let TypeDesc::Signature { variadic, .. } = table.get(sig).unwrap() else {
            panic!("expected signature");
        };
        assert!(variadic);
    }
}
