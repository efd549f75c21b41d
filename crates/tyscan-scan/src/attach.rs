//! Comment attachment.
//!
//! The attacher walks a package's syntactic declarations and records
//! comment blocks in the package registry under declaration keys:
//! `TypeName`, `TypeName.Member`, `FuncName`, `ReceiverName.FuncName`
//! (receiver name extracted ignoring pointer wrapping and type-argument
//! brackets), and the reserved `#PACKAGE_DOC` key for the file-level
//! package comment concatenated across files.
//!
//! Dependency packages are attached lazily through `LazyDocs`, memoized
//! per path so a package's files are walked at most once even when the
//! extraction finds nothing.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use tyscan_catalog::{Catalog, PACKAGE_DOC_KEY, PackageEntity};
use tyscan_common::Comment;
use tyscan_front::{Decl, FrontendExport, GroupDecl, Package};
use tyscan_resolver::DocProvider;

/// Walks parsed packages and writes their comments into the registry.
pub struct Attacher<'a> {
    export: &'a FrontendExport,
    catalog: Arc<Catalog>,
}

impl<'a> Attacher<'a> {
    pub fn new(export: &'a FrontendExport, catalog: Arc<Catalog>) -> Self {
        Attacher { export, catalog }
    }

    /// Ensure a registry entry exists for the package at `index`, without
    /// attaching comments. Used to pre-register dependencies.
    pub fn register_package(&self, index: usize) -> Arc<PackageEntity> {
        let pkg = &self.export.packages[index];
        if let Some(existing) = self.catalog.packages.get(&pkg.path) {
            return existing;
        }
        let entity = Arc::new(
            PackageEntity::new(pkg.path.as_str(), pkg.name.as_str())
                .with_distance(pkg.distance)
                .with_files(pkg.file_paths())
                .with_source(index),
        );
        self.catalog.packages.set(pkg.path.clone(), Arc::clone(&entity));
        entity
    }

    /// Register the package and attach every comment its files carry.
    pub fn attach_package(&self, index: usize) -> Arc<PackageEntity> {
        let entity = self.register_package(index);
        let pkg = &self.export.packages[index];
        self.attach_comments(pkg, &entity);
        entity
    }

    fn attach_comments(&self, pkg: &Package, entity: &Arc<PackageEntity>) {
        for file in &pkg.files {
            if !file.doc.is_empty() {
                entity.add_comments(
                    PACKAGE_DOC_KEY,
                    file.doc.iter().map(|text| Comment::package(text.as_str())).collect(),
                );
            }
            for decl in &file.decls {
                match decl {
                    Decl::Const(group) | Decl::Var(group) => {
                        self.attach_group(group, entity);
                    }
                    Decl::Type(decl) => {
                        let mut comments: Vec<Comment> =
                            decl.doc.iter().map(|text| Comment::above(text.as_str())).collect();
                        if let Some(line) = &decl.line {
                            comments.push(Comment::inline(line.as_str()));
                        }
                        entity.add_comments(decl.name.as_str(), comments);
                        for member in &decl.members {
                            let mut comments: Vec<Comment> = member
                                .doc
                                .iter()
                                .map(|text| Comment::above(text.as_str()))
                                .collect();
                            if let Some(line) = &member.line {
                                comments.push(Comment::inline(line.as_str()));
                            }
                            entity
                                .add_comments(format!("{}.{}", decl.name, member.name), comments);
                        }
                    }
                    Decl::Func(decl) => {
                        let key = match &decl.recv {
                            Some(recv) => format!("{}.{}", receiver_name(recv), decl.name),
                            None => decl.name.clone(),
                        };
                        let mut comments: Vec<Comment> =
                            decl.doc.iter().map(|text| Comment::above(text.as_str())).collect();
                        if let Some(line) = &decl.line {
                            comments.push(Comment::inline(line.as_str()));
                        }
                        entity.add_comments(key, comments);
                    }
                }
            }
        }
    }

    /// Each declared name in a const/var group receives the group's
    /// above-comment plus that spec's own above/inline comments.
    fn attach_group(&self, group: &GroupDecl, entity: &Arc<PackageEntity>) {
        for spec in &group.specs {
            for name in &spec.names {
                let mut comments: Vec<Comment> = group
                    .doc
                    .iter()
                    .map(|text| Comment::above(text.as_str()))
                    .collect();
                comments.extend(spec.doc.iter().map(|text| Comment::above(text.as_str())));
                if let Some(line) = &spec.line {
                    comments.push(Comment::inline(line.as_str()));
                }
                entity.add_comments(name.as_str(), comments);
            }
        }
    }
}

/// The receiver's type name, ignoring pointer wrapping and type-argument
/// brackets: `*GenericStruct[T]` yields `GenericStruct`.
fn receiver_name(recv: &str) -> &str {
    let name = recv.trim_start_matches('*');
    match name.find('[') {
        Some(pos) => &name[..pos],
        None => name,
    }
}

/// Lazy, memoized documentation loading for dependency packages.
pub struct LazyDocs<'a> {
    export: &'a FrontendExport,
    catalog: Arc<Catalog>,
    /// Sentinel map: present means "already attempted", successful or not,
    /// so a package's files are never walked twice.
    loaded: DashMap<String, bool>,
}

impl<'a> LazyDocs<'a> {
    pub fn new(export: &'a FrontendExport, catalog: Arc<Catalog>) -> Self {
        LazyDocs {
            export,
            catalog,
            loaded: DashMap::new(),
        }
    }
}

impl DocProvider for LazyDocs<'_> {
    fn ensure_package_docs(&self, path: &str) {
        if self.loaded.insert(path.to_string(), true).is_some() {
            return;
        }
        let Some(index) = self.export.packages.iter().position(|p| p.path == path) else {
            debug!(%path, "no parsed package for dependency docs");
            return;
        };
        debug!(%path, "loading dependency docs");
        Attacher::new(self.export, Arc::clone(&self.catalog)).attach_package(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyscan_common::Placement;
    use tyscan_front::{FuncDecl, MemberDoc, SourceFile, TypeDecl, TypeTable, ValueSpec};

    fn demo_export() -> FrontendExport {
        let mut table = TypeTable::new();
        let int = table.basic(tyscan_front::BasicKind::Int);
        let node = table.named("example.com/demo", "Node", int);
        let sig = table.signature(vec![], vec![]);

        let mut pkg = Package::new("example.com/demo", "demo");
        let mut file = SourceFile::new("demo.go");
        file.doc.push("Package demo is a fixture.".to_string());

        let mut type_decl = TypeDecl::new("Node", node);
        type_decl.doc.push("Node is a node.".to_string());
        type_decl.members.push(MemberDoc {
            name: "Next".to_string(),
            doc: vec!["Next links nodes.".to_string()],
            line: None,
        });
        file.decls.push(Decl::Type(type_decl));

        let mut group = GroupDecl {
            doc: vec!["Limits.".to_string()],
            specs: vec![ValueSpec::single("MaxDepth", Some(int), "8")],
        };
        group.specs[0].line = Some("inclusive".to_string());
        file.decls.push(Decl::Const(group));

        let mut method = FuncDecl::method("Describe", "*Node[T]", sig);
        method.doc.push("Describe renders the node.".to_string());
        file.decls.push(Decl::Func(method));

        let mut func = FuncDecl::new("New", sig);
        func.doc.push("New builds a Node.".to_string());
        file.decls.push(Decl::Func(func));

        pkg.files.push(file);
        FrontendExport::new(table, vec![pkg])
    }

    #[test]
    fn test_attach_package_records_all_keys() {
        let export = demo_export();
        let catalog = Arc::new(Catalog::new());
        let entity = Attacher::new(&export, Arc::clone(&catalog)).attach_package(0);

        let pkg_doc = entity.package_comments();
        assert_eq!(pkg_doc.len(), 1);
        assert_eq!(pkg_doc[0].placement, Placement::Package);

        assert_eq!(entity.get_comments("Node")[0].text, "Node is a node.");
        assert_eq!(
            entity.get_comments("Node.Next")[0].text,
            "Next links nodes."
        );

        let max_depth = entity.get_comments("MaxDepth");
        assert_eq!(max_depth.len(), 2);
        assert_eq!(max_depth[0].placement, Placement::Above);
        assert_eq!(max_depth[1].placement, Placement::Inline);

        // Receiver name extracted through pointer and brackets.
        assert_eq!(
            entity.get_comments("Node.Describe")[0].text,
            "Describe renders the node."
        );
        assert_eq!(entity.get_comments("New")[0].text, "New builds a Node.");
    }

    #[test]
    fn test_receiver_name_unwraps() {
        assert_eq!(receiver_name("Node"), "Node");
        assert_eq!(receiver_name("*Node"), "Node");
        assert_eq!(receiver_name("*GenericStruct[T]"), "GenericStruct");
    }

    #[test]
    fn test_lazy_docs_memoizes() {
        let export = demo_export();
        let catalog = Arc::new(Catalog::new());
        let docs = LazyDocs::new(&export, Arc::clone(&catalog));

        docs.ensure_package_docs("example.com/demo");
        let entity = catalog.packages.get("example.com/demo").unwrap();
        assert_eq!(entity.get_comments("Node").len(), 1);

        // A second call must not re-walk (comments would double).
        docs.ensure_package_docs("example.com/demo");
        let entity = catalog.packages.get("example.com/demo").unwrap();
        assert_eq!(entity.get_comments("Node").len(), 1);

        // Unknown packages record the sentinel and stay absent.
        docs.ensure_package_docs("example.com/absent");
        assert!(catalog.packages.get("example.com/absent").is_none());
    }
}
