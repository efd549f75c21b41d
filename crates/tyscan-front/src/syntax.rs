//! Parsed package objects.
//!
//! Packages carry the syntactic side of the frontend export: file lists,
//! declaration groups, and the comments the attacher associates with
//! declared names. This is deliberately not an AST; it records only what
//! comment attachment and value extraction need.

use serde::{Deserialize, Serialize};

use crate::table::{Ty, TypeTable};

/// Whether a declared name is exported under the scanned language's
/// capitalization rule.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

/// The root object a frontend hands to the scanner.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FrontendExport {
    pub table: TypeTable,
    pub packages: Vec<Package>,
}

impl FrontendExport {
    pub fn new(table: TypeTable, packages: Vec<Package>) -> Self {
        FrontendExport { table, packages }
    }

    /// Find a package by path.
    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.path == path)
    }
}

/// One parsed package.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Package {
    /// Import path; also the prefix of every id declared here.
    pub path: String,
    /// Package name (the last path segment unless renamed).
    pub name: String,
    /// Import hops from the scanned roots; 0 for a package matched by a
    /// pattern, >0 for a dependency.
    #[serde(default)]
    pub distance: u32,
    /// Paths of packages imported by this one.
    #[serde(default)]
    pub imports: Vec<String>,
    pub files: Vec<SourceFile>,
}

impl Package {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Package {
            path: path.into(),
            name: name.into(),
            distance: 0,
            imports: Vec::new(),
            files: Vec::new(),
        }
    }

    /// File paths of this package, in declaration order.
    pub fn file_paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// One parsed file of a package.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    /// File-level package comment, one entry per comment line/block.
    #[serde(default)]
    pub doc: Vec<String>,
    #[serde(default)]
    pub decls: Vec<Decl>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>) -> Self {
        SourceFile {
            path: path.into(),
            doc: Vec::new(),
            decls: Vec::new(),
        }
    }
}

/// A top-level declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decl {
    Const(GroupDecl),
    Var(GroupDecl),
    Type(TypeDecl),
    Func(FuncDecl),
}

/// A grouped constant or variable declaration (`const ( ... )`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GroupDecl {
    /// Comment above the whole group.
    #[serde(default)]
    pub doc: Vec<String>,
    pub specs: Vec<ValueSpec>,
}

/// One spec line inside a const/var group: `A, B Type = 1, 2`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValueSpec {
    pub names: Vec<String>,
    /// Declared type, when the spec has one.
    #[serde(default)]
    pub ty: Option<Ty>,
    /// Literal value text per name, as written in source.
    #[serde(default)]
    pub values: Vec<String>,
    /// Comment above this spec.
    #[serde(default)]
    pub doc: Vec<String>,
    /// Trailing same-line comment.
    #[serde(default)]
    pub line: Option<String>,
}

impl ValueSpec {
    pub fn single(name: impl Into<String>, ty: Option<Ty>, value: impl Into<String>) -> Self {
        ValueSpec {
            names: vec![name.into()],
            ty,
            values: vec![value.into()],
            doc: Vec::new(),
            line: None,
        }
    }
}

/// A type declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    /// The declared descriptor.
    pub ty: Ty,
    #[serde(default)]
    pub doc: Vec<String>,
    #[serde(default)]
    pub line: Option<String>,
    /// Comments on struct fields or interface methods of this declaration.
    #[serde(default)]
    pub members: Vec<MemberDoc>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        TypeDecl {
            name: name.into(),
            ty,
            doc: Vec::new(),
            line: None,
            members: Vec::new(),
        }
    }
}

/// Comments on a member (struct field or interface method) of a type
/// declaration body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemberDoc {
    pub name: String,
    #[serde(default)]
    pub doc: Vec<String>,
    #[serde(default)]
    pub line: Option<String>,
}

/// A function or method declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    /// Receiver type name for methods, possibly pointer-wrapped
    /// (`"*Node"`); `None` for package-level functions.
    #[serde(default)]
    pub recv: Option<String>,
    /// The signature descriptor.
    pub sig: Ty,
    #[serde(default)]
    pub doc: Vec<String>,
    #[serde(default)]
    pub line: Option<String>,
}

impl FuncDecl {
    pub fn new(name: impl Into<String>, sig: Ty) -> Self {
        FuncDecl {
            name: name.into(),
            recv: None,
            sig,
            doc: Vec::new(),
            line: None,
        }
    }

    pub fn method(name: impl Into<String>, recv: impl Into<String>, sig: Ty) -> Self {
        FuncDecl {
            name: name.into(),
            recv: Some(recv.into()),
            sig,
            doc: Vec::new(),
            line: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::BasicKind;

    #[test]
    fn test_is_exported() {
        assert!(is_exported("Node"));
        assert!(!is_exported("node"));
        assert!(!is_exported(""));
        assert!(!is_exported("_Node"));
    }

    #[test]
    fn test_export_round_trips_through_json() {
        let mut table = TypeTable::new();
        let int = table.basic(BasicKind::Int);
        let my_int = table.named("example.com/demo", "MyInt", int);

        let mut pkg = Package::new("example.com/demo", "demo");
        let mut file = SourceFile::new("demo.go");
        file.doc.push("Package demo is a fixture.".to_string());
        let mut decl = TypeDecl::new("MyInt", my_int);
        decl.doc.push("MyInt counts things.".to_string());
        file.decls.push(Decl::Type(decl));
        pkg.files.push(file);

        let export = FrontendExport::new(table, vec![pkg]);
        let json = serde_json::to_string(&export).unwrap();
        let back: FrontendExport = serde_json::from_str(&json).unwrap();

        assert_eq!(back.packages.len(), 1);
        assert_eq!(back.packages[0].path, "example.com/demo");
        assert_eq!(back.table.len(), 2);
        assert_eq!(back.table.get(my_int).map(|d| d.kind_name()), Some("named"));
    }
}
