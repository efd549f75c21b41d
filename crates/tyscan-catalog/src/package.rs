//! Package registry entities.
//!
//! One `PackageEntity` per package path. It carries provenance (name,
//! files), the comment map written by the attacher, and a back-pointer to
//! the upstream parsed package so dependency docs can be loaded lazily.
//! The attacher writes a package's comments before any loader reads them,
//! so the store's RW mutex is the only coordination needed.

use std::sync::RwLock;

use indexmap::IndexMap;
use serde_json::{Value, json};
use tyscan_common::Comment;

/// Reserved comment key for the package-level comment, concatenated
/// across files.
pub const PACKAGE_DOC_KEY: &str = "#PACKAGE_DOC";

/// A catalogued package.
#[derive(Debug)]
pub struct PackageEntity {
    /// Import path; doubles as the store key.
    pub path: String,
    pub name: String,
    /// Import hops from the scanned roots.
    pub distance: u32,
    pub files: Vec<String>,
    /// Declaration-key -> comments. Keys are `TypeName`,
    /// `TypeName.Member`, `FuncName`, or `PACKAGE_DOC_KEY`.
    comments: RwLock<IndexMap<String, Vec<Comment>>>,
    /// Index of the upstream parsed package in the frontend export.
    pub source: Option<usize>,
}

impl PackageEntity {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        PackageEntity {
            path: path.into(),
            name: name.into(),
            distance: 0,
            files: Vec::new(),
            comments: RwLock::new(IndexMap::new()),
            source: None,
        }
    }

    pub fn with_distance(mut self, distance: u32) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    pub fn with_source(mut self, source: usize) -> Self {
        self.source = Some(source);
        self
    }

    /// Comments recorded under `key`, in attachment order.
    pub fn get_comments(&self, key: &str) -> Vec<Comment> {
        self.comments
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Append comments under `key`.
    pub fn add_comments(&self, key: impl Into<String>, comments: Vec<Comment>) {
        if comments.is_empty() {
            return;
        }
        let mut guard = self.comments.write().unwrap_or_else(|e| e.into_inner());
        guard.entry(key.into()).or_default().extend(comments);
    }

    /// The package-level comment list.
    pub fn package_comments(&self) -> Vec<Comment> {
        self.get_comments(PACKAGE_DOC_KEY)
    }

    /// Whether any comments were attached at all. Used to decide whether a
    /// dependency package still needs its docs extracted.
    pub fn has_comments(&self) -> bool {
        !self
            .comments
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    /// Structural serialization: `{path, name, files, comments}`.
    pub fn serialize(&self) -> Value {
        let comments: Value = {
            let guard = self.comments.read().unwrap_or_else(|e| e.into_inner());
            let mut map = serde_json::Map::new();
            let mut keys: Vec<&String> = guard.keys().collect();
            keys.sort();
            for key in keys {
                let list: Vec<Value> = guard[key.as_str()]
                    .iter()
                    .map(|c| json!({"text": c.text, "placement": c.placement}))
                    .collect();
                map.insert(key.clone(), Value::Array(list));
            }
            Value::Object(map)
        };
        json!({
            "path": self.path,
            "name": self.name,
            "distance": self.distance,
            "files": self.files,
            "comments": comments,
        })
    }
}
