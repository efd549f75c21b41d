//! The scan orchestrator.
//!
//! Pipeline: raise the effective scan mode over the processor chain,
//! select packages by pattern, register every package (selected and
//! dependency) in the registry, attach comments for the selected ones,
//! walk their declarations through the resolver, then run the fixpoint:
//! collect unloaded ids sorted lexicographically, fire each loader, and
//! repeat until an iteration discovers nothing new. The loop converges
//! because the store grows monotonically and every loader fires at most
//! once.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use tyscan_catalog::{Catalog, Serializer};
use tyscan_common::{ScanMode, limits::MAX_FIXPOINT_ROUNDS};
use tyscan_front::{Decl, FrontendExport};
use tyscan_resolver::Resolver;

use crate::attach::{Attacher, LazyDocs};
use crate::error::ScanError;
use crate::patterns::{Pattern, select_packages};
use crate::process::{Processor, ProcessorChain};

/// Scanner configuration.
#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Package patterns (see `patterns`).
    pub packages: Vec<String>,
    pub mode: ScanMode,
    /// Emit unexported methods and fields.
    pub include_unexported: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            packages: Vec::new(),
            mode: ScanMode::DEFAULT,
            include_unexported: false,
        }
    }
}

/// The completed catalog of one scan.
#[derive(Debug)]
pub struct ScanOutput {
    pub catalog: Arc<Catalog>,
}

impl ScanOutput {
    /// `{types, values, packages}` with deterministic ordering.
    pub fn snapshot(&self) -> Value {
        Serializer::new(&self.catalog).snapshot()
    }
}

/// Drives the scan pipeline.
#[derive(Default)]
pub struct Scanner {
    config: ScanConfig,
    chain: ProcessorChain,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Scanner {
            config,
            chain: ProcessorChain::new(),
        }
    }

    /// Register a processor; invoked in registration order.
    pub fn register(&mut self, processor: Box<dyn Processor>) {
        self.chain.register(processor);
    }

    /// Run the scan over a frontend export.
    pub fn scan(&mut self, export: &FrontendExport) -> Result<ScanOutput, ScanError> {
        let start = Instant::now();

        // Effective mode: configuration OR every processor's requirement.
        let mode = self.config.mode | self.chain.required_mode();
        self.chain.announce(mode);

        let mut patterns = Vec::with_capacity(self.config.packages.len());
        for raw in &self.config.packages {
            patterns.push(Pattern::expand(raw)?);
        }
        if patterns.is_empty() {
            return Err(ScanError::Config("no package patterns given".to_string()));
        }
        let selected = select_packages(export, &patterns)?;

        let catalog = Arc::new(Catalog::new());
        let attacher = Attacher::new(export, Arc::clone(&catalog));
        // Register everything up front so dependency docs and provenance
        // are reachable from loaders.
        for index in 0..export.packages.len() {
            attacher.register_package(index);
        }

        let docs = LazyDocs::new(export, Arc::clone(&catalog));
        let resolver = Resolver::new(export, Arc::clone(&catalog), mode)
            .with_include_unexported(self.config.include_unexported)
            .with_doc_provider(&docs);

        for &index in &selected {
            let pkg_entity = attacher.attach_package(index);
            let pkg = &export.packages[index];
            debug!(path = %pkg.path, "scanning package");

            for file in &pkg.files {
                for decl in &file.decls {
                    match decl {
                        Decl::Const(group) if mode.contains(ScanMode::CONSTS) => {
                            for spec in &group.specs {
                                for (i, name) in spec.names.iter().enumerate() {
                                    let value =
                                        spec.values.get(i).map(String::as_str).unwrap_or("");
                                    resolver.resolve_const(&pkg_entity, name, spec.ty, value);
                                }
                            }
                        }
                        Decl::Var(group) if mode.contains(ScanMode::VARIABLES) => {
                            for spec in &group.specs {
                                for name in &spec.names {
                                    resolver.resolve_var(&pkg_entity, name, spec.ty);
                                }
                            }
                        }
                        Decl::Type(type_decl) if mode.contains(ScanMode::TYPES) => {
                            if let Some(entity) = resolver.resolve(type_decl.ty) {
                                self.chain.dispatch(&entity)?;
                            }
                        }
                        // Methods are skipped here; they belong to their
                        // parent types.
                        Decl::Func(func) if mode.contains(ScanMode::FUNCTIONS) => {
                            if func.recv.is_none() {
                                resolver.resolve_func(&pkg_entity, func);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        self.fixpoint(&resolver, &catalog);

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            packages = selected.len(),
            types = catalog.types.len(),
            values = catalog.values.len(),
            "scan complete"
        );
        Ok(ScanOutput { catalog })
    }

    /// Fire loaders until an iteration finds nothing pending. Ids are
    /// visited in sorted order for deterministic output.
    fn fixpoint(&self, resolver: &Resolver<'_>, catalog: &Arc<Catalog>) {
        let mut rounds = 0usize;
        loop {
            let pending: Vec<String> = catalog
                .types
                .keys_sorted()
                .into_iter()
                .filter(|id| {
                    catalog
                        .types
                        .get(id)
                        .is_some_and(|entity| !entity.loaded())
                })
                .collect();
            if pending.is_empty() {
                break;
            }
            rounds += 1;
            if rounds > MAX_FIXPOINT_ROUNDS {
                warn!(rounds, "fixpoint round cap reached; aborting expansion");
                break;
            }
            for id in &pending {
                if let Some(entity) = catalog.types.get(id) {
                    resolver.fire(&entity);
                }
            }
        }
        // Value loaders only attach comments and cannot discover new
        // types, so one pass after convergence finishes them.
        catalog.values.range(|_, entity| {
            if !entity.loaded() {
                resolver.fire(entity);
            }
            true
        });
        debug!(rounds, "fixpoint converged");
    }
}
