//! Centralized limits and thresholds.

/// Maximum pointer depth the resolver folds before treating the chain as a
/// malformed descriptor and dropping it with a warning.
pub const MAX_POINTER_DEPTH: u32 = 64;

/// Maximum number of fixpoint rounds the orchestrator runs before giving up.
/// The loop converges long before this on any well-formed input; the cap
/// bounds damage from a frontend that keeps minting fresh descriptors.
pub const MAX_FIXPOINT_ROUNDS: usize = 1024;

/// Maximum recursion depth for a single `resolve` call chain.
pub const MAX_RESOLVE_DEPTH: usize = 256;
