//! Single-fire lazy-load slots.
//!
//! Every entity carries a `LoadSlot`. The slot holds a declarative
//! `LoadPlan` describing what expanding the entity means; the resolver
//! executes the plan when the orchestrator's fixpoint pass (or a first
//! serialization) fires it. A slot fires at most once, even under
//! concurrent attempts; a failed load captures its error and every later
//! fire is a no-op that reports it.
//!
//! Loaders do minimal local work and never fire the slots of child
//! entities. Running child loaders inside a parent loader under locking
//! would deadlock on self-referential declarations; transitive expansion
//! belongs to the driver loop.

use std::sync::Mutex;

use tyscan_front::Ty;

/// What firing an entity's loader should do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadPlan {
    /// Attach comments, then run the kind-specific expansion (methods for
    /// named basics/sequences/maps/chans, methods+embeds for interfaces,
    /// fields+promotions+methods for structs) from the origin descriptor.
    Expand { origin: Ty },
    /// Attach comments only.
    Comments,
}

/// Externally visible slot state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    /// The loader has not fired yet.
    Pending,
    /// The loader ran to completion (or the entity never had one).
    Loaded,
    /// The loader ran and failed; the error is captured.
    Failed(String),
}

#[derive(Debug)]
enum Slot {
    /// No plan installed; the entity has nothing to expand.
    Idle,
    Pending(LoadPlan),
    /// A fire is in progress on some thread.
    Running,
    Done,
    Failed(String),
}

/// The single-fire slot itself.
#[derive(Debug)]
pub struct LoadSlot {
    state: Mutex<Slot>,
}

impl LoadSlot {
    pub fn new() -> Self {
        LoadSlot {
            state: Mutex::new(Slot::Idle),
        }
    }

    pub fn with_plan(plan: LoadPlan) -> Self {
        LoadSlot {
            state: Mutex::new(Slot::Pending(plan)),
        }
    }

    /// Install a plan into an idle slot. Returns `false` (and leaves the
    /// slot untouched) if a plan was already installed or the slot fired.
    pub fn install(&self, plan: LoadPlan) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match *state {
            Slot::Idle => {
                *state = Slot::Pending(plan);
                true
            }
            _ => false,
        }
    }

    /// Take the plan for execution, transitioning to `Running`.
    ///
    /// Returns `None` when there is nothing to run: the slot was idle (it
    /// is marked done), already fired, or is firing on another thread.
    pub fn begin(&self) -> Option<LoadPlan> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match std::mem::replace(&mut *state, Slot::Running) {
            Slot::Pending(plan) => Some(plan),
            Slot::Idle => {
                *state = Slot::Done;
                None
            }
            // Restore whatever terminal or in-progress state we displaced.
            other => {
                *state = other;
                None
            }
        }
    }

    /// Record the outcome of an execution started with `begin`.
    pub fn finish(&self, result: Result<(), String>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = match result {
            Ok(()) => Slot::Done,
            Err(message) => Slot::Failed(message),
        };
    }

    /// The externally visible state.
    pub fn state(&self) -> LoadState {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match &*state {
            Slot::Idle | Slot::Pending(_) | Slot::Running => LoadState::Pending,
            Slot::Done => LoadState::Loaded,
            Slot::Failed(message) => LoadState::Failed(message.clone()),
        }
    }

    /// Whether the loader has fired (successfully or not).
    pub fn fired(&self) -> bool {
        !matches!(self.state(), LoadState::Pending)
    }
}

impl Default for LoadSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_fire() {
        let slot = LoadSlot::with_plan(LoadPlan::Comments);
        assert_eq!(slot.begin(), Some(LoadPlan::Comments));
        // Second fire while running is a no-op.
        assert_eq!(slot.begin(), None);
        slot.finish(Ok(()));
        assert_eq!(slot.begin(), None);
        assert_eq!(slot.state(), LoadState::Loaded);
    }

    #[test]
    fn test_idle_slot_counts_as_loaded_after_fire() {
        let slot = LoadSlot::new();
        assert_eq!(slot.begin(), None);
        assert_eq!(slot.state(), LoadState::Loaded);
        // Installing after the fact is rejected.
        assert!(!slot.install(LoadPlan::Comments));
    }

    #[test]
    fn test_failure_is_captured_and_sticky() {
        let slot = LoadSlot::with_plan(LoadPlan::Comments);
        let _ = slot.begin();
        slot.finish(Err("boom".to_string()));
        assert_eq!(slot.state(), LoadState::Failed("boom".to_string()));
        assert_eq!(slot.begin(), None);
        assert_eq!(slot.state(), LoadState::Failed("boom".to_string()));
    }
}
