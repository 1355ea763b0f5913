//! Dirty Flags
//!
//! A dirty flag records whether a slot's cached value is stale. Besides the
//! state itself it keeps a version counter that increments on every
//! invalidation, and the pass that last brought the slot up to date.

use crate::graph::PassId;

/// Staleness of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    /// The cached value is up-to-date.
    Clean,

    /// The slot must be recomputed before its value is used.
    Dirty,
}

/// Per-slot staleness tracker.
#[derive(Debug, Clone)]
pub struct DirtyFlag {
    state: DirtyState,
    version: u64,
    updated_in: Option<PassId>,
}

impl DirtyFlag {
    /// A flag that starts dirty, forcing a first computation.
    pub fn dirty() -> Self {
        Self {
            state: DirtyState::Dirty,
            version: 0,
            updated_in: None,
        }
    }

    /// A flag that starts clean.
    pub fn clean() -> Self {
        Self {
            state: DirtyState::Clean,
            version: 0,
            updated_in: None,
        }
    }

    pub fn state(&self) -> DirtyState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == DirtyState::Dirty
    }

    pub fn is_clean(&self) -> bool {
        self.state == DirtyState::Clean
    }

    /// Number of invalidations seen so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The pass in which the slot was last made clean.
    pub fn updated_in(&self) -> Option<PassId> {
        self.updated_in
    }

    /// Mark stale. Never recomputes anything.
    pub fn invalidate(&mut self) {
        self.state = DirtyState::Dirty;
        self.version += 1;
    }

    /// Mark up-to-date as of `pass`.
    pub fn mark_clean(&mut self, pass: PassId) {
        self.state = DirtyState::Clean;
        self.updated_in = Some(pass);
    }
}

impl Default for DirtyFlag {
    fn default() -> Self {
        Self::dirty()
    }
}
