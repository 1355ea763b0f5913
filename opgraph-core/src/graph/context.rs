//! Evaluation Context
//!
//! An evaluation context carries the state of one evaluation request
//! (typically one rendered frame): the time, the frame index, a pass stamp
//! used for memoization, and the stack of slots currently being computed.
//!
//! # Cycle Detection
//!
//! Before an output is computed its id is pushed onto the stack through
//! [`EvaluationContext::enter`]. Re-entering a slot that is already on the
//! stack fails with [`GraphError::CycleDetected`] instead of recursing. The
//! returned [`EvalFrame`] pops the entry when dropped, so every exit path
//! (including `?` early returns) restores the stack.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use crate::config::DEFAULT_MAX_RECURSION_DEPTH;
use crate::error::GraphError;
use crate::slot::SlotId;

/// Identifier of one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassId(u64);

impl PassId {
    /// Generate a new unique pass ID.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Counters collected during a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalStats {
    /// Operator computes run.
    pub computes: usize,
    /// Reads answered from a clean cache.
    pub cache_hits: usize,
    /// Computes that failed and kept their previous value.
    pub faults: usize,
}

/// Per-request evaluation state.
#[derive(Debug)]
pub struct EvaluationContext {
    pass: PassId,
    time: f64,
    frame: u64,
    stack: SmallVec<[SlotId; 16]>,
    max_depth: usize,
    stats: EvalStats,
}

impl EvaluationContext {
    /// A fresh context with its own pass stamp.
    pub fn new(time: f64, frame: u64) -> Self {
        Self {
            pass: PassId::next(),
            time,
            frame,
            stack: SmallVec::new(),
            max_depth: DEFAULT_MAX_RECURSION_DEPTH,
            stats: EvalStats::default(),
        }
    }

    /// A context for `frame` at `fps` frames per second.
    pub fn for_frame(frame: u64, fps: f64) -> Self {
        let time = if fps > 0.0 { frame as f64 / fps } else { 0.0 };
        Self::new(time, frame)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn pass(&self) -> PassId {
        self.pass
    }

    /// Time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Current nesting of slot computations.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Slots currently being computed, outermost first.
    pub fn stack(&self) -> &[SlotId] {
        &self.stack
    }

    pub fn stats(&self) -> EvalStats {
        self.stats
    }

    /// Push `slot` onto the evaluation stack.
    ///
    /// Fails if `slot` is already being computed further up, or if the stack
    /// is at its depth limit.
    pub fn enter(&mut self, slot: SlotId) -> Result<EvalFrame<'_>, GraphError> {
        if let Some(start) = self.stack.iter().position(|s| *s == slot) {
            let mut path: Vec<SlotId> = self.stack[start..].to_vec();
            path.push(slot);
            return Err(GraphError::CycleDetected { path });
        }
        if self.stack.len() >= self.max_depth {
            return Err(GraphError::RecursionLimit {
                slot,
                depth: self.max_depth,
            });
        }

        self.stack.push(slot);
        Ok(EvalFrame { ctx: self, slot })
    }

    pub(crate) fn record_compute(&mut self) {
        self.stats.computes += 1;
    }

    pub(crate) fn record_cache_hit(&mut self) {
        self.stats.cache_hits += 1;
    }

    pub(crate) fn record_fault(&mut self) {
        self.stats.faults += 1;
    }
}

/// Guard for one entry on the evaluation stack.
///
/// Dereferences to the context so nested pulls can keep using it.
pub struct EvalFrame<'a> {
    ctx: &'a mut EvaluationContext,
    slot: SlotId,
}

impl EvalFrame<'_> {
    pub fn slot(&self) -> SlotId {
        self.slot
    }
}

impl Deref for EvalFrame<'_> {
    type Target = EvaluationContext;

    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}

impl DerefMut for EvalFrame<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}

impl Drop for EvalFrame<'_> {
    fn drop(&mut self) {
        let popped = self.ctx.stack.pop();

        // Frames are strictly nested, so the top must be ours.
        debug_assert_eq!(
            popped,
            Some(self.slot),
            "EvalFrame mismatch: expected {:?}, got {:?}",
            self.slot,
            popped
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InstanceId;
    use crate::slot::SlotIndex;

    fn slot(instance: u64) -> SlotId {
        SlotId::new(InstanceId::from(instance), SlotIndex(0))
    }

    #[test]
    fn frames_push_and_pop() {
        let mut ctx = EvaluationContext::new(0.0, 0);
        assert_eq!(ctx.depth(), 0);

        {
            let mut outer = ctx.enter(slot(1)).unwrap();
            assert_eq!(outer.depth(), 1);

            {
                let inner = outer.enter(slot(2)).unwrap();
                assert_eq!(inner.stack(), &[slot(1), slot(2)]);
            }

            // After inner frame drops, outer should be on top
            assert_eq!(outer.stack(), &[slot(1)]);
        }

        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn reentry_is_a_cycle() {
        let mut ctx = EvaluationContext::new(0.0, 0);
        let mut a = ctx.enter(slot(1)).unwrap();
        let mut b = a.enter(slot(2)).unwrap();

        let err = b.enter(slot(1)).err().unwrap();
        assert_eq!(
            err,
            GraphError::CycleDetected {
                path: vec![slot(1), slot(2), slot(1)]
            }
        );

        // The failed enter pushed nothing
        assert_eq!(b.depth(), 2);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut ctx = EvaluationContext::new(0.0, 0).with_max_depth(1);
        let mut a = ctx.enter(slot(1)).unwrap();
        let err = a.enter(slot(2)).err().unwrap();
        assert!(matches!(err, GraphError::RecursionLimit { depth: 1, .. }));
    }

    #[test]
    fn error_return_still_pops() {
        fn nested(ctx: &mut EvaluationContext) -> Result<(), GraphError> {
            let mut frame = ctx.enter(slot(1))?;
            frame.enter(slot(1))?;
            Ok(())
        }

        let mut ctx = EvaluationContext::new(0.0, 0);
        assert!(nested(&mut ctx).is_err());
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn contexts_get_distinct_passes() {
        let a = EvaluationContext::new(0.0, 0);
        let b = EvaluationContext::new(0.0, 0);
        assert_ne!(a.pass(), b.pass());
    }

    #[test]
    fn frame_time_from_fps() {
        let ctx = EvaluationContext::for_frame(30, 60.0);
        assert_eq!(ctx.time(), 0.5);
        assert_eq!(ctx.frame(), 30);
    }
}
