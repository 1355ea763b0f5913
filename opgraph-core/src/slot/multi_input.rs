//! Multi-input slots: ordered, resizable lists of inputs.

use crate::graph::PassId;
use crate::value::{Value, ValueType};

use super::dirty::DirtyFlag;
use super::input::InputSlot;
use super::ChildId;

/// An ordered collection of inputs feeding one aggregating operator.
///
/// The order of `children` is the order consumers see. It starts as the order
/// inputs were added and changes only through [`MultiInputSlot::reorder`] and
/// removals.
#[derive(Debug, Clone)]
pub struct MultiInputSlot {
    value_type: ValueType,
    child_default: Value,
    children: Vec<(ChildId, InputSlot)>,
    next_child: u32,
    dirty: DirtyFlag,
}

impl MultiInputSlot {
    /// An empty multi-input. New children are seeded with `child_default`.
    pub fn new(child_default: Value) -> Self {
        Self {
            value_type: child_default.value_type(),
            child_default,
            children: Vec::new(),
            next_child: 0,
            dirty: DirtyFlag::dirty(),
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn child_default(&self) -> &Value {
        &self.child_default
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Own structural staleness (children added, removed or moved).
    pub fn dirty(&self) -> &DirtyFlag {
        &self.dirty
    }

    /// Child ids in current order.
    pub fn child_ids(&self) -> impl Iterator<Item = ChildId> + '_ {
        self.children.iter().map(|(id, _)| *id)
    }

    pub fn children(&self) -> impl Iterator<Item = (ChildId, &InputSlot)> + '_ {
        self.children.iter().map(|(id, slot)| (*id, slot))
    }

    pub fn child(&self, id: ChildId) -> Option<&InputSlot> {
        self.children
            .iter()
            .find(|(child, _)| *child == id)
            .map(|(_, slot)| slot)
    }

    pub(crate) fn child_mut(&mut self, id: ChildId) -> Option<&mut InputSlot> {
        self.children
            .iter_mut()
            .find(|(child, _)| *child == id)
            .map(|(_, slot)| slot)
    }

    /// Current position of a child.
    pub fn position(&self, id: ChildId) -> Option<usize> {
        self.children.iter().position(|(child, _)| *child == id)
    }

    /// Child at a position.
    pub fn child_at(&self, index: usize) -> Option<ChildId> {
        self.children.get(index).map(|(id, _)| *id)
    }

    /// Append a new child. Returns its position and id.
    pub(crate) fn add_input(&mut self) -> (usize, ChildId) {
        let id = ChildId(self.next_child);
        self.next_child += 1;
        self.children
            .push((id, InputSlot::new(self.child_default.clone())));
        self.dirty.invalidate();
        (self.children.len() - 1, id)
    }

    /// Remove the child at `index`, shifting later children forward.
    pub(crate) fn remove_input(&mut self, index: usize) -> Option<(ChildId, InputSlot)> {
        if index >= self.children.len() {
            return None;
        }
        self.dirty.invalidate();
        Some(self.children.remove(index))
    }

    /// Move the child at `from` so that it ends up at `to`.
    pub(crate) fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.children.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let child = self.children.remove(from);
            self.children.insert(to, child);
            self.dirty.invalidate();
        }
        true
    }

    pub(crate) fn invalidate(&mut self) {
        self.dirty.invalidate();
    }

    pub(crate) fn mark_clean(&mut self, pass: PassId) {
        self.dirty.mark_clean(pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(multi: &MultiInputSlot) -> Vec<ChildId> {
        multi.child_ids().collect()
    }

    #[test]
    fn add_remove_keeps_order() {
        let mut multi = MultiInputSlot::new(Value::Float(0.0));
        let (_, x) = multi.add_input();
        let (_, y) = multi.add_input();

        multi.remove_input(0);
        let (index, z) = multi.add_input();

        assert_eq!(index, 1);
        assert_eq!(ids(&multi), vec![y, z]);
        assert_eq!(multi.position(x), None);
    }

    #[test]
    fn child_ids_are_not_reused() {
        let mut multi = MultiInputSlot::new(Value::Int(0));
        let (_, first) = multi.add_input();
        multi.remove_input(0);
        let (_, second) = multi.add_input();
        assert_ne!(first, second);
    }

    #[test]
    fn reorder_moves_child() {
        let mut multi = MultiInputSlot::new(Value::Float(0.0));
        let a = multi.add_input().1;
        let b = multi.add_input().1;
        let c = multi.add_input().1;

        assert!(multi.reorder(0, 2));
        assert_eq!(ids(&multi), vec![b, c, a]);

        assert!(multi.reorder(2, 0));
        assert_eq!(ids(&multi), vec![a, b, c]);

        assert!(!multi.reorder(0, 3));
        assert!(multi.remove_input(5).is_none());
    }

    #[test]
    fn children_take_the_child_default() {
        let mut multi = MultiInputSlot::new(Value::Float(1.5));
        let (_, id) = multi.add_input();
        assert_eq!(multi.child(id).map(InputSlot::local_default), Some(&Value::Float(1.5)));
    }
}
