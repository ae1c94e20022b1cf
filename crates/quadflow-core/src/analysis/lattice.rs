//! Set lattices over a per-analysis universe.
//!
//! A [`SetFact`] is a subset of a fixed universe. Its [`MeetPolicy`] decides which end of the
//! lattice is top:
//! - `Union` (may analyses): top = ∅, bottom = universe, meet = ∪
//! - `Intersection` (must analyses): top = universe, bottom = ∅, meet = ∩

use crate::quad::{QuadId, Register};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A value the solver can combine and compare.
///
/// `meet_with` must be commutative, associative, idempotent and must never move a fact towards
/// top; the solver's termination depends on it.
pub trait DataflowFact: Clone + PartialEq + fmt::Debug + fmt::Display {
    fn set_to_top(&mut self);

    fn set_to_bottom(&mut self);

    fn meet_with(&mut self, other: &Self);

    fn copy_from(&mut self, other: &Self) {
        self.clone_from(other);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeetPolicy {
    Union,
    Intersection,
}

#[derive(Debug, Clone)]
pub struct SetFact<T: Ord> {
    elems: BTreeSet<T>,
    universe: Arc<BTreeSet<T>>,
    policy: MeetPolicy,
}

pub type DefSet = SetFact<QuadId>;
pub type VarSet = SetFact<Register>;

impl<T: Ord + Clone> SetFact<T> {
    pub fn empty(universe: Arc<BTreeSet<T>>, policy: MeetPolicy) -> Self {
        Self {
            elems: BTreeSet::new(),
            universe,
            policy,
        }
    }

    pub fn full(universe: Arc<BTreeSet<T>>, policy: MeetPolicy) -> Self {
        Self {
            elems: (*universe).clone(),
            universe,
            policy,
        }
    }

    pub fn top(universe: Arc<BTreeSet<T>>, policy: MeetPolicy) -> Self {
        let mut fact = Self::empty(universe, policy);
        fact.set_to_top_set();
        fact
    }

    pub fn bottom(universe: Arc<BTreeSet<T>>, policy: MeetPolicy) -> Self {
        let mut fact = Self::empty(universe, policy);
        fact.set_to_bottom_set();
        fact
    }

    pub fn policy(&self) -> MeetPolicy {
        self.policy
    }

    pub fn universe(&self) -> &BTreeSet<T> {
        &self.universe
    }

    pub fn as_set(&self) -> &BTreeSet<T> {
        &self.elems
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elems.iter()
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.elems.contains(item)
    }

    pub fn insert(&mut self, item: T) -> bool {
        self.elems.insert(item)
    }

    pub fn remove(&mut self, item: &T) -> bool {
        self.elems.remove(item)
    }

    pub fn remove_all<'a>(&mut self, items: impl IntoIterator<Item = &'a T>)
    where
        T: 'a,
    {
        for item in items {
            self.elems.remove(item);
        }
    }

    /// Replaces the set with `universe \ self`.
    pub fn complement(&mut self) {
        self.elems = self.universe.difference(&self.elems).cloned().collect();
    }

    /// Whether `self` is at or below `other` in this lattice.
    pub fn is_below(&self, other: &Self) -> bool {
        match self.policy {
            MeetPolicy::Union => self.elems.is_superset(&other.elems),
            MeetPolicy::Intersection => self.elems.is_subset(&other.elems),
        }
    }

    fn set_to_top_set(&mut self) {
        self.elems = match self.policy {
            MeetPolicy::Union => BTreeSet::new(),
            MeetPolicy::Intersection => (*self.universe).clone(),
        };
    }

    fn set_to_bottom_set(&mut self) {
        self.elems = match self.policy {
            MeetPolicy::Union => (*self.universe).clone(),
            MeetPolicy::Intersection => BTreeSet::new(),
        };
    }
}

impl<T: Ord> PartialEq for SetFact<T> {
    fn eq(&self, other: &Self) -> bool {
        self.elems == other.elems
    }
}

impl<T: Ord> Eq for SetFact<T> {}

impl<T: Ord + Clone + fmt::Debug + fmt::Display> DataflowFact for SetFact<T> {
    fn set_to_top(&mut self) {
        self.set_to_top_set();
    }

    fn set_to_bottom(&mut self) {
        self.set_to_bottom_set();
    }

    fn meet_with(&mut self, other: &Self) {
        match self.policy {
            MeetPolicy::Union => self.elems.extend(other.elems.iter().cloned()),
            MeetPolicy::Intersection => self.elems.retain(|item| other.elems.contains(item)),
        }
    }

    fn copy_from(&mut self, other: &Self) {
        self.elems.clone_from(&other.elems);
    }
}

impl<T: Ord + fmt::Display> fmt::Display for SetFact<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.elems.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", item)?;
        }
        f.write_str("]")
    }
}

impl<T: Ord + Serialize> Serialize for SetFact<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.elems.serialize(serializer)
    }
}
