//! Symmetric body pairs and the ordered sets that hold them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A unique, case-sensitive identifier for a rigid body (link).
pub type BodyName = String;

/// An unordered pair of two distinct bodies.
///
/// The pair remembers the orientation it was created with so reports read the
/// way the pair was declared, but equality and hashing ignore it:
/// `{a, b}` and `{b, a}` are the same pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "(BodyName, BodyName)", into = "(BodyName, BodyName)")]
pub struct CollisionPair {
    first: BodyName,
    second: BodyName,
}

impl CollisionPair {
    /// Builds a pair, or `None` if both names are the same body.
    pub fn new(first: impl Into<BodyName>, second: impl Into<BodyName>) -> Option<Self> {
        let first = first.into();
        let second = second.into();
        if first == second {
            return None;
        }
        Some(Self { first, second })
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    /// The two names in lexicographic order.
    pub fn key(&self) -> (&str, &str) {
        if self.first <= self.second {
            (&self.first, &self.second)
        } else {
            (&self.second, &self.first)
        }
    }

    /// Whether this pair joins `a` and `b`, in either order.
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

impl TryFrom<(BodyName, BodyName)> for CollisionPair {
    type Error = String;

    fn try_from((first, second): (BodyName, BodyName)) -> Result<Self, Self::Error> {
        Self::new(first, second).ok_or_else(|| "collision pair joins a body to itself".to_string())
    }
}

impl From<CollisionPair> for (BodyName, BodyName) {
    fn from(pair: CollisionPair) -> Self {
        (pair.first, pair.second)
    }
}

impl PartialEq for CollisionPair {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CollisionPair {}

impl Hash for CollisionPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for CollisionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.first, self.second)
    }
}

/// An insertion-ordered set of [`CollisionPair`]s with O(1) symmetric lookup.
///
/// Iteration follows insertion order, so two runs over identical inputs list
/// their pairs identically.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CollisionPair>", into = "Vec<CollisionPair>")]
pub struct PairSet {
    order: Vec<CollisionPair>,
    index: HashSet<CollisionPair>,
}

impl PairSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: Vec::with_capacity(capacity),
            index: HashSet::with_capacity(capacity),
        }
    }

    /// Inserts `pair`, returning `false` if it (or its mirror) was already present.
    pub fn insert(&mut self, pair: CollisionPair) -> bool {
        if self.index.contains(&pair) {
            return false;
        }
        self.index.insert(pair.clone());
        self.order.push(pair);
        true
    }

    pub fn contains(&self, pair: &CollisionPair) -> bool {
        self.index.contains(pair)
    }

    /// Symmetric membership test by name. Self-pairs are never members.
    pub fn contains_bodies(&self, a: &str, b: &str) -> bool {
        CollisionPair::new(a, b).is_some_and(|pair| self.index.contains(&pair))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CollisionPair> {
        self.order.iter()
    }

    pub fn as_slice(&self) -> &[CollisionPair] {
        &self.order
    }

    /// Pairs of `self` not present in `other`, in `self`'s order.
    pub fn difference(&self, other: &PairSet) -> PairSet {
        self.order
            .iter()
            .filter(|pair| !other.contains(pair))
            .cloned()
            .collect()
    }
}

impl PartialEq for PairSet {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl Eq for PairSet {}

impl From<Vec<CollisionPair>> for PairSet {
    fn from(pairs: Vec<CollisionPair>) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<PairSet> for Vec<CollisionPair> {
    fn from(set: PairSet) -> Self {
        set.order
    }
}

impl FromIterator<CollisionPair> for PairSet {
    fn from_iter<I: IntoIterator<Item = CollisionPair>>(iter: I) -> Self {
        let mut set = PairSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<CollisionPair> for PairSet {
    fn extend<I: IntoIterator<Item = CollisionPair>>(&mut self, iter: I) {
        for pair in iter {
            self.insert(pair);
        }
    }
}

impl<'a> IntoIterator for &'a PairSet {
    type Item = &'a CollisionPair;
    type IntoIter = std::slice::Iter<'a, CollisionPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}
