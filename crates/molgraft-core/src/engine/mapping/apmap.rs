use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Pairs of AP positions, from the first AP list (keys) to the second (values).
///
/// When the lists are the AP lists of two vertices, positions are AP indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApMapping(BTreeMap<usize, usize>);

impl ApMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    pub fn insert(&mut self, key: usize, value: usize) -> Option<usize> {
        self.0.insert(key, value)
    }

    pub fn get(&self, key: usize) -> Option<usize> {
        self.0.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: usize) -> bool {
        self.0.contains_key(&key)
    }

    pub fn contains_value(&self, value: usize) -> bool {
        self.0.values().any(|&v| v == value)
    }

    pub fn contains_all_keys(&self, keys: &[usize]) -> bool {
        keys.iter().all(|&k| self.contains_key(k))
    }

    pub fn contains_all_values(&self, values: &[usize]) -> bool {
        values.iter().all(|&v| self.contains_value(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().map(|(&k, &v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.values().copied()
    }

    pub fn as_map(&self) -> &BTreeMap<usize, usize> {
        &self.0
    }

    /// Canonical form in which positions of the same symmetric set are indistinguishable.
    pub(crate) fn symmetry_key(
        &self,
        key_sets: &[BTreeSet<usize>],
        value_sets: &[BTreeSet<usize>],
    ) -> Vec<(usize, usize)> {
        let representative = |sets: &[BTreeSet<usize>], p: usize| {
            sets.iter()
                .find(|s| s.contains(&p))
                .and_then(|s| s.first().copied())
                .unwrap_or(p)
        };
        let mut pairs: Vec<(usize, usize)> = self
            .iter()
            .map(|(k, v)| (representative(key_sets, k), representative(value_sets, v)))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

impl From<ApMapping> for BTreeMap<usize, usize> {
    fn from(mapping: ApMapping) -> Self {
        mapping.0
    }
}

impl fmt::Display for ApMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}->{v}")?;
        }
        write!(f, "}}")
    }
}
