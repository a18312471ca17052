use super::apmap::ApMapping;
use super::candidates::{ApSide, compatibility_lists};
use super::iter::ApMappingIter;
use crate::core::fragspace::space::FragmentSpace;
use crate::engine::config::{DEFAULT_MAX_COMBINATIONS, MappingConfig};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, trace};

/// Switches controlling a mapping search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingOptions {
    /// Only complete mappings: every AP of both lists must be paired.
    pub require_all_aps: bool,
    /// Ignore APs that are already linked.
    pub only_unused_aps: bool,
    /// Enumerate every combination instead of stopping at `max_combinations`.
    pub complete_search: bool,
    /// Let an AP that is free throughout pair with any AP.
    pub compatible_if_free: bool,
    pub max_combinations: usize,
    /// Collapse mappings that differ only within symmetric AP sets.
    pub dedupe_symmetric: bool,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            require_all_aps: false,
            only_unused_aps: false,
            complete_search: false,
            compatible_if_free: true,
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            dedupe_symmetric: false,
        }
    }
}

impl MappingOptions {
    pub fn from_config(config: &MappingConfig) -> Self {
        Self {
            max_combinations: config.max_combinations,
            ..Self::default()
        }
    }

    pub fn require_all_aps(mut self, value: bool) -> Self {
        self.require_all_aps = value;
        self
    }

    pub fn only_unused_aps(mut self, value: bool) -> Self {
        self.only_unused_aps = value;
        self
    }

    pub fn complete_search(mut self, value: bool) -> Self {
        self.complete_search = value;
        self
    }

    pub fn compatible_if_free(mut self, value: bool) -> Self {
        self.compatible_if_free = value;
        self
    }

    pub fn max_combinations(mut self, value: usize) -> Self {
        self.max_combinations = value;
        self
    }

    pub fn dedupe_symmetric(mut self, value: bool) -> Self {
        self.dedupe_symmetric = value;
        self
    }
}

/// Outcome of a mapping search. Finding nothing is a normal outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApMappingResult {
    pub all: Vec<ApMapping>,
    pub chosen: Option<ApMapping>,
    /// Whether the bounded enumeration was cut short.
    pub stopped: bool,
}

impl ApMappingResult {
    pub fn found(&self) -> bool {
        !self.all.is_empty()
    }
}

/// Searches AP mappings from an X side onto a Y side under the compatibility rules of
/// a fragment space.
#[derive(Debug, Clone)]
pub struct ApMapFinder<'a> {
    space: &'a FragmentSpace,
    options: MappingOptions,
}

impl<'a> ApMapFinder<'a> {
    pub fn new(space: &'a FragmentSpace, options: MappingOptions) -> Self {
        Self { space, options }
    }

    pub fn options(&self) -> &MappingOptions {
        &self.options
    }

    /// Enumerates mappings that extend `forced` and picks one at random.
    #[instrument(level = "debug", skip_all, fields(x = x.len(), y = y.len()))]
    pub fn find(
        &self,
        x: &ApSide,
        y: &ApSide,
        forced: &ApMapping,
        rng: &mut impl Rng,
    ) -> ApMappingResult {
        let opts = &self.options;
        if forced.iter().any(|(k, v)| k >= x.len() || v >= y.len()) {
            debug!(%forced, "Forced mapping refers to APs that do not exist");
            return ApMappingResult::default();
        }

        let x_positions = usable_positions(x, opts.only_unused_aps, |i| forced.contains_key(i));
        let y_positions = usable_positions(y, opts.only_unused_aps, |i| forced.contains_value(i));
        let needy_x = needy_positions(x, opts);
        let needy_y = needy_positions(y, opts);

        let mut lists = compatibility_lists(
            x,
            &x_positions,
            y,
            &y_positions,
            self.space,
            opts.compatible_if_free,
        );

        let missing_key = needy_x
            .iter()
            .any(|k| !forced.contains_key(*k) && !lists.contains_key(k));
        let reachable: BTreeSet<usize> = lists.values().flatten().flatten().copied().collect();
        let missing_value = needy_y
            .iter()
            .any(|v| !forced.contains_value(*v) && !reachable.contains(v));
        if missing_key || missing_value {
            trace!("A needy AP has no compatible partner");
            return ApMappingResult::default();
        }

        if !opts.require_all_aps {
            for (key, options) in lists.iter_mut() {
                if x.aps[*key].is_free() {
                    options.push(None);
                }
            }
        }

        let mut all = Vec::new();
        let mut stopped = false;
        for mapping in ApMappingIter::new(lists.clone(), forced.clone()) {
            all.push(mapping);
            if !opts.complete_search && all.len() >= opts.max_combinations {
                stopped = true;
                break;
            }
        }
        if stopped {
            debug!(limit = opts.max_combinations, "Mapping enumeration stopped at the limit");
        }

        all.retain(|m| m.contains_all_keys(&needy_x) && m.contains_all_values(&needy_y));

        if opts.dedupe_symmetric {
            let mut seen = BTreeSet::new();
            all.retain(|m| seen.insert(m.symmetry_key(&x.symmetric_sets, &y.symmetric_sets)));
        }

        if stopped && all.is_empty() {
            if let Some(mapping) = self.random_attempts(&lists, forced, &needy_x, &needy_y, rng) {
                all.push(mapping);
            }
        }

        let chosen = all.choose(rng).cloned();
        debug!(found = all.len(), "AP mapping search done");
        ApMappingResult {
            all,
            chosen,
            stopped,
        }
    }

    /// Builds mappings by drawing one random partner per needy key.
    fn random_attempts(
        &self,
        lists: &BTreeMap<usize, Vec<Option<usize>>>,
        forced: &ApMapping,
        needy_x: &[usize],
        needy_y: &[usize],
        rng: &mut impl Rng,
    ) -> Option<ApMapping> {
        let keys: Vec<usize> = if self.options.require_all_aps {
            lists.keys().copied().collect()
        } else {
            needy_x
                .iter()
                .copied()
                .filter(|k| !forced.contains_key(*k))
                .collect()
        };
        'attempt: for _ in 0..self.options.max_combinations {
            let mut mapping = forced.clone();
            for &key in &keys {
                let free: Vec<usize> = lists
                    .get(&key)
                    .into_iter()
                    .flatten()
                    .flatten()
                    .copied()
                    .filter(|v| !mapping.contains_value(*v))
                    .collect();
                let Some(&value) = free.choose(rng) else {
                    continue 'attempt;
                };
                mapping.insert(key, value);
            }
            if !mapping.is_empty() && mapping.contains_all_values(needy_y) {
                return Some(mapping);
            }
        }
        None
    }
}

/// Positions open to the search: not already forced and, if requested, not linked.
fn usable_positions(side: &ApSide, only_unused: bool, forced: impl Fn(usize) -> bool) -> Vec<usize> {
    (0..side.len())
        .filter(|&i| !forced(i))
        .filter(|&i| !only_unused || side.aps[i].is_free())
        .collect()
}

fn needy_positions(side: &ApSide, options: &MappingOptions) -> Vec<usize> {
    let needy: Vec<usize> = if options.require_all_aps {
        (0..side.len()).collect()
    } else {
        side.needy.clone()
    };
    needy
        .into_iter()
        .filter(|&i| {
            side.aps
                .get(i)
                .is_some_and(|ap| !options.only_unused_aps || ap.is_free())
        })
        .collect()
}
