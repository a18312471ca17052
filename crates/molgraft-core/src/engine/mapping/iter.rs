use super::apmap::ApMapping;
use std::collections::BTreeMap;

/// Lazy enumeration of AP mappings by backtracking over per-key candidate lists.
///
/// Every key picks one of its options; `None` leaves the key out of the mapping. A
/// value is never used twice, neither within one assignment nor against the forced
/// `base`. Each yielded mapping is the base extended with one assignment, and empty
/// mappings are skipped.
#[derive(Debug, Clone)]
pub struct ApMappingIter {
    keys: Vec<usize>,
    options: Vec<Vec<Option<usize>>>,
    base: ApMapping,
    stack: Vec<usize>,
    started: bool,
    exhausted: bool,
}

impl ApMappingIter {
    pub fn new(lists: BTreeMap<usize, Vec<Option<usize>>>, base: ApMapping) -> Self {
        let (keys, options) = lists.into_iter().unzip();
        Self {
            keys,
            options,
            base,
            stack: Vec::new(),
            started: false,
            exhausted: false,
        }
    }

    fn chosen(&self, level: usize) -> Option<usize> {
        self.options[level][self.stack[level]]
    }

    fn conflicts(&self, level: usize) -> bool {
        let Some(value) = self.chosen(level) else {
            return false;
        };
        self.base.contains_value(value) || (0..level).any(|l| self.chosen(l) == Some(value))
    }

    /// Moves the stack to the next complete and consistent assignment.
    fn seek(&mut self) -> bool {
        loop {
            let depth = self.stack.len();
            if depth == 0 {
                return false;
            }
            let level = depth - 1;
            if self.stack[level] >= self.options[level].len() {
                self.stack.pop();
                if let Some(previous) = self.stack.last_mut() {
                    *previous += 1;
                }
                continue;
            }
            if self.conflicts(level) {
                self.stack[level] += 1;
                continue;
            }
            if depth == self.keys.len() {
                return true;
            }
            self.stack.push(0);
        }
    }

    fn current(&self) -> ApMapping {
        let mut mapping = self.base.clone();
        for (level, &key) in self.keys.iter().enumerate() {
            if let Some(value) = self.chosen(level) {
                mapping.insert(key, value);
            }
        }
        mapping
    }
}

impl Iterator for ApMappingIter {
    type Item = ApMapping;

    fn next(&mut self) -> Option<ApMapping> {
        if self.exhausted {
            return None;
        }
        if self.keys.is_empty() {
            self.exhausted = true;
            return (!self.base.is_empty()).then(|| self.base.clone());
        }
        if self.started {
            if let Some(last) = self.stack.last_mut() {
                *last += 1;
            }
        } else {
            self.started = true;
            self.stack.push(0);
        }
        loop {
            if !self.seek() {
                self.exhausted = true;
                return None;
            }
            let mapping = self.current();
            if !mapping.is_empty() {
                return Some(mapping);
            }
            if let Some(last) = self.stack.last_mut() {
                *last += 1;
            }
        }
    }
}
