use crate::core::models::apclass::APClass;
use crate::core::models::vertex::Vertex;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Lookup tables derived from the fragment and capping libraries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Fragment indices grouped by number of APs.
    pub by_ap_count: BTreeMap<usize, Vec<usize>>,
    /// Distinct AP classes of each fragment, indexed like the fragment library.
    pub classes_per_fragment: Vec<BTreeSet<APClass>>,
    /// `(fragment index, AP index)` pairs per AP class.
    pub aps_by_class: HashMap<APClass, Vec<(usize, usize)>>,
    /// Capping-group indices per AP class they expose.
    pub capping_by_class: HashMap<APClass, Vec<usize>>,
}

impl Classification {
    pub fn build(fragments: &[Vertex], caps: &[Vertex]) -> Self {
        let mut classification = Self::default();
        for (frag_id, fragment) in fragments.iter().enumerate() {
            classification
                .by_ap_count
                .entry(fragment.ap_count())
                .or_default()
                .push(frag_id);
            classification
                .classes_per_fragment
                .push(fragment.ap_classes());
            for (ap_id, ap) in fragment.aps().iter().enumerate() {
                classification
                    .aps_by_class
                    .entry(ap.class.clone())
                    .or_default()
                    .push((frag_id, ap_id));
            }
        }
        for (cap_id, cap) in caps.iter().enumerate() {
            for class in cap.ap_classes() {
                classification
                    .capping_by_class
                    .entry(class)
                    .or_default()
                    .push(cap_id);
            }
        }
        classification
    }
}
