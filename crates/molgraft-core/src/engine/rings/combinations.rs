use super::RingClosureError;
use super::closability::is_closeable;
use super::path::PathSubGraph;
use super::size_manager::RingSizeManager;
use crate::core::chemistry::ChemistryProvider;
use crate::core::fragspace::space::FragmentSpace;
use crate::core::models::graph::DGraph;
use crate::core::models::topology::Ring;
use crate::engine::config::RingClosureConfig;
use crate::engine::utils::sampling::try_weighted_sample;
use rand::Rng;
use tracing::{debug, trace};

/// Endless source of random ring sets for one graph.
///
/// Every item is a fresh, independent draw. The rings of one set never share a
/// ring-closing vertex; an empty set means no ring could be closed.
pub struct RandomCombOfRingsIterator<'a, R: Rng> {
    graph: &'a DGraph,
    space: &'a FragmentSpace,
    config: &'a RingClosureConfig,
    chem: &'a dyn ChemistryProvider,
    rng: R,
}

impl<'a, R: Rng> RandomCombOfRingsIterator<'a, R> {
    pub fn new(
        graph: &'a DGraph,
        space: &'a FragmentSpace,
        config: &'a RingClosureConfig,
        chem: &'a dyn ChemistryProvider,
        rng: R,
    ) -> Self {
        Self {
            graph,
            space,
            config,
            chem,
            rng,
        }
    }

    fn sample(&mut self) -> Result<Vec<Ring>, RingClosureError> {
        let mut manager = RingSizeManager::new(self.graph, self.space, self.config);
        let mut candidates = manager.biased_candidates();
        let mut rings = Vec::new();

        while rings.len() < self.config.max_ring_closures {
            let weights: Vec<u32> = candidates.iter().map(|&(_, w)| w).collect();
            let Some(pick) = try_weighted_sample(&weights, &mut self.rng) else {
                break;
            };
            let (head, _) = candidates.remove(pick);
            candidates.retain(|&(v, _)| v != head);
            if manager.is_done(head) {
                continue;
            }

            let mut partners = manager.biased_partners(head);
            loop {
                let weights: Vec<u32> = partners.iter().map(|&(_, w)| w).collect();
                let Some(pick) = try_weighted_sample(&weights, &mut self.rng) else {
                    break;
                };
                let (tail, _) = partners.remove(pick);
                let path = PathSubGraph::new(self.graph, head, tail)?;
                if !is_closeable(self.graph, &path, self.config, self.chem)? {
                    continue;
                }
                let bond_type = self.graph.ring_bond_type(head, tail)?;
                trace!(chain = path.chain_id(), size = path.ring_size(), "Ring selected");
                rings.push(Ring::new(path.vertices().to_vec(), bond_type));
                candidates.retain(|&(v, _)| v != tail);
                manager.add_ring_closing_bond(head, tail);
                manager.mark_done(tail);
                break;
            }
            manager.mark_done(head);
        }

        debug!(rings = rings.len(), "Sampled combination of rings");
        Ok(rings)
    }
}

impl<R: Rng> Iterator for RandomCombOfRingsIterator<'_, R> {
    type Item = Result<Vec<Ring>, RingClosureError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.sample())
    }
}
