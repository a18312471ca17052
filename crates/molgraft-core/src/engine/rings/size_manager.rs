use super::RingClosureError;
use super::closability::is_closeable;
use super::path::PathSubGraph;
use crate::core::chemistry::ChemistryProvider;
use crate::core::fragspace::space::FragmentSpace;
use crate::core::models::graph::DGraph;
use crate::core::models::ids::VertexId;
use crate::engine::config::RingClosureConfig;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::trace;

/// Ring-size bookkeeping over the free ring-closing vertices (RCVs) of a graph.
///
/// Two RCVs are compatible when their attractor polarities pair, both hang from a parent
/// through ring-compatible AP classes, they are not bound to the same parent atom, and
/// the ring they would close has a positive size weight. The weight of an RCV is the sum
/// of the weights of the rings it could close.
#[derive(Debug, Clone)]
pub struct RingSizeManager<'a> {
    graph: &'a DGraph,
    config: &'a RingClosureConfig,
    rcvs: Vec<VertexId>,
    /// Pairwise chemical compatibility, independent of ring size.
    chemically_compatible: Vec<Vec<bool>>,
    adjacency: HashMap<VertexId, Vec<VertexId>>,
    sizes: Vec<Vec<Option<usize>>>,
    done: HashSet<VertexId>,
}

impl<'a> RingSizeManager<'a> {
    pub fn new(graph: &'a DGraph, space: &FragmentSpace, config: &'a RingClosureConfig) -> Self {
        let rcvs = graph.free_rcvs();
        let n = rcvs.len();
        let mut chemically_compatible = vec![vec![false; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let ok = chemically_compatible_pair(graph, space, rcvs[i], rcvs[j]);
                chemically_compatible[i][j] = ok;
                chemically_compatible[j][i] = ok;
            }
        }

        let mut adjacency: HashMap<VertexId, Vec<VertexId>> = HashMap::new();
        for (_, edge) in graph.edges_iter() {
            adjacency.entry(edge.src.vertex).or_default().push(edge.trg.vertex);
            adjacency.entry(edge.trg.vertex).or_default().push(edge.src.vertex);
        }
        let mut manager = Self {
            graph,
            config,
            rcvs,
            chemically_compatible,
            adjacency,
            sizes: Vec::new(),
            done: HashSet::new(),
        };
        let closed: Vec<(VertexId, VertexId)> = graph
            .rings()
            .iter()
            .filter_map(|r| Some((r.head()?, r.tail()?)))
            .collect();
        for (head, tail) in closed {
            manager.add_chord(head, tail);
        }
        manager.recompute_sizes();
        manager
    }

    pub fn rcvs(&self) -> &[VertexId] {
        &self.rcvs
    }

    fn index_of(&self, vertex: VertexId) -> Option<usize> {
        self.rcvs.iter().position(|&v| v == vertex)
    }

    fn add_chord(&mut self, a: VertexId, b: VertexId) {
        let (Some(pa), Some(pb)) = (self.graph.parent(a), self.graph.parent(b)) else {
            return;
        };
        if pa == pb {
            return;
        }
        self.adjacency.entry(pa).or_default().push(pb);
        self.adjacency.entry(pb).or_default().push(pa);
    }

    fn recompute_sizes(&mut self) {
        let n = self.rcvs.len();
        let mut sizes = vec![vec![None; n]; n];
        for i in 0..n {
            let distances = self.route_lengths(self.rcvs[i]);
            for j in 0..n {
                if i != j {
                    sizes[i][j] = distances.get(&self.rcvs[j]).copied();
                }
            }
        }
        self.sizes = sizes;
    }

    /// Number of vertices on the shortest route from `start` to every reachable vertex.
    fn route_lengths(&self, start: VertexId) -> HashMap<VertexId, usize> {
        let mut lengths = HashMap::from([(start, 1)]);
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            let here = lengths[&v];
            for &next in self.adjacency.get(&v).into_iter().flatten() {
                if !lengths.contains_key(&next) {
                    lengths.insert(next, here + 1);
                    queue.push_back(next);
                }
            }
        }
        lengths
    }

    fn factor(&self, i: usize, j: usize) -> u32 {
        if i == j || !self.chemically_compatible[i][j] {
            return 0;
        }
        self.sizes[i][j].map_or(0, |size| self.config.size_weight(size))
    }

    /// Size of the ring closed by two RCVs, counted in vertices along the shortest route.
    pub fn ring_size(&self, a: VertexId, b: VertexId) -> Option<usize> {
        let (i, j) = (self.index_of(a)?, self.index_of(b)?);
        self.sizes[i][j]
    }

    pub fn is_compatible_pair(&self, a: VertexId, b: VertexId) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(i), Some(j)) => self.factor(i, j) > 0,
            _ => false,
        }
    }

    pub fn is_done(&self, vertex: VertexId) -> bool {
        self.done.contains(&vertex)
    }

    /// RCVs still open, with their total ring-size weight; weightless ones are left out.
    pub fn biased_candidates(&self) -> Vec<(VertexId, u32)> {
        (0..self.rcvs.len())
            .filter(|&i| !self.done.contains(&self.rcvs[i]))
            .filter_map(|i| {
                let weight: u32 = (0..self.rcvs.len())
                    .filter(|&j| !self.done.contains(&self.rcvs[j]))
                    .map(|j| self.factor(i, j))
                    .sum();
                (weight > 0).then_some((self.rcvs[i], weight))
            })
            .collect()
    }

    /// Open partners of `vertex`, weighted by the size of the ring they would close.
    pub fn biased_partners(&self, vertex: VertexId) -> Vec<(VertexId, u32)> {
        let Some(i) = self.index_of(vertex) else {
            return Vec::new();
        };
        (0..self.rcvs.len())
            .filter(|&j| !self.done.contains(&self.rcvs[j]))
            .filter_map(|j| {
                let weight = self.factor(i, j);
                (weight > 0).then_some((self.rcvs[j], weight))
            })
            .collect()
    }

    pub fn mark_done(&mut self, vertex: VertexId) {
        self.done.insert(vertex);
    }

    /// Records a ring closed between two RCVs: their parents become adjacent.
    pub fn add_ring_closing_bond(&mut self, a: VertexId, b: VertexId) {
        trace!(?a, ?b, "Ring-closing bond added");
        self.add_chord(a, b);
        self.recompute_sizes();
    }

    /// Every open compatible pair, each listed once, judged on ring size and AP classes only.
    pub fn compatible_pairs(&self) -> Vec<(VertexId, VertexId)> {
        let n = self.rcvs.len();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let open = !self.done.contains(&self.rcvs[i]) && !self.done.contains(&self.rcvs[j]);
                if open && self.factor(i, j) > 0 {
                    pairs.push((self.rcvs[i], self.rcvs[j]));
                }
            }
        }
        pairs
    }

    /// Open compatible pairs whose ring also passes the checks enabled by the closability mode.
    pub fn closeable_pairs(
        &self,
        chem: &dyn ChemistryProvider,
    ) -> Result<Vec<(VertexId, VertexId)>, RingClosureError> {
        let mut pairs = Vec::new();
        for (a, b) in self.compatible_pairs() {
            let path = PathSubGraph::new(self.graph, a, b)?;
            if is_closeable(self.graph, &path, self.config, chem)? {
                pairs.push((a, b));
            }
        }
        Ok(pairs)
    }
}

fn chemically_compatible_pair(graph: &DGraph, space: &FragmentSpace, a: VertexId, b: VertexId) -> bool {
    if a == b {
        return false;
    }
    let polarity = |v: VertexId| {
        graph
            .vertex(v)
            .and_then(|x| x.ap(0))
            .and_then(|ap| ap.class.rca_polarity())
    };
    let (Some(pol_a), Some(pol_b)) = (polarity(a), polarity(b)) else {
        return false;
    };
    if !pol_a.pairs_with(pol_b) {
        return false;
    }
    let parent_ap = |v: VertexId| {
        let edge = graph.edge(graph.parent_edge(v)?)?;
        Some((edge.src.vertex, graph.ap(edge.src)?))
    };
    let (Some((parent_a, ap_a)), Some((parent_b, ap_b))) = (parent_ap(a), parent_ap(b)) else {
        return false;
    };
    if !space.has_ring_rule(&ap_a.class) || !space.has_ring_rule(&ap_b.class) {
        return false;
    }
    if !space.is_ring_compatible(&ap_a.class, &ap_b.class)
        && !space.is_ring_compatible(&ap_b.class, &ap_a.class)
    {
        return false;
    }
    let same_atom = parent_a == parent_b
        && matches!((ap_a.atom_index, ap_b.atom_index), (Some(x), Some(y)) if x == y);
    !same_atom
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::fragspace::space::tests::cls;
    use crate::core::models::apclass::APClass;
    use crate::core::models::graph::tests::{frag, rcv};
    use crate::core::models::topology::{ApRef, BondType};
    use crate::core::models::vertex::AttachmentPoint;

    /// Backbone b0 - b1 - b2 - b3 (APs: in A:0, out A:0, ring R:0), one neutral RCV on
    /// every backbone vertex. Returns the graph and the RCVs in backbone order.
    pub(crate) fn ladder() -> (DGraph, Vec<VertexId>) {
        let mut g = DGraph::new();
        let mut backbone: Vec<VertexId> = Vec::new();
        let mut rcvs = Vec::new();
        for i in 0..4u32 {
            let b = g.add_vertex(frag(i, i as usize, &["A:0", "A:0", "R:0"])).unwrap();
            if let Some(&prev) = backbone.last() {
                g.add_edge(ApRef::new(prev, 1), ApRef::new(b, 0), BondType::Single)
                    .unwrap();
            }
            backbone.push(b);
            let r = g.add_vertex(rcv(10 + i, APClass::rca_neutral())).unwrap();
            g.add_edge(ApRef::new(b, 2), ApRef::new(r, 0), BondType::Single)
                .unwrap();
            rcvs.push(r);
        }
        (g, rcvs)
    }

    pub(crate) fn ring_space() -> FragmentSpace {
        let mut space = FragmentSpace::new();
        space.add_ring_compatibility(cls("R:0"), cls("R:0"));
        space
    }

    pub(crate) fn permissive() -> RingClosureConfig {
        RingClosureConfig {
            ring_size_bias: vec![1; 10],
            ..RingClosureConfig::default()
        }
    }

    fn only_size(size: usize) -> RingClosureConfig {
        let mut config = RingClosureConfig {
            ring_size_bias: vec![0; 10],
            ..RingClosureConfig::default()
        };
        config.set_size_weight(size, 1);
        config
    }

    mod compatibility {
        use super::*;

        #[test]
        fn every_pair_closes_with_a_permissive_bias() {
            let (g, rcvs) = ladder();
            let space = ring_space();
            let config = permissive();
            let manager = RingSizeManager::new(&g, &space, &config);
            assert_eq!(manager.compatible_pairs().len(), 6);
            assert_eq!(manager.ring_size(rcvs[0], rcvs[3]), Some(6));
            assert_eq!(manager.ring_size(rcvs[1], rcvs[2]), Some(4));
        }

        #[test]
        fn nothing_closes_without_ring_rules() {
            let (g, _) = ladder();
            let config = permissive();
            let manager = RingSizeManager::new(&g, &FragmentSpace::new(), &config);
            assert!(manager.compatible_pairs().is_empty());
            assert!(manager.biased_candidates().is_empty());
        }

        #[test]
        fn polarities_must_pair() {
            let mut g = DGraph::new();
            let b = g.add_vertex(frag(0, 0, &["R:0", "R:0"])).unwrap();
            let plus = g.add_vertex(rcv(1, APClass::rca_plus())).unwrap();
            let plus2 = g.add_vertex(rcv(2, APClass::rca_plus())).unwrap();
            g.add_edge(ApRef::new(b, 0), ApRef::new(plus, 0), BondType::Single)
                .unwrap();
            g.add_edge(ApRef::new(b, 1), ApRef::new(plus2, 0), BondType::Single)
                .unwrap();
            let space = ring_space();
            let config = permissive();
            assert!(RingSizeManager::new(&g, &space, &config)
                .compatible_pairs()
                .is_empty());
        }

        #[test]
        fn rcvs_on_the_same_parent_atom_never_pair() {
            let mut g = DGraph::new();
            let parent = frag(0, 0, &[])
                .with_ap(AttachmentPoint::new(cls("R:0")).with_atom_index(3))
                .with_ap(AttachmentPoint::new(cls("R:0")).with_atom_index(3))
                .with_ap(AttachmentPoint::new(cls("R:0")).with_atom_index(4));
            let b = g.add_vertex(parent).unwrap();
            let mut rcvs = Vec::new();
            for i in 0..3u32 {
                let r = g.add_vertex(rcv(1 + i, APClass::rca_neutral())).unwrap();
                g.add_edge(ApRef::new(b, i as usize), ApRef::new(r, 0), BondType::Single)
                    .unwrap();
                rcvs.push(r);
            }
            let space = ring_space();
            let config = permissive();
            let manager = RingSizeManager::new(&g, &space, &config);
            assert!(!manager.is_compatible_pair(rcvs[0], rcvs[1]));
            assert!(manager.is_compatible_pair(rcvs[0], rcvs[2]));
            assert!(manager.is_compatible_pair(rcvs[1], rcvs[2]));
        }
    }

    mod size_bias {
        use super::*;

        #[test]
        fn single_allowed_size_selects_exactly_those_rings() {
            let (g, _) = ladder();
            let space = ring_space();
            let config = only_size(5);
            let manager = RingSizeManager::new(&g, &space, &config);
            let pairs = manager.compatible_pairs();
            assert_eq!(pairs.len(), 2);
            assert!(pairs
                .iter()
                .all(|&(a, b)| manager.ring_size(a, b) == Some(5)));
        }

        #[test]
        fn zero_weights_leave_no_candidates() {
            let (g, _) = ladder();
            let space = ring_space();
            let config = RingClosureConfig {
                ring_size_bias: vec![0; 10],
                ..RingClosureConfig::default()
            };
            let manager = RingSizeManager::new(&g, &space, &config);
            assert!(manager.biased_candidates().is_empty());
            assert!(manager.compatible_pairs().is_empty());
        }

        #[test]
        fn sizes_beyond_the_limit_weigh_nothing() {
            let (g, rcvs) = ladder();
            let space = ring_space();
            let config = RingClosureConfig {
                ring_size_bias: vec![1; 10],
                max_ring_size: 5,
                ..RingClosureConfig::default()
            };
            let manager = RingSizeManager::new(&g, &space, &config);
            assert!(!manager.is_compatible_pair(rcvs[0], rcvs[3]));
            assert!(manager.is_compatible_pair(rcvs[0], rcvs[2]));
        }

        #[test]
        fn candidate_weights_sum_pair_factors() {
            let (g, rcvs) = ladder();
            let space = ring_space();
            let config = permissive();
            let manager = RingSizeManager::new(&g, &space, &config);
            let candidates = manager.biased_candidates();
            assert_eq!(candidates.len(), 4);
            assert!(candidates.iter().all(|&(_, w)| w == 3));
            assert_eq!(manager.biased_partners(rcvs[0]).len(), 3);
        }
    }

    mod closability {
        use super::*;
        use crate::core::chemistry::NoChemistry;
        use crate::engine::rings::ClosabilityMode;

        #[test]
        fn size_bias_mode_keeps_every_compatible_pair() {
            let (g, _) = ladder();
            let space = ring_space();
            let config = permissive();
            let manager = RingSizeManager::new(&g, &space, &config);
            assert_eq!(
                manager.closeable_pairs(&NoChemistry).unwrap(),
                manager.compatible_pairs()
            );
        }

        #[test]
        fn constitution_mode_filters_pairs_by_required_elements() {
            let (g, _) = ladder();
            let space = ring_space();
            let mut config = RingClosureConfig {
                mode: ClosabilityMode::Constitution,
                ..permissive()
            };
            config.required_elements.insert("S".to_string());
            let manager = RingSizeManager::new(&g, &space, &config);
            assert_eq!(manager.compatible_pairs().len(), 6);
            assert!(manager.closeable_pairs(&NoChemistry).unwrap().is_empty());
        }

        #[test]
        fn geometry_mode_surfaces_chemistry_errors() {
            let (g, _) = ladder();
            let space = ring_space();
            let config = RingClosureConfig {
                mode: ClosabilityMode::Geometry3D,
                ..permissive()
            };
            let manager = RingSizeManager::new(&g, &space, &config);
            assert!(matches!(
                manager.closeable_pairs(&NoChemistry),
                Err(RingClosureError::Chemistry { .. })
            ));
        }
    }

    mod updates {
        use super::*;

        #[test]
        fn closing_a_ring_shortens_routes_and_retires_vertices() {
            let (g, rcvs) = ladder();
            let space = ring_space();
            let config = permissive();
            let mut manager = RingSizeManager::new(&g, &space, &config);
            manager.add_ring_closing_bond(rcvs[0], rcvs[3]);
            manager.mark_done(rcvs[0]);
            manager.mark_done(rcvs[3]);
            assert_eq!(manager.compatible_pairs(), vec![(rcvs[1], rcvs[2])]);
            assert_eq!(manager.ring_size(rcvs[0], rcvs[3]), Some(4));
            assert!(manager.biased_partners(rcvs[1]).iter().all(|&(v, _)| v == rcvs[2]));
        }
    }
}
