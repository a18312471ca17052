use super::graph::{DGraph, GraphError};
use super::ids::VertexId;
use std::collections::HashSet;

impl DGraph {
    /// Clone of the graph restricted to `seed` and its descendants, stopping at (and
    /// including) the `frontier` vertices.
    ///
    /// Handles are preserved, so vertices of the result can be looked up with the same
    /// [`VertexId`] as in `self`. APs that pointed outside the subgraph become free.
    pub fn extract_subgraph(
        &self,
        seed: VertexId,
        frontier: &[VertexId],
        stop_before_rcvs: bool,
    ) -> Result<DGraph, GraphError> {
        if !self.contains_vertex(seed) {
            return Err(GraphError::VertexNotFound(seed));
        }
        let mut members = vec![seed];
        members.extend(self.child_tree_limited(seed, frontier, stop_before_rcvs));
        self.extract_subgraph_from(&members)
    }

    /// Clone of the graph restricted to `seed` and all its descendants.
    pub fn extract_branch(&self, seed: VertexId) -> Result<DGraph, GraphError> {
        self.extract_subgraph(seed, &[], false)
    }

    /// Clone of the graph restricted to an explicit collection of vertices.
    pub fn extract_subgraph_from(&self, vertices: &[VertexId]) -> Result<DGraph, GraphError> {
        let keep: HashSet<VertexId> = vertices.iter().copied().collect();
        if let Some(&missing) = keep.iter().find(|&&v| !self.contains_vertex(v)) {
            return Err(GraphError::VertexNotFound(missing));
        }
        let mut sub = self.clone();
        let doomed: Vec<VertexId> = self
            .vertex_ids_sorted()
            .into_iter()
            .filter(|v| !keep.contains(v))
            .collect();
        for v in doomed {
            sub.remove_vertex(v)?;
        }
        Ok(sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::apclass::APClass;
    use crate::core::models::graph::tests::{chain, frag, rcv};
    use crate::core::models::topology::{ApRef, BondType};

    #[test]
    fn extract_branch_keeps_descendants_and_frees_cut_ap() {
        let (g, ids) = chain(5);
        let sub = g.extract_branch(ids[2]).unwrap();
        assert_eq!(sub.vertex_count(), 3);
        assert_eq!(sub.edge_count(), 2);
        assert!(sub.vertex(ids[2]).is_some());
        assert!(sub.vertex(ids[1]).is_none());
        assert!(sub.ap(ApRef::new(ids[2], 0)).unwrap().is_available());
        assert_eq!(sub.source_vertex(), Some(ids[2]));
        assert_eq!(g.vertex_count(), 5);
    }

    #[test]
    fn extract_subgraph_includes_frontier_vertices() {
        let (g, ids) = chain(5);
        let sub = g.extract_subgraph(ids[1], &[ids[3]], false).unwrap();
        let kept: Vec<u32> = sub
            .vertex_ids_sorted()
            .into_iter()
            .map(|v| sub.vertex(v).unwrap().id)
            .collect();
        assert_eq!(kept, vec![1, 2, 3]);
        assert!(sub.ap(ApRef::new(ids[3], 1)).unwrap().is_available());
    }

    #[test]
    fn extract_subgraph_keeps_internal_rings_only() {
        let mut g = DGraph::new();
        let hub = g.add_vertex(frag(0, 0, &["A:0", "A:0", "A:0"])).unwrap();
        let mid = g.add_vertex(frag(1, 1, &["A:0", "A:0", "A:0"])).unwrap();
        let r1 = g.add_vertex(rcv(2, APClass::rca_plus())).unwrap();
        let r2 = g.add_vertex(rcv(3, APClass::rca_minus())).unwrap();
        g.add_edge(ApRef::new(hub, 0), ApRef::new(mid, 0), BondType::Single)
            .unwrap();
        g.add_edge(ApRef::new(mid, 1), ApRef::new(r1, 0), BondType::Single)
            .unwrap();
        g.add_edge(ApRef::new(mid, 2), ApRef::new(r2, 0), BondType::Single)
            .unwrap();
        g.add_ring(r1, r2, BondType::Single).unwrap();

        let with_rcvs = g.extract_branch(mid).unwrap();
        assert_eq!(with_rcvs.rings().len(), 1);

        let without_rcvs = g.extract_subgraph(mid, &[], true).unwrap();
        assert_eq!(without_rcvs.vertex_count(), 1);
        assert!(without_rcvs.rings().is_empty());
    }

    #[test]
    fn extract_from_unknown_vertex_fails() {
        let (mut g, ids) = chain(3);
        g.remove_vertex(ids[2]).unwrap();
        assert_eq!(
            g.extract_subgraph_from(&[ids[0], ids[2]]).err(),
            Some(GraphError::VertexNotFound(ids[2]))
        );
    }
}
