use super::ids::{EdgeId, GraphTag, VertexId, VertexKey};
use super::topology::{ApRef, BondType, Edge, Ring};
use super::vertex::{AttachmentPoint, Vertex};
use slotmap::SlotMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("A vertex with id {0} already exists in the graph")]
    DuplicateVertexId(u32),
    #[error("Vertex {0:?} not found in the graph")]
    VertexNotFound(VertexId),
    #[error("Vertex {0:?} belongs to another graph")]
    ForeignVertex(VertexId),
    #[error("No vertex with id {0} in the graph")]
    VertexIdNotFound(u32),
    #[error("Edge {0:?} not found in the graph")]
    EdgeNotFound(EdgeId),
    #[error("Attachment point {index} out of range on vertex {vertex} ({count} APs)")]
    ApOutOfRange {
        vertex: u32,
        index: usize,
        count: usize,
    },
    #[error("Attachment point {index} on vertex {vertex} is already used")]
    ApAlreadyUsed { vertex: u32, index: usize },
    #[error("Cannot connect two attachment points of the same vertex {0}")]
    SameVertexEdge(u32),
    #[error("Vertex {0} is not a ring-closing vertex")]
    NotRingClosingVertex(u32),
    #[error("A ring cannot start and end on the same vertex {0}")]
    SameVertexRing(u32),
    #[error("Vertex {0} already belongs to a ring")]
    AlreadyInRing(u32),
    #[error("No tree path between vertices {from} and {to}")]
    NoPath { from: u32, to: u32 },
    #[error("Vertex {0} has no parent edge")]
    MissingParentEdge(u32),
    #[error("Ring-closing vertices disagree on bond type: {first} vs {second}")]
    InconsistentRingBondType { first: BondType, second: BondType },
    #[error("Parent edge of vertex {vertex} uses AP {ap}, which the AP mapping leaves out")]
    UnmappedParentEdge { vertex: u32, ap: usize },
    #[error("Invalid AP mapping: {0}")]
    InvalidApMapping(String),
    #[error("Invalid symmetric vertex set: {0}")]
    InvalidSymmetricSet(String),
    #[error("Template APs [{found}] do not match the required APs [{expected}]")]
    RequiredApsMismatch { expected: String, found: String },
}

/// A design graph: vertices joined by edges between attachment points, plus ring chords.
///
/// Vertices and edges live in slot-map arenas, so their handles stay valid across
/// removals and in every clone of the graph. Vertex handles carry the tag of the graph
/// that created them; handles of an unrelated graph are rejected. The integer vertex ids
/// are unique within a graph and can be resolved back to handles with
/// [`DGraph::find_vertex_by_id`].
#[derive(Debug, Clone)]
pub struct DGraph {
    tag: GraphTag,
    vertices: SlotMap<VertexKey, Vertex>,
    vertex_id_map: HashMap<u32, VertexId>,
    edges: SlotMap<EdgeId, Edge>,
    rings: Vec<Ring>,
    symmetric_vertices: Vec<BTreeSet<VertexId>>,
}

impl Default for DGraph {
    fn default() -> Self {
        Self {
            tag: GraphTag::fresh(),
            vertices: SlotMap::with_key(),
            vertex_id_map: HashMap::new(),
            edges: SlotMap::with_key(),
            rings: Vec::new(),
            symmetric_vertices: Vec::new(),
        }
    }
}

impl DGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena key of `id`, if the handle was minted by this graph or one it was cloned from.
    fn key(&self, id: VertexId) -> Option<VertexKey> {
        (id.graph() == self.tag).then(|| id.key())
    }

    fn owned_key(&self, id: VertexId) -> Result<VertexKey, GraphError> {
        let key = self.key(id).ok_or(GraphError::ForeignVertex(id))?;
        if !self.vertices.contains_key(key) {
            return Err(GraphError::VertexNotFound(id));
        }
        Ok(key)
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.key(id).and_then(|k| self.vertices.get(k))
    }

    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.key(id).and_then(|k| self.vertices.get_mut(k))
    }

    pub fn vertices_iter(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        let tag = self.tag;
        self.vertices.iter().map(move |(k, v)| (VertexId::new(tag, k), v))
    }

    /// Vertex handles ordered by integer vertex id.
    pub fn vertex_ids_sorted(&self) -> Vec<VertexId> {
        let mut ids: Vec<(u32, VertexId)> = self.vertices_iter().map(|(k, v)| (v.id, k)).collect();
        ids.sort_unstable();
        ids.into_iter().map(|(_, k)| k).collect()
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertex(id).is_some()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn find_vertex_by_id(&self, id: u32) -> Option<VertexId> {
        self.vertex_id_map.get(&id).copied()
    }

    /// Smallest integer id not used by any vertex and larger than all existing ones.
    pub fn next_vertex_id(&self) -> u32 {
        self.vertex_id_map.keys().max().map_or(0, |m| m + 1)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn edges_iter(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn symmetric_vertex_sets(&self) -> &[BTreeSet<VertexId>] {
        &self.symmetric_vertices
    }

    pub fn ap(&self, ap: ApRef) -> Option<&AttachmentPoint> {
        self.vertex(ap.vertex).and_then(|v| v.ap(ap.index))
    }

    /// The edge using `ap`, if any.
    pub fn edge_of_ap(&self, ap: ApRef) -> Option<EdgeId> {
        self.ap(ap).and_then(|a| a.user())
    }

    /// The AP on the other side of the edge using `ap`.
    pub fn linked_ap(&self, ap: ApRef) -> Option<ApRef> {
        self.edge_of_ap(ap)
            .and_then(|e| self.edges.get(e))
            .and_then(|e| e.partner_of(ap))
    }

    /// Edges touching a vertex, ordered by the AP index on that vertex.
    pub fn edges_of(&self, vertex: VertexId) -> Vec<EdgeId> {
        self.vertex(vertex)
            .map(|v| v.aps().iter().filter_map(|ap| ap.user()).collect())
            .unwrap_or_default()
    }

    /// The edge whose target end sits on `vertex`.
    pub fn parent_edge(&self, vertex: VertexId) -> Option<EdgeId> {
        self.edges_of(vertex)
            .into_iter()
            .find(|e| self.edges.get(*e).is_some_and(|e| e.trg.vertex == vertex))
    }

    /// Edges whose source end sits on `vertex`, ordered by source AP index.
    pub fn child_edges(&self, vertex: VertexId) -> Vec<EdgeId> {
        self.edges_of(vertex)
            .into_iter()
            .filter(|e| self.edges.get(*e).is_some_and(|e| e.src.vertex == vertex))
            .collect()
    }

    fn int_id(&self, vertex: VertexId) -> Result<u32, GraphError> {
        let key = self.owned_key(vertex)?;
        Ok(self.vertices[key].id)
    }

    /// Inserts a vertex with all of its APs free.
    ///
    /// Links the vertex had in another graph do not carry over.
    pub fn add_vertex(&mut self, mut vertex: Vertex) -> Result<VertexId, GraphError> {
        if self.vertex_id_map.contains_key(&vertex.id) {
            return Err(GraphError::DuplicateVertexId(vertex.id));
        }
        vertex.clear_ap_users();
        let int_id = vertex.id;
        let handle = VertexId::new(self.tag, self.vertices.insert(vertex));
        self.vertex_id_map.insert(int_id, handle);
        Ok(handle)
    }

    fn check_free_ap(&self, ap: ApRef) -> Result<(), GraphError> {
        let vertex = &self.vertices[self.owned_key(ap.vertex)?];
        let slot = vertex.ap(ap.index).ok_or(GraphError::ApOutOfRange {
            vertex: vertex.id,
            index: ap.index,
            count: vertex.ap_count(),
        })?;
        if !slot.is_available() {
            return Err(GraphError::ApAlreadyUsed {
                vertex: vertex.id,
                index: ap.index,
            });
        }
        Ok(())
    }

    fn set_ap_user(&mut self, ap: ApRef, user: Option<EdgeId>) {
        if let Some(slot) = self.vertex_mut(ap.vertex).and_then(|v| v.ap_mut(ap.index)) {
            slot.user = user;
        }
    }

    /// Connects two free APs. `src` is the parent side.
    pub fn add_edge(
        &mut self,
        src: ApRef,
        trg: ApRef,
        bond_type: BondType,
    ) -> Result<EdgeId, GraphError> {
        self.check_free_ap(src)?;
        self.check_free_ap(trg)?;
        if src.vertex == trg.vertex {
            return Err(GraphError::SameVertexEdge(self.int_id(src.vertex)?));
        }
        let id = self.edges.insert(Edge::new(src, trg, bond_type));
        self.set_ap_user(src, Some(id));
        self.set_ap_user(trg, Some(id));
        Ok(id)
    }

    /// Removes an edge and frees both APs.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, GraphError> {
        let edge = self.edges.remove(id).ok_or(GraphError::EdgeNotFound(id))?;
        self.set_ap_user(edge.src, None);
        self.set_ap_user(edge.trg, None);
        Ok(edge)
    }

    pub fn is_in_ring(&self, vertex: VertexId) -> bool {
        self.rings.iter().any(|r| r.contains(vertex))
    }

    pub fn rings_containing(&self, vertex: VertexId) -> Vec<&Ring> {
        self.rings.iter().filter(|r| r.contains(vertex)).collect()
    }

    /// Ring-closing vertices.
    pub fn rcvs(&self) -> Vec<VertexId> {
        self.vertex_ids_sorted()
            .into_iter()
            .filter(|&v| self.vertex(v).is_some_and(Vertex::is_rcv))
            .collect()
    }

    /// Ring-closing vertices that do not yet close any ring.
    pub fn free_rcvs(&self) -> Vec<VertexId> {
        self.rcvs()
            .into_iter()
            .filter(|&v| !self.rings.iter().any(|r| r.head() == Some(v) || r.tail() == Some(v)))
            .collect()
    }

    /// Closes a ring between two ring-closing vertices along their tree path.
    pub fn add_ring(
        &mut self,
        head: VertexId,
        tail: VertexId,
        bond_type: BondType,
    ) -> Result<(), GraphError> {
        let head_id = self.int_id(head)?;
        let tail_id = self.int_id(tail)?;
        if head == tail {
            return Err(GraphError::SameVertexRing(head_id));
        }
        for (v, id) in [(head, head_id), (tail, tail_id)] {
            if !self.vertex(v).is_some_and(Vertex::is_rcv) {
                return Err(GraphError::NotRingClosingVertex(id));
            }
            if self.is_in_ring(v) {
                return Err(GraphError::AlreadyInRing(id));
            }
        }
        let path = self.path(head, tail).ok_or(GraphError::NoPath {
            from: head_id,
            to: tail_id,
        })?;
        self.rings.push(Ring::new(path, bond_type));
        Ok(())
    }

    /// Bond type of the chord that would join two ring-closing vertices.
    ///
    /// The chord replaces both RCV parent edges, which must carry the same bond type.
    pub fn ring_bond_type(&self, head: VertexId, tail: VertexId) -> Result<BondType, GraphError> {
        let bond_of = |v: VertexId| -> Result<BondType, GraphError> {
            self.parent_edge(v)
                .and_then(|e| self.edges.get(e))
                .map(|e| e.bond_type)
                .ok_or(GraphError::MissingParentEdge(self.int_id(v)?))
        };
        let first = bond_of(head)?;
        let second = bond_of(tail)?;
        if first != second {
            return Err(GraphError::InconsistentRingBondType { first, second });
        }
        Ok(first)
    }

    /// Removes a vertex, its edges, the rings through it and its symmetric-set membership.
    pub fn remove_vertex(&mut self, vertex: VertexId) -> Result<Vertex, GraphError> {
        let key = self.owned_key(vertex)?;
        for edge in self.edges_of(vertex) {
            self.remove_edge(edge)?;
        }
        self.rings.retain(|r| !r.contains(vertex));
        for set in self.symmetric_vertices.iter_mut() {
            set.remove(&vertex);
        }
        self.symmetric_vertices.retain(|s| s.len() > 1);
        let removed = self
            .vertices
            .remove(key)
            .ok_or(GraphError::VertexNotFound(vertex))?;
        self.vertex_id_map.remove(&removed.id);
        Ok(removed)
    }

    /// Declares vertices that are symmetric images of each other.
    pub fn add_symmetric_vertex_set(
        &mut self,
        set: impl IntoIterator<Item = VertexId>,
    ) -> Result<(), GraphError> {
        let set: BTreeSet<VertexId> = set.into_iter().collect();
        if set.len() < 2 {
            return Err(GraphError::InvalidSymmetricSet(
                "at least two vertices are needed".to_string(),
            ));
        }
        for &v in &set {
            let id = self.int_id(v)?;
            if self.symmetric_set_of(v).is_some() {
                return Err(GraphError::InvalidSymmetricSet(format!(
                    "vertex {id} is already in a symmetric set"
                )));
            }
        }
        self.symmetric_vertices.push(set);
        Ok(())
    }

    pub fn symmetric_set_of(&self, vertex: VertexId) -> Option<&BTreeSet<VertexId>> {
        self.symmetric_vertices.iter().find(|s| s.contains(&vertex))
    }

    /// Swaps a vertex for another one, re-wiring edges according to `ap_mapping`
    /// (old AP index to new AP index).
    ///
    /// Child branches hanging from unmapped APs are deleted. The parent edge must be
    /// mapped. The replacement inherits the integer id of the replaced vertex.
    pub fn replace_vertex(
        &mut self,
        old: VertexId,
        replacement: Vertex,
        ap_mapping: &BTreeMap<usize, usize>,
    ) -> Result<VertexId, GraphError> {
        let old_vertex = &self.vertices[self.owned_key(old)?];
        let old_int_id = old_vertex.id;

        let mut seen_targets = BTreeSet::new();
        for (&from, &to) in ap_mapping {
            if from >= old_vertex.ap_count() {
                return Err(GraphError::InvalidApMapping(format!(
                    "AP {from} does not exist on the replaced vertex"
                )));
            }
            if to >= replacement.ap_count() {
                return Err(GraphError::InvalidApMapping(format!(
                    "AP {to} does not exist on the replacement vertex"
                )));
            }
            if !seen_targets.insert(to) {
                return Err(GraphError::InvalidApMapping(format!(
                    "AP {to} of the replacement vertex is mapped twice"
                )));
            }
        }

        let mut rewired = Vec::new();
        let mut dropped_children = Vec::new();
        for edge_id in self.edges_of(old) {
            let edge = self.edges[edge_id];
            let (own, is_src) = if edge.src.vertex == old {
                (edge.src, true)
            } else {
                (edge.trg, false)
            };
            match ap_mapping.get(&own.index) {
                Some(&new_index) => rewired.push((edge, is_src, new_index)),
                None if !is_src => {
                    return Err(GraphError::UnmappedParentEdge {
                        vertex: old_int_id,
                        ap: own.index,
                    });
                }
                None => dropped_children.push(edge.trg.vertex),
            }
        }

        for child in dropped_children {
            let mut branch = vec![child];
            branch.extend(self.children_tree(child));
            for v in branch {
                self.remove_vertex(v)?;
            }
        }
        for edge_id in self.edges_of(old) {
            self.remove_edge(edge_id)?;
        }

        let mut replacement = replacement.detached_copy(old_int_id);
        std::mem::swap(
            self.vertex_mut(old).ok_or(GraphError::VertexNotFound(old))?,
            &mut replacement,
        );
        let new_key = old;

        for (edge, is_src, new_index) in rewired {
            let own = ApRef::new(new_key, new_index);
            if is_src {
                self.add_edge(own, edge.trg, edge.bond_type)?;
            } else {
                self.add_edge(edge.src, own, edge.bond_type)?;
            }
        }
        Ok(new_key)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::models::apclass::APClass;
    use crate::core::models::vertex::{BuildingBlockType, Fragment};

    pub(crate) fn cls(s: &str) -> APClass {
        s.parse().unwrap()
    }

    pub(crate) fn frag(id: u32, bb_id: usize, classes: &[&str]) -> Vertex {
        let mut v = Vertex::fragment(id, Fragment::new(&format!("f{bb_id}")))
            .with_building_block(BuildingBlockType::Fragment, Some(bb_id));
        for c in classes {
            v = v.with_ap(AttachmentPoint::new(cls(c)));
        }
        v
    }

    pub(crate) fn rcv(id: u32, class: APClass) -> Vertex {
        Vertex::fragment(id, Fragment::new("rca"))
            .with_building_block(BuildingBlockType::Fragment, Some(100))
            .with_ap(AttachmentPoint::new(class))
            .with_rcv(true)
    }

    /// Linear chain v0 - v1 - ... - v(n-1), each joined through AP 1 (parent) to AP 0 (child).
    pub(crate) fn chain(n: u32) -> (DGraph, Vec<VertexId>) {
        let mut g = DGraph::new();
        let mut ids = Vec::new();
        for i in 0..n {
            let id = g.add_vertex(frag(i, i as usize, &["A:0", "A:0"])).unwrap();
            if let Some(&prev) = ids.last() {
                g.add_edge(ApRef::new(prev, 1), ApRef::new(id, 0), BondType::Single)
                    .unwrap();
            }
            ids.push(id);
        }
        (g, ids)
    }

    mod construction {
        use super::*;

        #[test]
        fn add_vertex_rejects_duplicate_ids() {
            let mut g = DGraph::new();
            g.add_vertex(frag(1, 0, &["A:0"])).unwrap();
            assert_eq!(
                g.add_vertex(frag(1, 1, &["A:0"])),
                Err(GraphError::DuplicateVertexId(1))
            );
            assert_eq!(g.next_vertex_id(), 2);
        }

        #[test]
        fn add_edge_marks_both_aps_used() {
            let (g, ids) = chain(2);
            let e = g.edge_of_ap(ApRef::new(ids[0], 1)).unwrap();
            assert_eq!(g.edge_of_ap(ApRef::new(ids[1], 0)), Some(e));
            assert_eq!(g.linked_ap(ApRef::new(ids[0], 1)), Some(ApRef::new(ids[1], 0)));
            assert_eq!(g.parent_edge(ids[1]), Some(e));
            assert_eq!(g.child_edges(ids[0]), vec![e]);
        }

        #[test]
        fn add_edge_rejects_invalid_aps() {
            let (mut g, ids) = chain(2);
            assert_eq!(
                g.add_edge(ApRef::new(ids[0], 1), ApRef::new(ids[1], 1), BondType::Single),
                Err(GraphError::ApAlreadyUsed { vertex: 0, index: 1 })
            );
            assert_eq!(
                g.add_edge(ApRef::new(ids[0], 5), ApRef::new(ids[1], 1), BondType::Single),
                Err(GraphError::ApOutOfRange {
                    vertex: 0,
                    index: 5,
                    count: 2
                })
            );
            assert_eq!(
                g.add_edge(ApRef::new(ids[0], 0), ApRef::new(ids[0], 0), BondType::Single),
                Err(GraphError::SameVertexEdge(0))
            );
            let gone = g.add_vertex(frag(7, 7, &["A:0"])).unwrap();
            g.remove_vertex(gone).unwrap();
            assert_eq!(
                g.add_edge(ApRef::new(ids[1], 1), ApRef::new(gone, 0), BondType::Single),
                Err(GraphError::VertexNotFound(gone))
            );
        }

        #[test]
        fn add_edge_rejects_aps_of_another_graph() {
            let (mut g1, own) = chain(2);
            let mut g2 = DGraph::new();
            let c = g2.add_vertex(frag(0, 0, &["A:0"])).unwrap();
            let d = g2.add_vertex(frag(1, 1, &["A:0"])).unwrap();

            assert_eq!(
                g1.add_edge(ApRef::new(c, 0), ApRef::new(d, 0), BondType::Single),
                Err(GraphError::ForeignVertex(c))
            );
            assert_eq!(
                g1.add_edge(ApRef::new(own[1], 1), ApRef::new(d, 0), BondType::Single),
                Err(GraphError::ForeignVertex(d))
            );
            assert_eq!(g1.edge_count(), 1);
            assert!(g1.vertex(c).is_none());
            assert_eq!(g1.remove_vertex(c), Err(GraphError::ForeignVertex(c)));
        }

        #[test]
        fn clones_share_handles() {
            let (g, ids) = chain(3);
            let mut copy = g.clone();
            let e = copy.parent_edge(ids[2]).unwrap();
            copy.remove_edge(e).unwrap();
            assert!(copy
                .add_edge(ApRef::new(ids[1], 1), ApRef::new(ids[2], 0), BondType::Double)
                .is_ok());
            assert_eq!(g.edge(g.parent_edge(ids[2]).unwrap()).unwrap().bond_type, BondType::Single);
        }

        #[test]
        fn added_vertex_starts_with_free_aps() {
            let (g, ids) = chain(2);
            let linked = g.vertex(ids[0]).unwrap().clone();
            assert!(!linked.ap(1).unwrap().is_available());

            let mut fresh = DGraph::new();
            let v = fresh.add_vertex(linked).unwrap();
            let other = fresh.add_vertex(frag(5, 5, &["A:0"])).unwrap();
            assert!(fresh.vertex(v).unwrap().aps().iter().all(|ap| ap.is_available()));
            assert!(fresh
                .add_edge(ApRef::new(v, 1), ApRef::new(other, 0), BondType::Single)
                .is_ok());
        }

        #[test]
        fn remove_edge_frees_aps() {
            let (mut g, ids) = chain(2);
            let e = g.parent_edge(ids[1]).unwrap();
            g.remove_edge(e).unwrap();
            assert!(g.ap(ApRef::new(ids[0], 1)).unwrap().is_available());
            assert!(g.ap(ApRef::new(ids[1], 0)).unwrap().is_available());
            assert_eq!(g.remove_edge(e), Err(GraphError::EdgeNotFound(e)));
        }
    }

    mod rings {
        use super::*;

        fn graph_with_two_rcvs() -> (DGraph, VertexId, VertexId, VertexId) {
            let mut g = DGraph::new();
            let hub = g.add_vertex(frag(0, 0, &["A:0", "A:0", "A:0"])).unwrap();
            let r1 = g.add_vertex(rcv(1, APClass::rca_plus())).unwrap();
            let r2 = g.add_vertex(rcv(2, APClass::rca_minus())).unwrap();
            g.add_edge(ApRef::new(hub, 0), ApRef::new(r1, 0), BondType::Single)
                .unwrap();
            g.add_edge(ApRef::new(hub, 1), ApRef::new(r2, 0), BondType::Single)
                .unwrap();
            (g, hub, r1, r2)
        }

        #[test]
        fn add_ring_uses_tree_path() {
            let (mut g, hub, r1, r2) = graph_with_two_rcvs();
            assert_eq!(g.free_rcvs(), vec![r1, r2]);
            g.add_ring(r1, r2, BondType::Single).unwrap();
            assert_eq!(g.rings()[0].vertices(), &[r1, hub, r2]);
            assert!(g.free_rcvs().is_empty());
            assert_eq!(
                g.add_ring(r1, r2, BondType::Single),
                Err(GraphError::AlreadyInRing(1))
            );
        }

        #[test]
        fn add_ring_requires_distinct_rcvs() {
            let (mut g, hub, r1, _) = graph_with_two_rcvs();
            assert_eq!(
                g.add_ring(r1, r1, BondType::Single),
                Err(GraphError::SameVertexRing(1))
            );
            assert_eq!(
                g.add_ring(hub, r1, BondType::Single),
                Err(GraphError::NotRingClosingVertex(0))
            );
        }

        #[test]
        fn add_ring_rejects_rcvs_of_another_graph() {
            let (mut g, _, r1, _) = graph_with_two_rcvs();
            let (other, _, _, foreign) = graph_with_two_rcvs();
            assert_eq!(
                g.add_ring(r1, foreign, BondType::Single),
                Err(GraphError::ForeignVertex(foreign))
            );
            assert!(g.rings().is_empty());
            assert!(other.rings().is_empty());
        }

        #[test]
        fn add_ring_requires_path() {
            let mut g = DGraph::new();
            let r1 = g.add_vertex(rcv(1, APClass::rca_plus())).unwrap();
            let r2 = g.add_vertex(rcv(2, APClass::rca_minus())).unwrap();
            assert_eq!(
                g.add_ring(r1, r2, BondType::Single),
                Err(GraphError::NoPath { from: 1, to: 2 })
            );
        }

        #[test]
        fn ring_bond_type_requires_agreeing_parent_edges() {
            let (mut g, hub, r1, r2) = graph_with_two_rcvs();
            assert_eq!(g.ring_bond_type(r1, r2), Ok(BondType::Single));
            let e = g.parent_edge(r2).unwrap();
            g.remove_edge(e).unwrap();
            assert_eq!(g.ring_bond_type(r1, r2), Err(GraphError::MissingParentEdge(2)));
            g.add_edge(ApRef::new(hub, 1), ApRef::new(r2, 0), BondType::Double)
                .unwrap();
            assert_eq!(
                g.ring_bond_type(r1, r2),
                Err(GraphError::InconsistentRingBondType {
                    first: BondType::Single,
                    second: BondType::Double
                })
            );
        }

        #[test]
        fn remove_vertex_drops_rings_and_frees_partner_aps() {
            let (mut g, hub, r1, r2) = graph_with_two_rcvs();
            g.add_ring(r1, r2, BondType::Single).unwrap();
            g.add_symmetric_vertex_set([r1, r2]).unwrap();
            g.remove_vertex(r2).unwrap();
            assert!(g.rings().is_empty());
            assert!(g.symmetric_vertex_sets().is_empty());
            assert!(g.ap(ApRef::new(hub, 1)).unwrap().is_available());
            assert_eq!(g.find_vertex_by_id(2), None);
            assert_eq!(g.vertex_count(), 2);
        }
    }

    mod symmetry {
        use super::*;

        #[test]
        fn symmetric_sets_must_be_disjoint() {
            let (mut g, ids) = chain(4);
            g.add_symmetric_vertex_set([ids[1], ids[2]]).unwrap();
            assert!(g.symmetric_set_of(ids[2]).unwrap().contains(&ids[1]));
            assert!(matches!(
                g.add_symmetric_vertex_set([ids[2], ids[3]]),
                Err(GraphError::InvalidSymmetricSet(_))
            ));
            assert!(matches!(
                g.add_symmetric_vertex_set([ids[3]]),
                Err(GraphError::InvalidSymmetricSet(_))
            ));
        }
    }

    mod replacement {
        use super::*;

        #[test]
        fn replace_vertex_rewires_mapped_edges() {
            let (mut g, ids) = chain(3);
            let replacement = frag(50, 7, &["B:0", "A:0", "A:0"]);
            let mapping = BTreeMap::from([(0, 1), (1, 2)]);
            let new_key = g.replace_vertex(ids[1], replacement, &mapping).unwrap();
            let v = g.vertex(new_key).unwrap();
            assert_eq!(v.id, 1);
            assert_eq!(v.bb_id(), Some(7));
            assert_eq!(g.linked_ap(ApRef::new(ids[0], 1)), Some(ApRef::new(new_key, 1)));
            assert_eq!(g.linked_ap(ApRef::new(new_key, 2)), Some(ApRef::new(ids[2], 0)));
            assert!(v.ap(0).unwrap().is_available());
            assert_eq!(g.edge_count(), 2);
        }

        #[test]
        fn replace_vertex_drops_unmapped_child_branches() {
            let (mut g, ids) = chain(4);
            let mapping = BTreeMap::from([(0, 0)]);
            let new_key = g
                .replace_vertex(ids[1], frag(9, 9, &["A:0"]), &mapping)
                .unwrap();
            assert_eq!(g.vertex_count(), 2);
            assert!(g.vertex(ids[2]).is_none());
            assert!(g.vertex(ids[3]).is_none());
            assert_eq!(g.parent(new_key), Some(ids[0]));
        }

        #[test]
        fn replace_vertex_requires_parent_edge_mapping() {
            let (mut g, ids) = chain(3);
            let mapping = BTreeMap::from([(1, 0)]);
            assert_eq!(
                g.replace_vertex(ids[1], frag(9, 9, &["A:0", "A:0"]), &mapping),
                Err(GraphError::UnmappedParentEdge { vertex: 1, ap: 0 })
            );
            let bad = BTreeMap::from([(0, 0), (1, 0)]);
            assert!(matches!(
                g.replace_vertex(ids[1], frag(9, 9, &["A:0", "A:0"]), &bad),
                Err(GraphError::InvalidApMapping(_))
            ));
        }
    }
}
