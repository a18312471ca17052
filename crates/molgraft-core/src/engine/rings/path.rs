use crate::core::models::graph::{DGraph, GraphError};
use crate::core::models::ids::{EdgeId, VertexId};
use crate::core::models::topology::ApRef;

/// The tree path between two vertices, seen as the backbone of a candidate ring.
#[derive(Debug, Clone)]
pub struct PathSubGraph {
    vertices: Vec<VertexId>,
    edges: Vec<EdgeId>,
    /// Per edge: the AP on the side of the head, then the AP on the side of the tail.
    ap_chain: Vec<(ApRef, ApRef)>,
    turning_point: VertexId,
    chain_id: String,
    reverse_chain_id: String,
    all_chain_ids: Vec<String>,
    path_graph: DGraph,
}

impl PathSubGraph {
    pub fn new(graph: &DGraph, head: VertexId, tail: VertexId) -> Result<Self, GraphError> {
        let int_id = |v: VertexId| {
            graph
                .vertex(v)
                .map(|x| x.id)
                .ok_or(GraphError::VertexNotFound(v))
        };
        let no_path = || -> Result<GraphError, GraphError> {
            Ok(GraphError::NoPath {
                from: int_id(head)?,
                to: int_id(tail)?,
            })
        };
        let vertices = match graph.path(head, tail) {
            Some(path) => path,
            None => return Err(no_path()?),
        };
        let edges = match graph.edge_path(head, tail) {
            Some(edges) => edges,
            None => return Err(no_path()?),
        };

        let mut ap_chain = Vec::with_capacity(edges.len());
        for (step, &edge_id) in vertices.windows(2).zip(&edges) {
            let edge = graph.edge(edge_id).ok_or(GraphError::EdgeNotFound(edge_id))?;
            if edge.src.vertex == step[0] {
                ap_chain.push((edge.src, edge.trg));
            } else {
                ap_chain.push((edge.trg, edge.src));
            }
        }

        let turning_point = vertices
            .iter()
            .copied()
            .min_by_key(|&v| graph.level(v).unwrap_or(usize::MAX))
            .unwrap_or(head);

        let tokens = chain_tokens(graph, &vertices, &ap_chain);
        let inner_count = tokens.len();
        let internal: &[VertexId] = if vertices.len() > 2 {
            &vertices[1..vertices.len() - 1]
        } else {
            &[]
        };
        let tp = internal.iter().position(|&v| v == turning_point);
        let reverse_tokens: Vec<String> = tokens.iter().rev().map(|t| t.reversed()).collect();
        let forward_tokens: Vec<String> = tokens.iter().map(|t| t.forward()).collect();

        let tp_forward = tp.map_or(-1, |k| k as i64);
        let tp_reverse = tp.map_or(-1, |k| (inner_count - 1 - k) as i64);
        let chain_id = format!("{}%{tp_forward}", forward_tokens.concat());
        let reverse_chain_id = format!("{}%{tp_reverse}", reverse_tokens.concat());
        let mut all_chain_ids = Vec::new();
        for parts in [&forward_tokens, &reverse_tokens] {
            for shift in 0..parts.len() {
                let mut rotated = parts.to_vec();
                rotated.rotate_left(shift);
                let id = rotated.concat();
                if !all_chain_ids.contains(&id) {
                    all_chain_ids.push(id);
                }
            }
        }

        let path_graph = build_path_graph(graph, &vertices, &ap_chain, &edges)?;

        Ok(Self {
            vertices,
            edges,
            ap_chain,
            turning_point,
            chain_id,
            reverse_chain_id,
            all_chain_ids,
            path_graph,
        })
    }

    pub fn head(&self) -> VertexId {
        self.vertices[0]
    }

    pub fn tail(&self) -> VertexId {
        self.vertices[self.vertices.len() - 1]
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn ap_chain(&self) -> &[(ApRef, ApRef)] {
        &self.ap_chain
    }

    /// The path vertex closest to the root of the spanning tree.
    pub fn turning_point(&self) -> VertexId {
        self.turning_point
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn reverse_chain_id(&self) -> &str {
        &self.reverse_chain_id
    }

    /// Every rotation of the chain read in both directions, without the turning point.
    pub fn all_chain_ids(&self) -> &[String] {
        &self.all_chain_ids
    }

    /// Copies of the path vertices, linked from head to tail.
    pub fn path_graph(&self) -> &DGraph {
        &self.path_graph
    }

    /// Number of vertices in the ring this path would close, both ends included.
    pub fn ring_size(&self) -> usize {
        self.vertices.len()
    }
}

struct ChainToken {
    bb_id: i64,
    bb_type: i32,
    back_ap: usize,
    front_ap: usize,
}

impl ChainToken {
    fn forward(&self) -> String {
        format!(
            "{}/{}/ap{}ap{}_",
            self.bb_id, self.bb_type, self.back_ap, self.front_ap
        )
    }

    fn reversed(&self) -> String {
        format!(
            "{}/{}/ap{}ap{}_",
            self.bb_id, self.bb_type, self.front_ap, self.back_ap
        )
    }
}

fn chain_tokens(graph: &DGraph, vertices: &[VertexId], ap_chain: &[(ApRef, ApRef)]) -> Vec<ChainToken> {
    if vertices.len() < 3 {
        return Vec::new();
    }
    (1..vertices.len() - 1)
        .filter_map(|i| {
            let vertex = graph.vertex(vertices[i])?;
            Some(ChainToken {
                bb_id: vertex.bb_id().map_or(-1, |id| id as i64),
                bb_type: vertex.bb_type().code(),
                back_ap: ap_chain[i - 1].1.index,
                front_ap: ap_chain[i].0.index,
            })
        })
        .collect()
}

fn build_path_graph(
    graph: &DGraph,
    vertices: &[VertexId],
    ap_chain: &[(ApRef, ApRef)],
    edges: &[EdgeId],
) -> Result<DGraph, GraphError> {
    let mut path_graph = DGraph::new();
    let mut copies = Vec::with_capacity(vertices.len());
    for &v in vertices {
        let original = graph.vertex(v).ok_or(GraphError::VertexNotFound(v))?;
        copies.push(path_graph.add_vertex(original.detached_copy(original.id))?);
    }
    for (i, (&(near_head, near_tail), &edge_id)) in ap_chain.iter().zip(edges).enumerate() {
        let bond_type = graph
            .edge(edge_id)
            .map(|e| e.bond_type)
            .ok_or(GraphError::EdgeNotFound(edge_id))?;
        path_graph.add_edge(
            ApRef::new(copies[i], near_head.index),
            ApRef::new(copies[i + 1], near_tail.index),
            bond_type,
        )?;
    }
    Ok(path_graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::graph::tests::{chain, frag};
    use crate::core::models::topology::BondType;

    /// root(0) with two branches: root.AP0 -> l1(1).AP0 -> l2(2), root.AP1 -> r1(3).
    fn forked() -> (DGraph, Vec<VertexId>) {
        let mut g = DGraph::new();
        let root = g.add_vertex(frag(0, 0, &["A:0", "A:0"])).unwrap();
        let l1 = g.add_vertex(frag(1, 1, &["A:0", "A:0"])).unwrap();
        let l2 = g.add_vertex(frag(2, 2, &["A:0"])).unwrap();
        let r1 = g.add_vertex(frag(3, 3, &["A:0"])).unwrap();
        g.add_edge(ApRef::new(root, 0), ApRef::new(l1, 0), BondType::Single)
            .unwrap();
        g.add_edge(ApRef::new(l1, 1), ApRef::new(l2, 0), BondType::Double)
            .unwrap();
        g.add_edge(ApRef::new(root, 1), ApRef::new(r1, 0), BondType::Single)
            .unwrap();
        (g, vec![root, l1, l2, r1])
    }

    #[test]
    fn path_through_the_turning_point() {
        let (g, ids) = forked();
        let path = PathSubGraph::new(&g, ids[2], ids[3]).unwrap();
        assert_eq!(path.vertices(), &[ids[2], ids[1], ids[0], ids[3]]);
        assert_eq!(path.turning_point(), ids[0]);
        assert_eq!(path.ring_size(), 4);
        assert_eq!(path.edges().len(), 3);
        assert_eq!(path.ap_chain()[0], (ApRef::new(ids[2], 0), ApRef::new(ids[1], 1)));
        assert_eq!(path.head(), ids[2]);
        assert_eq!(path.tail(), ids[3]);
    }

    #[test]
    fn chain_ids_describe_internal_vertices_in_both_directions() {
        let (g, ids) = forked();
        let path = PathSubGraph::new(&g, ids[2], ids[3]).unwrap();
        assert_eq!(path.chain_id(), "1/1/ap1ap0_0/1/ap0ap1_%1");
        assert_eq!(path.reverse_chain_id(), "0/1/ap1ap0_1/1/ap0ap1_%0");
        assert!(path.all_chain_ids().contains(&"0/1/ap0ap1_1/1/ap1ap0_".to_string()));
        assert_eq!(path.all_chain_ids().len(), 4);
    }

    #[test]
    fn turning_point_at_an_end_is_reported_as_missing() {
        let (g, ids) = chain(4);
        let path = PathSubGraph::new(&g, ids[0], ids[3]).unwrap();
        assert!(path.chain_id().ends_with("%-1"));
        assert!(path.reverse_chain_id().ends_with("%-1"));
    }

    #[test]
    fn path_graph_runs_from_head_to_tail() {
        let (g, ids) = forked();
        let path = PathSubGraph::new(&g, ids[2], ids[3]).unwrap();
        let pg = path.path_graph();
        assert_eq!(pg.vertex_count(), 4);
        assert_eq!(pg.edge_count(), 3);
        let head = pg.find_vertex_by_id(2).unwrap();
        assert_eq!(pg.parent(head), None);
        let tail = pg.find_vertex_by_id(3).unwrap();
        assert_eq!(pg.parent_tree(tail).len(), 3);
        let first = pg.edge(pg.child_edges(head)[0]).unwrap();
        assert_eq!(first.bond_type, BondType::Double);
    }

    #[test]
    fn disconnected_vertices_have_no_path() {
        let (mut g, ids) = chain(2);
        let lone = g.add_vertex(frag(9, 9, &["A:0"])).unwrap();
        assert_eq!(
            PathSubGraph::new(&g, ids[0], lone).unwrap_err(),
            GraphError::NoPath { from: 0, to: 9 }
        );
    }
}
