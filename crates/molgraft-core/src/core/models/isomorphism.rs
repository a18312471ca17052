use super::graph::DGraph;
use super::ids::VertexId;
use super::topology::BondType;
use super::vertex::Vertex;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Vertex identity, AP indices and bond types must all match.
    Full,
    /// Only ring-closing flags and bond types must match.
    Structural,
}

/// Comparable label of one connection seen from one of its ends.
type LinkKey = (bool, usize, usize, BondType, bool);

#[derive(Debug, Clone, Copy)]
struct Link {
    far: VertexId,
    key: LinkKey,
}

fn adjacency(graph: &DGraph, mode: Mode) -> HashMap<VertexId, Vec<Link>> {
    let mut adj: HashMap<VertexId, Vec<Link>> =
        graph.vertices_iter().map(|(k, _)| (k, Vec::new())).collect();
    for (_, edge) in graph.edges_iter() {
        let (src_key, trg_key) = match mode {
            Mode::Full => (
                (false, edge.src.index, edge.trg.index, edge.bond_type, true),
                (false, edge.trg.index, edge.src.index, edge.bond_type, false),
            ),
            Mode::Structural => (
                (false, 0, 0, edge.bond_type, false),
                (false, 0, 0, edge.bond_type, false),
            ),
        };
        if let Some(links) = adj.get_mut(&edge.src.vertex) {
            links.push(Link {
                far: edge.trg.vertex,
                key: src_key,
            });
        }
        if let Some(links) = adj.get_mut(&edge.trg.vertex) {
            links.push(Link {
                far: edge.src.vertex,
                key: trg_key,
            });
        }
    }
    for ring in graph.rings() {
        if let (Some(head), Some(tail)) = (ring.head(), ring.tail()) {
            let key = (true, 0, 0, ring.bond_type, false);
            if let Some(links) = adj.get_mut(&head) {
                links.push(Link { far: tail, key });
            }
            if let Some(links) = adj.get_mut(&tail) {
                links.push(Link { far: head, key });
            }
        }
    }
    adj
}

fn sorted_keys(links: &[Link]) -> Vec<LinkKey> {
    let mut keys: Vec<LinkKey> = links.iter().map(|l| l.key).collect();
    keys.sort();
    keys
}

struct Matcher<'a, F: Fn(&Vertex, &Vertex) -> bool> {
    a: &'a DGraph,
    b: &'a DGraph,
    adj_a: HashMap<VertexId, Vec<Link>>,
    adj_b: HashMap<VertexId, Vec<Link>>,
    order: Vec<VertexId>,
    a_to_b: HashMap<VertexId, VertexId>,
    b_taken: HashMap<VertexId, VertexId>,
    same_vertex: F,
}

impl<F: Fn(&Vertex, &Vertex) -> bool> Matcher<'_, F> {
    fn feasible(&self, va: VertexId, vb: VertexId) -> bool {
        let (Some(vertex_a), Some(vertex_b)) = (self.a.vertex(va), self.b.vertex(vb)) else {
            return false;
        };
        if !(self.same_vertex)(vertex_a, vertex_b) {
            return false;
        }
        let links_a = &self.adj_a[&va];
        let links_b = &self.adj_b[&vb];
        if sorted_keys(links_a) != sorted_keys(links_b) {
            return false;
        }
        // Connections to already-mapped neighbours must be mirrored exactly.
        for link in links_a {
            let Some(&far_b) = self.a_to_b.get(&link.far) else {
                continue;
            };
            let mut from_a: Vec<LinkKey> = links_a
                .iter()
                .filter(|l| l.far == link.far)
                .map(|l| l.key)
                .collect();
            let mut from_b: Vec<LinkKey> = links_b
                .iter()
                .filter(|l| l.far == far_b)
                .map(|l| l.key)
                .collect();
            from_a.sort();
            from_b.sort();
            if from_a != from_b {
                return false;
            }
        }
        true
    }

    fn search(&mut self, depth: usize) -> bool {
        let Some(&va) = self.order.get(depth) else {
            return true;
        };
        let candidates = self.b.vertex_ids_sorted();
        for vb in candidates {
            if self.b_taken.contains_key(&vb) || !self.feasible(va, vb) {
                continue;
            }
            self.a_to_b.insert(va, vb);
            self.b_taken.insert(vb, va);
            if self.search(depth + 1) {
                return true;
            }
            self.a_to_b.remove(&va);
            self.b_taken.remove(&vb);
        }
        false
    }
}

fn equivalent(a: &DGraph, b: &DGraph, mode: Mode) -> bool {
    if a.vertex_count() != b.vertex_count()
        || a.edge_count() != b.edge_count()
        || a.rings().len() != b.rings().len()
    {
        return false;
    }
    let same_vertex = move |x: &Vertex, y: &Vertex| match mode {
        Mode::Full => x.same_identity(y),
        Mode::Structural => x.is_rcv() == y.is_rcv(),
    };
    let mut matcher = Matcher {
        a,
        b,
        adj_a: adjacency(a, mode),
        adj_b: adjacency(b, mode),
        order: a.bfs_order(),
        a_to_b: HashMap::new(),
        b_taken: HashMap::new(),
        same_vertex,
    };
    matcher.search(0)
}

impl DGraph {
    /// Whether the two graphs have the same vertices (building blocks and AP classes)
    /// connected through the same APs with the same bond types, rings included.
    pub fn is_isomorphic_to(&self, other: &DGraph) -> bool {
        equivalent(self, other, Mode::Full)
    }

    /// Whether the two graphs have the same shape, comparing only ring-closing flags
    /// and bond types.
    pub fn is_isostructural_to(&self, other: &DGraph) -> bool {
        equivalent(self, other, Mode::Structural)
    }
}
