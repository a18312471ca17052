use super::graph::DGraph;
use super::ids::{EdgeId, VertexId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// Identifier of the branch a vertex belongs to, relative to a seed vertex.
///
/// The seed holds `[0]`. Every time the tree forks, each child branch extends the
/// identifier of its parent with a fresh number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(Vec<u32>);

impl BranchId {
    pub fn levels(&self) -> &[u32] {
        &self.0
    }

    /// Whether `self` lies on the branch `other` or in one of its sub-branches.
    pub fn descends_from(&self, other: &BranchId) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in &self.0 {
            write!(f, "{level}_")?;
        }
        Ok(())
    }
}

impl DGraph {
    pub fn parent(&self, vertex: VertexId) -> Option<VertexId> {
        self.parent_edge(vertex)
            .and_then(|e| self.edge(e))
            .map(|e| e.src.vertex)
    }

    /// Children ordered by the AP index they hang from.
    pub fn child_vertices(&self, vertex: VertexId) -> Vec<VertexId> {
        self.child_edges(vertex)
            .into_iter()
            .filter_map(|e| self.edge(e))
            .map(|e| e.trg.vertex)
            .collect()
    }

    /// Root of the spanning tree; with several roots, the one with the lowest vertex id.
    pub fn source_vertex(&self) -> Option<VertexId> {
        self.vertex_ids_sorted()
            .into_iter()
            .find(|&v| self.parent_edge(v).is_none())
    }

    /// Ancestors of a vertex, nearest first.
    pub fn parent_tree(&self, vertex: VertexId) -> Vec<VertexId> {
        let mut ancestors = Vec::new();
        let mut current = vertex;
        while let Some(parent) = self.parent(current) {
            if parent == vertex || ancestors.contains(&parent) {
                break;
            }
            ancestors.push(parent);
            current = parent;
        }
        ancestors
    }

    /// Number of edges between a vertex and the root of its tree.
    pub fn level(&self, vertex: VertexId) -> Option<usize> {
        self.contains_vertex(vertex)
            .then(|| self.parent_tree(vertex).len())
    }

    /// All descendants of a vertex, depth first.
    pub fn children_tree(&self, vertex: VertexId) -> Vec<VertexId> {
        let mut children = Vec::new();
        self.collect_children(vertex, &mut children, &HashSet::new(), false);
        children
    }

    /// Descendants of `seed`, depth first, not exploring past any vertex in `limits`.
    ///
    /// Limit vertices are part of the result. With `stop_before_rcvs`, ring-closing
    /// vertices and whatever hangs below them are left out.
    pub fn child_tree_limited(
        &self,
        seed: VertexId,
        limits: &[VertexId],
        stop_before_rcvs: bool,
    ) -> Vec<VertexId> {
        let limits: HashSet<VertexId> = limits.iter().copied().collect();
        let mut children = Vec::new();
        self.collect_children(seed, &mut children, &limits, stop_before_rcvs);
        children
    }

    fn collect_children(
        &self,
        vertex: VertexId,
        children: &mut Vec<VertexId>,
        limits: &HashSet<VertexId>,
        stop_before_rcvs: bool,
    ) {
        for child in self.child_vertices(vertex) {
            if children.contains(&child) {
                continue;
            }
            if stop_before_rcvs && self.vertex(child).is_some_and(|v| v.is_rcv()) {
                continue;
            }
            children.push(child);
            if !limits.contains(&child) {
                self.collect_children(child, children, limits, stop_before_rcvs);
            }
        }
    }

    /// Descendants of `seed` together with the branch identifier of each vertex (seed included).
    pub fn children_tree_with_branches(
        &self,
        seed: VertexId,
    ) -> (Vec<VertexId>, HashMap<VertexId, BranchId>) {
        let mut children = Vec::new();
        let mut branches = HashMap::new();
        let mut next_branch = 0u32;
        let seed_branch = BranchId(vec![next_branch]);
        next_branch += 1;
        branches.insert(seed, seed_branch.clone());
        self.collect_branches(seed, &seed_branch, &mut next_branch, &mut children, &mut branches);
        (children, branches)
    }

    fn collect_branches(
        &self,
        vertex: VertexId,
        branch: &BranchId,
        next_branch: &mut u32,
        children: &mut Vec<VertexId>,
        branches: &mut HashMap<VertexId, BranchId>,
    ) {
        let kids = self.child_vertices(vertex);
        let forks = kids.len() > 1;
        for child in kids {
            if children.contains(&child) {
                continue;
            }
            children.push(child);
            let child_branch = if forks {
                let mut levels = branch.0.clone();
                levels.push(*next_branch);
                *next_branch += 1;
                BranchId(levels)
            } else {
                branch.clone()
            };
            branches.insert(child, child_branch.clone());
            self.collect_branches(child, &child_branch, next_branch, children, branches);
        }
    }

    /// The vertex closest to the root among `vertices`; ties go to the earliest listed.
    pub fn deepest_among(&self, vertices: &[VertexId]) -> Option<VertexId> {
        vertices
            .iter()
            .filter_map(|&v| self.level(v).map(|l| (l, v)))
            .min_by_key(|(l, _)| *l)
            .map(|(_, v)| v)
    }

    fn roots(&self) -> Vec<VertexId> {
        self.vertex_ids_sorted()
            .into_iter()
            .filter(|&v| self.parent_edge(v).is_none())
            .collect()
    }

    /// Breadth-first order over the spanning forest, roots by increasing vertex id.
    pub fn bfs_order(&self) -> Vec<VertexId> {
        let mut order = Vec::with_capacity(self.vertex_count());
        let mut seen = HashSet::new();
        for root in self.roots() {
            let mut queue = VecDeque::from([root]);
            seen.insert(root);
            while let Some(v) = queue.pop_front() {
                order.push(v);
                for child in self.child_vertices(v) {
                    if seen.insert(child) {
                        queue.push_back(child);
                    }
                }
            }
        }
        order
    }

    /// Depth-first pre-order over the spanning forest.
    pub fn dfs_order(&self) -> Vec<VertexId> {
        let mut order = Vec::with_capacity(self.vertex_count());
        for root in self.roots() {
            order.push(root);
            order.extend(self.children_tree(root));
        }
        order
    }

    /// Unique tree path from `from` to `to`, both included.
    pub fn path(&self, from: VertexId, to: VertexId) -> Option<Vec<VertexId>> {
        if !self.contains_vertex(from) || !self.contains_vertex(to) {
            return None;
        }
        if from == to {
            return Some(vec![from]);
        }
        let mut up_from = vec![from];
        up_from.extend(self.parent_tree(from));
        let mut up_to = vec![to];
        up_to.extend(self.parent_tree(to));

        let turning_point = up_from.iter().position(|v| up_to.contains(v))?;
        let common = up_from[turning_point];
        let to_side = up_to.iter().position(|&v| v == common)?;

        let mut path: Vec<VertexId> = up_from[..=turning_point].to_vec();
        path.extend(up_to[..to_side].iter().rev());
        Some(path)
    }

    /// Edges along the tree path from `from` to `to`.
    pub fn edge_path(&self, from: VertexId, to: VertexId) -> Option<Vec<EdgeId>> {
        let path = self.path(from, to)?;
        path.windows(2)
            .map(|pair| self.edge_between(pair[0], pair[1]))
            .collect()
    }

    /// The edge joining two adjacent vertices, in either direction.
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edges_of(a)
            .into_iter()
            .find(|&e| self.edge(e).is_some_and(|e| e.involves(b)))
    }
}
