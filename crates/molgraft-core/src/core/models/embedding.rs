use super::apclass::APClass;
use super::graph::DGraph;
use super::ids::VertexId;
use super::template::Template;
use super::topology::ApRef;
use std::fmt;

/// Template vertices to descend through, outermost first, to reach a nested graph.
///
/// Paths only hold handles, so a path computed on one graph resolves the same way in
/// any clone of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EmbeddingPath(Vec<VertexId>);

impl EmbeddingPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn steps(&self) -> &[VertexId] {
        &self.0
    }

    pub fn child(&self, template_vertex: VertexId) -> Self {
        let mut steps = self.0.clone();
        steps.push(template_vertex);
        Self(steps)
    }

    /// The path to the graph holding the template this path ends in.
    pub fn parent(&self) -> Option<(EmbeddingPath, VertexId)> {
        let (&last, rest) = self.0.split_last()?;
        Some((Self(rest.to_vec()), last))
    }
}

impl fmt::Display for EmbeddingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/")?;
        for step in &self.0 {
            write!(f, "{step:?}/")?;
        }
        Ok(())
    }
}

/// How an AP is connected once every template boundary above it is taken into account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApStatus {
    Free,
    Linked {
        partner_class: APClass,
        /// Whether the AP is the source (parent side) of the linking edge.
        is_source: bool,
    },
}

impl DGraph {
    /// Resolves a nested graph.
    pub fn embedded_graph(&self, path: &EmbeddingPath) -> Option<&DGraph> {
        let mut graph = self;
        for &step in path.steps() {
            graph = graph.vertex(step)?.as_template()?.inner();
        }
        Some(graph)
    }

    /// Finds where `target` sits among the graphs nested in `self`, by identity.
    pub fn embedding_path_of(&self, target: &DGraph) -> Option<EmbeddingPath> {
        self.nested_graphs()
            .into_iter()
            .find(|(_, g)| std::ptr::eq(*g, target))
            .map(|(path, _)| path)
    }

    /// This graph and every graph nested in its templates, at any depth, outermost first.
    pub fn nested_graphs(&self) -> Vec<(EmbeddingPath, &DGraph)> {
        let mut found = vec![(EmbeddingPath::root(), self)];
        let mut cursor = 0;
        while cursor < found.len() {
            let (path, graph) = found[cursor].clone();
            for vid in graph.vertex_ids_sorted() {
                if let Some(template) = graph.vertex(vid).and_then(|v| v.as_template()) {
                    found.push((path.child(vid), template.inner()));
                }
            }
            cursor += 1;
        }
        found
    }
}

/// A nested graph seen together with the graphs that embed it.
#[derive(Debug, Clone)]
pub struct EmbeddedView<'a> {
    root: &'a DGraph,
    path: EmbeddingPath,
    graph: &'a DGraph,
}

impl<'a> EmbeddedView<'a> {
    pub fn new(root: &'a DGraph, path: EmbeddingPath) -> Option<Self> {
        let graph = root.embedded_graph(&path)?;
        Some(Self { root, path, graph })
    }

    pub fn top(root: &'a DGraph) -> Self {
        Self {
            root,
            path: EmbeddingPath::root(),
            graph: root,
        }
    }

    pub fn graph(&self) -> &'a DGraph {
        self.graph
    }

    pub fn root(&self) -> &'a DGraph {
        self.root
    }

    pub fn path(&self) -> &EmbeddingPath {
        &self.path
    }

    /// The template whose inner graph is the viewed graph.
    pub fn jacket(&self) -> Option<&'a Template> {
        let (parent_path, template_vertex) = self.path.parent()?;
        self.root
            .embedded_graph(&parent_path)?
            .vertex(template_vertex)?
            .as_template()
    }

    fn outer(&self) -> Option<(EmbeddedView<'a>, VertexId)> {
        let (parent_path, template_vertex) = self.path.parent()?;
        let view = EmbeddedView::new(self.root, parent_path)?;
        Some((view, template_vertex))
    }

    /// Follows an AP up through template boundaries until it meets an edge.
    pub fn linked_ap_throughout(&self, ap: ApRef) -> ApStatus {
        if let Some(edge) = self.graph.edge_of_ap(ap).and_then(|e| self.graph.edge(e)) {
            let is_source = edge.src == ap;
            let partner = if is_source { edge.trg } else { edge.src };
            if let Some(partner_ap) = self.graph.ap(partner) {
                return ApStatus::Linked {
                    partner_class: partner_ap.class.clone(),
                    is_source,
                };
            }
        }
        let Some((outer_view, template_vertex)) = self.outer() else {
            return ApStatus::Free;
        };
        let outer_index = outer_view
            .graph
            .vertex(template_vertex)
            .and_then(|v| v.as_template())
            .and_then(|t| t.outer_index_of(ap));
        match outer_index {
            Some(index) => outer_view.linked_ap_throughout(ApRef::new(template_vertex, index)),
            None => ApStatus::Free,
        }
    }

    pub fn is_available_throughout(&self, ap: ApRef) -> bool {
        self.linked_ap_throughout(ap) == ApStatus::Free
    }

    /// APs of `subgraph` that connect it to anything else: edges leaving the
    /// subgraph, or locally free APs that are used beyond a template boundary.
    pub fn interface_aps(&self, subgraph: &[VertexId]) -> Vec<ApRef> {
        self.collect_aps(subgraph, |view, ap| {
            if view.is_available_throughout(ap) {
                return false;
            }
            match view.graph.linked_ap(ap) {
                Some(partner) => !subgraph.contains(&partner.vertex),
                None => true,
            }
        })
    }

    /// APs of `subgraph` that are free, or used by an edge leaving the subgraph.
    pub fn subgraph_aps(&self, subgraph: &[VertexId]) -> Vec<ApRef> {
        self.collect_aps(subgraph, |view, ap| match view.graph.linked_ap(ap) {
            Some(partner) => !subgraph.contains(&partner.vertex),
            None => true,
        })
    }

    fn collect_aps(
        &self,
        subgraph: &[VertexId],
        keep: impl Fn(&Self, ApRef) -> bool,
    ) -> Vec<ApRef> {
        subgraph
            .iter()
            .filter_map(|&v| self.graph.vertex(v).map(|vertex| (v, vertex.ap_count())))
            .flat_map(|(v, count)| (0..count).map(move |i| ApRef::new(v, i)))
            .filter(|&ap| keep(self, ap))
            .collect()
    }
}
