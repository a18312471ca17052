use crate::core::models::embedding::EmbeddingPath;
use crate::core::models::graph::{DGraph, GraphError};
use crate::core::models::ids::VertexId;
use crate::core::models::topology::ApRef;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossoverType {
    /// A vertex with everything hanging below it.
    Branch,
    /// A connected piece delimited by end points below its seed.
    Subgraph,
}

impl fmt::Display for CrossoverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch => write!(f, "BRANCH"),
            Self::Subgraph => write!(f, "SUBGRAPH"),
        }
    }
}

/// The part of one parent graph that takes part in a crossover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSide {
    /// Where the subgraph lives, relative to the outermost graph.
    pub path: EmbeddingPath,
    pub vertices: Vec<VertexId>,
    /// APs that tie the subgraph to the rest of the graph.
    pub needy_aps: Vec<ApRef>,
}

impl SiteSide {
    pub fn size(&self) -> usize {
        self.vertices.len()
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Checks that this side can be resolved in `root`.
    fn check_in(&self, root: &DGraph) -> Result<(), GraphError> {
        let mut graph = root;
        for &step in self.path.steps() {
            graph = graph
                .vertex(step)
                .and_then(|v| v.as_template())
                .map(|t| t.inner())
                .ok_or(GraphError::VertexNotFound(step))?;
        }
        if let Some(&missing) = self.vertices.iter().find(|&&v| !graph.contains_vertex(v)) {
            return Err(GraphError::VertexNotFound(missing));
        }
        if let Some(ap) = self.needy_aps.iter().find(|ap| graph.ap(**ap).is_none()) {
            return Err(GraphError::VertexNotFound(ap.vertex));
        }
        Ok(())
    }
}

/// A pair of subgraphs, one per parent, that can be swapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XoverSite {
    pub a: SiteSide,
    pub b: SiteSide,
    pub kind: CrossoverType,
}

impl XoverSite {
    /// Combined number of vertices on both sides.
    pub fn size(&self) -> usize {
        self.a.size() + self.b.size()
    }

    /// The same site with the two parents swapped.
    pub fn mirror(&self) -> Self {
        Self {
            a: self.b.clone(),
            b: self.a.clone(),
            kind: self.kind,
        }
    }

    /// Re-targets the site on copies of the parent graphs.
    ///
    /// Vertex handles survive cloning, so the projection only has to verify that every
    /// location still resolves in the copies.
    pub fn project_onto(&self, a: &DGraph, b: &DGraph) -> Result<Self, GraphError> {
        self.a.check_in(a)?;
        self.b.check_in(b)?;
        Ok(self.clone())
    }
}

impl fmt::Display for XoverSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} site: {} vertices at {} <-> {} vertices at {}",
            self.kind,
            self.a.size(),
            self.a.path,
            self.b.size(),
            self.b.path
        )
    }
}
