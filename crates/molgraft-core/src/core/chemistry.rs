//! Seam towards a cheminformatics toolkit.
//!
//! The graph engine never looks inside fragment payloads. Whenever a decision needs
//! real chemistry (substructure matching, 3-D ring-closure feasibility), it asks a
//! [`ChemistryProvider`]. [`NoChemistry`] is the provider to use when no toolkit is
//! available.

use crate::core::models::graph::DGraph;
use crate::core::models::ids::VertexId;
use crate::core::models::vertex::{AttachmentPoint, Fragment};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChemistryError {
    #[error("Operation '{0}' is not supported by the chemistry provider")]
    Unsupported(&'static str),
    #[error("Chemistry provider failed: {0}")]
    Failed(String),
}

pub trait ChemistryProvider {
    /// Attachment points implied by the chemical payload of a fragment.
    fn declared_attachment_points(
        &self,
        _fragment: &Fragment,
    ) -> Result<Vec<AttachmentPoint>, ChemistryError> {
        Err(ChemistryError::Unsupported("declared_attachment_points"))
    }

    /// Element symbols found along a ring path, excluding the two ring-closing ends.
    ///
    /// The default reads the element lists stored on fragment vertices.
    fn ring_path_elements(
        &self,
        graph: &DGraph,
        path: &[VertexId],
    ) -> Result<Vec<String>, ChemistryError> {
        if path.len() < 3 {
            return Ok(Vec::new());
        }
        Ok(path[1..path.len() - 1]
            .iter()
            .filter_map(|&v| graph.vertex(v))
            .filter_map(|v| v.as_fragment())
            .flat_map(|f| f.elements.iter().cloned())
            .collect())
    }

    /// Number of matches of a substructure query on the molecule the ring would form.
    fn count_substructure_matches(
        &self,
        _graph: &DGraph,
        _path: &[VertexId],
        _query: &str,
    ) -> Result<usize, ChemistryError> {
        Err(ChemistryError::Unsupported("count_substructure_matches"))
    }

    /// Whether the ring-closing ends of a path can meet in three dimensions.
    fn is_path_closable_3d(&self, _graph: &DGraph, _path: &[VertexId]) -> Result<bool, ChemistryError> {
        Err(ChemistryError::Unsupported("is_path_closable_3d"))
    }
}

/// Provider without a chemistry toolkit behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChemistry;

impl ChemistryProvider for NoChemistry {}
