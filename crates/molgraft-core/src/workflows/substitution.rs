use crate::core::fragspace::space::FragmentSpace;
use crate::core::models::embedding::EmbeddedView;
use crate::core::models::graph::{DGraph, GraphError};
use crate::core::models::ids::{EdgeId, VertexId};
use crate::core::models::topology::ApRef;
use crate::core::models::vertex::Vertex;
use crate::engine::error::EngineError;
use crate::engine::link::LinkFinder;
use crate::engine::mapping::MappingOptions;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Replaces `vertex` with a compatible building block from the fragment space.
///
/// Returns `None` when no building block fits. Branches hanging from APs that the
/// chosen mapping leaves out are removed along with the old vertex's links.
#[instrument(skip_all, name = "substitution_workflow")]
pub fn substitute_vertex(
    graph: &mut DGraph,
    space: &FragmentSpace,
    vertex: VertexId,
    building_block: Option<usize>,
    options: MappingOptions,
    rng: &mut impl Rng,
) -> Result<Option<VertexId>, EngineError> {
    let finder = LinkFinder::new(space, options);
    let result = finder.find_for_vertex(&EmbeddedView::top(graph), vertex, building_block, rng)?;
    let Some(alternative) = result.choose(rng).cloned() else {
        debug!("No building block can replace the vertex");
        return Ok(None);
    };
    let Some(mapping) = alternative.chosen_mapping() else {
        return Ok(None);
    };
    let mapping = mapping.as_map().clone();
    let mut staged = graph.clone();
    let replaced = staged.replace_vertex(vertex, alternative.vertex, &mapping)?;
    *graph = staged;
    info!(mapping = %mapping_summary(&mapping), "Vertex substituted");
    Ok(Some(replaced))
}

/// Splits `edge` by inserting a building block between its two ends.
///
/// The graph is left untouched when any step of the insertion fails.
#[instrument(skip_all, name = "link_insertion_workflow")]
pub fn insert_link_on_edge(
    graph: &mut DGraph,
    space: &FragmentSpace,
    edge: EdgeId,
    options: MappingOptions,
    rng: &mut impl Rng,
) -> Result<Option<VertexId>, EngineError> {
    let finder = LinkFinder::new(space, options);
    let result = finder.find_for_edge(graph, edge, rng)?;
    let Some(alternative) = result.choose(rng).cloned() else {
        debug!("No building block fits on the edge");
        return Ok(None);
    };
    let (Some(towards_src), Some(towards_trg)) = (
        alternative.chosen_mapping().and_then(|m| m.get(0)),
        alternative.chosen_mapping().and_then(|m| m.get(1)),
    ) else {
        return Ok(None);
    };

    let link = splice(graph, edge, alternative.vertex, towards_src, towards_trg)?;
    Ok(Some(link))
}

/// Puts `link` in place of `edge`, bound to the old source through `towards_src` and
/// to the old target through `towards_trg`. Nothing changes on failure.
fn splice(
    graph: &mut DGraph,
    edge: EdgeId,
    link: Vertex,
    towards_src: usize,
    towards_trg: usize,
) -> Result<VertexId, GraphError> {
    let mut staged = graph.clone();
    let old = staged.remove_edge(edge)?;
    let link = staged.add_vertex(link)?;
    staged.add_edge(old.src, ApRef::new(link, towards_src), old.bond_type)?;
    staged.add_edge(ApRef::new(link, towards_trg), old.trg, old.bond_type)?;
    let id = staged.vertex(link).map(|v| v.id).ok_or(GraphError::VertexNotFound(link))?;
    *graph = staged;
    info!(id, "Link inserted");
    Ok(link)
}

fn mapping_summary(mapping: &BTreeMap<usize, usize>) -> String {
    mapping
        .iter()
        .map(|(from, to)| format!("{from}->{to}"))
        .collect::<Vec<_>>()
        .join(",")
}
