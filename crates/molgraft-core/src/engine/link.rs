//! # Link Finder
//!
//! Looks in the fragment space for building blocks that can take the place of an
//! existing vertex, or that can be inserted in the middle of an edge.

use super::error::EngineError;
use super::mapping::apmap::ApMapping;
use super::mapping::candidates::ApSide;
use super::mapping::finder::{ApMapFinder, ApMappingResult, MappingOptions};
use super::mapping::iter::ApMappingIter;
use crate::core::fragspace::space::{FragmentSpace, LibraryKind};
use crate::core::models::embedding::EmbeddedView;
use crate::core::models::graph::{DGraph, GraphError};
use crate::core::models::ids::{EdgeId, VertexId};
use crate::core::models::topology::ApRef;
use crate::core::models::vertex::{BuildingBlockType, Vertex};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// A building block that fits, with the ways its APs can be wired in.
#[derive(Debug, Clone)]
pub struct LinkAlternative {
    pub vertex: Vertex,
    pub mappings: ApMappingResult,
}

impl LinkAlternative {
    pub fn chosen_mapping(&self) -> Option<&ApMapping> {
        self.mappings.chosen.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LinkSearchResult {
    pub alternatives: Vec<LinkAlternative>,
}

impl LinkSearchResult {
    pub fn found(&self) -> bool {
        !self.alternatives.is_empty()
    }

    pub fn choose(&self, rng: &mut impl Rng) -> Option<&LinkAlternative> {
        self.alternatives.choose(rng)
    }
}

pub struct LinkFinder<'a> {
    space: &'a FragmentSpace,
    options: MappingOptions,
}

impl<'a> LinkFinder<'a> {
    pub fn new(space: &'a FragmentSpace, options: MappingOptions) -> Self {
        Self { space, options }
    }

    /// Building blocks that could replace `vertex` while keeping every used AP connected.
    ///
    /// Scaffold vertices are replaced by scaffolds and fragment vertices by fragments.
    /// With `building_block`, only that library entry is considered. Unless the options
    /// ask for a complete search, the first fitting candidate ends the search.
    #[instrument(skip_all, name = "link_for_vertex")]
    pub fn find_for_vertex(
        &self,
        view: &EmbeddedView<'_>,
        vertex: VertexId,
        building_block: Option<usize>,
        rng: &mut impl Rng,
    ) -> Result<LinkSearchResult, EngineError> {
        let original = view
            .graph()
            .vertex(vertex)
            .ok_or(GraphError::VertexNotFound(vertex))?;
        let kind = match original.bb_type() {
            BuildingBlockType::Scaffold => LibraryKind::Scaffold,
            BuildingBlockType::Fragment => LibraryKind::Fragment,
            other => {
                debug!(bb_type = %other, "No replacement library for this building-block type");
                return Ok(LinkSearchResult::default());
            }
        };
        let used_throughout = (0..original.ap_count())
            .filter(|&i| !view.is_available_throughout(ApRef::new(vertex, i)))
            .count();
        let x = ApSide::in_graph(view, vertex)?;

        let candidates = match building_block {
            Some(index) => vec![index],
            None => shuffled_indices(self.space.library(kind).len(), rng),
        };

        let finder = ApMapFinder::new(self.space, self.options.clone());
        let mut result = LinkSearchResult::default();
        for index in candidates {
            let candidate = self.space.vertex(kind, index, original.id)?;
            if candidate.same_building_block(original) || candidate.ap_count() < used_throughout {
                continue;
            }
            let mappings = finder.find(&x, &ApSide::detached(&candidate), &ApMapping::new(), rng);
            if !mappings.found() {
                continue;
            }
            result.alternatives.push(LinkAlternative {
                vertex: candidate,
                mappings,
            });
            if !self.options.complete_search {
                break;
            }
        }
        debug!(found = result.alternatives.len(), "Vertex link search done");
        Ok(result)
    }

    /// Building blocks that could be inserted between the two ends of `edge`.
    ///
    /// In every mapping, key 0 is the candidate AP bound to the source side of the edge
    /// and key 1 the AP bound to the target side.
    #[instrument(skip_all, name = "link_for_edge")]
    pub fn find_for_edge(
        &self,
        graph: &DGraph,
        edge: EdgeId,
        rng: &mut impl Rng,
    ) -> Result<LinkSearchResult, EngineError> {
        let edge = graph.edge(edge).ok_or(GraphError::EdgeNotFound(edge))?;
        let src_class = &graph
            .ap(edge.src)
            .ok_or(GraphError::VertexNotFound(edge.src.vertex))?
            .class;
        let trg_class = &graph
            .ap(edge.trg)
            .ok_or(GraphError::VertexNotFound(edge.trg.vertex))?
            .class;
        let kind = graph
            .vertex(edge.trg.vertex)
            .and_then(|v| LibraryKind::for_bb_type(v.bb_type()))
            .unwrap_or(LibraryKind::Fragment);
        let new_id = graph.next_vertex_id();

        let mut result = LinkSearchResult::default();
        for index in shuffled_indices(self.space.library(kind).len(), rng) {
            let candidate = self.space.vertex(kind, index, new_id)?;
            if candidate.ap_count() < 2 {
                continue;
            }
            let towards_src: Vec<Option<usize>> = (0..candidate.ap_count())
                .filter(|&i| {
                    candidate
                        .ap(i)
                        .is_some_and(|ap| self.space.is_compatible(src_class, &ap.class))
                })
                .map(Some)
                .collect();
            let towards_trg: Vec<Option<usize>> = (0..candidate.ap_count())
                .filter(|&i| {
                    candidate
                        .ap(i)
                        .is_some_and(|ap| self.space.is_compatible(&ap.class, trg_class))
                })
                .map(Some)
                .collect();
            if towards_src.is_empty() || towards_trg.is_empty() {
                continue;
            }

            let lists = BTreeMap::from([(0, towards_src), (1, towards_trg)]);
            let mut all = Vec::new();
            let mut stopped = false;
            for mapping in ApMappingIter::new(lists, ApMapping::new()) {
                all.push(mapping);
                if !self.options.complete_search && all.len() >= self.options.max_combinations {
                    stopped = true;
                    break;
                }
            }
            if all.is_empty() {
                continue;
            }
            let chosen = all.choose(rng).cloned();
            result.alternatives.push(LinkAlternative {
                vertex: candidate,
                mappings: ApMappingResult {
                    all,
                    chosen,
                    stopped,
                },
            });
            if !self.options.complete_search {
                break;
            }
        }
        debug!(found = result.alternatives.len(), "Edge link search done");
        Ok(result)
    }
}

fn shuffled_indices(len: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(rng);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fragspace::space::tests::small_space;
    use crate::core::models::topology::BondType;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// core(scaffold).AP0 -> ab.AP1
    fn scaffold_with_fragment(space: &FragmentSpace) -> (DGraph, VertexId, VertexId) {
        let mut g = DGraph::new();
        let core = g
            .add_vertex(space.vertex(LibraryKind::Scaffold, 0, 0).unwrap())
            .unwrap();
        let ab = g
            .add_vertex(space.vertex(LibraryKind::Fragment, 0, 1).unwrap())
            .unwrap();
        g.add_edge(ApRef::new(core, 0), ApRef::new(ab, 1), BondType::Single)
            .unwrap();
        (g, core, ab)
    }

    mod vertex_links {
        use super::*;

        #[test]
        fn complete_search_lists_every_fitting_fragment() {
            let space = small_space();
            let (g, _, ab) = scaffold_with_fragment(&space);
            let finder =
                LinkFinder::new(&space, MappingOptions::default().complete_search(true));
            let result = finder
                .find_for_vertex(&EmbeddedView::top(&g), ab, None, &mut StdRng::seed_from_u64(3))
                .unwrap();

            let mut names: Vec<String> = result
                .alternatives
                .iter()
                .filter_map(|alt| alt.vertex.as_fragment().map(|f| f.name.clone()))
                .collect();
            names.sort();
            assert_eq!(names, vec!["aab", "b"]);
            for alt in &result.alternatives {
                let mapping = alt.chosen_mapping().unwrap();
                let b_index = alt.vertex.ap_count() - 1;
                assert_eq!(mapping.get(1), Some(b_index));
                assert_eq!(alt.vertex.id, 1);
            }
            let aab = result
                .alternatives
                .iter()
                .find(|alt| alt.vertex.ap_count() == 3)
                .unwrap();
            assert_eq!(aab.mappings.all.len(), 3);
        }

        #[test]
        fn first_hit_mode_stops_after_one_candidate() {
            let space = small_space();
            let (g, _, ab) = scaffold_with_fragment(&space);
            let finder = LinkFinder::new(&space, MappingOptions::default());
            let result = finder
                .find_for_vertex(&EmbeddedView::top(&g), ab, None, &mut StdRng::seed_from_u64(3))
                .unwrap();
            assert_eq!(result.alternatives.len(), 1);
        }

        #[test]
        fn requested_building_block_is_the_only_candidate() {
            let space = small_space();
            let (g, _, ab) = scaffold_with_fragment(&space);
            let finder =
                LinkFinder::new(&space, MappingOptions::default().complete_search(true));
            let result = finder
                .find_for_vertex(&EmbeddedView::top(&g), ab, Some(1), &mut StdRng::seed_from_u64(3))
                .unwrap();
            assert_eq!(result.alternatives.len(), 1);
            assert_eq!(result.alternatives[0].vertex.bb_id(), Some(1));
        }

        #[test]
        fn vertex_is_never_replaced_by_itself() {
            let space = small_space();
            let (g, core, _) = scaffold_with_fragment(&space);
            let finder =
                LinkFinder::new(&space, MappingOptions::default().complete_search(true));
            let result = finder
                .find_for_vertex(&EmbeddedView::top(&g), core, None, &mut StdRng::seed_from_u64(3))
                .unwrap();
            assert!(!result.found());
        }

        #[test]
        fn missing_vertex_is_an_error() {
            let space = small_space();
            let (mut g, _, ab) = scaffold_with_fragment(&space);
            g.remove_vertex(ab).unwrap();
            let finder = LinkFinder::new(&space, MappingOptions::default());
            assert!(finder
                .find_for_vertex(&EmbeddedView::top(&g), ab, None, &mut StdRng::seed_from_u64(3))
                .is_err());
        }
    }

    mod edge_links {
        use super::*;

        #[test]
        fn inserted_block_bridges_both_classes() {
            let space = small_space();
            let mut g = DGraph::new();
            let core = g
                .add_vertex(space.vertex(LibraryKind::Scaffold, 0, 0).unwrap())
                .unwrap();
            let b = g
                .add_vertex(space.vertex(LibraryKind::Fragment, 1, 1).unwrap())
                .unwrap();
            let edge = g
                .add_edge(ApRef::new(core, 0), ApRef::new(b, 0), BondType::Single)
                .unwrap();

            let finder =
                LinkFinder::new(&space, MappingOptions::default().complete_search(true));
            let result = finder
                .find_for_edge(&g, edge, &mut StdRng::seed_from_u64(11))
                .unwrap();

            assert_eq!(result.alternatives.len(), 2);
            let ab = result
                .alternatives
                .iter()
                .find(|alt| alt.vertex.ap_count() == 2)
                .unwrap();
            assert_eq!(ab.mappings.all, vec![ApMapping::from_pairs([(0, 1), (1, 0)])]);
            let aab = result
                .alternatives
                .iter()
                .find(|alt| alt.vertex.ap_count() == 3)
                .unwrap();
            assert_eq!(aab.mappings.all.len(), 2);
            assert!(result.alternatives.iter().all(|alt| alt.vertex.id == 2));
        }
    }
}
