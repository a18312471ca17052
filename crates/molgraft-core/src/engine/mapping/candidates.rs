use crate::core::fragspace::space::FragmentSpace;
use crate::core::models::apclass::APClass;
use crate::core::models::embedding::{ApStatus, EmbeddedView};
use crate::core::models::graph::GraphError;
use crate::core::models::ids::VertexId;
use crate::core::models::topology::ApRef;
use crate::core::models::vertex::Vertex;
use std::collections::{BTreeMap, BTreeSet};

/// An AP as seen by the mapping search: its class and how it is linked.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingAp {
    pub class: APClass,
    pub status: ApStatus,
}

impl MappingAp {
    pub fn free(class: APClass) -> Self {
        Self {
            class,
            status: ApStatus::Free,
        }
    }

    pub fn is_free(&self) -> bool {
        self.status == ApStatus::Free
    }
}

/// One side of a mapping problem.
#[derive(Debug, Clone, Default)]
pub struct ApSide {
    pub aps: Vec<MappingAp>,
    /// Positions that must appear in every mapping.
    pub needy: Vec<usize>,
    /// Interchangeable positions.
    pub symmetric_sets: Vec<BTreeSet<usize>>,
}

impl ApSide {
    /// A vertex outside any graph: all APs are free and none is needy.
    pub fn detached(vertex: &Vertex) -> Self {
        Self {
            aps: vertex
                .aps()
                .iter()
                .map(|ap| MappingAp::free(ap.class.clone()))
                .collect(),
            needy: Vec::new(),
            symmetric_sets: vertex.symmetric_ap_sets().to_vec(),
        }
    }

    /// A vertex inside a (possibly nested) graph. APs linked to the rest of the
    /// graph, across template boundaries included, are needy.
    pub fn in_graph(view: &EmbeddedView<'_>, vertex: VertexId) -> Result<Self, GraphError> {
        let v = view
            .graph()
            .vertex(vertex)
            .ok_or(GraphError::VertexNotFound(vertex))?;
        let aps = (0..v.ap_count())
            .filter_map(|i| {
                let ap_ref = ApRef::new(vertex, i);
                v.ap(i).map(|ap| MappingAp {
                    class: ap.class.clone(),
                    status: view.linked_ap_throughout(ap_ref),
                })
            })
            .collect();
        let needy = view
            .interface_aps(&[vertex])
            .into_iter()
            .map(|ap| ap.index)
            .collect();
        Ok(Self {
            aps,
            needy,
            symmetric_sets: v.symmetric_ap_sets().to_vec(),
        })
    }

    /// An explicit AP list from a graph; `needy` must be a subset of `all`.
    pub fn from_aps(
        view: &EmbeddedView<'_>,
        all: &[ApRef],
        needy: &[ApRef],
    ) -> Result<Self, GraphError> {
        let graph = view.graph();
        let mut aps = Vec::with_capacity(all.len());
        for &ap_ref in all {
            let vertex = graph
                .vertex(ap_ref.vertex)
                .ok_or(GraphError::VertexNotFound(ap_ref.vertex))?;
            let ap = vertex.ap(ap_ref.index).ok_or(GraphError::ApOutOfRange {
                vertex: vertex.id,
                index: ap_ref.index,
                count: vertex.ap_count(),
            })?;
            aps.push(MappingAp {
                class: ap.class.clone(),
                status: view.linked_ap_throughout(ap_ref),
            });
        }
        let position = |ap: &ApRef| all.iter().position(|a| a == ap);
        let needy = needy.iter().filter_map(position).collect();

        let mut symmetric_sets = Vec::new();
        let mut seen_vertices = BTreeSet::new();
        for ap_ref in all {
            if !seen_vertices.insert(ap_ref.vertex) {
                continue;
            }
            let Some(vertex) = graph.vertex(ap_ref.vertex) else {
                continue;
            };
            for set in vertex.symmetric_ap_sets() {
                let positions: Option<BTreeSet<usize>> = set
                    .iter()
                    .map(|&i| position(&ApRef::new(ap_ref.vertex, i)))
                    .collect();
                if let Some(positions) = positions {
                    symmetric_sets.push(positions);
                }
            }
        }
        Ok(Self {
            aps,
            needy,
            symmetric_sets,
        })
    }

    pub fn len(&self) -> usize {
        self.aps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aps.is_empty()
    }
}

/// Whether `y` can take the role `x` currently plays.
///
/// Equal classes always qualify. A free `x` accepts anything when `compatible_if_free`
/// is set. A linked `x` accepts any `y` whose class forms the same link with x's partner,
/// in the same direction.
pub fn is_exchangeable(
    x: &MappingAp,
    y: &MappingAp,
    space: &FragmentSpace,
    compatible_if_free: bool,
) -> bool {
    if x.class == y.class {
        return true;
    }
    match &x.status {
        ApStatus::Free => compatible_if_free,
        ApStatus::Linked {
            partner_class,
            is_source: true,
        } => space.is_compatible(&y.class, partner_class),
        ApStatus::Linked {
            partner_class,
            is_source: false,
        } => space.is_compatible(partner_class, &y.class),
    }
}

/// For every X position with at least one match, the Y positions it may map to.
pub fn compatibility_lists(
    x: &ApSide,
    x_positions: &[usize],
    y: &ApSide,
    y_positions: &[usize],
    space: &FragmentSpace,
    compatible_if_free: bool,
) -> BTreeMap<usize, Vec<Option<usize>>> {
    let mut lists = BTreeMap::new();
    for &xi in x_positions {
        let Some(x_ap) = x.aps.get(xi) else {
            continue;
        };
        let matches: Vec<Option<usize>> = y_positions
            .iter()
            .copied()
            .filter(|&yi| {
                y.aps
                    .get(yi)
                    .is_some_and(|y_ap| is_exchangeable(x_ap, y_ap, space, compatible_if_free))
            })
            .map(Some)
            .collect();
        if !matches.is_empty() {
            lists.insert(xi, matches);
        }
    }
    lists
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fragspace::space::tests::{cls, small_space};
    use crate::core::models::graph::tests::frag;
    use crate::core::models::graph::DGraph;
    use crate::core::models::topology::BondType;

    fn linked(class: &str, partner: &str, is_source: bool) -> MappingAp {
        MappingAp {
            class: cls(class),
            status: ApStatus::Linked {
                partner_class: cls(partner),
                is_source,
            },
        }
    }

    #[test]
    fn exchangeability_respects_link_direction() {
        // A:0 binds B:0 and B:0 binds A:0
        let space = small_space();
        let x_src = linked("Z:0", "B:0", true);
        let x_trg = linked("Z:0", "A:0", false);
        assert!(is_exchangeable(&x_src, &MappingAp::free(cls("A:0")), &space, false));
        assert!(!is_exchangeable(&x_src, &MappingAp::free(cls("B:0")), &space, false));
        assert!(is_exchangeable(&x_trg, &MappingAp::free(cls("B:0")), &space, false));
        assert!(!is_exchangeable(&x_trg, &MappingAp::free(cls("A:0")), &space, true));
    }

    #[test]
    fn free_ap_accepts_anything_only_when_allowed() {
        let space = small_space();
        let x = MappingAp::free(cls("A:0"));
        let y = MappingAp::free(cls("Z:0"));
        assert!(is_exchangeable(&x, &y, &space, true));
        assert!(!is_exchangeable(&x, &y, &space, false));
        assert!(is_exchangeable(&x, &MappingAp::free(cls("A:0")), &space, false));
    }

    #[test]
    fn sides_from_graph_mark_used_aps_as_needy() {
        let mut g = DGraph::new();
        let a = g.add_vertex(frag(0, 0, &["A:0", "B:0"])).unwrap();
        let b = g.add_vertex(frag(1, 1, &["A:0"])).unwrap();
        g.add_edge(ApRef::new(a, 1), ApRef::new(b, 0), BondType::Single)
            .unwrap();
        let view = EmbeddedView::top(&g);

        let side = ApSide::in_graph(&view, a).unwrap();
        assert_eq!(side.needy, vec![1]);
        assert!(side.aps[0].is_free());
        assert!(!side.aps[1].is_free());

        let all = view.subgraph_aps(&[b]);
        let needy = view.interface_aps(&[b]);
        let list_side = ApSide::from_aps(&view, &all, &needy).unwrap();
        assert_eq!(list_side.len(), 1);
        assert_eq!(list_side.needy, vec![0]);
    }

    #[test]
    fn compatibility_lists_skip_unmatched_keys() {
        let space = small_space();
        let x = ApSide {
            aps: vec![MappingAp::free(cls("A:0")), MappingAp::free(cls("Q:0"))],
            ..ApSide::default()
        };
        let y = ApSide {
            aps: vec![MappingAp::free(cls("B:0")), MappingAp::free(cls("A:0"))],
            ..ApSide::default()
        };
        let lists = compatibility_lists(&x, &[0, 1], &y, &[0, 1], &space, false);
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[&0], vec![Some(1)]);
    }
}
