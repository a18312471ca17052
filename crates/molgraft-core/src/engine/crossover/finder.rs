use super::combinatorics::{bounded_permutations, bounded_product};
use super::site::{CrossoverType, SiteSide, XoverSite};
use crate::core::fragspace::space::FragmentSpace;
use crate::core::models::embedding::{EmbeddedView, EmbeddingPath};
use crate::core::models::graph::DGraph;
use crate::core::models::ids::VertexId;
use crate::core::models::template::ContractLevel;
use crate::core::models::topology::ApRef;
use crate::core::models::vertex::BuildingBlockType;
use crate::engine::config::CrossoverConfig;
use crate::engine::error::EngineError;
use crate::engine::mapping::apmap::ApMapping;
use crate::engine::mapping::candidates::ApSide;
use crate::engine::mapping::finder::{ApMapFinder, MappingOptions};
use crate::engine::progress::{Progress, ProgressReporter};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, instrument, trace};

type EndPair = (VertexId, VertexId);

/// Site identity: per side, the embedding path and the sorted vertex set with every
/// vertex replaced by the first member of its symmetric set.
type SiteKey = (EmbeddingPath, Vec<VertexId>, EmbeddingPath, Vec<VertexId>);

/// Finds the places where two graphs can exchange subgraphs.
pub struct CrossoverSiteFinder<'a> {
    space: &'a FragmentSpace,
    config: CrossoverConfig,
}

struct Collector {
    sites: Vec<XoverSite>,
    keys: HashSet<SiteKey>,
}

impl<'a> CrossoverSiteFinder<'a> {
    pub fn new(space: &'a FragmentSpace, config: CrossoverConfig) -> Self {
        Self { space, config }
    }

    /// All crossover sites between `a` and `b`, smallest first.
    ///
    /// A graph is never crossed with itself nor with an isomorphic copy.
    #[instrument(skip_all, name = "crossover_sites")]
    pub fn find_sites(
        &self,
        a: &DGraph,
        b: &DGraph,
        reporter: &ProgressReporter,
        rng: &mut impl Rng,
    ) -> Result<Vec<XoverSite>, EngineError> {
        if std::ptr::eq(a, b) || a.is_isomorphic_to(b) {
            debug!("Parents are the same graph; no crossover sites");
            return Ok(Vec::new());
        }
        let mut collector = Collector {
            sites: Vec::new(),
            keys: HashSet::new(),
        };
        self.collect(
            &EmbeddedView::top(a),
            &EmbeddedView::top(b),
            &mut collector,
            reporter,
            rng,
        )?;
        let mut sites = collector.sites;
        sites.sort_by_key(XoverSite::size);
        reporter.report(Progress::SearchFinish { found: sites.len() });
        debug!(found = sites.len(), "Crossover site search done");
        Ok(sites)
    }

    fn collect(
        &self,
        view_a: &EmbeddedView<'_>,
        view_b: &EmbeddedView<'_>,
        collector: &mut Collector,
        reporter: &ProgressReporter,
        rng: &mut impl Rng,
    ) -> Result<(), EngineError> {
        let pairs = self.compatible_seed_pairs(view_a.graph(), view_b.graph());
        reporter.report(Progress::SearchStart {
            name: "crossover seeds",
            total_steps: pairs.len() as u64,
        });
        for &(seed_a, seed_b) in &pairs {
            self.branch_site(view_a, view_b, seed_a, seed_b, collector, rng)?;
            self.subgraph_sites(view_a, view_b, seed_a, seed_b, &pairs, collector, rng)?;
            reporter.report(Progress::SearchIncrement);
        }

        let open_templates = |view: &EmbeddedView<'_>| -> Vec<VertexId> {
            view.graph()
                .vertex_ids_sorted()
                .into_iter()
                .filter(|&v| {
                    view.graph()
                        .vertex(v)
                        .and_then(|v| v.as_template())
                        .is_some_and(|t| t.contract() != ContractLevel::Fixed)
                })
                .collect()
        };
        for ta in open_templates(view_a) {
            for tb in open_templates(view_b) {
                let inner_a = EmbeddedView::new(view_a.root(), view_a.path().child(ta));
                let inner_b = EmbeddedView::new(view_b.root(), view_b.path().child(tb));
                if let (Some(inner_a), Some(inner_b)) = (inner_a, inner_b) {
                    trace!(a = %inner_a.path(), b = %inner_b.path(), "Entering templates");
                    self.collect(&inner_a, &inner_b, collector, reporter, rng)?;
                }
            }
        }
        Ok(())
    }

    /// Target vertices of edge pairs that could be cut and re-joined crosswise.
    fn compatible_seed_pairs(&self, a: &DGraph, b: &DGraph) -> Vec<EndPair> {
        let cuttable = |g: &DGraph| {
            g.edges_iter()
                .filter(|(_, e)| {
                    g.vertex(e.trg.vertex)
                        .is_some_and(|v| v.bb_type() != BuildingBlockType::Cap)
                })
                .filter_map(|(_, e)| {
                    let src = g.ap(e.src)?.class.clone();
                    let trg = g.ap(e.trg)?.class.clone();
                    Some((e.trg.vertex, src, trg))
                })
                .collect::<Vec<_>>()
        };
        let edges_b = cuttable(b);
        let mut pairs = Vec::new();
        for (trg_a, src_class_a, trg_class_a) in cuttable(a) {
            for (trg_b, src_class_b, trg_class_b) in &edges_b {
                if self.space.is_compatible(&src_class_a, trg_class_b)
                    && self.space.is_compatible(src_class_b, &trg_class_a)
                    && !pairs.contains(&(trg_a, *trg_b))
                {
                    pairs.push((trg_a, *trg_b));
                }
            }
        }
        pairs.sort();
        pairs
    }

    fn branch_site(
        &self,
        view_a: &EmbeddedView<'_>,
        view_b: &EmbeddedView<'_>,
        seed_a: VertexId,
        seed_b: VertexId,
        collector: &mut Collector,
        rng: &mut impl Rng,
    ) -> Result<(), EngineError> {
        let (ga, gb) = (view_a.graph(), view_b.graph());
        let mut sub_a = vec![seed_a];
        sub_a.extend(ga.children_tree(seed_a));
        let mut sub_b = vec![seed_b];
        sub_b.extend(gb.children_tree(seed_b));
        if sub_a.len().max(sub_b.len()) > self.config.max_subgraph_size {
            return Ok(());
        }
        if ga
            .extract_branch(seed_a)?
            .is_isomorphic_to(&gb.extract_branch(seed_b)?)
        {
            return Ok(());
        }
        self.check_and_add(
            CrossoverType::Branch,
            view_a,
            sub_a,
            view_b,
            sub_b,
            collector,
            rng,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn subgraph_sites(
        &self,
        view_a: &EmbeddedView<'_>,
        view_b: &EmbeddedView<'_>,
        seed_a: VertexId,
        seed_b: VertexId,
        pairs: &[EndPair],
        collector: &mut Collector,
        rng: &mut impl Rng,
    ) -> Result<(), EngineError> {
        let (ga, gb) = (view_a.graph(), view_b.graph());
        let below_a: HashSet<VertexId> = std::iter::once(seed_a)
            .chain(ga.children_tree(seed_a))
            .collect();
        let below_b: HashSet<VertexId> = std::iter::once(seed_b)
            .chain(gb.children_tree(seed_b))
            .collect();
        let fixed_struct = [view_a, view_b]
            .iter()
            .any(|v| v.jacket().is_some_and(|t| t.contract() == ContractLevel::FixedStruct));

        let mut ends: Vec<EndPair> = Vec::new();
        for &(va, vb) in pairs {
            if (va, vb) == (seed_a, seed_b) {
                continue;
            }
            let (Some(end_a), Some(end_b)) = (ga.parent(va), gb.parent(vb)) else {
                continue;
            };
            if !below_a.contains(&end_a) || !below_b.contains(&end_b) {
                continue;
            }
            if fixed_struct {
                let len_a = ga.path(seed_a, end_a).map(|p| p.len());
                let len_b = gb.path(seed_b, end_b).map(|p| p.len());
                if len_a != len_b {
                    continue;
                }
            }
            if !ends.contains(&(end_a, end_b)) {
                ends.push((end_a, end_b));
            }
        }
        if ends.is_empty() {
            return Ok(());
        }

        let groups_a = group_by_branch(ga, &ends, |e| e.0);
        let groups_b = group_by_branch(gb, &ends, |e| e.1);
        let groups = if groups_b.len() < groups_a.len() {
            groups_b
        } else {
            groups_a
        };
        let options: Vec<Vec<Option<EndPair>>> = groups
            .into_values()
            .map(|group| {
                let mut options: Vec<Option<EndPair>> = group.into_iter().map(Some).collect();
                options.push(None);
                options
            })
            .collect();

        let combinations: Vec<Vec<EndPair>> =
            bounded_product(&options, self.config.max_end_point_combinations)
                .into_iter()
                .map(|combo| combo.into_iter().flatten().collect::<Vec<_>>())
                .filter(|combo| !combo.is_empty() && !has_shared_ends(combo))
                .take(self.config.max_end_point_sets)
                .collect();
        trace!(count = combinations.len(), "End-point combinations");

        for combination in combinations {
            for permutation in bounded_permutations(&combination, self.config.max_permutations) {
                let (ends_a, ends_b) = delimiting_ends(ga, gb, seed_a, seed_b, &permutation);
                let sub_a = delimited(ga, seed_a, &ends_a);
                let sub_b = delimited(gb, seed_b, &ends_b);
                if sub_a.len().max(sub_b.len()) > self.config.max_subgraph_size {
                    continue;
                }
                if sub_a.len() == 1 && sub_b.len() == 1 {
                    let same = ga
                        .vertex(sub_a[0])
                        .zip(gb.vertex(sub_b[0]))
                        .is_some_and(|(x, y)| x.same_identity(y));
                    if same {
                        continue;
                    }
                }
                if ga
                    .extract_subgraph_from(&sub_a)?
                    .is_isomorphic_to(&gb.extract_subgraph_from(&sub_b)?)
                {
                    continue;
                }
                self.check_and_add(
                    CrossoverType::Subgraph,
                    view_a,
                    sub_a,
                    view_b,
                    sub_b,
                    collector,
                    rng,
                )?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn check_and_add(
        &self,
        kind: CrossoverType,
        view_a: &EmbeddedView<'_>,
        sub_a: Vec<VertexId>,
        view_b: &EmbeddedView<'_>,
        sub_b: Vec<VertexId>,
        collector: &mut Collector,
        rng: &mut impl Rng,
    ) -> Result<(), EngineError> {
        let needy_a = view_a.interface_aps(&sub_a);
        let needy_b = view_b.interface_aps(&sub_b);
        let all_a = view_a.subgraph_aps(&sub_a);
        let all_b = view_b.subgraph_aps(&sub_b);
        if needy_a.len() > all_b.len() || needy_b.len() > all_a.len() {
            return Ok(());
        }
        if self.leaves_forbidden_end(view_a, &all_a, &needy_a)
            || self.leaves_forbidden_end(view_b, &all_b, &needy_b)
        {
            trace!("Site rejected: it would leave an uncappable forbidden end");
            return Ok(());
        }

        let jackets = [view_a.jacket(), view_b.jacket()];
        let accept_directly = kind == CrossoverType::Branch && jackets.iter().all(Option::is_none);
        if !accept_directly {
            let fixed_struct = jackets
                .iter()
                .flatten()
                .any(|t| t.contract() == ContractLevel::FixedStruct);
            if fixed_struct {
                let ring_bound = |view: &EmbeddedView<'_>, sub: &[VertexId]| {
                    sub.iter().any(|&v| {
                        view.graph().vertex(v).is_some_and(|x| x.is_rcv())
                            && view.graph().is_in_ring(v)
                    })
                };
                if ring_bound(view_a, &sub_a) || ring_bound(view_b, &sub_b) {
                    return Ok(());
                }
                let graph_a = view_a.graph().extract_subgraph_from(&sub_a)?;
                let graph_b = view_b.graph().extract_subgraph_from(&sub_b)?;
                if !graph_a.is_isostructural_to(&graph_b) {
                    return Ok(());
                }
            }

            let x = ApSide::from_aps(view_a, &all_a, &needy_a)?;
            let y = ApSide::from_aps(view_b, &all_b, &needy_b)?;
            let mut forced = ApMapping::new();
            if let (Some(root_a), Some(root_b)) = (
                root_ap(view_a.graph(), &sub_a, &all_a),
                root_ap(view_b.graph(), &sub_b, &all_b),
            ) {
                forced.insert(root_a, root_b);
            }
            let options = MappingOptions::from_config(&self.config.mapping)
                .require_all_aps(true)
                .complete_search(false)
                .compatible_if_free(false);
            let result = ApMapFinder::new(self.space, options).find(&x, &y, &forced, rng);
            if !result.found() {
                return Ok(());
            }
        }

        let site = XoverSite {
            a: SiteSide {
                path: view_a.path().clone(),
                vertices: sub_a,
                needy_aps: needy_a,
            },
            b: SiteSide {
                path: view_b.path().clone(),
                vertices: sub_b,
                needy_aps: needy_b,
            },
            kind,
        };
        let key = site_key(view_a.graph(), view_b.graph(), &site);
        if collector.keys.insert(key) {
            trace!(%site, "Crossover site accepted");
            collector.sites.push(site);
        }
        Ok(())
    }

    /// Whether an AP left free by the swap would be a forbidden end nothing can cap.
    fn leaves_forbidden_end(
        &self,
        view: &EmbeddedView<'_>,
        all: &[ApRef],
        needy: &[ApRef],
    ) -> bool {
        all.iter()
            .filter(|ap| !needy.contains(ap))
            .filter_map(|ap| view.graph().ap(*ap))
            .any(|ap| {
                self.space.is_forbidden_end(&ap.class) && self.space.capping_class(&ap.class).is_none()
            })
    }
}

/// Position, within `all`, of the AP through which the subgraph hangs from its parent.
fn root_ap(graph: &DGraph, sub: &[VertexId], all: &[ApRef]) -> Option<usize> {
    let root = graph.deepest_among(sub)?;
    let edge = graph.edge(graph.parent_edge(root)?)?;
    all.iter().position(|ap| *ap == edge.trg)
}

fn group_by_branch(
    graph: &DGraph,
    ends: &[EndPair],
    pick: impl Fn(&EndPair) -> VertexId,
) -> BTreeMap<String, Vec<EndPair>> {
    let branches = graph
        .source_vertex()
        .map(|source| graph.children_tree_with_branches(source).1)
        .unwrap_or_default();
    let mut groups: BTreeMap<String, Vec<EndPair>> = BTreeMap::new();
    for end in ends {
        let branch = branches
            .get(&pick(end))
            .map(ToString::to_string)
            .unwrap_or_default();
        groups.entry(branch).or_default().push(*end);
    }
    groups
}

fn has_shared_ends(combination: &[EndPair]) -> bool {
    let mut seen_a = HashSet::new();
    let mut seen_b = HashSet::new();
    combination
        .iter()
        .any(|&(a, b)| !seen_a.insert(a) || !seen_b.insert(b))
}

/// End points of a permutation, skipping those already lying on the path towards an
/// earlier end.
fn delimiting_ends(
    ga: &DGraph,
    gb: &DGraph,
    seed_a: VertexId,
    seed_b: VertexId,
    permutation: &[EndPair],
) -> (Vec<VertexId>, Vec<VertexId>) {
    let mut covered_a = HashSet::new();
    let mut covered_b = HashSet::new();
    let mut ends_a = Vec::new();
    let mut ends_b = Vec::new();
    for &(end_a, end_b) in permutation {
        if covered_a.contains(&end_a) || covered_b.contains(&end_b) {
            continue;
        }
        covered_a.extend(ga.path(seed_a, end_a).unwrap_or_default());
        covered_b.extend(gb.path(seed_b, end_b).unwrap_or_default());
        ends_a.push(end_a);
        ends_b.push(end_b);
    }
    (ends_a, ends_b)
}

fn delimited(graph: &DGraph, seed: VertexId, ends: &[VertexId]) -> Vec<VertexId> {
    let mut sub = vec![seed];
    if !ends.contains(&seed) {
        sub.extend(graph.child_tree_limited(seed, ends, true));
    }
    sub
}

fn site_key(ga: &DGraph, gb: &DGraph, site: &XoverSite) -> SiteKey {
    let canonical = |graph: &DGraph, vertices: &[VertexId]| {
        vertices
            .iter()
            .map(|&v| {
                graph
                    .symmetric_set_of(v)
                    .and_then(|set| set.first().copied())
                    .unwrap_or(v)
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>()
    };
    (
        site.a.path.clone(),
        canonical(ga, &site.a.vertices),
        site.b.path.clone(),
        canonical(gb, &site.b.vertices),
    )
}
