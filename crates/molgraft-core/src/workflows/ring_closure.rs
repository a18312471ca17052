use crate::core::chemistry::ChemistryProvider;
use crate::core::fragspace::space::FragmentSpace;
use crate::core::models::graph::{DGraph, GraphError};
use crate::core::models::topology::Ring;
use crate::engine::config::RingClosureConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::rings::RandomCombOfRingsIterator;
use rand::Rng;
use tracing::{debug, info, instrument};

/// Samples one set of rings and closes them on `graph`.
///
/// Returns the rings that were added. Nothing changes when the sampled set is smaller
/// than `min_ring_closures` or when any of its rings cannot be added.
#[instrument(skip_all, name = "ring_closure_workflow")]
pub fn close_rings(
    graph: &mut DGraph,
    space: &FragmentSpace,
    config: &RingClosureConfig,
    chem: &dyn ChemistryProvider,
    rng: &mut impl Rng,
) -> Result<Vec<Ring>, EngineError> {
    config.validate()?;
    let rings = RandomCombOfRingsIterator::new(&*graph, space, config, chem, &mut *rng)
        .next()
        .transpose()?
        .unwrap_or_default();
    if rings.len() < config.min_ring_closures {
        debug!(
            sampled = rings.len(),
            required = config.min_ring_closures,
            "Too few rings to close, graph left unchanged"
        );
        return Ok(Vec::new());
    }
    apply_rings(graph, &rings)?;
    info!(rings = rings.len(), "Rings closed");
    Ok(rings)
}

/// Adds every ring to `graph`, or none of them.
fn apply_rings(graph: &mut DGraph, rings: &[Ring]) -> Result<(), GraphError> {
    let mut staged = graph.clone();
    for ring in rings {
        if let (Some(head), Some(tail)) = (ring.head(), ring.tail()) {
            staged.add_ring(head, tail, ring.bond_type)?;
        }
    }
    *graph = staged;
    Ok(())
}

/// Draws `samples` independent ring sets without touching the graph.
#[instrument(skip_all, name = "ring_survey_workflow")]
pub fn survey_ring_sets(
    graph: &DGraph,
    space: &FragmentSpace,
    config: &RingClosureConfig,
    chem: &dyn ChemistryProvider,
    samples: usize,
    reporter: &ProgressReporter,
    rng: &mut impl Rng,
) -> Result<Vec<Vec<Ring>>, EngineError> {
    config.validate()?;
    reporter.report(Progress::SearchStart {
        name: "Ring sets",
        total_steps: samples as u64,
    });
    let mut sets = Vec::with_capacity(samples);
    for set in RandomCombOfRingsIterator::new(graph, space, config, chem, &mut *rng).take(samples) {
        sets.push(set?);
        reporter.report(Progress::SearchIncrement);
    }
    let found = sets.iter().filter(|s| !s.is_empty()).count();
    reporter.report(Progress::SearchFinish { found });
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chemistry::NoChemistry;
    use crate::core::models::topology::BondType;
    use crate::engine::rings::size_manager::tests::{ladder, permissive, ring_space};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::{Arc, Mutex};

    #[test]
    fn sampled_rings_are_added_to_the_graph() {
        let (mut g, _) = ladder();
        let space = ring_space();
        let config = permissive();
        let rings = close_rings(&mut g, &space, &config, &NoChemistry, &mut StdRng::seed_from_u64(4))
            .unwrap();
        assert_eq!(rings.len(), 2);
        assert_eq!(g.rings(), rings.as_slice());
        assert!(g.free_rcvs().is_empty());
    }

    #[test]
    fn too_few_rings_leave_the_graph_alone() {
        let (mut g, _) = ladder();
        let space = ring_space();
        let config = RingClosureConfig {
            min_ring_closures: 3,
            ..permissive()
        };
        let rings = close_rings(&mut g, &space, &config, &NoChemistry, &mut StdRng::seed_from_u64(4))
            .unwrap();
        assert!(rings.is_empty());
        assert!(g.rings().is_empty());
    }

    #[test]
    fn a_failing_ring_leaves_the_graph_unchanged() {
        let (mut g, rcvs) = ladder();
        let backbone = g.parent(rcvs[1]).unwrap();
        let path = g.path(rcvs[0], rcvs[2]).unwrap();
        let rings = [
            Ring::new(path, BondType::Single),
            Ring::new(vec![backbone, rcvs[3]], BondType::Single),
        ];
        assert!(matches!(
            apply_rings(&mut g, &rings),
            Err(GraphError::NotRingClosingVertex(_))
        ));
        assert!(g.rings().is_empty());
        assert_eq!(g.free_rcvs(), rcvs);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (mut g, _) = ladder();
        let space = ring_space();
        let config = RingClosureConfig {
            min_ring_closures: 5,
            max_ring_closures: 2,
            ..permissive()
        };
        assert!(matches!(
            close_rings(&mut g, &space, &config, &NoChemistry, &mut StdRng::seed_from_u64(4)),
            Err(EngineError::Config { .. })
        ));
    }

    #[test]
    fn survey_reports_progress_for_every_sample() {
        let (g, _) = ladder();
        let space = ring_space();
        let config = permissive();
        let increments = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&increments);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::SearchIncrement = event {
                *sink.lock().unwrap() += 1;
            }
        }));
        let sets = survey_ring_sets(
            &g,
            &space,
            &config,
            &NoChemistry,
            5,
            &reporter,
            &mut StdRng::seed_from_u64(8),
        )
        .unwrap();
        assert_eq!(sets.len(), 5);
        assert_eq!(*increments.lock().unwrap(), 5);
        assert!(g.rings().is_empty());
    }
}
