use super::{read_graph, write_graph};
use crate::cli::RingsArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use molgraft::core::chemistry::NoChemistry;
use molgraft::core::models::graph::DGraph;
use molgraft::core::models::topology::Ring;
use molgraft::engine::progress::ProgressReporter;
use molgraft::workflows::ring_closure;
use tracing::{info, warn};

pub fn run(args: RingsArgs) -> Result<()> {
    let config = PartialRunConfig::from_file(&args.space.config)?.merge_with_cli(&args.space)?;
    let space = config.load_space()?;
    let graph = read_graph(&args.graph)?;
    let mut rng = config.rng();

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let sets = ring_closure::survey_ring_sets(
        &graph,
        &space,
        &config.ring_closure,
        &NoChemistry,
        args.samples,
        &reporter,
        &mut rng,
    )?;

    for (i, set) in sets.iter().enumerate() {
        println!("Set {:>3}: {}", i + 1, describe(&graph, set));
    }
    if sets.iter().all(Vec::is_empty) {
        warn!("No ring could be closed on this graph.");
    }

    if let Some(output) = &args.output {
        let mut closed = graph.clone();
        let rings = ring_closure::close_rings(
            &mut closed,
            &space,
            &config.ring_closure,
            &NoChemistry,
            &mut rng,
        )?;
        info!("Closed {} ring(s)", rings.len());
        write_graph(&closed, output)?;
        println!("Graph with {} new ring(s) written to: {}", rings.len(), output.display());
    }
    Ok(())
}

fn describe(graph: &DGraph, rings: &[Ring]) -> String {
    if rings.is_empty() {
        return "no rings".to_string();
    }
    rings
        .iter()
        .map(|ring| {
            let ids: Vec<String> = ring
                .vertices()
                .iter()
                .filter_map(|&v| graph.vertex(v).map(|x| x.id.to_string()))
                .collect();
            format!("[{}]", ids.join("-"))
        })
        .collect::<Vec<_>>()
        .join(" ")
}
