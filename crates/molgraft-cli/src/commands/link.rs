use super::{read_graph, write_graph};
use crate::cli::LinkArgs;
use crate::config::PartialRunConfig;
use crate::error::{CliError, Result};
use molgraft::engine::mapping::MappingOptions;
use molgraft::workflows::substitution;
use tracing::{info, warn};

pub fn run(args: LinkArgs) -> Result<()> {
    let config = PartialRunConfig::from_file(&args.space.config)?.merge_with_cli(&args.space)?;
    let space = config.load_space()?;
    let mut graph = read_graph(&args.graph)?;
    let mut rng = config.rng();

    let vertex = graph.find_vertex_by_id(args.vertex).ok_or_else(|| {
        CliError::Argument(format!("Graph has no vertex with id {}", args.vertex))
    })?;
    let options = MappingOptions::from_config(&config.mapping);

    let edited = if args.insert_above {
        let edge = graph.parent_edge(vertex).ok_or_else(|| {
            CliError::Argument(format!("Vertex {} has no parent edge", args.vertex))
        })?;
        info!("Looking for a building block to insert above vertex {}", args.vertex);
        substitution::insert_link_on_edge(&mut graph, &space, edge, options, &mut rng)?
    } else {
        info!("Looking for a replacement of vertex {}", args.vertex);
        substitution::substitute_vertex(
            &mut graph,
            &space,
            vertex,
            args.building_block,
            options,
            &mut rng,
        )?
    };

    let Some(edited) = edited else {
        warn!("No compatible building block found; graph left unchanged.");
        println!("No compatible building block found.");
        return Ok(());
    };
    let id = graph.vertex(edited).map(|v| v.id).unwrap_or(args.vertex);
    write_graph(&graph, &args.output)?;
    println!("Vertex {} placed; graph written to: {}", id, args.output.display());
    Ok(())
}
