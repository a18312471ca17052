use super::read_graph;
use crate::cli::XoverArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use molgraft::core::models::embedding::EmbeddingPath;
use molgraft::core::models::graph::DGraph;
use molgraft::engine::crossover::{CrossoverSiteFinder, SiteSide, XoverSite};
use molgraft::engine::progress::ProgressReporter;
use serde::Serialize;
use std::io::Write;
use tracing::info;

/// One CSV line per crossover site; vertices and paths use integer vertex ids.
#[derive(Debug, Serialize, PartialEq)]
struct SiteRow {
    index: usize,
    kind: String,
    size: usize,
    first_path: String,
    first_vertices: String,
    second_path: String,
    second_vertices: String,
}

pub fn run(args: XoverArgs) -> Result<()> {
    let config = PartialRunConfig::from_file(&args.space.config)?.merge_with_cli(&args.space)?;
    let space = config.load_space()?;
    let first = read_graph(&args.first)?;
    let second = read_graph(&args.second)?;
    let mut rng = config.rng();

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let finder = CrossoverSiteFinder::new(&space, config.crossover.clone());
    let sites = finder.find_sites(&first, &second, &reporter, &mut rng)?;
    info!("Found {} crossover site(s)", sites.len());

    let rows: Vec<SiteRow> = sites
        .iter()
        .enumerate()
        .map(|(i, site)| row(i + 1, site, &first, &second))
        .collect();
    match &args.output {
        Some(path) => {
            write_rows(&rows, std::fs::File::create(path)?)?;
            println!("{} site(s) written to: {}", rows.len(), path.display());
        }
        None => write_rows(&rows, std::io::stdout().lock())?,
    }
    Ok(())
}

fn write_rows(rows: &[SiteRow], sink: impl Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn row(index: usize, site: &XoverSite, first: &DGraph, second: &DGraph) -> SiteRow {
    SiteRow {
        index,
        kind: site.kind.to_string(),
        size: site.size(),
        first_path: path_ids(first, &site.a.path),
        first_vertices: vertex_ids(first, &site.a),
        second_path: path_ids(second, &site.b.path),
        second_vertices: vertex_ids(second, &site.b),
    }
}

/// Template vertex ids from the outermost graph down, `/` for the outermost graph itself.
fn path_ids(root: &DGraph, path: &EmbeddingPath) -> String {
    let mut out = String::from("/");
    let mut graph = Some(root);
    for &step in path.steps() {
        let vertex = graph.and_then(|g| g.vertex(step));
        match vertex {
            Some(v) => out.push_str(&format!("{}/", v.id)),
            None => out.push_str("?/"),
        }
        graph = vertex.and_then(|v| v.as_template()).map(|t| t.inner());
    }
    out
}

fn vertex_ids(root: &DGraph, side: &SiteSide) -> String {
    let graph = root.embedded_graph(&side.path);
    let mut ids: Vec<u32> = side
        .vertices
        .iter()
        .filter_map(|&v| graph.and_then(|g| g.vertex(v)).map(|x| x.id))
        .collect();
    ids.sort_unstable();
    ids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(";")
}
