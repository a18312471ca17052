pub mod inspect;
pub mod link;
pub mod rings;
pub mod xover;

use crate::error::{CliError, Result};
use molgraft::core::io::graph_toml::TomlGraphFile;
use molgraft::core::io::traits::GraphFile;
use molgraft::core::models::graph::DGraph;
use std::path::Path;
use tracing::info;

pub(crate) fn read_graph(path: &Path) -> Result<DGraph> {
    info!("Loading graph from {:?}", path);
    TomlGraphFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

pub(crate) fn write_graph(graph: &DGraph, path: &Path) -> Result<()> {
    info!("Writing graph to {:?}", path);
    TomlGraphFile::write_to_path(graph, path)?;
    Ok(())
}
