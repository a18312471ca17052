use super::records::{GraphRecord, RecordError};
use super::traits::GraphFile;
use crate::core::models::graph::DGraph;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphFormatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Invalid graph record: {0}")]
    Record(#[from] RecordError),
}

/// Graphs stored as TOML documents with `[[vertex]]`, `[[edge]]` and `[[ring]]` tables.
pub struct TomlGraphFile;

impl TomlGraphFile {
    pub fn from_toml_str(content: &str) -> Result<DGraph, GraphFormatError> {
        let record: GraphRecord = toml::from_str(content)?;
        Ok(record.into_graph()?)
    }

    pub fn to_toml_string(graph: &DGraph) -> Result<String, GraphFormatError> {
        Ok(toml::to_string(&GraphRecord::from_graph(graph))?)
    }
}

impl GraphFile for TomlGraphFile {
    type Error = GraphFormatError;

    fn read_from(reader: &mut impl BufRead) -> Result<DGraph, Self::Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::from_toml_str(&content)
    }

    fn write_to(graph: &DGraph, writer: &mut impl Write) -> Result<(), Self::Error> {
        writer.write_all(Self::to_toml_string(graph)?.as_bytes())?;
        Ok(())
    }
}
