use crate::core::models::graph::DGraph;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing design graphs.
///
/// Implementors handle format-specific parsing and serialization; the path-based
/// helpers take care of opening and buffering files.
pub trait GraphFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a graph from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<DGraph, Self::Error>;

    /// Writes a graph to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(graph: &DGraph, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a graph from a file path.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<DGraph, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a graph to a file path, creating or truncating the file.
    fn write_to_path<P: AsRef<Path>>(graph: &DGraph, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(graph, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
