//! Provides input/output functionality for design graphs.
//!
//! Graphs and building blocks are persisted as TOML documents. [`records`] holds the
//! serializable mirror of the graph model, and [`graph_toml`] implements the
//! [`traits::GraphFile`] interface on top of it.

pub mod graph_toml;
pub mod records;
pub mod traits;
