//! # Core Models Module
//!
//! Data structures for design graphs: building-block vertices with typed attachment
//! points, the edges and ring chords joining them, and templates that nest whole graphs
//! inside a single vertex.
//!
//! ## Overview
//!
//! Vertices and edges are stored in slot-map arenas owned by [`graph::DGraph`]. Handles
//! ([`ids::VertexId`], [`ids::EdgeId`]) stay valid across removals and are shared by every
//! clone of a graph, so a location computed on one graph can be resolved on its copies.
//!
//! ## Key Components
//!
//! - [`apclass`] - Attachment-point classes and ring-closing-attractor polarity
//! - [`topology`] - Bond types, AP references, edges and rings
//! - [`vertex`] - Vertices, attachment points and building-block roles
//! - [`template`] - Vertices wrapping an inner graph, with their contract level
//! - [`graph`] - The graph container and its mutators
//! - [`traversal`] - Spanning-tree navigation (parents, children, paths, branches)
//! - [`subgraph`] - Extraction of sub-graphs as handle-preserving clones
//! - [`embedding`] - Nested-graph paths and context-aware AP queries
//! - [`isomorphism`] - Graph equivalence checks

pub mod apclass;
pub mod embedding;
pub mod graph;
pub mod ids;
pub mod isomorphism;
pub mod subgraph;
pub mod template;
pub mod topology;
pub mod traversal;
pub mod vertex;
