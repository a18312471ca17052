//! # molgraft Core Library
//!
//! Graph-based molecular design: molecules are spanning trees of building-block vertices
//! joined through typed attachment points, with rings closed by chords between
//! ring-closing vertices.
//!
//! ## Architectural Philosophy
//!
//! The library keeps three layers apart:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`DGraph`, `Vertex`, `APClass`),
//!   the `FragmentSpace` that says which building blocks exist and how they may bond,
//!   TOML I/O, and the `ChemistryProvider` seam towards a cheminformatics toolkit.
//!
//! - **[`engine`]: The Logic Core.** The searches: attachment-point mappings, link and
//!   crossover-site finders, and ring-closure sampling, with their configuration.
//!
//! - **[`workflows`]: The Public API.** Complete graph edits built from engine searches,
//!   such as closing rings or substituting a vertex.

pub mod core;
pub mod engine;
pub mod workflows;
