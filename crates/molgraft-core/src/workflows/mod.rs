//! # Workflows Module
//!
//! High-level entry points that compose the engine searches into complete graph edits.
//!
//! ## Overview
//!
//! Each workflow takes a graph, the fragment space and a caller-owned random generator,
//! runs one of the engine searches, and applies the outcome. A search that finds nothing
//! leaves the graph untouched and reports it as an ordinary value.
//!
//! - **Ring Closure** ([`ring_closure`]) - Sample a set of rings and close them
//! - **Substitution** ([`substitution`]) - Swap a vertex for another building block, or
//!   insert a new one in the middle of an edge

pub mod ring_closure;
pub mod substitution;
