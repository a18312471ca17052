//! # Engine Module
//!
//! The search algorithms of molgraft. They read graphs and the fragment space from
//! [`crate::core`] and answer the questions a design loop keeps asking: how can two sets
//! of attachment points be wired together, which building block fits here, where can two
//! graphs exchange pieces, and which rings can be closed.
//!
//! ## Architecture
//!
//! - **AP Mapping** ([`mapping`]) - Compatible one-to-one pairings between attachment points
//! - **Link Finder** ([`link`]) - Building blocks that replace a vertex or bridge an edge
//! - **Crossover Sites** ([`crossover`]) - Pairs of subgraphs that two graphs can swap
//! - **Ring Closure** ([`rings`]) - Ring-size bias, closability checks and ring-set sampling
//! - **Configuration** ([`config`]) - Search bounds and ring-closure settings
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine-level error type
//!
//! Every random choice draws from a generator passed in by the caller, so a seeded
//! generator reproduces a run exactly.

pub mod config;
pub mod crossover;
pub mod error;
pub mod link;
pub mod mapping;
pub mod progress;
pub mod rings;
pub(crate) mod utils;
