//! # Core Module
//!
//! The stateless foundation of molgraft: the graph data model, the fragment space that
//! defines what may be built, file I/O, and the seam towards external chemistry.
//!
//! ## Overview
//!
//! Everything in this module is plain data plus the operations that keep it
//! consistent. Search algorithms that operate on these structures live in
//! [`crate::engine`].
//!
//! ## Architecture
//!
//! - **Graph Representation** ([`models`]) - Vertices, attachment points, edges, rings and templates
//! - **Design Space** ([`fragspace`]) - Building-block libraries and AP-class compatibility rules
//! - **File I/O** ([`io`]) - TOML graph records
//! - **External Chemistry** ([`chemistry`]) - The provider trait for toolkit-backed checks

pub mod chemistry;
pub mod fragspace;
pub mod io;
pub mod models;
