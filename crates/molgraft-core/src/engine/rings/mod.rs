//! # Ring Closure
//!
//! Chooses which ring-closing vertices (RCVs) of a spanning tree get joined into rings.
//!
//! [`size_manager::RingSizeManager`] weighs RCV pairs by the size of the ring they would
//! close, [`closability`] vets a candidate ring against constitution and geometry, and
//! [`combinations::RandomCombOfRingsIterator`] samples whole sets of compatible rings.
//! A candidate ring is described by its [`path::PathSubGraph`].

pub mod closability;
pub mod combinations;
pub mod path;
pub mod size_manager;

use crate::core::chemistry::ChemistryError;
use crate::core::models::graph::GraphError;
use thiserror::Error;

pub use closability::{ClosabilityMode, is_closeable};
pub use combinations::RandomCombOfRingsIterator;
pub use path::PathSubGraph;
pub use size_manager::RingSizeManager;

#[derive(Debug, Error)]
pub enum RingClosureError {
    #[error("Graph error while closing rings: {source}")]
    Graph {
        #[from]
        source: GraphError,
    },

    #[error("Chemistry check failed: {source}")]
    Chemistry {
        #[from]
        source: ChemistryError,
    },
}
