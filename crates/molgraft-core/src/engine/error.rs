use thiserror::Error;

use super::config::ConfigError;
use super::rings::RingClosureError;
use super::utils::sampling::SamplingError;
use crate::core::chemistry::ChemistryError;
use crate::core::fragspace::space::FragmentSpaceError;
use crate::core::models::graph::GraphError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Graph operation failed: {source}")]
    Graph {
        #[from]
        source: GraphError,
    },

    #[error("Fragment space lookup failed: {source}")]
    FragmentSpace {
        #[from]
        source: FragmentSpaceError,
    },

    #[error("Chemistry provider error: {source}")]
    Chemistry {
        #[from]
        source: ChemistryError,
    },

    #[error("Ring closure failed: {source}")]
    RingClosure {
        #[from]
        source: RingClosureError,
    },

    #[error("Invalid engine configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Random sampling failed: {source}")]
    Sampling {
        #[from]
        source: SamplingError,
    },
}
