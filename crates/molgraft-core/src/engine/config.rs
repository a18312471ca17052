use crate::engine::rings::closability::ClosabilityMode;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub const DEFAULT_MAX_COMBINATIONS: usize = 250;
pub const DEFAULT_MAX_SUBGRAPH_SIZE: usize = 100;
pub const DEFAULT_MAX_END_POINT_COMBINATIONS: usize = 100_000;
pub const DEFAULT_MAX_END_POINT_SETS: usize = 50;
pub const DEFAULT_MAX_PERMUTATIONS: usize = 100;
pub const DEFAULT_MAX_RING_SIZE: usize = 9;
pub const DEFAULT_MAX_RING_CLOSURES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingConfig {
    /// Number of mappings after which a non-exhaustive search stops.
    pub max_combinations: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            max_combinations: DEFAULT_MAX_COMBINATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossoverConfig {
    pub max_subgraph_size: usize,
    pub max_end_point_combinations: usize,
    pub max_end_point_sets: usize,
    pub max_permutations: usize,
    pub mapping: MappingConfig,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        Self {
            max_subgraph_size: DEFAULT_MAX_SUBGRAPH_SIZE,
            max_end_point_combinations: DEFAULT_MAX_END_POINT_COMBINATIONS,
            max_end_point_sets: DEFAULT_MAX_END_POINT_SETS,
            max_permutations: DEFAULT_MAX_PERMUTATIONS,
            mapping: MappingConfig::default(),
        }
    }
}

/// Ring-closure settings.
///
/// `ring_size_bias[n]` is the relative weight of rings made of `n` vertices, both
/// ring-closing vertices included. Sizes beyond `max_ring_size` always weigh zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingClosureConfig {
    pub max_ring_size: usize,
    pub ring_size_bias: Vec<u32>,
    pub min_ring_closures: usize,
    pub max_ring_closures: usize,
    pub mode: ClosabilityMode,
    pub required_elements: BTreeSet<String>,
    pub ring_queries: BTreeMap<String, String>,
}

impl RingClosureConfig {
    pub fn size_weight(&self, size: usize) -> u32 {
        if size > self.max_ring_size {
            return 0;
        }
        self.ring_size_bias.get(size).copied().unwrap_or(0)
    }

    /// Sets the weight of one ring size, growing the bias and the size limit when needed.
    pub fn set_size_weight(&mut self, size: usize, weight: u32) {
        if size >= self.ring_size_bias.len() {
            self.ring_size_bias.resize(size + 1, 0);
        }
        self.ring_size_bias[size] = weight;
        if size > self.max_ring_size {
            self.max_ring_size = size;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_ring_closures > self.max_ring_closures {
            return Err(ConfigError::Invalid(format!(
                "minimum number of ring closures ({}) exceeds the maximum ({})",
                self.min_ring_closures, self.max_ring_closures
            )));
        }
        if let Some((name, _)) = self.ring_queries.iter().find(|(_, q)| q.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("ring query '{name}' is empty")));
        }
        Ok(())
    }
}

impl Default for RingClosureConfig {
    fn default() -> Self {
        let mut ring_size_bias = vec![0; DEFAULT_MAX_RING_SIZE + 1];
        ring_size_bias[5] = 2;
        ring_size_bias[6] = 4;
        ring_size_bias[7] = 1;
        Self {
            max_ring_size: DEFAULT_MAX_RING_SIZE,
            ring_size_bias,
            min_ring_closures: 0,
            max_ring_closures: DEFAULT_MAX_RING_CLOSURES,
            mode: ClosabilityMode::default(),
            required_elements: BTreeSet::new(),
            ring_queries: BTreeMap::new(),
        }
    }
}

#[derive(Default)]
pub struct CrossoverConfigBuilder {
    max_subgraph_size: Option<usize>,
    max_end_point_combinations: Option<usize>,
    max_end_point_sets: Option<usize>,
    max_permutations: Option<usize>,
    max_combinations: Option<usize>,
}

impl CrossoverConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_subgraph_size(mut self, size: usize) -> Self {
        self.max_subgraph_size = Some(size);
        self
    }
    pub fn max_end_point_combinations(mut self, n: usize) -> Self {
        self.max_end_point_combinations = Some(n);
        self
    }
    pub fn max_end_point_sets(mut self, n: usize) -> Self {
        self.max_end_point_sets = Some(n);
        self
    }
    pub fn max_permutations(mut self, n: usize) -> Self {
        self.max_permutations = Some(n);
        self
    }
    pub fn max_combinations(mut self, n: usize) -> Self {
        self.max_combinations = Some(n);
        self
    }

    pub fn build(self) -> Result<CrossoverConfig, ConfigError> {
        Ok(CrossoverConfig {
            max_subgraph_size: self
                .max_subgraph_size
                .ok_or(ConfigError::MissingParameter("max_subgraph_size"))?,
            max_end_point_combinations: self
                .max_end_point_combinations
                .ok_or(ConfigError::MissingParameter("max_end_point_combinations"))?,
            max_end_point_sets: self
                .max_end_point_sets
                .ok_or(ConfigError::MissingParameter("max_end_point_sets"))?,
            max_permutations: self
                .max_permutations
                .ok_or(ConfigError::MissingParameter("max_permutations"))?,
            mapping: MappingConfig {
                max_combinations: self
                    .max_combinations
                    .ok_or(ConfigError::MissingParameter("max_combinations"))?,
            },
        })
    }
}

#[derive(Default)]
pub struct RingClosureConfigBuilder {
    max_ring_size: Option<usize>,
    ring_size_bias: Option<Vec<u32>>,
    size_weights: Vec<(usize, u32)>,
    min_ring_closures: Option<usize>,
    max_ring_closures: Option<usize>,
    mode: Option<ClosabilityMode>,
    required_elements: BTreeSet<String>,
    ring_queries: BTreeMap<String, String>,
}

impl RingClosureConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_ring_size(mut self, size: usize) -> Self {
        self.max_ring_size = Some(size);
        self
    }
    pub fn ring_size_bias(mut self, bias: Vec<u32>) -> Self {
        self.ring_size_bias = Some(bias);
        self
    }
    /// Overrides one entry of the bias after it is built.
    pub fn size_weight(mut self, size: usize, weight: u32) -> Self {
        self.size_weights.push((size, weight));
        self
    }
    pub fn min_ring_closures(mut self, n: usize) -> Self {
        self.min_ring_closures = Some(n);
        self
    }
    pub fn max_ring_closures(mut self, n: usize) -> Self {
        self.max_ring_closures = Some(n);
        self
    }
    pub fn mode(mut self, mode: ClosabilityMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn required_element(mut self, element: &str) -> Self {
        self.required_elements.insert(element.to_string());
        self
    }
    pub fn ring_query(mut self, name: &str, query: &str) -> Self {
        self.ring_queries.insert(name.to_string(), query.to_string());
        self
    }

    pub fn build(self) -> Result<RingClosureConfig, ConfigError> {
        let max_ring_size = self
            .max_ring_size
            .ok_or(ConfigError::MissingParameter("max_ring_size"))?;
        let mut ring_size_bias = self
            .ring_size_bias
            .ok_or(ConfigError::MissingParameter("ring_size_bias"))?;
        if ring_size_bias.len() < max_ring_size + 1 {
            ring_size_bias.resize(max_ring_size + 1, 0);
        }
        let mut config = RingClosureConfig {
            max_ring_size,
            ring_size_bias,
            min_ring_closures: self.min_ring_closures.unwrap_or(0),
            max_ring_closures: self
                .max_ring_closures
                .ok_or(ConfigError::MissingParameter("max_ring_closures"))?,
            mode: self.mode.ok_or(ConfigError::MissingParameter("mode"))?,
            required_elements: self.required_elements,
            ring_queries: self.ring_queries,
        };
        for (size, weight) in self.size_weights {
            config.set_size_weight(size, weight);
        }
        config.validate()?;
        Ok(config)
    }
}
