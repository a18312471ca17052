use crate::cli::SpaceArgs;
use crate::error::{CliError, Result};
use molgraft::core::fragspace::io::FragmentSpacePaths;
use molgraft::core::fragspace::space::FragmentSpace;
use molgraft::engine::config as core_config;
use molgraft::engine::rings::ClosabilityMode;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialFragmentSpaceConfig {
    scaffolds: Option<PathBuf>,
    fragments: Option<PathBuf>,
    caps: Option<PathBuf>,
    compatibility: Option<PathBuf>,
    ring_compatibility: Option<PathBuf>,
    /// Symmetry probability per AP class, overriding the library defaults.
    #[serde(default)]
    symmetry: BTreeMap<String, f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialMappingConfig {
    max_combinations: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialCrossoverConfig {
    max_subgraph_size: Option<usize>,
    max_end_point_combinations: Option<usize>,
    max_end_point_sets: Option<usize>,
    max_permutations: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialRingClosureConfig {
    max_ring_size: Option<usize>,
    ring_size_bias: Option<Vec<u32>>,
    min_ring_closures: Option<usize>,
    max_ring_closures: Option<usize>,
    mode: Option<String>,
    #[serde(default)]
    required_elements: Vec<String>,
    #[serde(default)]
    queries: BTreeMap<String, String>,
}

/// The run configuration as written in the TOML file; every entry is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialRunConfig {
    fragment_space: Option<PartialFragmentSpaceConfig>,
    mapping: Option<PartialMappingConfig>,
    crossover: Option<PartialCrossoverConfig>,
    ring_closure: Option<PartialRingClosureConfig>,
    seed: Option<u64>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Fully resolved settings for one command.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub space_paths: FragmentSpacePaths,
    pub symmetry: BTreeMap<String, f64>,
    pub mapping: core_config::MappingConfig,
    pub crossover: core_config::CrossoverConfig,
    pub ring_closure: core_config::RingClosureConfig,
    pub seed: Option<u64>,
}

impl RunConfig {
    /// Loads the fragment space and applies the symmetry overrides.
    pub fn load_space(&self) -> Result<FragmentSpace> {
        let mut space = FragmentSpace::load(&self.space_paths)?;
        for (class, probability) in &self.symmetry {
            let class = class
                .parse()
                .map_err(|e| CliError::Config(format!("Invalid AP class '{class}': {e}")))?;
            space.set_symmetry_probability(class, *probability);
        }
        Ok(space)
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => {
                info!("Using random seed {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        }
    }
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut partial: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        partial.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(partial)
    }

    /// Relative library paths are taken relative to the configuration file.
    fn resolve(&self, path: Option<PathBuf>) -> Result<Option<PathBuf>> {
        let Some(path) = path else {
            return Ok(None);
        };
        let resolved = if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        };
        if !resolved.exists() {
            return Err(CliError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Provided path does not exist: {}", resolved.display()),
            )));
        }
        Ok(Some(resolved))
    }

    pub fn merge_with_cli(mut self, args: &SpaceArgs) -> Result<RunConfig> {
        self.apply_set_values(&args.set_values)?;

        let space = self.fragment_space.take().unwrap_or_default();
        let space_paths = FragmentSpacePaths {
            scaffolds: self.resolve(space.scaffolds)?,
            fragments: self.resolve(space.fragments)?,
            caps: self.resolve(space.caps)?,
            compatibility: self.resolve(space.compatibility)?,
            ring_compatibility: self.resolve(space.ring_compatibility)?,
        };
        if space_paths.fragments.is_none() && space_paths.scaffolds.is_none() {
            return Err(CliError::Config(
                "`fragment-space` needs at least one of `scaffolds` or `fragments`.".to_string(),
            ));
        }

        let mapping = Self::merge_mapping(self.mapping.take());
        let crossover = Self::merge_crossover(self.crossover.take(), &mapping)?;
        let ring_closure = Self::merge_ring_closure(self.ring_closure.take())?;

        Ok(RunConfig {
            space_paths,
            symmetry: space.symmetry,
            mapping,
            crossover,
            ring_closure,
            seed: args.seed.or(self.seed),
        })
    }

    fn merge_mapping(partial: Option<PartialMappingConfig>) -> core_config::MappingConfig {
        let defaults = core_config::MappingConfig::default();
        let partial = partial.unwrap_or_default();
        core_config::MappingConfig {
            max_combinations: partial.max_combinations.unwrap_or(defaults.max_combinations),
        }
    }

    fn merge_crossover(
        partial: Option<PartialCrossoverConfig>,
        mapping: &core_config::MappingConfig,
    ) -> Result<core_config::CrossoverConfig> {
        let defaults = core_config::CrossoverConfig::default();
        let partial = partial.unwrap_or_default();
        core_config::CrossoverConfigBuilder::new()
            .max_subgraph_size(partial.max_subgraph_size.unwrap_or(defaults.max_subgraph_size))
            .max_end_point_combinations(
                partial
                    .max_end_point_combinations
                    .unwrap_or(defaults.max_end_point_combinations),
            )
            .max_end_point_sets(partial.max_end_point_sets.unwrap_or(defaults.max_end_point_sets))
            .max_permutations(partial.max_permutations.unwrap_or(defaults.max_permutations))
            .max_combinations(mapping.max_combinations)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn merge_ring_closure(
        partial: Option<PartialRingClosureConfig>,
    ) -> Result<core_config::RingClosureConfig> {
        let defaults = core_config::RingClosureConfig::default();
        let partial = partial.unwrap_or_default();
        let mode = match partial.mode {
            Some(mode) => mode
                .parse::<ClosabilityMode>()
                .map_err(|e| CliError::Config(e.to_string()))?,
            None => defaults.mode,
        };
        let mut builder = core_config::RingClosureConfigBuilder::new()
            .max_ring_size(partial.max_ring_size.unwrap_or(defaults.max_ring_size))
            .ring_size_bias(partial.ring_size_bias.unwrap_or(defaults.ring_size_bias))
            .min_ring_closures(partial.min_ring_closures.unwrap_or(defaults.min_ring_closures))
            .max_ring_closures(partial.max_ring_closures.unwrap_or(defaults.max_ring_closures))
            .mode(mode);
        for element in &partial.required_elements {
            builder = builder.required_element(element);
        }
        for (name, query) in &partial.queries {
            builder = builder.ring_query(name, query);
        }
        let config = builder.build().map_err(|e| CliError::Config(e.to_string()))?;
        config
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(config)
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let integer = || -> Result<usize> {
                value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid integer value for {}: {}", key, value_str))
                })
            };

            match key {
                "seed" => {
                    self.seed = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!("Invalid seed value: {}", value_str))
                    })?);
                }
                "mapping.max-combinations" => {
                    self.mapping
                        .get_or_insert_with(Default::default)
                        .max_combinations = Some(integer()?);
                }
                "crossover.max-subgraph-size" => {
                    self.crossover
                        .get_or_insert_with(Default::default)
                        .max_subgraph_size = Some(integer()?);
                }
                "ring-closure.max-ring-size" => {
                    self.ring_closure
                        .get_or_insert_with(Default::default)
                        .max_ring_size = Some(integer()?);
                }
                "ring-closure.min-ring-closures" => {
                    self.ring_closure
                        .get_or_insert_with(Default::default)
                        .min_ring_closures = Some(integer()?);
                }
                "ring-closure.max-ring-closures" => {
                    self.ring_closure
                        .get_or_insert_with(Default::default)
                        .max_ring_closures = Some(integer()?);
                }
                "ring-closure.mode" => {
                    self.ring_closure.get_or_insert_with(Default::default).mode =
                        Some(value_str.to_string());
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const LIBRARY: &str = r#"
[[vertex]]
name = "c"
ap = [{ class = "A:0" }, { class = "A:0" }]
"#;

    fn write_space(dir: &TempDir) {
        fs::write(dir.path().join("fragments.toml"), LIBRARY).unwrap();
        fs::write(dir.path().join("cpmap.txt"), "RCN A:0 A:0\n").unwrap();
    }

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("run.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn space_args(extra: &[&str], config: &Path) -> SpaceArgs {
        let mut args = vec![
            "molgraft",
            "rings",
            "-g",
            "graph.toml",
            "-c",
            config.to_str().unwrap(),
        ];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Rings(rings) => rings.space,
            _ => panic!("Expected 'rings' subcommand"),
        }
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        write_space(&dir);
        let config_path = write_config(
            &dir,
            r#"
[fragment-space]
fragments = "fragments.toml"
compatibility = "cpmap.txt"
"#,
        );
        let config = PartialRunConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&space_args(&[], &config_path))
            .unwrap();

        assert_eq!(config.space_paths.fragments, Some(dir.path().join("fragments.toml")));
        assert_eq!(config.space_paths.scaffolds, None);
        assert_eq!(config.mapping, core_config::MappingConfig::default());
        assert_eq!(config.crossover, core_config::CrossoverConfig::default());
        assert_eq!(config.ring_closure, core_config::RingClosureConfig::default());
        assert_eq!(config.seed, None);
    }

    #[test]
    fn file_values_are_merged_into_core_configs() {
        let dir = tempdir().unwrap();
        write_space(&dir);
        let config_path = write_config(
            &dir,
            r#"
seed = 7

[fragment-space]
fragments = "fragments.toml"
symmetry = { "A:0" = 0.25 }

[mapping]
max-combinations = 12

[crossover]
max-subgraph-size = 4

[ring-closure]
max-ring-size = 6
ring-size-bias = [0, 0, 0, 1, 1, 3, 5]
mode = "constitution"
required-elements = ["N"]
queries = { amide = "C(=O)N" }
"#,
        );
        let config = PartialRunConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&space_args(&[], &config_path))
            .unwrap();

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.symmetry.get("A:0"), Some(&0.25));
        assert_eq!(config.mapping.max_combinations, 12);
        assert_eq!(config.crossover.max_subgraph_size, 4);
        assert_eq!(config.crossover.mapping.max_combinations, 12);
        assert_eq!(config.ring_closure.max_ring_size, 6);
        assert_eq!(config.ring_closure.size_weight(6), 5);
        assert_eq!(config.ring_closure.mode, ClosabilityMode::Constitution);
        assert!(config.ring_closure.required_elements.contains("N"));
        assert_eq!(
            config.ring_closure.ring_queries.get("amide").map(String::as_str),
            Some("C(=O)N")
        );

        let space = config.load_space().unwrap();
        assert_eq!(space.symmetry_probability(&"A:0".parse().unwrap()), Some(0.25));
    }

    #[test]
    fn cli_values_override_the_file() {
        let dir = tempdir().unwrap();
        write_space(&dir);
        let config_path = write_config(
            &dir,
            r#"
seed = 7

[fragment-space]
fragments = "fragments.toml"

[ring-closure]
max-ring-size = 6
"#,
        );
        let args = space_args(
            &["--seed", "99", "-S", "ring-closure.max-ring-size=8", "-S", "ring-closure.mode=2"],
            &config_path,
        );
        let config = PartialRunConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.ring_closure.max_ring_size, 8);
        assert_eq!(
            config.ring_closure.mode,
            ClosabilityMode::ConstitutionAndGeometry
        );
    }

    #[test]
    fn invalid_entries_are_reported() {
        let dir = tempdir().unwrap();
        write_space(&dir);

        let missing = write_config(&dir, "[fragment-space]\nfragments = \"nowhere.toml\"\n");
        let result = PartialRunConfig::from_file(&missing)
            .unwrap()
            .merge_with_cli(&space_args(&[], &missing));
        assert!(matches!(result, Err(CliError::Io(_))));

        let no_libraries = write_config(&dir, "seed = 1\n");
        let result = PartialRunConfig::from_file(&no_libraries)
            .unwrap()
            .merge_with_cli(&space_args(&[], &no_libraries));
        assert!(matches!(result, Err(CliError::Config(_))));

        let bad_key = write_config(&dir, "[fragment-space]\nfragments = \"fragments.toml\"\n");
        let result = PartialRunConfig::from_file(&bad_key)
            .unwrap()
            .merge_with_cli(&space_args(&["-S", "crossover.unknown=1"], &bad_key));
        assert!(matches!(result, Err(CliError::Config(_))));

        let unknown_field = write_config(&dir, "[mapping]\nmax-combos = 3\n");
        assert!(matches!(
            PartialRunConfig::from_file(&unknown_field),
            Err(CliError::FileParsing { .. })
        ));
    }
}
