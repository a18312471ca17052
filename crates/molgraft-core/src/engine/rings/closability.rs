use super::RingClosureError;
use super::path::PathSubGraph;
use crate::core::chemistry::ChemistryProvider;
use crate::core::models::graph::DGraph;
use crate::engine::config::RingClosureConfig;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{trace, warn};

/// How strictly a candidate ring is vetted before it is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClosabilityMode {
    /// Only the ring-size bias decides.
    #[default]
    SizeBiasOnly,
    Constitution,
    Geometry3D,
    ConstitutionAndGeometry,
}

impl ClosabilityMode {
    pub fn checks_constitution(self) -> bool {
        matches!(self, Self::Constitution | Self::ConstitutionAndGeometry)
    }

    pub fn checks_geometry(self) -> bool {
        matches!(self, Self::Geometry3D | Self::ConstitutionAndGeometry)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid ring closability mode '{0}'")]
pub struct ParseClosabilityModeError(pub String);

impl FromStr for ClosabilityMode {
    type Err = ParseClosabilityModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "-1" | "size_bias_only" | "none" => Ok(Self::SizeBiasOnly),
            "0" | "constitution" => Ok(Self::Constitution),
            "1" | "geometry_3d" | "geometry3d" | "3d" => Ok(Self::Geometry3D),
            "2" | "constitution_and_geometry" | "both" => Ok(Self::ConstitutionAndGeometry),
            _ => Err(ParseClosabilityModeError(s.to_string())),
        }
    }
}

impl fmt::Display for ClosabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::SizeBiasOnly => "SIZE_BIAS_ONLY",
                Self::Constitution => "CONSTITUTION",
                Self::Geometry3D => "GEOMETRY_3D",
                Self::ConstitutionAndGeometry => "CONSTITUTION_AND_GEOMETRY",
            }
        )
    }
}

/// Decides whether the ring along `path` may be closed under the configured mode.
pub fn is_closeable(
    graph: &DGraph,
    path: &PathSubGraph,
    config: &RingClosureConfig,
    chem: &dyn ChemistryProvider,
) -> Result<bool, RingClosureError> {
    if config.mode.checks_constitution() && !is_constitutionally_closeable(graph, path, config, chem)? {
        trace!(chain = path.chain_id(), "Ring rejected by constitution");
        return Ok(false);
    }
    if config.mode.checks_geometry() && !chem.is_path_closable_3d(graph, path.vertices())? {
        trace!(chain = path.chain_id(), "Ring rejected by geometry");
        return Ok(false);
    }
    Ok(true)
}

fn is_constitutionally_closeable(
    graph: &DGraph,
    path: &PathSubGraph,
    config: &RingClosureConfig,
    chem: &dyn ChemistryProvider,
) -> Result<bool, RingClosureError> {
    if !config.required_elements.is_empty() {
        let elements = chem.ring_path_elements(graph, path.vertices())?;
        if !elements.iter().any(|e| config.required_elements.contains(e)) {
            return Ok(false);
        }
    }
    if config.ring_queries.is_empty() {
        return Ok(true);
    }
    let mut matched = false;
    for (name, query) in &config.ring_queries {
        match chem.count_substructure_matches(graph, path.vertices(), query) {
            Ok(count) if count > 0 => {
                matched = true;
                break;
            }
            Ok(_) => {}
            Err(e) => warn!(query = %name, error = %e, "Ring query could not be evaluated"),
        }
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chemistry::{ChemistryError, NoChemistry};
    use crate::core::models::graph::tests::chain;
    use crate::core::models::ids::VertexId;
    use crate::core::models::topology::{ApRef, BondType};
    use crate::core::models::vertex::{AttachmentPoint, Fragment, Vertex};

    struct FakeChemistry {
        matches: Result<usize, ChemistryError>,
        closable: Result<bool, ChemistryError>,
    }

    impl ChemistryProvider for FakeChemistry {
        fn ring_path_elements(
            &self,
            _graph: &DGraph,
            _path: &[VertexId],
        ) -> Result<Vec<String>, ChemistryError> {
            Ok(vec!["C".to_string(), "N".to_string()])
        }

        fn count_substructure_matches(
            &self,
            _graph: &DGraph,
            _path: &[VertexId],
            _query: &str,
        ) -> Result<usize, ChemistryError> {
            self.matches.clone()
        }

        fn is_path_closable_3d(&self, _graph: &DGraph, _path: &[VertexId]) -> Result<bool, ChemistryError> {
            self.closable.clone()
        }
    }

    fn fake(matches: Result<usize, ChemistryError>, closable: Result<bool, ChemistryError>) -> FakeChemistry {
        FakeChemistry { matches, closable }
    }

    fn config(mode: ClosabilityMode) -> RingClosureConfig {
        RingClosureConfig {
            mode,
            ..RingClosureConfig::default()
        }
    }

    fn path() -> (DGraph, PathSubGraph) {
        let (g, ids) = chain(4);
        let path = PathSubGraph::new(&g, ids[0], ids[3]).unwrap();
        (g, path)
    }

    mod parsing {
        use super::*;

        #[test]
        fn numeric_and_named_modes_are_accepted() {
            assert_eq!("-1".parse(), Ok(ClosabilityMode::SizeBiasOnly));
            assert_eq!("0".parse(), Ok(ClosabilityMode::Constitution));
            assert_eq!("1".parse(), Ok(ClosabilityMode::Geometry3D));
            assert_eq!("2".parse(), Ok(ClosabilityMode::ConstitutionAndGeometry));
            assert_eq!("geometry-3d".parse(), Ok(ClosabilityMode::Geometry3D));
            assert_eq!(
                "3".parse::<ClosabilityMode>(),
                Err(ParseClosabilityModeError("3".to_string()))
            );
        }

        #[test]
        fn display_names_parse_back() {
            for mode in [
                ClosabilityMode::SizeBiasOnly,
                ClosabilityMode::Constitution,
                ClosabilityMode::Geometry3D,
                ClosabilityMode::ConstitutionAndGeometry,
            ] {
                assert_eq!(mode.to_string().parse(), Ok(mode));
            }
        }
    }

    mod constitution {
        use super::*;

        #[test]
        fn passes_when_nothing_is_configured() {
            let (g, path) = path();
            let config = config(ClosabilityMode::Constitution);
            assert!(is_closeable(&g, &path, &config, &NoChemistry).unwrap());
        }

        #[test]
        fn required_elements_must_appear_on_the_path() {
            let (g, path) = path();
            let mut config = config(ClosabilityMode::Constitution);
            config.required_elements.insert("S".to_string());
            let chem = fake(Ok(0), Ok(true));
            assert!(!is_closeable(&g, &path, &config, &chem).unwrap());
            config.required_elements.insert("N".to_string());
            assert!(is_closeable(&g, &path, &config, &chem).unwrap());
        }

        #[test]
        fn default_elements_come_from_fragments() {
            let mut g = DGraph::new();
            let mut ids = Vec::new();
            for (i, elements) in [&["H"][..], &["O"], &["H"]].iter().enumerate() {
                let mut fragment = Fragment::new("f");
                fragment.elements = elements.iter().map(|e| e.to_string()).collect();
                let mut v: Vertex = Vertex::fragment(i as u32, fragment);
                for _ in 0..2 {
                    v = v.with_ap(AttachmentPoint::new("A:0".parse().unwrap()));
                }
                let id = g.add_vertex(v).unwrap();
                if let Some(&prev) = ids.last() {
                    g.add_edge(ApRef::new(prev, 1), ApRef::new(id, 0), BondType::Single)
                        .unwrap();
                }
                ids.push(id);
            }
            let path = PathSubGraph::new(&g, ids[0], ids[2]).unwrap();
            let mut config = config(ClosabilityMode::Constitution);
            config.required_elements.insert("O".to_string());
            assert!(is_closeable(&g, &path, &config, &NoChemistry).unwrap());
        }

        #[test]
        fn queries_need_one_match_and_errors_are_skipped() {
            let (g, path) = path();
            let mut config = config(ClosabilityMode::Constitution);
            config
                .ring_queries
                .insert("aromatic".to_string(), "c1ccccc1".to_string());
            assert!(is_closeable(&g, &path, &config, &fake(Ok(2), Ok(true))).unwrap());
            assert!(!is_closeable(&g, &path, &config, &fake(Ok(0), Ok(true))).unwrap());
            assert!(!is_closeable(&g, &path, &config, &NoChemistry).unwrap());
        }
    }

    mod geometry {
        use super::*;

        #[test]
        fn geometry_is_delegated_and_errors_propagate() {
            let (g, path) = path();
            let config = config(ClosabilityMode::Geometry3D);
            assert!(is_closeable(&g, &path, &config, &fake(Ok(0), Ok(true))).unwrap());
            assert!(!is_closeable(&g, &path, &config, &fake(Ok(0), Ok(false))).unwrap());
            assert!(matches!(
                is_closeable(&g, &path, &config, &NoChemistry),
                Err(RingClosureError::Chemistry { .. })
            ));
        }

        #[test]
        fn size_bias_only_never_asks_the_provider() {
            let (g, path) = path();
            let config = config(ClosabilityMode::SizeBiasOnly);
            assert!(is_closeable(&g, &path, &config, &NoChemistry).unwrap());
        }

        #[test]
        fn combined_mode_needs_both() {
            let (g, path) = path();
            let mut config = config(ClosabilityMode::ConstitutionAndGeometry);
            config.required_elements.insert("C".to_string());
            assert!(is_closeable(&g, &path, &config, &fake(Ok(0), Ok(true))).unwrap());
            assert!(!is_closeable(&g, &path, &config, &fake(Ok(0), Ok(false))).unwrap());
        }
    }
}
