use super::space::{FragmentSpace, FragmentSpaceError, LibraryKind};
use crate::core::io::records::{RecordError, VertexRecord};
use crate::core::models::apclass::{APClass, ApClassError};
use crate::core::models::vertex::Vertex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

const COMMENT: char = '#';
const RULE_KEYWORD: &str = "RCN";
const CAPPING_KEYWORD: &str = "CAP";
const FORBIDDEN_END_KEYWORD: &str = "DEL";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompatibilityParseErrorKind {
    #[error("Compatibility rule needs a source class and at least one target class")]
    IncompleteRule,
    #[error("Capping line must have exactly a source class and a capping class")]
    IncompleteCapping,
    #[error("Forbidden-end line lists no class")]
    EmptyForbiddenEnd,
    #[error("Unknown keyword '{0}'")]
    UnknownKeyword(String),
    #[error("Invalid APClass: {0}")]
    ApClass(#[from] ApClassError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompatibilityParseError {
    #[error("Parse error on line {line}: {kind}")]
    Line {
        line: usize,
        kind: CompatibilityParseErrorKind,
    },
    #[error("No compatibility rule found")]
    NoRules,
}

/// Errors raised while reading a compatibility matrix file.
#[derive(Debug, Error)]
pub enum CompatibilityLoadError {
    /// The file could not be read.
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    /// The file content is not a valid matrix.
    #[error("Invalid compatibility matrix '{path}': {source}")]
    Parse {
        path: String,
        source: CompatibilityParseError,
    },
}

/// Errors raised while reading a building-block library file.
#[derive(Debug, Error)]
pub enum LibraryLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    /// A `[[vertex]]` entry does not describe a valid building block.
    #[error("Invalid building block #{index} in '{path}': {source}")]
    Record {
        path: String,
        index: usize,
        source: RecordError,
    },
}

#[derive(Debug, Error)]
pub enum FragmentSpaceLoadError {
    #[error(transparent)]
    Compatibility(#[from] CompatibilityLoadError),
    #[error(transparent)]
    Library(#[from] LibraryLoadError),
    #[error(transparent)]
    Space(#[from] FragmentSpaceError),
}

/// Content of an AP-class compatibility matrix file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompatibilityMatrix {
    pub compatibility: HashMap<APClass, Vec<APClass>>,
    pub capping: HashMap<APClass, APClass>,
    pub forbidden_ends: HashSet<APClass>,
}

fn split_classes(tokens: &[&str]) -> Result<Vec<APClass>, ApClassError> {
    tokens
        .iter()
        .flat_map(|t| t.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::parse::<APClass>)
        .collect()
}

fn push_unique(list: &mut Vec<APClass>, class: APClass) {
    if !list.contains(&class) {
        list.push(class);
    }
}

/// Parses the compatibility matrix text format.
///
/// ```text
/// # comment
/// RCN A:0 B:0,C:0     source class followed by the classes it binds to
/// CAP A:0 cap:0       capping class for a source class
/// DEL A:1 B:2         classes that may not be left unsaturated
/// ```
pub fn parse_compatibility_matrix(content: &str) -> Result<CompatibilityMatrix, CompatibilityParseError> {
    let mut matrix = CompatibilityMatrix::default();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(COMMENT) {
            continue;
        }
        let fail = |kind| CompatibilityParseError::Line {
            line: index + 1,
            kind,
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens[0] {
            RULE_KEYWORD => {
                if tokens.len() < 3 {
                    return Err(fail(CompatibilityParseErrorKind::IncompleteRule));
                }
                let src = tokens[1]
                    .parse::<APClass>()
                    .map_err(|e| fail(e.into()))?;
                let targets = split_classes(&tokens[2..]).map_err(|e| fail(e.into()))?;
                let entry = matrix.compatibility.entry(src).or_default();
                for target in targets {
                    push_unique(entry, target);
                }
            }
            CAPPING_KEYWORD => {
                if tokens.len() != 3 {
                    return Err(fail(CompatibilityParseErrorKind::IncompleteCapping));
                }
                let src = tokens[1]
                    .parse::<APClass>()
                    .map_err(|e| fail(e.into()))?;
                let cap = tokens[2]
                    .parse::<APClass>()
                    .map_err(|e| fail(e.into()))?;
                matrix.capping.insert(src, cap);
            }
            FORBIDDEN_END_KEYWORD => {
                if tokens.len() < 2 {
                    return Err(fail(CompatibilityParseErrorKind::EmptyForbiddenEnd));
                }
                let classes = split_classes(&tokens[1..]).map_err(|e| fail(e.into()))?;
                matrix.forbidden_ends.extend(classes);
            }
            other => {
                return Err(fail(CompatibilityParseErrorKind::UnknownKeyword(
                    other.to_string(),
                )));
            }
        }
    }
    if matrix.compatibility.is_empty() {
        return Err(CompatibilityParseError::NoRules);
    }
    Ok(matrix)
}

/// Parses a ring-compatibility matrix. Every rule is stored in both directions.
pub fn parse_ring_compatibility_matrix(
    content: &str,
) -> Result<HashMap<APClass, Vec<APClass>>, CompatibilityParseError> {
    let mut symmetric: HashMap<APClass, Vec<APClass>> = HashMap::new();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(COMMENT) {
            continue;
        }
        let fail = |kind| CompatibilityParseError::Line {
            line: index + 1,
            kind,
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens[0] != RULE_KEYWORD {
            return Err(fail(CompatibilityParseErrorKind::UnknownKeyword(
                tokens[0].to_string(),
            )));
        }
        if tokens.len() < 3 {
            return Err(fail(CompatibilityParseErrorKind::IncompleteRule));
        }
        let src = tokens[1]
            .parse::<APClass>()
            .map_err(|e| fail(e.into()))?;
        for target in split_classes(&tokens[2..]).map_err(|e| fail(e.into()))? {
            push_unique(symmetric.entry(src.clone()).or_default(), target.clone());
            push_unique(symmetric.entry(target).or_default(), src.clone());
        }
    }
    Ok(symmetric)
}

fn read_text(path: &Path) -> Result<String, CompatibilityLoadError> {
    std::fs::read_to_string(path).map_err(|e| CompatibilityLoadError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

pub fn read_compatibility_matrix(path: &Path) -> Result<CompatibilityMatrix, CompatibilityLoadError> {
    parse_compatibility_matrix(&read_text(path)?).map_err(|e| CompatibilityLoadError::Parse {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

pub fn read_ring_compatibility_matrix(
    path: &Path,
) -> Result<HashMap<APClass, Vec<APClass>>, CompatibilityLoadError> {
    parse_ring_compatibility_matrix(&read_text(path)?).map_err(|e| {
        CompatibilityLoadError::Parse {
            path: path.to_string_lossy().to_string(),
            source: e,
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LibraryFile {
    #[serde(default)]
    vertex: Vec<VertexRecord>,
}

/// Reads a TOML building-block library (`[[vertex]]` entries).
pub fn read_library(path: &Path) -> Result<Vec<Vertex>, LibraryLoadError> {
    let path_str = || path.to_string_lossy().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| LibraryLoadError::Io {
        path: path_str(),
        source: e,
    })?;
    let file: LibraryFile = toml::from_str(&content).map_err(|e| LibraryLoadError::Toml {
        path: path_str(),
        source: e,
    })?;
    file.vertex
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record.into_vertex().map_err(|e| LibraryLoadError::Record {
                path: path_str(),
                index,
                source: e,
            })
        })
        .collect()
}

/// Locations of the files making up a fragment space. Absent entries stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentSpacePaths {
    pub scaffolds: Option<PathBuf>,
    pub fragments: Option<PathBuf>,
    pub caps: Option<PathBuf>,
    pub compatibility: Option<PathBuf>,
    pub ring_compatibility: Option<PathBuf>,
}

impl FragmentSpace {
    /// Reads libraries and matrices from disk, then classifies the space.
    #[instrument(skip_all, name = "fragment_space_load")]
    pub fn load(paths: &FragmentSpacePaths) -> Result<Self, FragmentSpaceLoadError> {
        let mut space = FragmentSpace::new();
        for (kind, path) in [
            (LibraryKind::Scaffold, &paths.scaffolds),
            (LibraryKind::Fragment, &paths.fragments),
            (LibraryKind::Cap, &paths.caps),
        ] {
            if let Some(path) = path {
                space.load_library(kind, read_library(path)?)?;
            }
        }
        if let Some(path) = &paths.compatibility {
            let matrix = read_compatibility_matrix(path)?;
            space.set_compatibility(matrix.compatibility);
            space.set_capping(matrix.capping);
            space.set_forbidden_ends(matrix.forbidden_ends);
        }
        if let Some(path) = &paths.ring_compatibility {
            space.set_ring_compatibility(read_ring_compatibility_matrix(path)?);
        }
        space.classify();
        info!(
            scaffolds = space.library(LibraryKind::Scaffold).len(),
            fragments = space.library(LibraryKind::Fragment).len(),
            caps = space.library(LibraryKind::Cap).len(),
            "Fragment space loaded"
        );
        Ok(space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn cls(s: &str) -> APClass {
        s.parse().unwrap()
    }

    mod compatibility_matrix {
        use super::*;

        const MATRIX: &str = "\
# comment line
RCN A:0 B:0,C:0
RCN B:0 A:0 C:0

CAP A:0 cap:1
DEL B:0 C:0
";

        #[test]
        fn parses_rules_capping_and_forbidden_ends() {
            let m = parse_compatibility_matrix(MATRIX).unwrap();
            assert_eq!(m.compatibility[&cls("A:0")], vec![cls("B:0"), cls("C:0")]);
            assert_eq!(m.compatibility[&cls("B:0")], vec![cls("A:0"), cls("C:0")]);
            assert_eq!(m.capping[&cls("A:0")], cls("cap:1"));
            assert!(m.forbidden_ends.contains(&cls("C:0")));
            assert_eq!(m.forbidden_ends.len(), 2);
        }

        #[test]
        fn incomplete_lines_report_their_number() {
            let err = parse_compatibility_matrix("RCN A:0 B:0\nRCN A:0\n").unwrap_err();
            assert_eq!(
                err,
                CompatibilityParseError::Line {
                    line: 2,
                    kind: CompatibilityParseErrorKind::IncompleteRule
                }
            );
            let err = parse_compatibility_matrix("RCN A:0 B:0\nCAP A:0\n").unwrap_err();
            assert!(matches!(
                err,
                CompatibilityParseError::Line {
                    kind: CompatibilityParseErrorKind::IncompleteCapping,
                    ..
                }
            ));
        }

        #[test]
        fn unknown_keywords_and_bad_classes_are_errors() {
            assert!(matches!(
                parse_compatibility_matrix("XYZ A:0 B:0\n"),
                Err(CompatibilityParseError::Line {
                    kind: CompatibilityParseErrorKind::UnknownKeyword(_),
                    ..
                })
            ));
            assert!(matches!(
                parse_compatibility_matrix("RCN A:0 B\n"),
                Err(CompatibilityParseError::Line {
                    kind: CompatibilityParseErrorKind::ApClass(_),
                    ..
                })
            ));
        }

        #[test]
        fn matrix_without_rules_is_rejected() {
            assert_eq!(
                parse_compatibility_matrix("# nothing\nCAP A:0 cap:0\n"),
                Err(CompatibilityParseError::NoRules)
            );
        }

        #[test]
        fn ring_matrix_is_symmetric() {
            let rc = parse_ring_compatibility_matrix("RCN A:0 B:0\nRCN C:0 C:0\n").unwrap();
            assert_eq!(rc[&cls("A:0")], vec![cls("B:0")]);
            assert_eq!(rc[&cls("B:0")], vec![cls("A:0")]);
            assert_eq!(rc[&cls("C:0")], vec![cls("C:0")]);
        }

        #[test]
        fn empty_ring_matrix_is_allowed() {
            assert!(parse_ring_compatibility_matrix("# none\n").unwrap().is_empty());
        }
    }

    mod loading {
        use super::*;

        const LIBRARY: &str = r#"
[[vertex]]
name = "benzene"
elements = ["C", "C", "C", "C", "C", "C"]
ap = [{ class = "A:0" }, { class = "A:0", atom-index = 3 }]
symmetric-aps = [[0, 1]]

[[vertex]]
name = "amine"
ap = [{ class = "B:0" }]
"#;

        #[test]
        fn read_library_builds_vertices() {
            let dir = tempdir().unwrap();
            let path = dir.path().join("frags.toml");
            fs::write(&path, LIBRARY).unwrap();
            let vertices = read_library(&path).unwrap();
            assert_eq!(vertices.len(), 2);
            assert_eq!(vertices[0].symmetric_ap_sets().len(), 1);
            assert_eq!(vertices[1].as_fragment().unwrap().name, "amine");
        }

        #[test]
        fn read_library_reports_bad_records() {
            let dir = tempdir().unwrap();
            let path = dir.path().join("bad.toml");
            fs::write(&path, "[[vertex]]\nname = \"x\"\nap = [{ class = \"bad\" }]\n").unwrap();
            assert!(matches!(
                read_library(&path),
                Err(LibraryLoadError::Record { index: 0, .. })
            ));
            assert!(matches!(
                read_library(&dir.path().join("none.toml")),
                Err(LibraryLoadError::Io { .. })
            ));
        }

        #[test]
        fn load_assembles_and_classifies_space() {
            let dir = tempdir().unwrap();
            let frags = dir.path().join("frags.toml");
            let matrix = dir.path().join("cpm.txt");
            let rings = dir.path().join("rcpm.txt");
            fs::write(&frags, LIBRARY).unwrap();
            fs::write(&matrix, "RCN A:0 B:0\nRCN B:0 A:0\nCAP A:0 cap:0\n").unwrap();
            fs::write(&rings, "RCN A:0 B:0\n").unwrap();

            let space = FragmentSpace::load(&FragmentSpacePaths {
                fragments: Some(frags),
                compatibility: Some(matrix),
                ring_compatibility: Some(rings),
                ..Default::default()
            })
            .unwrap();
            assert!(space.is_classified());
            assert_eq!(space.library(LibraryKind::Fragment).len(), 2);
            assert!(space.library(LibraryKind::Scaffold).is_empty());
            assert!(space.is_compatible(&cls("A:0"), &cls("B:0")));
            assert!(space.is_ring_compatible(&cls("B:0"), &cls("A:0")));
            assert_eq!(space.fragments_with_class(&cls("B:0")), vec![1]);
        }

        #[test]
        fn load_propagates_matrix_errors_with_path() {
            let dir = tempdir().unwrap();
            let matrix = dir.path().join("cpm.txt");
            fs::write(&matrix, "# empty\n").unwrap();
            let err = FragmentSpace::load(&FragmentSpacePaths {
                compatibility: Some(matrix),
                ..Default::default()
            })
            .unwrap_err();
            assert!(matches!(
                err,
                FragmentSpaceLoadError::Compatibility(CompatibilityLoadError::Parse {
                    source: CompatibilityParseError::NoRules,
                    ..
                })
            ));
        }
    }
}
