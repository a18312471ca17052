use super::classify::Classification;
use crate::core::models::apclass::APClass;
use crate::core::models::graph::DGraph;
use crate::core::models::vertex::{BuildingBlockType, Vertex, VertexKind};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// The three building-block libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryKind {
    Scaffold,
    Fragment,
    Cap,
}

impl LibraryKind {
    pub fn bb_type(&self) -> BuildingBlockType {
        match self {
            Self::Scaffold => BuildingBlockType::Scaffold,
            Self::Fragment => BuildingBlockType::Fragment,
            Self::Cap => BuildingBlockType::Cap,
        }
    }

    pub fn for_bb_type(bb_type: BuildingBlockType) -> Option<Self> {
        match bb_type {
            BuildingBlockType::Scaffold => Some(Self::Scaffold),
            BuildingBlockType::Fragment => Some(Self::Fragment),
            BuildingBlockType::Cap => Some(Self::Cap),
            BuildingBlockType::Undefined | BuildingBlockType::None => None,
        }
    }
}

impl fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Scaffold => "scaffold",
                Self::Fragment => "fragment",
                Self::Cap => "capping",
            }
        )
    }
}

impl FromStr for LibraryKind {
    type Err = FragmentSpaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scaffold" | "scaffolds" => Ok(Self::Scaffold),
            "fragment" | "fragments" => Ok(Self::Fragment),
            "cap" | "caps" | "capping" => Ok(Self::Cap),
            _ => Err(FragmentSpaceError::UnknownLibrary(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FragmentSpaceError {
    #[error("No building block with index {index} in the {kind} library")]
    NotFound { kind: LibraryKind, index: usize },
    #[error("Duplicate building block '{name}' in the {kind} library")]
    DuplicateDefinition { kind: LibraryKind, name: String },
    #[error("Unknown library '{0}'")]
    UnknownLibrary(String),
}

/// The design space: building-block libraries plus the rules for joining them.
///
/// A fragment space is assembled once, then shared read-only by the search
/// algorithms. [`FragmentSpace::classify`] builds the lookup indices; queries that
/// need them fall back to computing them on the fly if it has not been called.
#[derive(Debug, Clone, Default)]
pub struct FragmentSpace {
    scaffolds: Vec<Vertex>,
    fragments: Vec<Vertex>,
    caps: Vec<Vertex>,
    compatibility: HashMap<APClass, Vec<APClass>>,
    ring_compatibility: HashMap<APClass, Vec<APClass>>,
    capping: HashMap<APClass, APClass>,
    forbidden_ends: HashSet<APClass>,
    symmetry_overrides: HashMap<APClass, f64>,
    classification: Option<Classification>,
}

impl FragmentSpace {
    pub fn new() -> Self {
        Self::default()
    }

    fn library_mut(&mut self, kind: LibraryKind) -> &mut Vec<Vertex> {
        match kind {
            LibraryKind::Scaffold => &mut self.scaffolds,
            LibraryKind::Fragment => &mut self.fragments,
            LibraryKind::Cap => &mut self.caps,
        }
    }

    pub fn library(&self, kind: LibraryKind) -> &[Vertex] {
        match kind {
            LibraryKind::Scaffold => &self.scaffolds,
            LibraryKind::Fragment => &self.fragments,
            LibraryKind::Cap => &self.caps,
        }
    }

    /// Replaces a library. Each block is tagged with its library role and index.
    pub fn load_library(
        &mut self,
        kind: LibraryKind,
        vertices: Vec<Vertex>,
    ) -> Result<(), FragmentSpaceError> {
        let mut seen = HashSet::new();
        for vertex in &vertices {
            if let Some(name) = unique_name(vertex) {
                if !seen.insert(name.to_string()) {
                    return Err(FragmentSpaceError::DuplicateDefinition {
                        kind,
                        name: name.to_string(),
                    });
                }
            }
        }
        let tagged = vertices
            .into_iter()
            .enumerate()
            .map(|(index, mut vertex)| {
                vertex.set_building_block(kind.bb_type(), Some(index));
                vertex
            })
            .collect::<Vec<_>>();
        debug!(library = %kind, size = tagged.len(), "Loaded building-block library");
        *self.library_mut(kind) = tagged;
        self.classification = None;
        Ok(())
    }

    /// Adds one block to a library and rebuilds the indices. Returns its index.
    pub fn append_to_library(
        &mut self,
        kind: LibraryKind,
        mut vertex: Vertex,
    ) -> Result<usize, FragmentSpaceError> {
        if let Some(name) = unique_name(&vertex) {
            if self
                .library(kind)
                .iter()
                .any(|v| unique_name(v) == Some(name))
            {
                return Err(FragmentSpaceError::DuplicateDefinition {
                    kind,
                    name: name.to_string(),
                });
            }
        }
        let index = self.library(kind).len();
        vertex.set_building_block(kind.bb_type(), Some(index));
        self.library_mut(kind).push(vertex);
        self.classify();
        Ok(index)
    }

    /// A fresh copy of a building block, ready to be added to a graph.
    pub fn vertex(
        &self,
        kind: LibraryKind,
        index: usize,
        vertex_id: u32,
    ) -> Result<Vertex, FragmentSpaceError> {
        self.library(kind)
            .get(index)
            .map(|v| v.detached_copy(vertex_id))
            .ok_or(FragmentSpaceError::NotFound { kind, index })
    }

    pub fn set_compatibility(&mut self, compatibility: HashMap<APClass, Vec<APClass>>) {
        self.compatibility = compatibility;
    }

    pub fn add_compatibility(&mut self, src: APClass, targets: impl IntoIterator<Item = APClass>) {
        let entry = self.compatibility.entry(src).or_default();
        for target in targets {
            if !entry.contains(&target) {
                entry.push(target);
            }
        }
    }

    pub fn set_ring_compatibility(&mut self, ring_compatibility: HashMap<APClass, Vec<APClass>>) {
        self.ring_compatibility = ring_compatibility;
    }

    /// Declares two classes able to close a ring together (in both directions).
    pub fn add_ring_compatibility(&mut self, a: APClass, b: APClass) {
        for (x, y) in [(a.clone(), b.clone()), (b, a)] {
            let entry = self.ring_compatibility.entry(x).or_default();
            if !entry.contains(&y) {
                entry.push(y);
            }
        }
    }

    pub fn set_capping(&mut self, capping: HashMap<APClass, APClass>) {
        self.capping = capping;
    }

    pub fn add_capping(&mut self, src: APClass, cap: APClass) {
        self.capping.insert(src, cap);
    }

    pub fn set_forbidden_ends(&mut self, forbidden: HashSet<APClass>) {
        self.forbidden_ends = forbidden;
    }

    pub fn add_forbidden_end(&mut self, class: APClass) {
        self.forbidden_ends.insert(class);
    }

    pub fn set_symmetry_probability(&mut self, class: APClass, probability: f64) {
        self.symmetry_overrides.insert(class, probability);
    }

    /// Classes that an AP of class `class` may bind to. The relation is directed.
    pub fn compatible_classes(&self, class: &APClass) -> &[APClass] {
        self.compatibility
            .get(class)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_compatible(&self, src: &APClass, trg: &APClass) -> bool {
        self.compatible_classes(src).contains(trg)
    }

    pub fn compatibility_map(&self) -> &HashMap<APClass, Vec<APClass>> {
        &self.compatibility
    }

    pub fn ring_compatible_classes(&self, class: &APClass) -> &[APClass] {
        self.ring_compatibility
            .get(class)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_ring_rule(&self, class: &APClass) -> bool {
        self.ring_compatibility.contains_key(class)
    }

    pub fn is_ring_compatible(&self, a: &APClass, b: &APClass) -> bool {
        self.ring_compatible_classes(a).contains(b)
    }

    pub fn capping_class(&self, class: &APClass) -> Option<&APClass> {
        self.capping.get(class)
    }

    pub fn is_forbidden_end(&self, class: &APClass) -> bool {
        self.forbidden_ends.contains(class)
    }

    pub fn symmetry_probability(&self, class: &APClass) -> Option<f64> {
        self.symmetry_overrides.get(class).copied()
    }

    /// Builds the lookup indices over the fragment and capping libraries.
    pub fn classify(&mut self) {
        let classification = Classification::build(&self.fragments, &self.caps);
        debug!(
            classes = classification.aps_by_class.len(),
            "Classified fragment space"
        );
        self.classification = Some(classification);
    }

    pub fn is_classified(&self) -> bool {
        self.classification.is_some()
    }

    fn classification(&self) -> Cow<'_, Classification> {
        match &self.classification {
            Some(c) => Cow::Borrowed(c),
            None => Cow::Owned(Classification::build(&self.fragments, &self.caps)),
        }
    }

    pub fn fragments_with_ap_count(&self, count: usize) -> Vec<usize> {
        self.classification()
            .by_ap_count
            .get(&count)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fragments_with_class(&self, class: &APClass) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .classification()
            .aps_by_class
            .get(class)
            .map(|aps| aps.iter().map(|(frag, _)| *frag).collect())
            .unwrap_or_default();
        ids.dedup();
        ids
    }

    /// `(fragment, AP)` pairs whose class an AP of class `class` may bind to.
    pub fn fragment_aps_compatible_with(&self, class: &APClass) -> Vec<(usize, usize)> {
        let classification = self.classification();
        let mut pairs: Vec<(usize, usize)> = self
            .compatible_classes(class)
            .iter()
            .filter_map(|target| classification.aps_by_class.get(target))
            .flatten()
            .copied()
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Fragments offering, for every listed class, at least one AP that class binds to.
    pub fn fragments_compatible_with(&self, classes: &[APClass]) -> Vec<usize> {
        let classification = self.classification();
        (0..self.fragments.len())
            .filter(|&frag| {
                let own = &classification.classes_per_fragment[frag];
                classes.iter().all(|class| {
                    self.compatible_classes(class)
                        .iter()
                        .any(|target| own.contains(target))
                })
            })
            .collect()
    }

    pub fn capping_groups_with_class(&self, class: &APClass) -> Vec<usize> {
        self.classification()
            .capping_by_class
            .get(class)
            .cloned()
            .unwrap_or_default()
    }

    /// A copy of the first capping group exposing the capping class of `class`.
    pub fn capping_vertex_for(&self, class: &APClass, vertex_id: u32) -> Option<Vertex> {
        let cap_class = self.capping_class(class)?;
        let first = *self.capping_groups_with_class(cap_class).first()?;
        self.vertex(LibraryKind::Cap, first, vertex_id).ok()
    }

    /// Whether every edge of the graph could also be traversed in the opposite direction.
    pub fn is_reversible(&self, graph: &DGraph) -> bool {
        graph.edges_iter().all(|(_, edge)| {
            match (graph.ap(edge.src), graph.ap(edge.trg)) {
                (Some(src), Some(trg)) => self.is_compatible(&trg.class, &src.class),
                _ => false,
            }
        })
    }
}

fn unique_name(vertex: &Vertex) -> Option<&str> {
    match vertex.kind() {
        VertexKind::Fragment(f) if !f.name.is_empty() => Some(f.name.as_str()),
        _ => None,
    }
}
