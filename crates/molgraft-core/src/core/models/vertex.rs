use super::apclass::APClass;
use super::ids::EdgeId;
use super::template::Template;
use nalgebra::Vector3;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Role of a building block in the design space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BuildingBlockType {
    #[default]
    Undefined,
    Scaffold,
    Fragment,
    Cap,
    None,
}

impl BuildingBlockType {
    /// Integer code used in serialized graphs and chain identifiers.
    pub fn code(&self) -> i32 {
        match self {
            Self::None => -1,
            Self::Scaffold => 0,
            Self::Fragment => 1,
            Self::Cap => 2,
            Self::Undefined => -99,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid building block type '{0}'")]
pub struct ParseBuildingBlockTypeError(pub String);

impl FromStr for BuildingBlockType {
    type Err = ParseBuildingBlockTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "undefined" | "-99" => Ok(Self::Undefined),
            "scaffold" | "0" => Ok(Self::Scaffold),
            "fragment" | "1" => Ok(Self::Fragment),
            "cap" | "capping" | "2" => Ok(Self::Cap),
            "none" | "-1" => Ok(Self::None),
            _ => Err(ParseBuildingBlockTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for BuildingBlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Undefined => "UNDEFINED",
                Self::Scaffold => "SCAFFOLD",
                Self::Fragment => "FRAGMENT",
                Self::Cap => "CAP",
                Self::None => "NONE",
            }
        )
    }
}

/// An attachment point owned by a vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentPoint {
    pub class: APClass,
    pub direction: Option<Vector3<f64>>,
    pub atom_index: Option<usize>,
    pub(crate) user: Option<EdgeId>,
}

impl AttachmentPoint {
    pub fn new(class: APClass) -> Self {
        Self {
            class,
            direction: None,
            atom_index: None,
            user: None,
        }
    }

    pub fn with_direction(mut self, direction: Vector3<f64>) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_atom_index(mut self, atom_index: usize) -> Self {
        self.atom_index = Some(atom_index);
        self
    }

    /// Whether no edge of the owning graph uses this AP.
    pub fn is_available(&self) -> bool {
        self.user.is_none()
    }

    pub fn user(&self) -> Option<EdgeId> {
        self.user
    }
}

/// Opaque chemical payload of a fragment vertex.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    pub name: String,
    pub payload: String,
    pub elements: Vec<String>,
}

impl Fragment {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub enum VertexKind {
    Fragment(Fragment),
    Empty,
    Template(Box<Template>),
}

impl VertexKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Fragment(_) => "fragment",
            Self::Empty => "empty",
            Self::Template(_) => "template",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VertexError {
    #[error("Attachment point index {index} out of range (vertex has {count} APs)")]
    ApOutOfRange { index: usize, count: usize },
    #[error("Attachment point {0} already belongs to a symmetric set")]
    ApAlreadySymmetric(usize),
    #[error("A symmetric AP set needs at least two members")]
    SymmetricSetTooSmall,
    #[error("APs cannot be added to a template vertex")]
    TemplateAps,
}

/// A node of a design graph.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: u32,
    bb_type: BuildingBlockType,
    bb_id: Option<usize>,
    aps: Vec<AttachmentPoint>,
    symmetric_aps: Vec<BTreeSet<usize>>,
    rcv: bool,
    kind: VertexKind,
}

impl Vertex {
    fn with_kind(id: u32, kind: VertexKind) -> Self {
        Self {
            id,
            bb_type: BuildingBlockType::Undefined,
            bb_id: None,
            aps: Vec::new(),
            symmetric_aps: Vec::new(),
            rcv: false,
            kind,
        }
    }

    pub fn fragment(id: u32, fragment: Fragment) -> Self {
        Self::with_kind(id, VertexKind::Fragment(fragment))
    }

    pub fn empty(id: u32) -> Self {
        Self::with_kind(id, VertexKind::Empty)
    }

    /// Wraps a template; its APs are the projections of the inner graph's free APs.
    pub fn template(id: u32, template: Template) -> Self {
        let aps = template.outer_aps();
        let mut vertex = Self::with_kind(id, VertexKind::Template(Box::new(template)));
        vertex.aps = aps;
        vertex
    }

    pub fn with_building_block(mut self, bb_type: BuildingBlockType, bb_id: Option<usize>) -> Self {
        self.bb_type = bb_type;
        self.bb_id = bb_id;
        self
    }

    pub fn with_ap(mut self, ap: AttachmentPoint) -> Self {
        self.aps.push(ap);
        self
    }

    pub fn with_rcv(mut self, rcv: bool) -> Self {
        self.rcv = rcv;
        self
    }

    pub fn add_ap(&mut self, ap: AttachmentPoint) -> Result<usize, VertexError> {
        if matches!(self.kind, VertexKind::Template(_)) {
            return Err(VertexError::TemplateAps);
        }
        self.aps.push(ap);
        Ok(self.aps.len() - 1)
    }

    /// Declares a set of interchangeable APs. Sets are kept disjoint.
    pub fn add_symmetric_ap_set(
        &mut self,
        indices: impl IntoIterator<Item = usize>,
    ) -> Result<(), VertexError> {
        let set: BTreeSet<usize> = indices.into_iter().collect();
        if set.len() < 2 {
            return Err(VertexError::SymmetricSetTooSmall);
        }
        for &index in &set {
            if index >= self.aps.len() {
                return Err(VertexError::ApOutOfRange {
                    index,
                    count: self.aps.len(),
                });
            }
            if self.symmetric_ap_set_of(index).is_some() {
                return Err(VertexError::ApAlreadySymmetric(index));
            }
        }
        self.symmetric_aps.push(set);
        Ok(())
    }

    pub fn bb_type(&self) -> BuildingBlockType {
        self.bb_type
    }

    pub fn bb_id(&self) -> Option<usize> {
        self.bb_id
    }

    pub(crate) fn set_building_block(&mut self, bb_type: BuildingBlockType, bb_id: Option<usize>) {
        self.bb_type = bb_type;
        self.bb_id = bb_id;
    }

    pub fn is_rcv(&self) -> bool {
        self.rcv
    }

    pub fn kind(&self) -> &VertexKind {
        &self.kind
    }

    pub fn as_fragment(&self) -> Option<&Fragment> {
        match &self.kind {
            VertexKind::Fragment(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_template(&self) -> Option<&Template> {
        match &self.kind {
            VertexKind::Template(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self.kind, VertexKind::Template(_))
    }

    pub fn aps(&self) -> &[AttachmentPoint] {
        &self.aps
    }

    pub fn ap(&self, index: usize) -> Option<&AttachmentPoint> {
        self.aps.get(index)
    }

    pub(crate) fn ap_mut(&mut self, index: usize) -> Option<&mut AttachmentPoint> {
        self.aps.get_mut(index)
    }

    pub fn ap_count(&self) -> usize {
        self.aps.len()
    }

    pub fn free_ap_indices(&self) -> Vec<usize> {
        self.aps
            .iter()
            .enumerate()
            .filter(|(_, ap)| ap.is_available())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn free_ap_count(&self) -> usize {
        self.aps.iter().filter(|ap| ap.is_available()).count()
    }

    pub fn used_ap_count(&self) -> usize {
        self.aps.len() - self.free_ap_count()
    }

    /// The distinct AP classes exposed by this vertex.
    pub fn ap_classes(&self) -> BTreeSet<APClass> {
        self.aps.iter().map(|ap| ap.class.clone()).collect()
    }

    pub fn symmetric_ap_sets(&self) -> &[BTreeSet<usize>] {
        &self.symmetric_aps
    }

    pub fn symmetric_ap_set_of(&self, ap_index: usize) -> Option<&BTreeSet<usize>> {
        self.symmetric_aps.iter().find(|s| s.contains(&ap_index))
    }

    /// Whether both vertices stem from the same library entry.
    pub fn same_building_block(&self, other: &Vertex) -> bool {
        self.bb_id.is_some() && self.bb_type == other.bb_type && self.bb_id == other.bb_id
    }

    /// Whether two vertices are interchangeable as graph nodes, ignoring AP usage.
    pub fn same_identity(&self, other: &Vertex) -> bool {
        if self.kind.tag() != other.kind.tag()
            || self.bb_type != other.bb_type
            || self.bb_id != other.bb_id
            || self.rcv != other.rcv
            || self.aps.len() != other.aps.len()
        {
            return false;
        }
        if !self
            .aps
            .iter()
            .zip(other.aps.iter())
            .all(|(a, b)| a.class == b.class)
        {
            return false;
        }
        match (&self.kind, &other.kind) {
            (VertexKind::Fragment(a), VertexKind::Fragment(b)) => a.name == b.name,
            (VertexKind::Template(a), VertexKind::Template(b)) => {
                a.inner().is_isomorphic_to(b.inner())
            }
            _ => true,
        }
    }

    /// Copy of this vertex with every AP marked free and a new id.
    pub fn detached_copy(&self, id: u32) -> Vertex {
        let mut copy = self.clone();
        copy.id = id;
        copy.clear_ap_users();
        copy
    }

    pub(crate) fn clear_ap_users(&mut self) {
        for ap in self.aps.iter_mut() {
            ap.user = None;
        }
    }
}
