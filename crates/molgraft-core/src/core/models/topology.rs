use super::ids::VertexId;
use phf::phf_map;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Formal bond order carried by attachment-point classes, edges and ring chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum BondType {
    None,
    #[default]
    Single,
    Double,
    Triple,
    Quadruple,
    Any,
}

static BOND_TYPE_ALIASES: phf::Map<&'static str, BondType> = phf_map! {
    "0" => BondType::None,
    "none" => BondType::None,
    "1" => BondType::Single,
    "s" => BondType::Single,
    "single" => BondType::Single,
    "2" => BondType::Double,
    "d" => BondType::Double,
    "double" => BondType::Double,
    "3" => BondType::Triple,
    "t" => BondType::Triple,
    "triple" => BondType::Triple,
    "4" => BondType::Quadruple,
    "q" => BondType::Quadruple,
    "quadruple" => BondType::Quadruple,
    "any" => BondType::Any,
};

impl BondType {
    /// Integer bond order, if the bond type corresponds to an actual chemical bond.
    pub fn order(&self) -> Option<u8> {
        match self {
            Self::Single => Some(1),
            Self::Double => Some(2),
            Self::Triple => Some(3),
            Self::Quadruple => Some(4),
            Self::None | Self::Any => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid bond type string '{0}'")]
pub struct ParseBondTypeError(pub String);

impl FromStr for BondType {
    type Err = ParseBondTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BOND_TYPE_ALIASES
            .get(s.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| ParseBondTypeError(s.to_string()))
    }
}

impl fmt::Display for BondType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::None => "NONE",
                Self::Single => "SINGLE",
                Self::Double => "DOUBLE",
                Self::Triple => "TRIPLE",
                Self::Quadruple => "QUADRUPLE",
                Self::Any => "ANY",
            }
        )
    }
}

/// Reference to one attachment point: the owning vertex and the AP index on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApRef {
    pub vertex: VertexId,
    pub index: usize,
}

impl ApRef {
    pub fn new(vertex: VertexId, index: usize) -> Self {
        Self { vertex, index }
    }
}

/// A directed connection between two attachment points.
///
/// The source sits on the parent side of the spanning tree, the target on the child side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub src: ApRef,
    pub trg: ApRef,
    pub bond_type: BondType,
}

impl Edge {
    pub fn new(src: ApRef, trg: ApRef, bond_type: BondType) -> Self {
        Self {
            src,
            trg,
            bond_type,
        }
    }

    pub fn involves(&self, vertex: VertexId) -> bool {
        self.src.vertex == vertex || self.trg.vertex == vertex
    }

    /// The AP at the other end of the edge, if `ap` is one of its ends.
    pub fn partner_of(&self, ap: ApRef) -> Option<ApRef> {
        if self.src == ap {
            Some(self.trg)
        } else if self.trg == ap {
            Some(self.src)
        } else {
            None
        }
    }
}

/// A cycle closed by a chord between the first and the last vertex of a tree path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    vertices: Vec<VertexId>,
    pub bond_type: BondType,
}

impl Ring {
    pub(crate) fn new(vertices: Vec<VertexId>, bond_type: BondType) -> Self {
        Self {
            vertices,
            bond_type,
        }
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub fn head(&self) -> Option<VertexId> {
        self.vertices.first().copied()
    }

    pub fn tail(&self) -> Option<VertexId> {
        self.vertices.last().copied()
    }

    /// Number of vertices in the ring, both ring-closing ends included.
    pub fn size(&self) -> usize {
        self.vertices.len()
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    pub fn position_of(&self, vertex: VertexId) -> Option<usize> {
        self.vertices.iter().position(|&v| v == vertex)
    }
}
