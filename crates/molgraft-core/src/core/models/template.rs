use super::apclass::APClass;
use super::graph::{DGraph, GraphError};
use super::topology::ApRef;
use super::vertex::AttachmentPoint;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How much of a template's inner graph may change during design operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContractLevel {
    /// Inner graph may change freely.
    Free,
    /// Inner graph structure is fixed, but vertices may be swapped for isostructural ones.
    FixedStruct,
    /// Inner graph is frozen.
    #[default]
    Fixed,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid contract level '{0}'")]
pub struct ParseContractLevelError(pub String);

impl FromStr for ContractLevel {
    type Err = ParseContractLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "free" => Ok(Self::Free),
            "fixed_struct" | "fixedstruct" => Ok(Self::FixedStruct),
            "fixed" => Ok(Self::Fixed),
            _ => Err(ParseContractLevelError(s.to_string())),
        }
    }
}

impl fmt::Display for ContractLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Free => "FREE",
                Self::FixedStruct => "FIXED_STRUCT",
                Self::Fixed => "FIXED",
            }
        )
    }
}

/// A vertex payload made of a whole graph.
///
/// The APs of the template vertex are, in order, the free APs of the inner graph
/// (vertices visited by increasing integer id, APs by index). `inner_to_outer[k]`
/// names the inner AP projected as outer AP `k`.
#[derive(Debug, Clone)]
pub struct Template {
    inner: DGraph,
    contract: ContractLevel,
    inner_to_outer: Vec<ApRef>,
    required_aps: Option<Vec<APClass>>,
}

impl Template {
    pub fn new(inner: DGraph) -> Self {
        let inner_to_outer = inner
            .vertex_ids_sorted()
            .into_iter()
            .flat_map(|vid| {
                inner
                    .vertex(vid)
                    .map(|v| v.free_ap_indices())
                    .unwrap_or_default()
                    .into_iter()
                    .map(move |index| ApRef::new(vid, index))
            })
            .collect();
        Self {
            inner,
            contract: ContractLevel::default(),
            inner_to_outer,
            required_aps: None,
        }
    }

    pub fn with_contract(mut self, contract: ContractLevel) -> Self {
        self.contract = contract;
        self
    }

    /// Constrains the template to expose exactly the given classes (as a multiset).
    pub fn with_required_aps(mut self, required: Vec<APClass>) -> Result<Self, GraphError> {
        let mut expected = required.clone();
        expected.sort();
        let mut found: Vec<APClass> = self
            .inner_to_outer
            .iter()
            .filter_map(|r| self.inner.ap(*r).map(|ap| ap.class.clone()))
            .collect();
        found.sort();
        if expected != found {
            return Err(GraphError::RequiredApsMismatch {
                expected: join_classes(&expected),
                found: join_classes(&found),
            });
        }
        self.required_aps = Some(required);
        Ok(self)
    }

    pub fn inner(&self) -> &DGraph {
        &self.inner
    }

    pub fn contract(&self) -> ContractLevel {
        self.contract
    }

    pub fn required_aps(&self) -> Option<&[APClass]> {
        self.required_aps.as_deref()
    }

    pub fn inner_ap_of(&self, outer_index: usize) -> Option<ApRef> {
        self.inner_to_outer.get(outer_index).copied()
    }

    pub fn outer_index_of(&self, inner: ApRef) -> Option<usize> {
        self.inner_to_outer.iter().position(|r| *r == inner)
    }

    pub fn interface(&self) -> &[ApRef] {
        &self.inner_to_outer
    }

    pub(crate) fn outer_aps(&self) -> Vec<AttachmentPoint> {
        self.inner_to_outer
            .iter()
            .filter_map(|r| self.inner.ap(*r))
            .map(|ap| {
                let mut outer = AttachmentPoint::new(ap.class.clone());
                outer.direction = ap.direction;
                outer.atom_index = ap.atom_index;
                outer
            })
            .collect()
    }
}

fn join_classes(classes: &[APClass]) -> String {
    classes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
