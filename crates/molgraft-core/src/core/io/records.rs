use crate::core::models::apclass::{APClass, ApClassError};
use crate::core::models::graph::{DGraph, GraphError};
use crate::core::models::template::{ContractLevel, ParseContractLevelError, Template};
use crate::core::models::topology::{ApRef, BondType, ParseBondTypeError};
use crate::core::models::vertex::{
    AttachmentPoint, BuildingBlockType, Fragment, ParseBuildingBlockTypeError, Vertex, VertexError,
    VertexKind,
};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Invalid APClass: {0}")]
    ApClass(#[from] ApClassError),
    #[error(transparent)]
    BondType(#[from] ParseBondTypeError),
    #[error(transparent)]
    BuildingBlockType(#[from] ParseBuildingBlockTypeError),
    #[error(transparent)]
    ContractLevel(#[from] ParseContractLevelError),
    #[error("Invalid vertex definition: {0}")]
    Vertex(#[from] VertexError),
    #[error("Invalid graph: {0}")]
    Graph(#[from] GraphError),
    #[error("Unknown vertex kind '{0}'")]
    UnknownKind(String),
    #[error("Template vertex {0} has no inner graph")]
    MissingTemplateGraph(u32),
    #[error("Record references unknown vertex id {0}")]
    UnknownVertex(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApRecord {
    /// Class in `rule:sub` or `rule:sub:BOND` form.
    pub class: String,
    #[serde(rename = "atom-index", default, skip_serializing_if = "Option::is_none")]
    pub atom_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<[f64; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VertexRecord {
    #[serde(default)]
    pub id: u32,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(rename = "building-block-type", default, skip_serializing_if = "Option::is_none")]
    pub bb_type: Option<String>,
    #[serde(rename = "building-block-id", default, skip_serializing_if = "Option::is_none")]
    pub bb_id: Option<usize>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub rcv: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<String>,
    #[serde(rename = "symmetric-aps", default, skip_serializing_if = "Vec::is_empty")]
    pub symmetric_aps: Vec<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    #[serde(rename = "required-aps", default, skip_serializing_if = "Option::is_none")]
    pub required_aps: Option<Vec<String>>,
    #[serde(rename = "ap", default, skip_serializing_if = "Vec::is_empty")]
    pub aps: Vec<ApRecord>,
    #[serde(rename = "inner-graph", default, skip_serializing_if = "Option::is_none")]
    pub inner_graph: Option<Box<GraphRecord>>,
}

fn default_kind() -> String {
    "fragment".to_string()
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeRecord {
    /// `[vertex id, AP index]` on the parent side.
    pub src: (u32, usize),
    /// `[vertex id, AP index]` on the child side.
    pub trg: (u32, usize),
    #[serde(default = "default_bond")]
    pub bond: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RingRecord {
    pub vertices: Vec<u32>,
    #[serde(default = "default_bond")]
    pub bond: String,
}

fn default_bond() -> String {
    BondType::default().to_string()
}

/// Flat, serializable form of a [`DGraph`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphRecord {
    #[serde(rename = "symmetric-vertices", default, skip_serializing_if = "Vec::is_empty")]
    pub symmetric_vertices: Vec<Vec<u32>>,
    #[serde(rename = "vertex", default)]
    pub vertices: Vec<VertexRecord>,
    #[serde(rename = "edge", default)]
    pub edges: Vec<EdgeRecord>,
    #[serde(rename = "ring", default, skip_serializing_if = "Vec::is_empty")]
    pub rings: Vec<RingRecord>,
}

impl VertexRecord {
    pub fn from_vertex(vertex: &Vertex) -> Self {
        let (kind, name, payload, elements, contract, required_aps, inner_graph) =
            match vertex.kind() {
                VertexKind::Fragment(f) => (
                    "fragment",
                    Some(f.name.clone()),
                    (!f.payload.is_empty()).then(|| f.payload.clone()),
                    f.elements.clone(),
                    None,
                    None,
                    None,
                ),
                VertexKind::Empty => ("empty", None, None, Vec::new(), None, None, None),
                VertexKind::Template(t) => (
                    "template",
                    None,
                    None,
                    Vec::new(),
                    Some(t.contract().to_string()),
                    t.required_aps()
                        .map(|r| r.iter().map(|c| c.to_extended_string()).collect()),
                    Some(Box::new(GraphRecord::from_graph(t.inner()))),
                ),
            };
        let aps = match vertex.kind() {
            VertexKind::Template(_) => Vec::new(),
            _ => vertex
                .aps()
                .iter()
                .map(|ap| ApRecord {
                    class: ap.class.to_extended_string(),
                    atom_index: ap.atom_index,
                    direction: ap.direction.map(|d| [d.x, d.y, d.z]),
                })
                .collect(),
        };
        Self {
            id: vertex.id,
            kind: kind.to_string(),
            bb_type: Some(vertex.bb_type().to_string()),
            bb_id: vertex.bb_id(),
            rcv: vertex.is_rcv(),
            name,
            payload,
            elements,
            symmetric_aps: vertex
                .symmetric_ap_sets()
                .iter()
                .map(|s| s.iter().copied().collect())
                .collect(),
            contract,
            required_aps,
            aps,
            inner_graph,
        }
    }

    pub fn into_vertex(self) -> Result<Vertex, RecordError> {
        let mut vertex = match self.kind.to_lowercase().as_str() {
            "fragment" => Vertex::fragment(
                self.id,
                Fragment {
                    name: self.name.unwrap_or_default(),
                    payload: self.payload.unwrap_or_default(),
                    elements: self.elements,
                },
            ),
            "empty" => Vertex::empty(self.id),
            "template" => {
                let inner = self
                    .inner_graph
                    .ok_or(RecordError::MissingTemplateGraph(self.id))?
                    .into_graph()?;
                let mut template = Template::new(inner);
                if let Some(contract) = self.contract {
                    template = template.with_contract(contract.parse::<ContractLevel>()?);
                }
                if let Some(required) = self.required_aps {
                    let classes = required
                        .iter()
                        .map(|c| c.parse::<APClass>())
                        .collect::<Result<Vec<_>, _>>()?;
                    template = template.with_required_aps(classes)?;
                }
                Vertex::template(self.id, template)
            }
            other => return Err(RecordError::UnknownKind(other.to_string())),
        };
        let bb_type = match self.bb_type {
            Some(t) => t.parse::<BuildingBlockType>()?,
            None => BuildingBlockType::Undefined,
        };
        vertex = vertex
            .with_building_block(bb_type, self.bb_id)
            .with_rcv(self.rcv);
        for ap in self.aps {
            let mut point = AttachmentPoint::new(ap.class.parse::<APClass>()?);
            point.atom_index = ap.atom_index;
            point.direction = ap.direction.map(|[x, y, z]| Vector3::new(x, y, z));
            vertex.add_ap(point)?;
        }
        for set in self.symmetric_aps {
            vertex.add_symmetric_ap_set(set)?;
        }
        Ok(vertex)
    }
}

impl GraphRecord {
    pub fn from_graph(graph: &DGraph) -> Self {
        let int_id = |v| graph.vertex(v).map(|vertex| vertex.id).unwrap_or_default();
        let vertices = graph
            .vertex_ids_sorted()
            .into_iter()
            .filter_map(|v| graph.vertex(v))
            .map(VertexRecord::from_vertex)
            .collect();
        let mut edges: Vec<EdgeRecord> = graph
            .edges_iter()
            .map(|(_, e)| EdgeRecord {
                src: (int_id(e.src.vertex), e.src.index),
                trg: (int_id(e.trg.vertex), e.trg.index),
                bond: e.bond_type.to_string(),
            })
            .collect();
        edges.sort_by_key(|e| (e.src, e.trg));
        let rings = graph
            .rings()
            .iter()
            .map(|r| RingRecord {
                vertices: r.vertices().iter().map(|&v| int_id(v)).collect(),
                bond: r.bond_type.to_string(),
            })
            .collect();
        let symmetric_vertices = graph
            .symmetric_vertex_sets()
            .iter()
            .map(|s| s.iter().map(|&v| int_id(v)).collect())
            .collect();
        Self {
            symmetric_vertices,
            vertices,
            edges,
            rings,
        }
    }

    pub fn into_graph(self) -> Result<DGraph, RecordError> {
        let mut graph = DGraph::new();
        for record in self.vertices {
            graph.add_vertex(record.into_vertex()?)?;
        }
        let lookup = |graph: &DGraph, id: u32| {
            graph
                .find_vertex_by_id(id)
                .ok_or(RecordError::UnknownVertex(id))
        };
        for edge in self.edges {
            let src = ApRef::new(lookup(&graph, edge.src.0)?, edge.src.1);
            let trg = ApRef::new(lookup(&graph, edge.trg.0)?, edge.trg.1);
            graph.add_edge(src, trg, edge.bond.parse()?)?;
        }
        for ring in self.rings {
            let (Some(&head), Some(&tail)) = (ring.vertices.first(), ring.vertices.last()) else {
                continue;
            };
            let head = lookup(&graph, head)?;
            let tail = lookup(&graph, tail)?;
            graph.add_ring(head, tail, ring.bond.parse()?)?;
        }
        for set in self.symmetric_vertices {
            let members = set
                .into_iter()
                .map(|id| lookup(&graph, id))
                .collect::<Result<Vec<_>, _>>()?;
            graph.add_symmetric_vertex_set(members)?;
        }
        Ok(graph)
    }
}
