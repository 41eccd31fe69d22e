//! Read and write hooks for exchanging monomer and connection data as GraphML-style attributes

use derive_more::Display;

use crate::{
    EdgeId, GraphError, Hypergraph, NodeId,
    parsers::{parse_attachment, parse_monomer, parse_polymer_type},
};

use super::check_pairing;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum Attribute {
    #[display("polymerType")]
    PolymerType,
    #[display("monomerId")]
    MonomerId,
    #[display("sourceAttachment")]
    SourceAttachment,
    #[display("targetAttachment")]
    TargetAttachment,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum ElementId {
    Node(NodeId),
    Edge(EdgeId),
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AttributeRecord {
    element: ElementId,
    attribute: Attribute,
    value: String,
}

impl Attribute {
    pub const NODE: [Self; 2] = [Self::PolymerType, Self::MonomerId];
    pub const EDGE: [Self; 2] = [Self::SourceAttachment, Self::TargetAttachment];

    /// Looks an attribute up by its GraphML key, like `monomerId`
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::NODE
            .into_iter()
            .chain(Self::EDGE)
            .find(|attribute| attribute.to_string() == key)
    }
}

impl AttributeRecord {
    #[must_use]
    pub const fn element(&self) -> ElementId {
        self.element
    }

    #[must_use]
    pub const fn attribute(&self) -> Attribute {
        self.attribute
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Hypergraph {
    pub fn node_attribute(&self, node: NodeId, attribute: Attribute) -> Result<String, GraphError> {
        let monomer = self.node(node).ok_or(GraphError::MissingNode(node))?.monomer();
        match attribute {
            Attribute::PolymerType => Ok(monomer.polymer_type().to_string()),
            Attribute::MonomerId => Ok(monomer.id().to_string()),
            Attribute::SourceAttachment | Attribute::TargetAttachment => {
                Err(GraphError::WrongElement { attribute })
            }
        }
    }

    pub fn edge_attribute(&self, edge: EdgeId, attribute: Attribute) -> Result<String, GraphError> {
        let edge = self.edge(edge).ok_or(GraphError::MissingEdge(edge))?;
        match attribute {
            Attribute::SourceAttachment => Ok(edge.source_attachment().to_owned()),
            Attribute::TargetAttachment => Ok(edge.target_attachment().to_owned()),
            Attribute::PolymerType | Attribute::MonomerId => Err(GraphError::WrongElement { attribute }),
        }
    }

    /// Every attribute of every node, then every edge, in creation order
    #[must_use]
    pub fn attribute_records(&self) -> Vec<AttributeRecord> {
        let nodes = self.nodes().flat_map(|(id, node)| {
            let monomer = node.monomer();
            [
                (Attribute::PolymerType, monomer.polymer_type().to_string()),
                (Attribute::MonomerId, monomer.id().to_string()),
            ]
            .map(|(attribute, value)| AttributeRecord {
                element: ElementId::Node(id),
                attribute,
                value,
            })
        });
        let edges = self.edges().flat_map(|(id, edge)| {
            [
                (Attribute::SourceAttachment, edge.source_attachment().to_owned()),
                (Attribute::TargetAttachment, edge.target_attachment().to_owned()),
            ]
            .map(|(attribute, value)| AttributeRecord {
                element: ElementId::Edge(id),
                attribute,
                value,
            })
        });
        nodes.chain(edges).collect()
    }

    /// Updates an attribute of a monomer, validating `value` as notation first
    ///
    /// A monomer can't change polymer type, so setting [`Attribute::PolymerType`] only succeeds for the type it already
    /// has. Changing a monomer's id invalidates the cached sequence of its polymer.
    pub fn set_node_attribute(
        &mut self,
        node: NodeId,
        attribute: Attribute,
        value: &str,
    ) -> Result<(), GraphError> {
        let monomer = self.node(node).ok_or(GraphError::MissingNode(node))?.monomer();
        let invalid = |source| GraphError::InvalidAttribute {
            attribute,
            value: value.to_owned(),
            source,
        };
        match attribute {
            Attribute::PolymerType => {
                let found = parse_polymer_type(value).map_err(invalid)?;
                let expected = monomer.polymer_type();
                if found == expected {
                    Ok(())
                } else {
                    let owner = self.owner(node).and_then(|hyper| self.hyper_node(hyper));
                    let polymer = owner.ok_or(GraphError::InconsistentHyperNode { node, claims: 0 })?;
                    Err(GraphError::PolymerTypeMismatch {
                        polymer: polymer.name(),
                        expected,
                        found,
                    })
                }
            }
            Attribute::MonomerId => {
                let id = parse_monomer(monomer.polymer_type(), value).map_err(invalid)?;
                let monomer = monomer.with_id(id);
                if let Some(Some(slot)) = self.nodes.get_mut(node.0) {
                    slot.monomer = monomer;
                }
                if let Some(hyper) = self.owner(node) {
                    self.clear_inner_notation(hyper);
                }
                Ok(())
            }
            Attribute::SourceAttachment | Attribute::TargetAttachment => {
                Err(GraphError::WrongElement { attribute })
            }
        }
    }

    /// Updates an attachment point of an edge, validating `value` as notation first
    ///
    /// Pairing and general connections must keep agreeing with their kind, so a base pair can't lose a `pair`
    /// attachment and a general connection can't gain one.
    pub fn set_edge_attribute(
        &mut self,
        edge: EdgeId,
        attribute: Attribute,
        value: &str,
    ) -> Result<(), GraphError> {
        let current = self.edge(edge).ok_or(GraphError::MissingEdge(edge))?;
        let value = valid_attachment(attribute, value)?;
        let (source_attachment, target_attachment) = match attribute {
            Attribute::SourceAttachment => (value.as_str(), current.target_attachment()),
            Attribute::TargetAttachment => (current.source_attachment(), value.as_str()),
            Attribute::PolymerType | Attribute::MonomerId => {
                return Err(GraphError::WrongElement { attribute });
            }
        };
        if let Some(kind) = current.kind().connection_kind() {
            check_pairing(kind, source_attachment, target_attachment)?;
        }

        if let Some(Some(slot)) = self.edges.get_mut(edge.0) {
            match attribute {
                Attribute::SourceAttachment => slot.source_attachment = value,
                _ => slot.target_attachment = value,
            }
        }
        Ok(())
    }
}

pub(super) fn valid_attachment(attribute: Attribute, value: &str) -> Result<String, GraphError> {
    parse_attachment(value).map_err(|source| GraphError::InvalidAttribute {
        attribute,
        value: value.to_owned(),
        source,
    })
}
