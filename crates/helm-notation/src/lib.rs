//! Parsing, graph construction, and canonical serialization of HELM (Hierarchical Editing Language for
//! Macromolecules) notation
//!
//! Text flows one way through [`parse`] → [`build`] into a [`Hypergraph`], and back out again through
//! [`serialize`]. A [`NotationCache`] keyed on a normalized form of the notation sits beside this pipeline, and a
//! [`NotationService`] ties the pieces together for callers.

pub mod cache;
pub mod compositor;
pub mod config;
pub mod document;
pub mod errors;
pub mod hypergraph;
pub mod monomer;
pub mod parsers;
pub mod service;
#[cfg(test)]
mod testing_tools;

use std::num::NonZeroU32;

use derive_more::Display;

pub use cache::{CacheKey, DEFAULT_CACHE_SIZE, MAXIMUM_CACHE_SIZE, NotationCache};
pub use compositor::{NotationPart, polymer_notation, serialize};
pub use config::{CacheConfig, HelmConfig};
pub use errors::{ConfigError, Error, GraphError, Result};
pub use hypergraph::{
    attributes::{Attribute, AttributeRecord, ElementId},
    builder::{MAXIMUM_MONOMERS, build},
};
pub use parsers::{
    errors::{HelmErrorKind, ParseError},
    parse,
};
pub use service::NotationService;

/// Parses, builds, and re-serializes `notation`, yielding its canonical form
pub fn canonicalize(notation: &str) -> Result<String> {
    let document = parse(notation)?;
    let graph = build(&document)?;
    Ok(serialize(&graph))
}

// NOTE: The types below are defined here, but implemented in the submodules named after them

// Notation Model ======================================================================================================

/// The index in a polymer name, like the `2` in `RNA2`
pub type Index = NonZeroU32;
/// A 1-based monomer position within a polymer, counting every monomer in the order it's written
pub type Position = NonZeroU32;
/// The number of times a repeated unit occurs, like the `3` in `A'3'`
pub type Count = NonZeroU32;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub enum PolymerType {
    #[display("RNA")]
    Rna,
    #[display("PEPTIDE")]
    Peptide,
    #[display("CHEM")]
    Chem,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum MonomerId {
    /// A code written without brackets: a single letter, or an alphanumeric word for CHEM polymers
    Symbol(String),
    /// A multi-character code written in brackets, like `[dR]`
    Bracketed(String),
    /// An ad-hoc monomer given as an inline SMILES string in brackets
    Smiles(String),
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MonomerRole {
    Backbone,
    /// Hangs off a backbone monomer, like the base `A` in `R(A)P`
    Branch,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct MonomerReference {
    polymer_type: PolymerType,
    id: MonomerId,
    role: MonomerRole,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("{polymer_type}{index}")]
pub struct PolymerName {
    polymer_type: PolymerType,
    index: Index,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Element {
    monomer: MonomerId,
    branch: Option<MonomerId>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Unit {
    elements: Vec<Element>,
    repeat: Option<Count>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Sequence {
    units: Vec<Unit>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PolymerBlock {
    name: PolymerName,
    sequence: Sequence,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Endpoint {
    polymer: PolymerName,
    position: Position,
    attachment: String,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum ConnectionKind {
    /// Base-pairing, written with `pair` on both ends
    #[display("pairing")]
    Pairing,
    /// Any other bond between two attachment points, possibly within a single polymer
    #[display("general")]
    General,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Connection {
    source: Endpoint,
    target: Endpoint,
    kind: ConnectionKind,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Annotation {
    polymer: PolymerName,
    text: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct ParsedDocument {
    polymers: Vec<PolymerBlock>,
    connections: Vec<Connection>,
    annotations: Vec<Annotation>,
}

// Hypergraph ==========================================================================================================

// NOTE: `Id`s index straight into the arenas of a `Hypergraph`. Removed elements leave a `None` behind, so handles are
// never reused and a stale handle simply fails to resolve
type Id = usize;

// NOTE: `*Id` types don't implement `Default`, since only a `Hypergraph` should be minting them
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("n{_0}")]
pub struct NodeId(Id);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("e{_0}")]
pub struct EdgeId(Id);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("h{_0}")]
pub struct HyperNodeId(Id);

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Hypergraph {
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    hyper_nodes: Vec<Option<HyperNode>>,
    owners: Vec<Option<HyperNodeId>>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Node {
    monomer: MonomerReference,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Edge {
    source: NodeId,
    target: NodeId,
    kind: EdgeKind,
    source_attachment: String,
    target_attachment: String,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum EdgeKind {
    /// Links consecutive backbone monomers; `new_unit` marks a `.` written between them
    Regular { new_unit: bool },
    /// Links a backbone monomer to its branch monomer
    Branch,
    Pairing,
    General,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct HyperNode {
    name: PolymerName,
    members: Vec<NodeId>,
    inner_notation: Option<String>,
    annotation: Option<String>,
}
