use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::{
    Attribute, ConnectionKind, EdgeId, HyperNodeId, NodeId, PolymerName, PolymerType, Position,
    parsers::errors::ParseError,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Eq, PartialEq, Diagnostic, Error)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Clone, Eq, PartialEq, Diagnostic, Error)]
pub enum GraphError {
    #[diagnostic(help(
        "positions count every monomer of a polymer from 1, including branch monomers, so check that {polymer} is \
        both defined and long enough"
    ))]
    #[error("the connection {connection} refers to position {position} of {polymer}, which doesn't exist")]
    DanglingConnection {
        connection: String,
        polymer: PolymerName,
        position: Position,
    },

    #[diagnostic(help("annotations must name a polymer defined in the first section of the notation"))]
    #[error("the annotation {annotation} refers to {polymer}, which isn't defined")]
    DanglingAnnotation {
        annotation: String,
        polymer: PolymerName,
    },

    #[diagnostic(help(
        "this is an internal error that you shouldn't ever see! If you have gotten this error, then please report \
        it as a bug!"
    ))]
    #[error("the monomer {node} is claimed by {claims} polymers, but must belong to exactly one")]
    InconsistentHyperNode { node: NodeId, claims: usize },

    #[error("the monomer {0} does not exist")]
    MissingNode(NodeId),

    #[error("the connection {0} does not exist")]
    MissingEdge(EdgeId),

    #[error("the polymer {0} does not exist")]
    MissingHyperNode(HyperNodeId),

    #[diagnostic(help("repeated units are expanded into one monomer per copy, so shrink the repeat counts"))]
    #[error("the notation expands to {count} monomers, but at most {maximum} are supported")]
    TooManyMonomers { count: usize, maximum: usize },

    #[diagnostic(help("polymer names must be unique, so pick an index that isn't taken yet"))]
    #[error("the polymer {0} already exists")]
    DuplicatePolymer(PolymerName),

    #[error("a {found} monomer cannot be added to the {expected} polymer {polymer}")]
    PolymerTypeMismatch {
        polymer: PolymerName,
        expected: PolymerType,
        found: PolymerType,
    },

    #[diagnostic(help("only RNA polymers have branch monomers, and each backbone monomer carries at most one"))]
    #[error("the monomer {0} can't take another branch monomer")]
    BranchOccupied(NodeId),

    #[error("the polymer {0} has no backbone monomer to attach a branch to")]
    MissingBackbone(PolymerName),

    #[diagnostic(help("base pairs use 'pair' on both ends, and every other connection uses it on neither"))]
    #[error("a {kind} connection can't join {source_attachment} to {target_attachment}")]
    MismatchedPairing {
        kind: ConnectionKind,
        source_attachment: String,
        target_attachment: String,
    },

    #[diagnostic(help("remove one of the monomers it links instead"))]
    #[error("the connection {0} is part of a polymer backbone")]
    BackboneEdge(EdgeId),

    #[error("{value:?} is not a valid value for the {attribute} attribute")]
    InvalidAttribute {
        attribute: Attribute,
        value: String,
        #[source]
        #[diagnostic_source]
        source: ParseError,
    },

    #[error("the {attribute} attribute doesn't apply to this kind of element")]
    WrongElement { attribute: Attribute },
}

#[derive(Debug, Diagnostic, Error)]
pub enum ConfigError {
    #[error("failed to read the configuration file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[diagnostic(help("the configuration is TOML, with a [cache] table holding an integer capacity"))]
    #[error("failed to parse the configuration")]
    Parse(#[from] toml::de::Error),
}
