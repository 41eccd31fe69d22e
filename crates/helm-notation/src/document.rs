use std::fmt::{self, Display, Formatter};

use itertools::Itertools;

use crate::{
    Annotation, Connection, ConnectionKind, Count, Element, Endpoint, Index, MonomerId,
    ParsedDocument, PolymerBlock, PolymerName, PolymerType, Position, Sequence, Unit,
};

/// The attachment label written on both ends of a base-pairing connection
pub const PAIR_ATTACHMENT: &str = "pair";

impl PolymerName {
    #[must_use]
    pub const fn new(polymer_type: PolymerType, index: Index) -> Self {
        Self {
            polymer_type,
            index,
        }
    }

    #[must_use]
    pub const fn polymer_type(&self) -> PolymerType {
        self.polymer_type
    }

    #[must_use]
    pub const fn index(&self) -> Index {
        self.index
    }
}

impl Element {
    #[must_use]
    pub const fn new(monomer: MonomerId, branch: Option<MonomerId>) -> Self {
        Self { monomer, branch }
    }

    #[must_use]
    pub const fn monomer(&self) -> &MonomerId {
        &self.monomer
    }

    #[must_use]
    pub const fn branch(&self) -> Option<&MonomerId> {
        self.branch.as_ref()
    }

    #[must_use]
    pub const fn monomer_count(&self) -> usize {
        if self.branch.is_some() { 2 } else { 1 }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.monomer)?;
        if let Some(branch) = &self.branch {
            write!(f, "({branch})")?;
        }
        Ok(())
    }
}

impl Unit {
    #[must_use]
    pub const fn new(elements: Vec<Element>, repeat: Option<Count>) -> Self {
        Self { elements, repeat }
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub const fn repeat(&self) -> Option<Count> {
        self.repeat
    }

    /// How many copies of this unit the polymer contains
    #[must_use]
    pub fn copies(&self) -> usize {
        self.repeat.map_or(1, |n| n.get() as usize)
    }

    /// Counts every monomer in every copy of this unit, saturating at `usize::MAX`
    #[must_use]
    pub fn monomer_count(&self) -> usize {
        let per_copy: usize = self.elements.iter().map(Element::monomer_count).sum();
        per_copy.saturating_mul(self.copies())
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            write!(f, "{element}")?;
        }
        if let Some(repeat) = self.repeat {
            write!(f, "'{repeat}'")?;
        }
        Ok(())
    }
}

impl Sequence {
    #[must_use]
    pub const fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    #[must_use]
    pub fn monomer_count(&self) -> usize {
        self.units
            .iter()
            .map(Unit::monomer_count)
            .fold(0, usize::saturating_add)
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.units.iter().join("."))
    }
}

impl PolymerBlock {
    #[must_use]
    pub const fn new(name: PolymerName, sequence: Sequence) -> Self {
        Self { name, sequence }
    }

    #[must_use]
    pub const fn name(&self) -> PolymerName {
        self.name
    }

    #[must_use]
    pub const fn sequence(&self) -> &Sequence {
        &self.sequence
    }
}

impl Display for PolymerBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{{}}}", self.name, self.sequence)
    }
}

impl Endpoint {
    #[must_use]
    pub fn new(polymer: PolymerName, position: Position, attachment: impl Into<String>) -> Self {
        let attachment = attachment.into();
        Self {
            polymer,
            position,
            attachment,
        }
    }

    #[must_use]
    pub const fn polymer(&self) -> PolymerName {
        self.polymer
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub fn attachment(&self) -> &str {
        &self.attachment
    }

    #[must_use]
    pub fn is_pair(&self) -> bool {
        self.attachment == PAIR_ATTACHMENT
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.position, self.attachment)
    }
}

impl Connection {
    #[must_use]
    pub const fn new(source: Endpoint, target: Endpoint, kind: ConnectionKind) -> Self {
        Self {
            source,
            target,
            kind,
        }
    }

    #[must_use]
    pub const fn source(&self) -> &Endpoint {
        &self.source
    }

    #[must_use]
    pub const fn target(&self) -> &Endpoint {
        &self.target
    }

    #[must_use]
    pub const fn kind(&self) -> ConnectionKind {
        self.kind
    }
}

impl Display for Connection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self { source, target, .. } = self;
        write!(
            f,
            "{},{},{source}-{target}",
            source.polymer, target.polymer
        )
    }
}

impl Annotation {
    #[must_use]
    pub fn new(polymer: PolymerName, text: impl Into<String>) -> Self {
        let text = text.into();
        Self { polymer, text }
    }

    #[must_use]
    pub const fn polymer(&self) -> PolymerName {
        self.polymer
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Display for Annotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{{}}}", self.polymer, self.text)
    }
}

impl ParsedDocument {
    #[must_use]
    pub const fn new(
        polymers: Vec<PolymerBlock>,
        connections: Vec<Connection>,
        annotations: Vec<Annotation>,
    ) -> Self {
        Self {
            polymers,
            connections,
            annotations,
        }
    }

    #[must_use]
    pub fn polymers(&self) -> &[PolymerBlock] {
        &self.polymers
    }

    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    #[must_use]
    pub fn polymer(&self, name: PolymerName) -> Option<&PolymerBlock> {
        self.polymers.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polymers.is_empty() && self.connections.is_empty() && self.annotations.is_empty()
    }
}
