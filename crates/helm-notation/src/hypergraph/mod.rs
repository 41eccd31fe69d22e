pub mod attributes;
pub mod builder;
mod editing;

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};

use crate::{
    ConnectionKind, Edge, EdgeId, EdgeKind, GraphError, HyperNode, HyperNodeId, Hypergraph,
    MonomerReference, Node, NodeId, PolymerName, PolymerType, Position,
    document::PAIR_ATTACHMENT,
};

// Attachment points used by the links implied by a polymer's sequence
const BACKBONE_OUT: &str = "R2";
const BACKBONE_IN: &str = "R1";
const BRANCH_OUT: &str = "R3";

impl Hypergraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0 && self.hyper_node_count() == 0
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    #[must_use]
    pub fn hyper_node_count(&self) -> usize {
        self.hyper_nodes.iter().flatten().count()
    }

    /// Every monomer, in the order it was created
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        live(&self.nodes).map(|(id, node)| (NodeId(id), node))
    }

    /// Every link between monomers, in the order it was created
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        live(&self.edges).map(|(id, edge)| (EdgeId(id), edge))
    }

    /// Every polymer, in the order it was created
    pub fn hyper_nodes(&self) -> impl Iterator<Item = (HyperNodeId, &HyperNode)> {
        live(&self.hyper_nodes).map(|(id, hyper)| (HyperNodeId(id), hyper))
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn hyper_node(&self, id: HyperNodeId) -> Option<&HyperNode> {
        self.hyper_nodes.get(id.0).and_then(Option::as_ref)
    }

    /// The polymer that `node` belongs to
    #[must_use]
    pub fn owner(&self, node: NodeId) -> Option<HyperNodeId> {
        self.owners.get(node.0).copied().flatten()
    }

    /// The 1-based position of `node` within its polymer, as used by connections
    #[must_use]
    pub fn position(&self, node: NodeId) -> Option<Position> {
        let hyper = self.hyper_node(self.owner(node)?)?;
        let index = hyper.members.iter().position(|&m| m == node)?;
        let index = u32::try_from(index).ok()?;
        Some(Position::MIN.saturating_add(index))
    }

    #[must_use]
    pub fn node_at(&self, hyper: HyperNodeId, position: Position) -> Option<NodeId> {
        let index = usize::try_from(position.get() - 1).ok()?;
        self.hyper_node(hyper)?.members.get(index).copied()
    }

    #[must_use]
    pub fn find_hyper_node(&self, name: PolymerName) -> Option<HyperNodeId> {
        self.hyper_nodes()
            .find(|(_, hyper)| hyper.name == name)
            .map(|(id, _)| id)
    }

    /// Every edge that starts or ends at `node`
    pub fn edges_of(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges()
            .filter(move |(_, edge)| edge.source == node || edge.target == node)
    }

    // Construction ====================================================================================================

    pub(crate) fn add_hyper_node(
        &mut self,
        name: PolymerName,
        inner_notation: Option<String>,
    ) -> HyperNodeId {
        let id = HyperNodeId(self.hyper_nodes.len());
        self.hyper_nodes.push(Some(HyperNode {
            name,
            members: Vec::new(),
            inner_notation,
            annotation: None,
        }));
        id
    }

    // NOTE: Only ever called with live hyper-nodes, so the membership list always receives the new node
    pub(crate) fn add_node(&mut self, hyper: HyperNodeId, monomer: MonomerReference) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node { monomer }));
        self.owners.push(Some(hyper));
        if let Some(Some(hyper)) = self.hyper_nodes.get_mut(hyper.0) {
            hyper.members.push(id);
        }
        id
    }

    pub(crate) fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        kind: EdgeKind,
        source_attachment: impl Into<String>,
        target_attachment: impl Into<String>,
    ) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(Some(Edge {
            source,
            target,
            kind,
            source_attachment: source_attachment.into(),
            target_attachment: target_attachment.into(),
        }));
        id
    }

    /// Adds one of the links implied by a sequence, using its standard attachment points
    pub(crate) fn add_sequence_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        kind: EdgeKind,
    ) -> EdgeId {
        let source_attachment = match kind {
            EdgeKind::Branch => BRANCH_OUT,
            _ => BACKBONE_OUT,
        };
        self.add_edge(source, target, kind, source_attachment, BACKBONE_IN)
    }

    pub(crate) fn clear_inner_notation(&mut self, hyper: HyperNodeId) {
        if let Some(Some(hyper)) = self.hyper_nodes.get_mut(hyper.0) {
            hyper.inner_notation = None;
        }
    }

    pub(crate) fn hyper_node_mut(&mut self, id: HyperNodeId) -> Result<&mut HyperNode, GraphError> {
        self.hyper_nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(GraphError::MissingHyperNode(id))
    }

    /// Re-derives which polymer owns each monomer by walking the sequence links out from every polymer's first
    /// monomer, cross-checked against the polymers' own membership lists
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InconsistentHyperNode`] if any monomer is claimed by no polymer or by more than one.
    pub(crate) fn assign_membership(&mut self) -> Result<(), GraphError> {
        let mut neighbours: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (_, edge) in self.edges().filter(|(_, edge)| edge.kind.is_sequence()) {
            neighbours.entry(edge.source).or_default().push(edge.target);
            neighbours.entry(edge.target).or_default().push(edge.source);
        }

        let mut claims: HashMap<NodeId, Vec<HyperNodeId>> = HashMap::new();
        for (id, hyper) in self.hyper_nodes() {
            let mut stack: Vec<_> = hyper.members.first().copied().into_iter().collect();
            let mut reached = HashSet::new();
            while let Some(node) = stack.pop() {
                if !reached.insert(node) {
                    continue;
                }
                stack.extend(neighbours.get(&node).into_iter().flatten().copied());
            }
            for node in reached.into_iter().chain(hyper.members.iter().copied()) {
                let owners = claims.entry(node).or_default();
                if !owners.contains(&id) {
                    owners.push(id);
                }
            }
        }

        for (node, _) in live(&self.nodes).map(|(id, node)| (NodeId(id), node)) {
            match claims.get(&node).map(Vec::as_slice) {
                Some(&[owner]) => self.owners[node.0] = Some(owner),
                other => {
                    let claims = other.map_or(0, <[_]>::len);
                    log::error!("monomer {node} is claimed by {claims} polymers");
                    return Err(GraphError::InconsistentHyperNode { node, claims });
                }
            }
        }
        Ok(())
    }
}

fn live<T>(arena: &[Option<T>]) -> impl Iterator<Item = (usize, &T)> {
    arena
        .iter()
        .enumerate()
        .filter_map(|(id, slot)| slot.as_ref().map(|value| (id, value)))
}

impl Node {
    #[must_use]
    pub const fn monomer(&self) -> &MonomerReference {
        &self.monomer
    }
}

impl EdgeKind {
    /// Whether this edge is one of the links implied by a polymer's sequence, rather than an explicit connection
    #[must_use]
    pub const fn is_sequence(self) -> bool {
        matches!(self, Self::Regular { .. } | Self::Branch)
    }

    #[must_use]
    pub const fn connection_kind(self) -> Option<ConnectionKind> {
        match self {
            Self::Pairing => Some(ConnectionKind::Pairing),
            Self::General => Some(ConnectionKind::General),
            Self::Regular { .. } | Self::Branch => None,
        }
    }
}

impl From<ConnectionKind> for EdgeKind {
    fn from(value: ConnectionKind) -> Self {
        match value {
            ConnectionKind::Pairing => Self::Pairing,
            ConnectionKind::General => Self::General,
        }
    }
}

impl Edge {
    #[must_use]
    pub const fn source(&self) -> NodeId {
        self.source
    }

    #[must_use]
    pub const fn target(&self) -> NodeId {
        self.target
    }

    #[must_use]
    pub const fn kind(&self) -> EdgeKind {
        self.kind
    }

    #[must_use]
    pub fn source_attachment(&self) -> &str {
        &self.source_attachment
    }

    #[must_use]
    pub fn target_attachment(&self) -> &str {
        &self.target_attachment
    }
}

impl HyperNode {
    #[must_use]
    pub const fn name(&self) -> PolymerName {
        self.name
    }

    #[must_use]
    pub const fn polymer_type(&self) -> PolymerType {
        self.name.polymer_type()
    }

    /// Member monomers in position order
    #[must_use]
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// The sequence as it was last written, if no edit has invalidated it since
    #[must_use]
    pub fn inner_notation(&self) -> Option<&str> {
        self.inner_notation.as_deref().filter(|n| !n.is_empty())
    }

    #[must_use]
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }
}

// Checks that a connection's kind agrees with its attachment points
fn check_pairing(
    kind: ConnectionKind,
    source_attachment: &str,
    target_attachment: &str,
) -> Result<(), GraphError> {
    let pairs = (
        source_attachment == PAIR_ATTACHMENT,
        target_attachment == PAIR_ATTACHMENT,
    );
    match (kind, pairs) {
        (ConnectionKind::Pairing, (true, true)) | (ConnectionKind::General, (false, false)) => Ok(()),
        _ => Err(GraphError::MismatchedPairing {
            kind,
            source_attachment: source_attachment.to_owned(),
            target_attachment: target_attachment.to_owned(),
        }),
    }
}
