use crate::{
    ConnectionKind, EdgeId, EdgeKind, GraphError, HyperNodeId, Hypergraph, MonomerId,
    MonomerReference, NodeId, PolymerName,
};

use super::{
    attributes::{Attribute, valid_attachment},
    check_pairing,
};

// NOTE: Every edit that changes a polymer's sequence clears its cached inner notation, so the compositor rebuilds it
// from the graph. Positions are always read back from membership order, so connections renumber themselves.
impl Hypergraph {
    /// Starts a new polymer holding a single backbone monomer
    ///
    /// # Errors
    ///
    /// Fails if the graph already has a polymer called `name`.
    pub fn add_polymer(
        &mut self,
        name: PolymerName,
        monomer: MonomerId,
    ) -> Result<HyperNodeId, GraphError> {
        if self.find_hyper_node(name).is_some() {
            return Err(GraphError::DuplicatePolymer(name));
        }
        let hyper = self.add_hyper_node(name, None);
        self.add_node(hyper, MonomerReference::backbone(name.polymer_type(), monomer));
        log::debug!("added the polymer {name} as {hyper}");
        Ok(hyper)
    }

    /// Appends a monomer to the end of a polymer
    ///
    /// Backbone monomers are linked after the last backbone monomer, starting a new unit if `new_unit` is set (units
    /// outside of RNA always hold a single monomer, so there it's implied). Branch monomers hang off the last backbone
    /// monomer instead.
    ///
    /// # Errors
    ///
    /// Fails if the polymer doesn't exist, if the monomer's polymer type doesn't match, or if a branch monomer has
    /// nowhere to go.
    pub fn push_monomer(
        &mut self,
        hyper: HyperNodeId,
        monomer: MonomerReference,
        new_unit: bool,
    ) -> Result<NodeId, GraphError> {
        let polymer = self.hyper_node(hyper).ok_or(GraphError::MissingHyperNode(hyper))?;
        let name = polymer.name();
        if monomer.polymer_type() != name.polymer_type() {
            return Err(GraphError::PolymerTypeMismatch {
                polymer: name,
                expected: name.polymer_type(),
                found: monomer.polymer_type(),
            });
        }
        let last_backbone = polymer.members().iter().rev().copied().find(|&member| {
            self.node(member)
                .is_some_and(|node| !node.monomer().is_branch())
        });

        let node = if monomer.is_branch() {
            let backbone = last_backbone.ok_or(GraphError::MissingBackbone(name))?;
            if !name.polymer_type().has_branches() || self.branch_of(backbone).is_some() {
                return Err(GraphError::BranchOccupied(backbone));
            }
            let node = self.add_node(hyper, monomer);
            self.add_sequence_edge(backbone, node, EdgeKind::Branch);
            node
        } else {
            let new_unit = new_unit || !name.polymer_type().has_branches();
            let node = self.add_node(hyper, monomer);
            if let Some(previous) = last_backbone {
                self.add_sequence_edge(previous, node, EdgeKind::Regular { new_unit });
            }
            node
        };
        self.clear_inner_notation(hyper);
        Ok(node)
    }

    /// Removes a monomer, along with its branch monomer and every edge touching either
    ///
    /// The backbone is spliced back together around a removed backbone monomer, and a polymer left without any
    /// monomers is removed too.
    pub fn remove_monomer(&mut self, node: NodeId) -> Result<(), GraphError> {
        let is_branch = self
            .node(node)
            .ok_or(GraphError::MissingNode(node))?
            .monomer()
            .is_branch();
        let hyper = self
            .owner(node)
            .ok_or(GraphError::InconsistentHyperNode { node, claims: 0 })?;

        let mut doomed = vec![node];
        if !is_branch {
            doomed.extend(self.branch_of(node));
            let incoming = self.previous_backbone(node);
            let outgoing = self.next_backbone(node);
            if let (Some((previous, before)), Some((next, after))) = (incoming, outgoing) {
                // NOTE: A unit boundary on either side of the removed monomer survives the splice
                let new_unit = before || after;
                self.add_sequence_edge(previous, next, EdgeKind::Regular { new_unit });
            }
        }

        for slot in &mut self.edges {
            if slot
                .as_ref()
                .is_some_and(|edge| doomed.contains(&edge.source) || doomed.contains(&edge.target))
            {
                *slot = None;
            }
        }
        for &id in &doomed {
            self.nodes[id.0] = None;
            self.owners[id.0] = None;
        }

        let polymer = self.hyper_node_mut(hyper)?;
        polymer.members.retain(|member| !doomed.contains(member));
        if polymer.members.is_empty() {
            log::debug!("removed the last monomer of {hyper}, so it goes too");
            self.hyper_nodes[hyper.0] = None;
        } else {
            self.clear_inner_notation(hyper);
        }
        Ok(())
    }

    /// Adds a pairing or general connection between two monomers
    ///
    /// # Errors
    ///
    /// Fails if either monomer is missing, if an attachment isn't valid notation, or if `kind` disagrees with the
    /// attachments (base pairs use `pair` on both ends, and nothing else may use it).
    pub fn connect(
        &mut self,
        source: NodeId,
        source_attachment: &str,
        target: NodeId,
        target_attachment: &str,
        kind: ConnectionKind,
    ) -> Result<EdgeId, GraphError> {
        for node in [source, target] {
            self.node(node).ok_or(GraphError::MissingNode(node))?;
        }
        let source_attachment = valid_attachment(Attribute::SourceAttachment, source_attachment)?;
        let target_attachment = valid_attachment(Attribute::TargetAttachment, target_attachment)?;
        check_pairing(kind, &source_attachment, &target_attachment)?;
        Ok(self.add_edge(source, target, kind.into(), source_attachment, target_attachment))
    }

    /// Removes a pairing or general connection
    pub fn disconnect(&mut self, edge: EdgeId) -> Result<(), GraphError> {
        let kind = self.edge(edge).ok_or(GraphError::MissingEdge(edge))?.kind();
        if kind.is_sequence() {
            return Err(GraphError::BackboneEdge(edge));
        }
        self.edges[edge.0] = None;
        Ok(())
    }

    /// Sets or clears the annotation of a polymer
    pub fn set_annotation(
        &mut self,
        hyper: HyperNodeId,
        text: Option<&str>,
    ) -> Result<(), GraphError> {
        self.hyper_node_mut(hyper)?.annotation = text.map(str::to_owned);
        Ok(())
    }

    pub(crate) fn branch_of(&self, node: NodeId) -> Option<NodeId> {
        self.edges()
            .find(|(_, edge)| edge.source == node && edge.kind == EdgeKind::Branch)
            .map(|(_, edge)| edge.target)
    }

    // The backbone monomer before `node`, and whether `node` starts a new unit
    fn previous_backbone(&self, node: NodeId) -> Option<(NodeId, bool)> {
        self.edges().find_map(|(_, edge)| match edge.kind {
            EdgeKind::Regular { new_unit } if edge.target == node => Some((edge.source, new_unit)),
            _ => None,
        })
    }

    fn next_backbone(&self, node: NodeId) -> Option<(NodeId, bool)> {
        self.edges().find_map(|(_, edge)| match edge.kind {
            EdgeKind::Regular { new_unit } if edge.source == node => Some((edge.target, new_unit)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Index, PolymerType, Position, build, parse, serialize};

    fn load(notation: &str) -> Hypergraph {
        build(&parse(notation).unwrap()).unwrap()
    }

    fn name(polymer_type: PolymerType, index: u32) -> PolymerName {
        PolymerName::new(polymer_type, Index::new(index).unwrap())
    }

    fn monomer(polymer_type: PolymerType, code: &str) -> MonomerReference {
        MonomerReference::backbone(polymer_type, MonomerId::Symbol(code.to_owned()))
    }

    fn base(code: &str) -> MonomerReference {
        MonomerReference::branch(PolymerType::Rna, MonomerId::Symbol(code.to_owned()))
    }

    fn at(graph: &Hypergraph, hyper: HyperNodeId, position: u32) -> NodeId {
        graph
            .node_at(hyper, Position::new(position).unwrap())
            .unwrap()
    }

    #[test]
    fn push_monomers() {
        let mut graph = load("RNA1{R(A)P.R(C)}$$$$");
        let hyper = graph.find_hyper_node(name(PolymerType::Rna, 1)).unwrap();

        graph
            .push_monomer(hyper, monomer(PolymerType::Rna, "P"), false)
            .unwrap();
        assert_eq!(graph.hyper_node(hyper).unwrap().inner_notation(), None);
        assert_eq!(serialize(&graph), "RNA1{R(A)P.R(C)P}$$$$");

        graph
            .push_monomer(hyper, monomer(PolymerType::Rna, "R"), true)
            .unwrap();
        let guanine = graph.push_monomer(hyper, base("G"), false).unwrap();
        assert_eq!(serialize(&graph), "RNA1{R(A)P.R(C)P.R(G)}$$$$");
        assert_eq!(graph.position(guanine).map(Position::get), Some(8));
    }

    #[test]
    fn build_a_polymer_from_scratch() {
        let mut graph = Hypergraph::new();
        let hyper = graph
            .add_polymer(
                name(PolymerType::Peptide, 4),
                MonomerId::Symbol("G".to_owned()),
            )
            .unwrap();
        // Units of a PEPTIDE only ever hold one monomer
        graph
            .push_monomer(hyper, monomer(PolymerType::Peptide, "A"), false)
            .unwrap();
        graph
            .push_monomer(hyper, monomer(PolymerType::Peptide, "C"), true)
            .unwrap();
        assert_eq!(serialize(&graph), "PEPTIDE1{G.A.C}$$$$");
    }

    #[test]
    fn polymer_names_stay_unique() {
        let mut graph = load("RNA1{R(A)}$$$$");
        let rna = graph.find_hyper_node(name(PolymerType::Rna, 1)).unwrap();
        assert_eq!(
            graph.add_polymer(name(PolymerType::Rna, 1), MonomerId::Symbol("R".to_owned())),
            Err(GraphError::DuplicatePolymer(name(PolymerType::Rna, 1)))
        );
        assert_eq!(graph.hyper_node_count(), 1);
        assert_eq!(graph.node_count(), 2);

        let second = graph
            .add_polymer(name(PolymerType::Rna, 2), MonomerId::Symbol("R".to_owned()))
            .unwrap();
        assert_ne!(second, rna);
        assert_eq!(graph.find_hyper_node(name(PolymerType::Rna, 2)), Some(second));
        assert_eq!(serialize(&graph), "RNA1{R(A)}|RNA2{R}$$$$");
    }

    #[test]
    fn rejected_pushes() {
        let mut graph = load("RNA1{R(A)}|PEPTIDE1{G}$$$$");
        let rna = graph.find_hyper_node(name(PolymerType::Rna, 1)).unwrap();
        let peptide = graph.find_hyper_node(name(PolymerType::Peptide, 1)).unwrap();

        assert!(matches!(
            graph.push_monomer(rna, monomer(PolymerType::Peptide, "G"), true),
            Err(GraphError::PolymerTypeMismatch { .. })
        ));
        assert_eq!(
            graph.push_monomer(rna, base("U"), false),
            Err(GraphError::BranchOccupied(at(&graph, rna, 1)))
        );
        let peptide_base = MonomerReference::branch(
            PolymerType::Peptide,
            MonomerId::Symbol("K".to_owned()),
        );
        assert!(matches!(
            graph.push_monomer(peptide, peptide_base, false),
            Err(GraphError::BranchOccupied(_))
        ));
        assert_eq!(serialize(&graph), "RNA1{R(A)}|PEPTIDE1{G}$$$$");
    }

    #[test]
    fn remove_monomers_and_renumber() {
        let mut graph = load("RNA1{R(A)P.R(C)P.R(G)}$RNA1,RNA1,7:R2-1:R1$$$");
        let hyper = graph.find_hyper_node(name(PolymerType::Rna, 1)).unwrap();

        graph.remove_monomer(at(&graph, hyper, 3)).unwrap();
        assert_eq!(
            serialize(&graph),
            "RNA1{R(A).R(C)P.R(G)}$RNA1,RNA1,6:R2-1:R1$$$"
        );

        // Removing a backbone monomer takes its base and any connections with it
        graph.remove_monomer(at(&graph, hyper, 1)).unwrap();
        assert_eq!(serialize(&graph), "RNA1{R(C)P.R(G)}$$$$");

        // Removing a base leaves the backbone alone
        graph.remove_monomer(at(&graph, hyper, 2)).unwrap();
        assert_eq!(serialize(&graph), "RNA1{RP.R(G)}$$$$");

        let stale = at(&graph, hyper, 1);
        graph.remove_monomer(stale).unwrap();
        assert_eq!(
            graph.remove_monomer(stale),
            Err(GraphError::MissingNode(stale))
        );
    }

    #[test]
    fn emptied_polymers_are_removed() {
        let mut graph = load("RNA1{R(A)}|PEPTIDE1{G}$$$$");
        let rna = graph.find_hyper_node(name(PolymerType::Rna, 1)).unwrap();
        let peptide = graph.find_hyper_node(name(PolymerType::Peptide, 1)).unwrap();

        graph.remove_monomer(at(&graph, peptide, 1)).unwrap();
        assert_eq!(graph.hyper_node(peptide), None);
        assert_eq!(serialize(&graph), "RNA1{R(A)}$$$$");

        graph.remove_monomer(at(&graph, rna, 1)).unwrap();
        assert!(graph.is_empty());
        assert_eq!(serialize(&graph), "");
    }

    #[test]
    fn connect_and_disconnect() {
        let mut graph = load("RNA1{R(A)}|RNA2{R(U)}$$$$");
        let first = graph.find_hyper_node(name(PolymerType::Rna, 1)).unwrap();
        let second = graph.find_hyper_node(name(PolymerType::Rna, 2)).unwrap();
        let adenine = at(&graph, first, 2);
        let uracil = at(&graph, second, 2);

        let pair = graph
            .connect(adenine, "pair", uracil, "pair", ConnectionKind::Pairing)
            .unwrap();
        assert_eq!(serialize(&graph), "RNA1{R(A)}|RNA2{R(U)}$$RNA1,RNA2,2:pair-2:pair$$");
        // Explicit connections don't touch the cached sequences
        assert!(graph.hyper_node(first).unwrap().inner_notation().is_some());

        assert!(matches!(
            graph.connect(adenine, "pair", uracil, "R1", ConnectionKind::General),
            Err(GraphError::MismatchedPairing { .. })
        ));
        assert!(matches!(
            graph.connect(adenine, "R 1", uracil, "R1", ConnectionKind::General),
            Err(GraphError::InvalidAttribute {
                attribute: Attribute::SourceAttachment,
                ..
            })
        ));

        graph.disconnect(pair).unwrap();
        assert_eq!(serialize(&graph), "RNA1{R(A)}|RNA2{R(U)}$$$$");
        assert_eq!(graph.disconnect(pair), Err(GraphError::MissingEdge(pair)));

        let (backbone, _) = graph.edges().next().unwrap();
        assert_eq!(
            graph.disconnect(backbone),
            Err(GraphError::BackboneEdge(backbone))
        );
    }

    #[test]
    fn annotate() {
        let mut graph = load("RNA1{R(A)}|RNA2{R(U)}$$$$");
        let second = graph.find_hyper_node(name(PolymerType::Rna, 2)).unwrap();
        graph.set_annotation(second, Some("as")).unwrap();
        assert_eq!(serialize(&graph), "RNA1{R(A)}|RNA2{R(U)}$$$RNA2{as}$");
        graph.set_annotation(second, None).unwrap();
        assert_eq!(serialize(&graph), "RNA1{R(A)}|RNA2{R(U)}$$$$");
    }
}
