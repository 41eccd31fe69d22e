use ahash::{HashMap, HashMapExt};

use crate::{
    Connection, EdgeKind, Endpoint, GraphError, HyperNodeId, Hypergraph, MonomerReference, NodeId,
    ParsedDocument, PolymerBlock, PolymerName,
};

/// The most monomers, counting every copy of a repeated unit, that a single document may expand to
pub const MAXIMUM_MONOMERS: usize = 100_000;

/// Builds the hypergraph described by a parsed document
///
/// Every polymer becomes a hyper-node whose members are its monomers in position order (repeated units are expanded),
/// linked by regular and branch edges. Connections become pairing or general edges between the monomers they name,
/// and annotations are attached to the hyper-node of their polymer.
///
/// # Errors
///
/// Fails with [`GraphError::DanglingConnection`] if a connection names a missing polymer or a position past the end
/// of one, and with [`GraphError::DanglingAnnotation`] if an annotation names a missing polymer. Documents that would
/// expand to more than [`MAXIMUM_MONOMERS`] monomers fail with [`GraphError::TooManyMonomers`] before anything is
/// built.
pub fn build(document: &ParsedDocument) -> Result<Hypergraph, GraphError> {
    let count = document
        .polymers()
        .iter()
        .map(|block| block.sequence().monomer_count())
        .fold(0, usize::saturating_add);
    if count > MAXIMUM_MONOMERS {
        return Err(GraphError::TooManyMonomers {
            count,
            maximum: MAXIMUM_MONOMERS,
        });
    }

    let mut graph = Hypergraph::new();
    let mut polymers = HashMap::with_capacity(document.polymers().len());

    for block in document.polymers() {
        let hyper = add_polymer(&mut graph, block);
        polymers.insert(block.name(), hyper);
    }

    for connection in document.connections() {
        let source = resolve(&graph, &polymers, connection, connection.source())?;
        let target = resolve(&graph, &polymers, connection, connection.target())?;
        graph.add_edge(
            source,
            target,
            connection.kind().into(),
            connection.source().attachment(),
            connection.target().attachment(),
        );
    }

    for annotation in document.annotations() {
        let hyper = polymers.get(&annotation.polymer()).copied().ok_or_else(|| {
            GraphError::DanglingAnnotation {
                annotation: annotation.to_string(),
                polymer: annotation.polymer(),
            }
        })?;
        graph.hyper_node_mut(hyper)?.annotation = Some(annotation.text().to_owned());
    }

    graph.assign_membership()?;
    log::debug!(
        "built a hypergraph of {} polymers, {} monomers, and {} edges",
        graph.hyper_node_count(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

fn add_polymer(graph: &mut Hypergraph, block: &PolymerBlock) -> HyperNodeId {
    let polymer_type = block.name().polymer_type();
    let hyper = graph.add_hyper_node(block.name(), Some(block.sequence().to_string()));

    let mut previous: Option<NodeId> = None;
    for unit in block.sequence().units() {
        for _ in 0..unit.copies() {
            for (i, element) in unit.elements().iter().enumerate() {
                let monomer = MonomerReference::backbone(polymer_type, element.monomer().clone());
                let node = graph.add_node(hyper, monomer);
                if let Some(previous) = previous {
                    graph.add_sequence_edge(previous, node, EdgeKind::Regular { new_unit: i == 0 });
                }
                previous = Some(node);

                if let Some(branch) = element.branch() {
                    let monomer = MonomerReference::branch(polymer_type, branch.clone());
                    let branch = graph.add_node(hyper, monomer);
                    graph.add_sequence_edge(node, branch, EdgeKind::Branch);
                }
            }
        }
    }
    hyper
}

fn resolve(
    graph: &Hypergraph,
    polymers: &HashMap<PolymerName, HyperNodeId>,
    connection: &Connection,
    endpoint: &Endpoint,
) -> Result<NodeId, GraphError> {
    polymers
        .get(&endpoint.polymer())
        .and_then(|&hyper| graph.node_at(hyper, endpoint.position()))
        .ok_or_else(|| GraphError::DanglingConnection {
            connection: connection.to_string(),
            polymer: endpoint.polymer(),
            position: endpoint.position(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeKind, MonomerId, PolymerType, parse};

    fn load(notation: &str) -> Result<Hypergraph, GraphError> {
        build(&parse(notation).unwrap())
    }

    #[test]
    fn cyclic_connections_stay_within_one_polymer() {
        let graph = load("RNA1{R(C)P.[dR](U)[sP]}$RNA1,RNA1,6:R2-1:R1$$$").unwrap();
        assert_eq!(graph.hyper_node_count(), 1);
        assert_eq!(graph.node_count(), 6);

        let (_, general) = graph
            .edges()
            .find(|(_, edge)| edge.kind() == EdgeKind::General)
            .unwrap();
        assert_eq!(graph.owner(general.source()), graph.owner(general.target()));
        assert_eq!(general.source_attachment(), "R2");
        assert_eq!(graph.position(general.source()).map(|p| p.get()), Some(6));
        assert_eq!(graph.position(general.target()).map(|p| p.get()), Some(1));

        let sp = graph.node(general.source()).unwrap().monomer();
        assert_eq!(sp.id(), &MonomerId::Bracketed("sP".to_owned()));
        assert!(!sp.is_branch());
    }

    #[test]
    fn repeats_are_bounded() {
        assert_eq!(
            load("PEPTIDE1{A'4000000000'}$$$$"),
            Err(GraphError::TooManyMonomers {
                count: 4_000_000_000,
                maximum: MAXIMUM_MONOMERS,
            })
        );
        // The limit covers the whole document, not each polymer
        assert!(matches!(
            load("PEPTIDE1{A'60000'}|PEPTIDE2{G'60000'}$$$$"),
            Err(GraphError::TooManyMonomers { count: 120_000, .. })
        ));
        let longest = load("PEPTIDE1{A'99999'.G}$$$$").unwrap();
        assert_eq!(longest.node_count(), MAXIMUM_MONOMERS);
    }

    #[test]
    fn sequence_edges() {
        let graph = load("RNA1{R(A)P.R(C)}$$$$").unwrap();
        let kinds: Vec<_> = graph.edges().map(|(_, edge)| edge.kind()).collect();
        assert_eq!(
            kinds,
            [
                EdgeKind::Branch,
                EdgeKind::Regular { new_unit: false },
                EdgeKind::Regular { new_unit: true },
                EdgeKind::Branch,
            ]
        );
        let (_, hyper) = graph.hyper_nodes().next().unwrap();
        assert_eq!(hyper.inner_notation(), Some("R(A)P.R(C)"));
        assert_eq!(hyper.members().len(), 5);
        assert_eq!(hyper.polymer_type(), PolymerType::Rna);
    }

    #[test]
    fn repeats_are_expanded() {
        let graph = load("PEPTIDE1{G.A'3'.C}$PEPTIDE1,PEPTIDE1,5:R3-1:R1$$$").unwrap();
        assert_eq!(graph.node_count(), 5);
        let (hyper, polymer) = graph.hyper_nodes().next().unwrap();
        assert_eq!(polymer.inner_notation(), Some("G.A'3'.C"));
        let last = graph.node_at(hyper, crate::Position::new(5).unwrap()).unwrap();
        assert_eq!(graph.node(last).unwrap().monomer().id().code(), "C");
    }

    #[test]
    fn dangling_connections() {
        assert!(matches!(
            load("RNA1{R(A)}$RNA1,RNA1,5:R1-1:R1$$$"),
            Err(GraphError::DanglingConnection { position, .. }) if position.get() == 5
        ));
        assert!(matches!(
            load("RNA1{R(A)}$RNA1,RNA2,1:R3-1:R1$$$"),
            Err(GraphError::DanglingConnection { .. })
        ));
        assert!(matches!(
            load("RNA1{R(A)}$$RNA1,RNA1,1:pair-3:pair$$"),
            Err(GraphError::DanglingConnection { .. })
        ));
    }

    #[test]
    fn annotations() {
        let graph = load("RNA1{R(A)}|RNA2{R(U)}$$RNA1,RNA2,2:pair-2:pair$RNA2{as}$").unwrap();
        let annotations: Vec<_> = graph
            .hyper_nodes()
            .map(|(_, hyper)| hyper.annotation())
            .collect();
        assert_eq!(annotations, [None, Some("as")]);

        assert_eq!(
            load("RNA1{R(A)}$$$CHEM1{linker}$"),
            Err(GraphError::DanglingAnnotation {
                annotation: "CHEM1{linker}".to_owned(),
                polymer: PolymerName::new(PolymerType::Chem, crate::Index::MIN),
            })
        );
    }

    #[test]
    fn empty_documents() {
        let graph = load("$$$$").unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.node_count(), 0);
    }
}
