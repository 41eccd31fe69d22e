use ahash::{HashMap, HashMapExt};
use itertools::Itertools;

use crate::{
    Annotation, Connection, ConnectionKind, EdgeKind, Endpoint, HyperNodeId, Hypergraph, Index,
    NodeId, PolymerName, PolymerType,
};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum NotationPart {
    /// Every polymer and its sequence, like `RNA1{R(A)P}`
    Polymers,
    /// Connections other than base pairs
    Connections,
    /// Base-pairing connections
    Pairs,
    Annotations,
}

impl NotationPart {
    /// The order parts are written in, each terminated by a `$`
    pub const ORDER: [Self; 4] = [
        Self::Polymers,
        Self::Connections,
        Self::Pairs,
        Self::Annotations,
    ];
}

/// Writes the canonical HELM notation of `graph`
///
/// Polymers are renamed by type in the order their hyper-nodes were created (`RNA1`, `RNA2`, `PEPTIDE1`, ...), and
/// connections are written in the order their edges were created. An empty graph is written as an empty string.
#[must_use]
pub fn serialize(graph: &Hypergraph) -> String {
    if graph.is_empty() {
        return String::new();
    }
    let names = canonical_names(graph);
    let mut notation = String::new();
    for part in NotationPart::ORDER {
        let rendered = render_part(graph, &names, part);
        log::trace!("rendered {part:?} as {rendered:?}");
        notation.push_str(&rendered);
        notation.push('$');
    }
    notation
}

/// Writes the sequence of one polymer by walking its backbone, like `R(A)P.R(C)`
///
/// Returns `None` if `hyper` doesn't exist or has no monomers.
#[must_use]
pub fn polymer_notation(graph: &Hypergraph, hyper: HyperNodeId) -> Option<String> {
    let polymer = graph.hyper_node(hyper)?;
    let mut branches = HashMap::new();
    let mut successors = HashMap::new();
    for (_, edge) in graph.edges() {
        match edge.kind() {
            EdgeKind::Branch => {
                branches.insert(edge.source(), edge.target());
            }
            EdgeKind::Regular { new_unit } => {
                successors.insert(edge.source(), (edge.target(), new_unit));
            }
            EdgeKind::Pairing | EdgeKind::General => (),
        }
    }

    let mut notation = String::new();
    let mut current = polymer.members().first().copied();
    // NOTE: Each member is written at most once, even if the backbone has been bent into a loop
    for _ in polymer.members() {
        let Some(node) = current else { break };
        write_monomer(&mut notation, graph, node);
        if let Some(&branch) = branches.get(&node) {
            notation.push('(');
            write_monomer(&mut notation, graph, branch);
            notation.push(')');
        }
        current = successors.get(&node).map(|&(next, new_unit)| {
            if new_unit {
                notation.push('.');
            }
            next
        });
    }
    (!notation.is_empty()).then_some(notation)
}

fn write_monomer(notation: &mut String, graph: &Hypergraph, node: NodeId) {
    if let Some(node) = graph.node(node) {
        notation.push_str(&node.monomer().id().to_string());
    }
}

fn canonical_names(graph: &Hypergraph) -> HashMap<HyperNodeId, PolymerName> {
    let mut counters: HashMap<PolymerType, u32> = HashMap::new();
    graph
        .hyper_nodes()
        .map(|(id, hyper)| {
            let polymer_type = hyper.polymer_type();
            let count = counters.entry(polymer_type).or_default();
            let name = PolymerName::new(polymer_type, Index::MIN.saturating_add(*count));
            *count += 1;
            (id, name)
        })
        .collect()
}

fn render_part(graph: &Hypergraph, names: &HashMap<HyperNodeId, PolymerName>, part: NotationPart) -> String {
    match part {
        NotationPart::Polymers => graph
            .hyper_nodes()
            .map(|(id, hyper)| {
                let sequence = hyper
                    .inner_notation()
                    .map(str::to_owned)
                    .or_else(|| polymer_notation(graph, id))
                    .unwrap_or_default();
                format!("{}{{{sequence}}}", names[&id])
            })
            .join("|"),
        NotationPart::Connections => render_connections(graph, names, ConnectionKind::General),
        NotationPart::Pairs => render_connections(graph, names, ConnectionKind::Pairing),
        NotationPart::Annotations => graph
            .hyper_nodes()
            .filter_map(|(id, hyper)| {
                let text = hyper.annotation()?;
                Some(Annotation::new(names[&id], text).to_string())
            })
            .join("|"),
    }
}

fn render_connections(
    graph: &Hypergraph,
    names: &HashMap<HyperNodeId, PolymerName>,
    kind: ConnectionKind,
) -> String {
    let endpoint = |node: NodeId, attachment: &str| {
        let name = names.get(&graph.owner(node)?)?;
        Some(Endpoint::new(*name, graph.position(node)?, attachment))
    };
    graph
        .edges()
        .filter(|(_, edge)| edge.kind().connection_kind() == Some(kind))
        .filter_map(|(id, edge)| {
            let source = endpoint(edge.source(), edge.source_attachment());
            let target = endpoint(edge.target(), edge.target_attachment());
            if let (Some(source), Some(target)) = (source, target) {
                Some(Connection::new(source, target, kind).to_string())
            } else {
                log::error!("the connection {id} has an end outside of every polymer");
                None
            }
        })
        .join("|")
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_snapshot;

    use super::*;
    use crate::{build, canonicalize, parse};

    fn load(notation: &str) -> Hypergraph {
        build(&parse(notation).unwrap()).unwrap()
    }

    #[test]
    fn round_trips() {
        let notations = indoc! {"
            RNA1{R(C)P.[dR](U)[sP]}$RNA1,RNA1,6:R2-1:R1$$$
            RNA1{R(A)P.R(C)P.R(G)}|RNA2{R(C)P.R(G)P.R(U)}$$RNA1,RNA2,2:pair-8:pair|RNA1,RNA2,5:pair-5:pair$$
            PEPTIDE1{G.C.A'2'}|CHEM1{SMCC}$PEPTIDE1,CHEM1,2:R3-1:R1$$CHEM1{linker}$
            CHEM1{[[*]OCCO[*] |$_R1;;;_R2$|]}$$$$
        "};
        for notation in notations.lines() {
            let canonical = serialize(&load(notation));
            assert_eq!(canonical, notation);
            // Serializing is idempotent
            assert_eq!(serialize(&load(&canonical)), canonical);
        }
    }

    #[test]
    fn polymers_are_renamed_in_order() {
        let canonical = canonicalize(
            "RNA3{R(A)}|PEPTIDE7{G.K}|RNA1{R(U)}$RNA3,PEPTIDE7,1:R1-2:R3$RNA3,RNA1,2:pair-2:pair$PEPTIDE7{tag}$",
        )
        .unwrap();
        assert_snapshot!(
            canonical,
            @"RNA1{R(A)}|PEPTIDE1{G.K}|RNA2{R(U)}$RNA1,PEPTIDE1,1:R1-2:R3$RNA1,RNA2,2:pair-2:pair$PEPTIDE1{tag}$"
        );
    }

    #[test]
    fn connections_are_sorted_into_their_sections() {
        // Base pairs written among the general connections move into their own section
        let canonical = canonicalize(
            "RNA1{R(A)P.R(C)}|RNA2{R(G)P.R(U)}$RNA1,RNA2,2:pair-5:pair|RNA1,RNA2,3:R2-1:R1$$$",
        )
        .unwrap();
        assert_snapshot!(
            canonical,
            @"RNA1{R(A)P.R(C)}|RNA2{R(G)P.R(U)}$RNA1,RNA2,3:R2-1:R1$RNA1,RNA2,2:pair-5:pair$$"
        );
    }

    #[test]
    fn sequences_are_rebuilt_when_missing() {
        let graph = load("RNA1{R(A)P.R(C)P.[dR](U)}|PEPTIDE1{G.A'3'}$$$$");
        let mut hypers = graph.hyper_nodes().map(|(id, _)| id);
        let rna = hypers.next().unwrap();
        let peptide = hypers.next().unwrap();
        assert_eq!(
            polymer_notation(&graph, rna).as_deref(),
            Some("R(A)P.R(C)P.[dR](U)")
        );
        // Repeats are written out in full
        assert_eq!(polymer_notation(&graph, peptide).as_deref(), Some("G.A.A.A"));
    }

    #[test]
    fn empty_graphs() {
        assert_eq!(serialize(&load("$$$$")), "");
        assert_eq!(serialize(&Hypergraph::new()), "");
        assert_eq!(canonicalize("").unwrap(), "");
    }

    #[test]
    fn part_order() {
        assert_eq!(NotationPart::ORDER[0], NotationPart::Polymers);
        assert_eq!(NotationPart::ORDER[3], NotationPart::Annotations);
    }
}
