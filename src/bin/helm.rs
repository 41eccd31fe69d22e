use std::{env, fmt::Write};

use ahash::{HashMap, HashMapExt};
use helm_notation::{ConnectionKind, HelmConfig, Hypergraph, NotationService, PolymerType, Result, serialize};
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};
use rustyline::DefaultEditor;

#[derive(Debug)]
struct Summary {
    canonical: String,
    polymers: Vec<String>,
    connections: usize,
    pairs: usize,
}

impl Summary {
    fn new(graph: &Hypergraph) -> Self {
        let mut counters: HashMap<PolymerType, u32> = HashMap::new();
        let polymers = graph
            .hyper_nodes()
            .map(|(_, hyper)| {
                let polymer_type = hyper.polymer_type();
                let index = counters.entry(polymer_type).or_default();
                *index += 1;
                format!(
                    "{polymer_type}{index} ({polymer_type}, {} monomers)",
                    hyper.members().len()
                )
            })
            .collect();
        let count = |kind| {
            graph
                .edges()
                .filter(|(_, edge)| edge.kind().connection_kind() == Some(kind))
                .count()
        };
        Self {
            canonical: serialize(graph),
            polymers,
            connections: count(ConnectionKind::General),
            pairs: count(ConnectionKind::Pairing),
        }
    }
}

fn main() {
    env_logger::init();
    let config = match env::args_os().nth(1) {
        Some(path) => match HelmConfig::load(path) {
            Ok(config) => config,
            Err(error) => return render_error(&error),
        },
        None => HelmConfig::default(),
    };
    let service = NotationService::new(config);

    let mut rl = DefaultEditor::new().unwrap();
    while let Ok(notation) = rl.readline("HELM: ") {
        rl.add_history_entry(&notation).unwrap();
        match notation_info(&service, &notation) {
            Ok(info) => print!("{info}"),
            Err(error) => render_error(&error),
        }
    }
}

fn notation_info(service: &NotationService<Summary>, notation: &str) -> Result<String> {
    let mut buf = String::new();
    let summary = service.view(notation, Summary::new)?;

    writeln!(buf, "Canonical: {}", summary.canonical).unwrap();
    for polymer in &summary.polymers {
        writeln!(buf, "  {polymer}").unwrap();
    }
    writeln!(buf, "Connections: {}", summary.connections).unwrap();
    writeln!(buf, "Base Pairs: {}", summary.pairs).unwrap();
    let usage = service.cache().usage(notation).unwrap_or_default();
    writeln!(buf, "Cache Hits: {usage}").unwrap();
    writeln!(buf).unwrap();

    Ok(buf)
}

fn render_error(diagnostic: &dyn Diagnostic) {
    let mut buf = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode())
        .render_report(&mut buf, diagnostic)
        .unwrap();
    println!("{buf}");
}
