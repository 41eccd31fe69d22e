use std::{fs, path::PathBuf};

use clap::Parser;
use helm_notation::{HelmConfig, NotationService, serialize};
use miette::{IntoDiagnostic, Result};

/// Rewrites one column of a delimited file as canonical HELM notation
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// A delimited text file with one notation per line
    input: PathBuf,
    /// Where to write the converted lines (defaults to standard output)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// A TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// The character separating columns
    #[arg(short, long, default_value_t = '\t')]
    delimiter: char,
    /// The (zero-based) column holding the notation
    #[arg(long, default_value_t = 0)]
    column: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => HelmConfig::load(path)?,
        None => HelmConfig::default(),
    };
    let service = NotationService::new(config);

    let input = fs::read_to_string(&args.input).into_diagnostic()?;
    let converted: Vec<_> = input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let Some(notation) = line.split(args.delimiter).nth(args.column) else {
                log::warn!("no column {} in {line:?}", args.column);
                return format!("{line}{}no column {}", args.delimiter, args.column);
            };
            let canonical = service
                .view(notation.trim(), serialize)
                .map_or_else(|error| error.to_string(), |canonical| canonical.to_string());
            format!("{line}{}{canonical}", args.delimiter)
        })
        .collect();

    let output = converted.join("\n") + "\n";
    match &args.output {
        Some(path) => fs::write(path, output).into_diagnostic()?,
        None => print!("{output}"),
    }

    Ok(())
}
