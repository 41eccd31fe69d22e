pub(crate) mod cache_key;
pub(crate) mod document;
pub mod errors;
pub mod primitives;
pub(crate) mod sequence;

use nom_miette::final_parser;

use crate::{MonomerId, ParsedDocument, PolymerType};

use self::errors::ParseError;

/// Parses a complete HELM document
///
/// Parsing is all-or-nothing: any malformed section, bracket, polymer name, or connection tuple fails the whole parse
/// with a [`ParseError`] pointing at the offending input.
pub fn parse(text: &str) -> Result<ParsedDocument, ParseError> {
    final_parser(document::document)(text)
}

/// Parses a single monomer, like `R` or `[dR]`, as it would be written inside a polymer of `polymer_type`
pub fn parse_monomer(polymer_type: PolymerType, text: &str) -> Result<MonomerId, ParseError> {
    final_parser(sequence::monomer(polymer_type))(text)
}

pub fn parse_polymer_type(text: &str) -> Result<PolymerType, ParseError> {
    final_parser(primitives::polymer_type)(text)
}

pub fn parse_attachment(text: &str) -> Result<String, ParseError> {
    final_parser(primitives::attachment)(text).map(str::to_owned)
}
