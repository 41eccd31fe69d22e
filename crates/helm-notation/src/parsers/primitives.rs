use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alphanumeric1, char, u32},
    combinator::{cut, map, map_opt, not, value},
    sequence::{pair, preceded, separated_pair},
};
use nom_miette::{expect, wrap_err};

use crate::{Index, PolymerName, PolymerType, Position};

use super::errors::{HelmErrorKind, ParseResult};

/// Number = digit - "0" , { digit } ;
pub fn number(i: &str) -> ParseResult<Index> {
    let not_zero = expect(cut(not(char('0'))), HelmErrorKind::ExpectedNoLeadingZero);
    let digits = expect(u32, HelmErrorKind::ExpectedDigit);
    map_opt(preceded(not_zero, digits), Index::new)(i)
}

/// Polymer Type = "RNA" | "PEPTIDE" | "CHEM" ;
pub fn polymer_type(i: &str) -> ParseResult<PolymerType> {
    let parser = alt((
        value(PolymerType::Rna, tag("RNA")),
        value(PolymerType::Peptide, tag("PEPTIDE")),
        value(PolymerType::Chem, tag("CHEM")),
    ));
    expect(parser, HelmErrorKind::UnknownPolymerType)(i)
}

/// Polymer Name = Polymer Type , Number ;
pub fn polymer_name(i: &str) -> ParseResult<PolymerName> {
    let index = wrap_err(number, HelmErrorKind::ExpectedPolymerIndex);
    map(pair(polymer_type, index), |(polymer_type, index)| {
        PolymerName::new(polymer_type, index)
    })(i)
}

/// Attachment = { letter | digit }- ;
pub fn attachment(i: &str) -> ParseResult<&str> {
    expect(alphanumeric1, HelmErrorKind::ExpectedAttachment)(i)
}

/// Endpoint = Number , ":" , Attachment ;
pub fn endpoint(i: &str) -> ParseResult<(Position, &str)> {
    let position = wrap_err(number, HelmErrorKind::ExpectedPosition);
    separated_pair(position, separator(':'), attachment)(i)
}

pub fn separator<'a>(c: char) -> impl FnMut(&'a str) -> ParseResult<'a, char> {
    expect(char(c), HelmErrorKind::ExpectedSeparator(c))
}
