use nom::{
    Err,
    branch::alt,
    bytes::complete::{is_not, take_while1},
    character::complete::{char, satisfy},
    combinator::{cond, cut, map, opt, recognize},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
};
use nom_miette::{LabeledParseError, expect};

use crate::{Count, Element, MonomerId, PolymerBlock, PolymerType, Sequence, Unit};

use super::{
    errors::{HelmErrorKind, ParseResult},
    primitives::{number, polymer_name},
};

/// Polymer = Polymer Name , "{" , Sequence , "}" ;
pub fn polymer(i: &str) -> ParseResult<PolymerBlock> {
    let (rest, name) = polymer_name(i)?;
    let open = expect(char('{'), HelmErrorKind::ExpectedSequenceStart);
    let close = expect(char('}'), HelmErrorKind::ExpectedSequenceEnd);
    let (rest, sequence) = cut(delimited(open, sequence(name.polymer_type()), close))(rest)?;
    Ok((rest, PolymerBlock::new(name, sequence)))
}

/// Sequence = Unit , { "." , Unit } ;
pub fn sequence<'a>(polymer_type: PolymerType) -> impl FnMut(&'a str) -> ParseResult<'a, Sequence> {
    map(
        separated_list1(char('.'), cut(unit(polymer_type))),
        Sequence::new,
    )
}

/// Unit = Element , { Element } (* RNA only *) , [ Repeat ] ;
fn unit<'a>(polymer_type: PolymerType) -> impl FnMut(&'a str) -> ParseResult<'a, Unit> {
    let mut first = element(polymer_type);
    let mut others = cond(polymer_type.has_branches(), many0(element(polymer_type)));
    move |i: &'a str| {
        let (rest, head) = first(i)?;
        let (rest, tail) = others(rest)?;
        let (rest, repeat) = opt(repeat)(rest)?;
        let elements = std::iter::once(head).chain(tail.into_iter().flatten()).collect();
        Ok((rest, Unit::new(elements, repeat)))
    }
}

/// Repeat = "'" , Number , "'" ;
fn repeat(i: &str) -> ParseResult<Count> {
    let close = expect(char('\''), HelmErrorKind::ExpectedRepeatEnd);
    preceded(char('\''), cut(terminated(number, close)))(i)
}

/// Element = Monomer , [ "(" , Monomer , ")" ] (* RNA only *) ;
fn element<'a>(polymer_type: PolymerType) -> impl FnMut(&'a str) -> ParseResult<'a, Element> {
    let close = expect(char(')'), HelmErrorKind::ExpectedBranchEnd);
    let branch = preceded(char('('), cut(terminated(monomer(polymer_type), close)));
    let parser = pair(
        monomer(polymer_type),
        cond(polymer_type.has_branches(), opt(branch)),
    );
    map(parser, |(monomer, branch)| Element::new(monomer, branch.flatten()))
}

/// Monomer = Bracketed Monomer | Symbol ;
pub fn monomer<'a>(polymer_type: PolymerType) -> impl FnMut(&'a str) -> ParseResult<'a, MonomerId> {
    let symbol = map(symbol(polymer_type), |code: &str| {
        MonomerId::Symbol(code.to_owned())
    });
    let mut symbol = expect(symbol, HelmErrorKind::ExpectedMonomer);
    move |i: &'a str| {
        if i.starts_with('[') {
            bracketed_monomer(i)
        } else {
            symbol(i)
        }
    }
}

/// Symbol = letter (* RNA and PEPTIDE *) | { letter | digit | "_" }- (* CHEM *) ;
fn symbol<'a>(polymer_type: PolymerType) -> impl FnMut(&'a str) -> ParseResult<'a, &'a str> {
    let mut letter = recognize(satisfy(|c| c.is_ascii_alphabetic()));
    let mut word = take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_');
    move |i: &'a str| match polymer_type {
        PolymerType::Chem => word(i),
        PolymerType::Rna | PolymerType::Peptide => letter(i),
    }
}

/// Bracketed Monomer = "[" , Bracket Contents , "]" ;
fn bracketed_monomer(i: &str) -> ParseResult<MonomerId> {
    let (rest, _) = char('[')(i)?;
    // NOTE: Both errors point at the opening bracket
    let (rest, contents) = bracket_contents(rest)
        .map_err(|_| Err::Failure(LabeledParseError::new(i, HelmErrorKind::EmptyBracket)))?;
    let (rest, _) = char::<_, ()>(']')(rest)
        .map_err(|_| Err::Failure(LabeledParseError::new(i, HelmErrorKind::UnclosedBracket)))?;
    Ok((rest, MonomerId::bracketed(contents)))
}

/// Bracket Contents = { ? any character except "[" or "]" ?
///   | "[" , Bracket Contents , "]" }- ;
pub(super) fn bracket_contents(i: &str) -> ParseResult<&str> {
    let nested = delimited(char('['), bracket_contents, char(']'));
    recognize(many1(alt((is_not("[]"), recognize(nested)))))(i)
}
