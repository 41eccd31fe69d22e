use itertools::Itertools;
use nom::{
    Parser,
    bytes::complete::take_till1,
    character::complete::char,
    combinator::{cut, map},
    multi::separated_list1,
    sequence::{delimited, pair, tuple},
};
use nom_miette::{LabeledParseError, expect, map_res, wrap_err};

use crate::{
    Annotation, Connection, ConnectionKind, Endpoint, ParsedDocument, PolymerBlock,
    document::PAIR_ATTACHMENT,
};

use super::{
    errors::{HelmErrorKind, ParseResult},
    primitives::{endpoint, polymer_name, separator},
    sequence::polymer,
};

/// Document = Polymers , "$" , Connections , "$" , Connections , "$" , Annotations , "$" ;
pub fn document(i: &str) -> ParseResult<ParsedDocument> {
    // NOTE: A blank document stands for the empty graph, the same as `$$$$`
    if i.is_empty() {
        return Ok((i, ParsedDocument::default()));
    }
    let (rest, polymers) = map_res(section(polymer), unique_polymers)(i)?;
    let (rest, mut connections) = section(connection)(rest)?;
    let (rest, pairs) = section(connection)(rest)?;
    let (rest, annotations) = section(annotation)(rest)?;
    connections.extend(pairs);
    Ok((rest, ParsedDocument::new(polymers, connections, annotations)))
}

/// Connection = Polymer Name , "," , Polymer Name , "," , Endpoint , "-" , Endpoint ;
pub fn connection(i: &str) -> ParseResult<Connection> {
    let parser = tuple((
        polymer_name,
        separator(','),
        polymer_name,
        separator(','),
        endpoint,
        separator('-'),
        endpoint,
    ));
    let parser = map_res(parser, |(source, _, target, _, source_end, _, target_end)| {
        let (source_position, source_attachment) = source_end;
        let (target_position, target_attachment) = target_end;
        let kind = match (
            source_attachment == PAIR_ATTACHMENT,
            target_attachment == PAIR_ATTACHMENT,
        ) {
            (true, true) => ConnectionKind::Pairing,
            (false, false) => ConnectionKind::General,
            _ => return Err(HelmErrorKind::HalfPairing),
        };
        let source = Endpoint::new(source, source_position, source_attachment);
        let target = Endpoint::new(target, target_position, target_attachment);
        Ok(Connection::new(source, target, kind))
    });
    wrap_err(parser, HelmErrorKind::ExpectedConnection)(i)
}

/// Annotation = Polymer Name , "{" , { ? any character except "}" ? }- , "}" ;
pub fn annotation(i: &str) -> ParseResult<Annotation> {
    let text = expect(take_till1(|c: char| c == '}'), HelmErrorKind::EmptyAnnotation);
    let text = delimited(separator('{'), text, separator('}'));
    let parser = map(pair(polymer_name, text), |(name, text)| {
        Annotation::new(name, text)
    });
    wrap_err(parser, HelmErrorKind::ExpectedAnnotation)(i)
}

/// Section<T> = [ T , { "|" , T } ] , "$" ;
fn section<'a, O, P>(item: P) -> impl FnMut(&'a str) -> ParseResult<'a, Vec<O>>
where
    P: Parser<&'a str, O, LabeledParseError<'a, HelmErrorKind>>,
{
    let mut items = separated_list1(char('|'), cut(item));
    let mut end = expect(char('$'), HelmErrorKind::ExpectedSectionEnd);
    move |i: &'a str| {
        let (rest, found) = if i.is_empty() || i.starts_with('$') {
            (i, Vec::new())
        } else {
            items(i)?
        };
        let (rest, _) = end(rest)?;
        Ok((rest, found))
    }
}

fn unique_polymers(polymers: Vec<PolymerBlock>) -> Result<Vec<PolymerBlock>, HelmErrorKind> {
    if let Some(name) = polymers.iter().map(PolymerBlock::name).duplicates().next() {
        Err(HelmErrorKind::DuplicatePolymer(name.to_string()))
    } else {
        Ok(polymers)
    }
}
