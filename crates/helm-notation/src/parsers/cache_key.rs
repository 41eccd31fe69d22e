use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_till},
    character::complete::{char, digit0, multispace1, one_of, satisfy},
    combinator::{eof, map, peek, recognize, value},
    multi::many0,
    sequence::{delimited, terminated, tuple},
};

use super::{errors::ParseResult, sequence::bracket_contents};

/// Key Tokens = { Separator | Fragment | Raw Text } ;
///
/// Never fails: anything that isn't a separator or a fragment is read as raw text.
pub fn key_tokens(i: &str) -> ParseResult<Vec<String>> {
    let token = alt((
        value(None, separator),
        map(fragment, |text: &str| Some(text.to_owned())),
        map(raw_text, Some),
    ));
    map(many0(token), |tokens| {
        tokens
            .into_iter()
            .flatten()
            .filter(|token| !token.is_empty())
            .collect()
    })(i)
}

/// Separator = "$" | "|" | whitespace ;
fn separator(i: &str) -> ParseResult<&str> {
    alt((multispace1, recognize(one_of("$|"))))(i)
}

/// Fragment = Polymer Type , digit - "0" , { digit } , "{" , Fragment Body , "}" ;
///
/// A fragment only counts as one when it's followed by a separator or the end of the input. Annotations are free text,
/// so a body that doesn't balance its brackets is instead read up to the first "}".
fn fragment(i: &str) -> ParseResult<&str> {
    let name = tuple((
        alt((tag("RNA"), tag("PEPTIDE"), tag("CHEM"))),
        satisfy(|c| matches!(c, '1'..='9')),
        digit0,
    ));
    let balanced = terminated(fragment_body, char('}'));
    let opaque = terminated(take_till(|c: char| c == '}'), char('}'));
    let body = alt((
        terminated(balanced, fragment_end),
        terminated(opaque, fragment_end),
    ));
    recognize(tuple((name, char('{'), body)))(i)
}

fn fragment_end(i: &str) -> ParseResult<&str> {
    peek(alt((eof, separator)))(i)
}

/// Fragment Body = { ? any character except "[", "]", "{", or "}" ? | "[" , Bracket Contents , "]" } ;
fn fragment_body(i: &str) -> ParseResult<&str> {
    let bracketed = recognize(delimited(char('['), bracket_contents, char(']')));
    recognize(many0(alt((is_not("[]{}"), bracketed))))(i)
}

/// Raw Text = { ? any character except "$" or "|" ? }- ;
fn raw_text(i: &str) -> ParseResult<String> {
    map(is_not("$|"), |text: &str| {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    })(i)
}
