//! Glue between `nom` parsers and `miette` diagnostics
//!
//! While parsing, errors are [`LabeledParseError`]s that borrow the remaining input. Once a parse has finished,
//! [`final_parser`] converts them into owned [`LabeledError`]s that carry the full input and a set of labelled source
//! spans, ready to be rendered by any `miette` report handler.

use std::{fmt, iter};

use miette::{Diagnostic, LabeledSpan, SourceSpan};
use nom::{
    Err, Finish, IResult, Parser,
    combinator::{all_consuming, complete, consumed},
    error::{ErrorKind, ParseError},
};
use thiserror::Error;

// Public API ==========================================================================================================

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("{error}")]
pub struct LabeledError<E: LabeledErrorKind> {
    full_input: String,
    labels: Vec<LabeledSpan>,
    error: ErrorTree<E>,
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ErrorTree<E: LabeledErrorKind> {
    #[error("{kind}")]
    Node {
        kind: E,
        #[source]
        source: Option<Box<LabeledError<E>>>,
    },
    #[error("attempted {} parse branches unsuccessfully", .0.len())]
    Branch(Vec<LabeledError<E>>),
}

/// An error kind that knows how to describe the span of input it was raised for
pub trait LabeledErrorKind: Diagnostic + Clone + Eq + From<ErrorKind> + 'static {
    fn label(&self) -> Option<&'static str> {
        None
    }
}

/// Converts the error returned by a [`map_res`] callback into a parse error
pub trait FromExternalError<'a, E> {
    /// Fatal errors stop `alt` from trying any further branches
    const FATAL: bool = false;

    fn from_external_error(input: &'a str, error: E) -> Self;
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LabeledParseError<'a, E> {
    input: &'a str,
    length: usize,
    kind: E,
    alternatives: Vec<LabeledParseError<'a, E>>,
    source: Option<Box<LabeledParseError<'a, E>>>,
}

impl<E: LabeledErrorKind> LabeledError<E> {
    /// The kind at the root of this error, or `None` if several parse branches failed
    #[must_use]
    pub const fn kind(&self) -> Option<&E> {
        match &self.error {
            ErrorTree::Node { kind, .. } => Some(kind),
            ErrorTree::Branch(_) => None,
        }
    }

    /// Whether `kind` appears anywhere in this error, including its sources and failed branches
    #[must_use]
    pub fn contains(&self, kind: &E) -> bool {
        match &self.error {
            ErrorTree::Node { kind: k, source } => {
                k == kind || source.as_ref().is_some_and(|e| e.contains(kind))
            }
            ErrorTree::Branch(alternatives) => alternatives.iter().any(|e| e.contains(kind)),
        }
    }

    #[must_use]
    pub fn input(&self) -> &str {
        // NOTE: Strips the padding added in `LabeledParseError::into_final_error`
        self.full_input
            .strip_suffix(' ')
            .unwrap_or(&self.full_input)
    }

    #[must_use]
    pub const fn tree(&self) -> &ErrorTree<E> {
        &self.error
    }

    // Parents without labels of their own adopt those of their children, so the most specific spans are shown
    fn bubble_labels(&mut self) {
        if !self.labels.is_empty() {
            return;
        }
        match &mut self.error {
            ErrorTree::Node {
                source: Some(child),
                ..
            } => {
                child.bubble_labels();
                self.labels = child.labels.drain(..).collect();
            }
            ErrorTree::Branch(alternatives) => {
                let child_labels = alternatives.iter_mut().flat_map(|child| {
                    child.bubble_labels();
                    child.labels.drain(..)
                });
                self.labels = merge_labels(child_labels);
            }
            ErrorTree::Node { source: None, .. } => (),
        }
    }
}

impl<E: LabeledErrorKind> Diagnostic for LabeledError<E> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind().and_then(|kind| kind.code())
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind().and_then(|kind| kind.help())
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.full_input)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.labels.iter().cloned()))
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        if let ErrorTree::Branch(related) = &self.error {
            Some(Box::new(related.iter().map(|e| e as &dyn Diagnostic)))
        } else {
            None
        }
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        if let ErrorTree::Node {
            source: Some(source),
            ..
        } = &self.error
        {
            Some(&**source as &dyn Diagnostic)
        } else {
            None
        }
    }
}

impl<'a, E: LabeledErrorKind> LabeledParseError<'a, E> {
    pub fn new(input: &'a str, kind: E) -> Self {
        Self::new_with_source(input, kind, None)
    }

    pub fn new_with_source(input: &'a str, kind: E, source: Option<Self>) -> Self {
        Self {
            input,
            length: 0,
            kind,
            alternatives: Vec::new(),
            source: source.map(Box::new),
        }
    }

    pub const fn kind(&self) -> &E {
        &self.kind
    }

    fn into_final_error(self, full_input: &str) -> LabeledError<E> {
        let span = self.span_in(full_input);
        let Self {
            input,
            length,
            kind,
            alternatives,
            source,
        } = self;
        // NOTE: The trailing space lets labels point one past the end of the input
        let padded_input = format!("{full_input} ");

        if alternatives.is_empty() {
            let labels = kind
                .label()
                .map(|label| LabeledSpan::new_with_span(Some(label.to_owned()), span))
                .into_iter()
                .collect();
            let source = source.map(|e| Box::new(e.into_final_error(full_input)));
            LabeledError {
                full_input: padded_input,
                labels,
                error: ErrorTree::Node { kind, source },
            }
        } else {
            let head = Self {
                input,
                length,
                kind,
                alternatives: Vec::new(),
                source,
            };
            let branches = iter::once(head)
                .chain(alternatives)
                .map(|e| e.into_final_error(full_input))
                .collect();
            LabeledError {
                full_input: padded_input,
                labels: Vec::new(),
                error: ErrorTree::Branch(branches),
            }
        }
    }

    // NOTE: `nom` only ever hands errors a suffix of the original input, so the offset falls out of the lengths
    fn span_in(&self, full_input: &str) -> SourceSpan {
        debug_assert!(
            full_input.ends_with(self.input),
            "tried to get the span of a non-suffix!"
        );
        let start = full_input.len().saturating_sub(self.input.len());
        SourceSpan::from(start..start + self.length)
    }
}

impl<'a, E: LabeledErrorKind> FromExternalError<'a, E> for LabeledParseError<'a, E> {
    const FATAL: bool = true;

    fn from_external_error(input: &'a str, kind: E) -> Self {
        Self::new(input, kind)
    }
}

impl<'a, E: LabeledErrorKind> ParseError<&'a str> for LabeledParseError<'a, E> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Self::new(input, kind.into())
    }

    fn append(_input: &str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    fn or(mut self, other: Self) -> Self {
        self.alternatives.push(other);
        self
    }
}

// Combinators =========================================================================================================

/// Runs `parser` over the whole input, converting any error into a [`LabeledError`]
pub fn final_parser<'a, O, P, E>(parser: P) -> impl FnMut(&'a str) -> Result<O, LabeledError<E>>
where
    E: LabeledErrorKind,
    P: Parser<&'a str, O, LabeledParseError<'a, E>>,
{
    let mut parser = all_consuming(complete(parser));
    move |input| {
        parser.parse(input).finish().map(|(_, o)| o).map_err(|e| {
            let mut error = e.into_final_error(input);
            error.bubble_labels();
            error
        })
    }
}

/// Like `nom::combinator::map_res`, but the error returned by `f` becomes the error kind, spanning the consumed input
pub fn map_res<'a, O1, O2, E1, E2, F, G>(
    mut parser: F,
    mut f: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, O2, LabeledParseError<'a, E1>>
where
    E1: LabeledErrorKind,
    F: Parser<&'a str, O1, LabeledParseError<'a, E1>>,
    G: FnMut(O1) -> Result<O2, E2>,
    LabeledParseError<'a, E1>: FromExternalError<'a, E2>,
{
    move |input| {
        let (rest, (matched, o1)) = consumed(|i: &'a str| parser.parse(i))(input)?;
        f(o1).map(|o2| (rest, o2)).map_err(|e| {
            let error = LabeledParseError {
                length: matched.len(),
                ..LabeledParseError::from_external_error(input, e)
            };
            if <LabeledParseError<'a, E1> as FromExternalError<'a, E2>>::FATAL {
                Err::Failure(error)
            } else {
                Err::Error(error)
            }
        })
    }
}

/// Wraps any error from `parser` in a new error of `kind`, keeping the original as its source
pub fn wrap_err<'a, O, P, E>(
    mut parser: P,
    kind: E,
) -> impl FnMut(&'a str) -> IResult<&'a str, O, LabeledParseError<'a, E>>
where
    E: LabeledErrorKind,
    P: Parser<&'a str, O, LabeledParseError<'a, E>>,
{
    move |i| {
        parser
            .parse(i)
            .map_err(|e| e.map(|e| LabeledParseError::new_with_source(i, kind.clone(), Some(e))))
    }
}

/// Replaces any error from `parser` with a new error of `kind`, discarding the original
pub fn expect<'a, O, P, E>(
    mut parser: P,
    kind: E,
) -> impl FnMut(&'a str) -> IResult<&'a str, O, LabeledParseError<'a, E>>
where
    E: LabeledErrorKind,
    P: Parser<&'a str, O, LabeledParseError<'a, E>>,
{
    move |i| {
        parser
            .parse(i)
            .map_err(|e| e.map(|_| LabeledParseError::new(i, kind.clone())))
    }
}

// Private Helpers =====================================================================================================

// Labels that share a span are joined into a single "a or b" label, keeping the order they were raised in
fn merge_labels(labels: impl Iterator<Item = LabeledSpan>) -> Vec<LabeledSpan> {
    let mut merged: Vec<(SourceSpan, Vec<String>)> = Vec::new();
    for labeled_span in labels {
        let span = *labeled_span.inner();
        let label = labeled_span.label().unwrap_or_default().to_owned();
        match merged.iter_mut().find(|(s, _)| *s == span) {
            Some((_, existing)) if !existing.contains(&label) => existing.push(label),
            Some(_) => (),
            None => merged.push((span, vec![label])),
        }
    }
    merged
        .into_iter()
        .map(|(span, labels)| LabeledSpan::new_with_span(Some(labels.join(" or ")), span))
        .collect()
}
