use miette::Diagnostic;
use nom::{IResult, error::ErrorKind};
use nom_miette::{LabeledError, LabeledErrorKind, LabeledParseError};
use thiserror::Error;

/// A failed parse of HELM notation, carrying the full input and labelled spans pointing at the problem
pub type ParseError = LabeledError<HelmErrorKind>;
pub(crate) type ParseResult<'a, O> = IResult<&'a str, O, LabeledParseError<'a, HelmErrorKind>>;

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum HelmErrorKind {
    #[diagnostic(help("polymer names start with RNA, PEPTIDE, or CHEM, followed by an index, like RNA1"))]
    #[error("unknown polymer type")]
    UnknownPolymerType,

    #[error("expected a polymer index, like the 1 in RNA1")]
    ExpectedPolymerIndex,

    #[diagnostic(help(
        "a 0 value doesn't make sense here, if you've mistakenly included a leading zero, like RNA01, try just \
        RNA1 instead"
    ))]
    #[error("numbers cannot start with 0")]
    ExpectedNoLeadingZero,

    #[error("expected an ASCII digit 1-9")]
    ExpectedDigit,

    #[error("expected '{{' to open a polymer sequence")]
    ExpectedSequenceStart,

    #[diagnostic(help("you've probably forgotten to close an earlier '{{' bracket"))]
    #[error("expected '}}' to close a polymer sequence")]
    ExpectedSequenceEnd,

    #[error(
        "expected a monomer: a single letter (or a word for CHEM polymers), or a code in square brackets like [dR]"
    )]
    ExpectedMonomer,

    #[diagnostic(help("square brackets may nest, but every '[' needs a matching ']'"))]
    #[error("expected ']' to close monomer brackets")]
    UnclosedBracket,

    #[error("monomer brackets cannot be empty")]
    EmptyBracket,

    #[diagnostic(help("you've probably forgotten to close an earlier '(' bracket"))]
    #[error("expected ')' to close a branch monomer")]
    ExpectedBranchEnd,

    #[error("expected a closing \"'\" after the repeat count")]
    ExpectedRepeatEnd,

    #[error("expected a connection, like RNA1,RNA2,2:pair-5:pair or PEPTIDE1,CHEM1,3:R3-1:R1")]
    ExpectedConnection,

    #[error("expected '{0}'")]
    ExpectedSeparator(char),

    #[error("expected a monomer position, like the 2 in 2:R3")]
    ExpectedPosition,

    #[error("expected an attachment point, like R1 or pair")]
    ExpectedAttachment,

    #[diagnostic(help("base-pairing connections must be written with 'pair' on both ends, like 2:pair-5:pair"))]
    #[error("only one end of this connection is a base pair")]
    HalfPairing,

    #[error("expected an annotation, like RNA1{{ss}}")]
    ExpectedAnnotation,

    #[error("annotations cannot be empty")]
    EmptyAnnotation,

    #[diagnostic(help(
        "HELM notation has four sections (polymers, connections, base pairs, and annotations), each terminated \
        by '$', like RNA1{{R(A)P}}$$$$"
    ))]
    #[error("expected '$' to end a notation section")]
    ExpectedSectionEnd,

    #[diagnostic(help("polymer names may only be used once, try renumbering the second one"))]
    #[error("the polymer {0} is defined more than once")]
    DuplicatePolymer(String),

    #[diagnostic(help(
        "this is an internal error that you shouldn't ever see! If you have gotten this error, then please report \
        it as a bug!"
    ))]
    #[error("internal `nom` error: {0:?}")]
    NomError(ErrorKind),

    #[diagnostic(help("check the unparsed region for errors, or remove it from the rest of the notation"))]
    #[error("could not interpret the full input as valid HELM notation")]
    Incomplete,
}

impl LabeledErrorKind for HelmErrorKind {
    fn label(&self) -> Option<&'static str> {
        Some(match self {
            Self::UnknownPolymerType => "unknown polymer type",
            Self::ExpectedNoLeadingZero => "expected non-zero",
            Self::ExpectedDigit => "expected digit",
            Self::ExpectedSequenceStart => "expected '{'",
            Self::ExpectedSequenceEnd => "expected '}'",
            Self::ExpectedMonomer => "expected monomer",
            Self::UnclosedBracket => "unclosed '['",
            Self::EmptyBracket => "empty brackets",
            Self::ExpectedBranchEnd => "expected ')'",
            Self::ExpectedRepeatEnd => "expected \"'\"",
            Self::ExpectedSeparator(_) => "missing separator",
            Self::ExpectedAttachment => "expected attachment point",
            Self::HalfPairing => "half of a base pair",
            Self::EmptyAnnotation => "empty annotation",
            Self::ExpectedSectionEnd => "expected '$'",
            Self::DuplicatePolymer(_) => "duplicate polymer",
            Self::Incomplete => "input was valid up until this point",
            Self::NomError(_) => "the region that triggered this bug!",
            _ => return None,
        })
    }
}

impl From<ErrorKind> for HelmErrorKind {
    fn from(value: ErrorKind) -> Self {
        match value {
            ErrorKind::Eof => Self::Incomplete,
            kind => Self::NomError(kind),
        }
    }
}
