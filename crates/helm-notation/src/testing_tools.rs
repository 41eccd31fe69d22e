use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};

macro_rules! assert_error_kind {
    ($result:expr, $kind:expr) => {{
        let error = $result.unwrap_err();
        assert!(
            error.contains(&$kind),
            "expected {:?} somewhere in {error:#?}",
            $kind
        );
    }};
}

pub(crate) use assert_error_kind;

macro_rules! assert_miette_snapshot {
    ($result:expr, @$snapshot:literal) => {{
        let report = $crate::testing_tools::render_report(&$result.unwrap_err());
        insta::assert_snapshot!(report, @$snapshot);
    }};
}

pub(crate) use assert_miette_snapshot;

pub(crate) fn render_report(diagnostic: &dyn Diagnostic) -> String {
    let mut out = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
        .with_width(80)
        .render_report(&mut out, diagnostic)
        .unwrap();
    out
}
