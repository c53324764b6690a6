//! Ariadne-based diagnostic rendering for type errors.
//!
//! Renders `TypeError` variants into formatted, labeled error messages.
//! Output is terse, with dual-span labels where the constraint origin
//! provides two useful positions (call site and argument, list and
//! element).

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use tally_common::Span;

use crate::error::{ConstraintOrigin, TypeError};

/// Options controlling diagnostic rendering.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticOptions {
    /// Whether to colorize output. Off by default so test output and logs
    /// stay stable.
    pub color: bool,
}

// ── Error codes ────────────────────────────────────────────────────────

/// Assign a stable error code to each TypeError variant.
fn error_code(err: &TypeError) -> &'static str {
    match err {
        TypeError::Mismatch { .. } => "E0001",
        TypeError::InfiniteType { .. } => "E0002",
        TypeError::Impredicative { .. } => "E0003",
        TypeError::UnboundVariable { .. } => "E0004",
        TypeError::TopLevelReference { .. } => "E0005",
        TypeError::EscapedVariable { .. } => "E0006",
        TypeError::RowLink { .. } => "E0007",
        TypeError::Unsupported { .. } => "E0008",
    }
}

// ── Span helpers ───────────────────────────────────────────────────────

fn span_to_range(span: Span) -> Range<usize> {
    span.start as usize..span.end as usize
}

// ── Main rendering function ────────────────────────────────────────────

/// Render a type error into a formatted diagnostic string.
///
/// Each diagnostic includes an error code, the error's display message,
/// and labeled source spans derived from the constraint origin.
pub fn render_diagnostic(
    error: &TypeError,
    source: &str,
    _filename: &str,
    options: &DiagnosticOptions,
) -> String {
    let config = Config::default().with_color(options.color);
    let source_len = source.len();

    // Clamp a range to be valid within source bounds; ariadne needs a
    // non-empty span.
    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };

    let code = error_code(error);
    let msg = error.to_string();
    let primary = clamp(span_to_range(error.span()));

    let mut builder = Report::build(ReportKind::Error, primary.clone())
        .with_code(code)
        .with_message(&msg)
        .with_config(config);

    match error {
        TypeError::Mismatch { expected, found, origin } => match origin {
            ConstraintOrigin::AppArg { call_span, arg_span, arg_idx } => {
                builder.add_label(
                    Label::new(clamp(span_to_range(*arg_span)))
                        .with_message(format!("found {}", found))
                        .with_color(Color::Red),
                );
                builder.add_label(
                    Label::new(clamp(span_to_range(*call_span)))
                        .with_message(format!("argument {} of this call expects {}", arg_idx + 1, expected))
                        .with_color(Color::Blue),
                );
            }
            ConstraintOrigin::ListElement { list_span, elem_span } => {
                builder.add_label(
                    Label::new(clamp(span_to_range(*elem_span)))
                        .with_message(format!("found {}", found))
                        .with_color(Color::Red),
                );
                builder.add_label(
                    Label::new(clamp(span_to_range(*list_span)))
                        .with_message(format!("this list's elements are {}", expected))
                        .with_color(Color::Blue),
                );
            }
            _ => {
                builder.add_label(
                    Label::new(primary.clone())
                        .with_message(format!("expected {}, found {}", expected, found))
                        .with_color(Color::Red),
                );
            }
        },

        TypeError::InfiniteType { .. } => {
            builder.add_label(
                Label::new(primary.clone())
                    .with_message("recursive type here")
                    .with_color(Color::Red),
            );
            builder.set_help("a value cannot have a type that refers to itself");
        }

        TypeError::Impredicative { ty, .. } => {
            builder.add_label(
                Label::new(primary.clone())
                    .with_message(format!("quantifier nested inside {}", ty))
                    .with_color(Color::Red),
            );
            builder.set_help("quantifiers may only appear at the top of a signature");
        }

        TypeError::UnboundVariable { name, .. } => {
            builder.add_label(
                Label::new(primary.clone())
                    .with_message(format!("`{}` is not in scope here", name))
                    .with_color(Color::Red),
            );
        }

        TypeError::TopLevelReference { name, .. } => {
            builder.add_label(
                Label::new(primary.clone())
                    .with_message(format!("`{}` is not a local binding", name))
                    .with_color(Color::Red),
            );
            builder.set_help("module-level names must be resolved before inference");
        }

        TypeError::EscapedVariable { var, .. } => {
            builder.add_label(
                Label::new(primary.clone())
                    .with_message(format!("`{}` is not quantified by any enclosing scheme", var))
                    .with_color(Color::Red),
            );
        }

        TypeError::RowLink { found, .. } => {
            builder.add_label(
                Label::new(primary.clone())
                    .with_message(format!("row position holds {}", found))
                    .with_color(Color::Red),
            );
        }

        TypeError::Unsupported { construct, .. } => {
            builder.add_label(
                Label::new(primary.clone())
                    .with_message(*construct)
                    .with_color(Color::Red),
            );
        }
    }

    let report = builder.finish();

    // Render to a buffer; color is governed by the options.
    let mut buf = Vec::new();
    let cache = Source::from(source);
    report.write(cache, &mut buf).expect("failed to write diagnostic");
    String::from_utf8(buf).expect("diagnostic output should be valid UTF-8")
}
