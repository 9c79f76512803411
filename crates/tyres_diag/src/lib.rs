//! Diagnostics for path and type resolution
//!
//! Resolution never aborts on a user error. Every failure becomes a
//! [`Diagnostic`] pushed into a [`DiagnosticSink`], and the caller keeps
//! checking sibling expressions.

use std::fmt;
use std::ops::Range;

use ariadne::{Config, Label as AriadneLabel, Report, ReportKind, Source};

/// Span in source code (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn range(self) -> Range<usize> {
        self.start..self.end
    }
}

/// The kind of failure a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The first segment of a path names nothing with a type.
    UnresolvedRoot,
    /// No inherent or trait item matches a later segment.
    UnresolvedSegment,
    /// More than one item matches a segment.
    AmbiguousCandidates,
    /// `<T as Trait>` where `T` does not implement `Trait`.
    BoundNotSatisfied,
    /// `<T as Trait>::x` where `Trait` has no item `x`.
    UnknownAssociatedItem,
    /// Explicit generic arguments on something that is not generic.
    UnsupportedSubstitution,
    /// Too many or badly named generic arguments.
    MalformedArguments,
    /// A declared generic parameter never appears in the arguments.
    UnconstrainedParameter,
    /// A path ends in a module where a type was expected.
    ExpectedType,
    /// A bound or qualified-path trait position names something that is not a trait.
    ExpectedTrait,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 10] = [
        ErrorCode::UnresolvedRoot,
        ErrorCode::UnresolvedSegment,
        ErrorCode::AmbiguousCandidates,
        ErrorCode::BoundNotSatisfied,
        ErrorCode::UnknownAssociatedItem,
        ErrorCode::UnsupportedSubstitution,
        ErrorCode::MalformedArguments,
        ErrorCode::UnconstrainedParameter,
        ErrorCode::ExpectedType,
        ErrorCode::ExpectedTrait,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UnresolvedRoot => "unresolved_root",
            ErrorCode::UnresolvedSegment => "unresolved_segment",
            ErrorCode::AmbiguousCandidates => "ambiguous_candidates",
            ErrorCode::BoundNotSatisfied => "bound_not_satisfied",
            ErrorCode::UnknownAssociatedItem => "unknown_associated_item",
            ErrorCode::UnsupportedSubstitution => "unsupported_substitution",
            ErrorCode::MalformedArguments => "malformed_arguments",
            ErrorCode::UnconstrainedParameter => "unconstrained_parameter",
            ErrorCode::ExpectedType => "expected_type",
            ErrorCode::ExpectedTrait => "expected_trait",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorCode::UnresolvedRoot => "E0401",
            ErrorCode::UnresolvedSegment => "E0402",
            ErrorCode::AmbiguousCandidates => "E0403",
            ErrorCode::BoundNotSatisfied => "E0404",
            ErrorCode::UnknownAssociatedItem => "E0405",
            ErrorCode::UnsupportedSubstitution => "E0406",
            ErrorCode::MalformedArguments => "E0407",
            ErrorCode::UnconstrainedParameter => "E0408",
            ErrorCode::ExpectedType => "E0409",
            ErrorCode::ExpectedTrait => "E0410",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A secondary location attached to a diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub span: Span,
    pub message: Option<String>,
}

/// A single reported failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    pub labels: Vec<Label>,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            labels: Vec::new(),
        }
    }

    pub fn with_label(mut self, span: Span, message: Option<String>) -> Self {
        self.labels.push(Label { span, message });
        self
    }

    /// Render against the source text with ariadne (no colour)
    pub fn render(&self, source_name: &str, source: &str) -> String {
        let mut report = Report::build(ReportKind::Error, source_name, self.span.start)
            .with_config(Config::default().with_color(false))
            .with_code(self.code.code())
            .with_message(&self.message)
            .with_label(AriadneLabel::new((source_name, self.span.range())).with_message(self.code.as_str()));
        for label in &self.labels {
            let mut l = AriadneLabel::new((source_name, label.span.range()));
            if let Some(msg) = &label.message {
                l = l.with_message(msg);
            }
            report = report.with_label(l);
        }

        let mut out = Vec::new();
        match report.finish().write((source_name, Source::from(source.to_string())), &mut out) {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for Diagnostic {}

/// Receiver of resolution diagnostics
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics in report order
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn with_code(&self, code: ErrorCode) -> Vec<&Diagnostic> {
        self.items.iter().filter(|d| d.code == code).collect()
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<_> = ErrorCode::ALL.iter().map(|c| c.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), ErrorCode::ALL.len());
    }

    #[test]
    fn test_display_uses_primary_span() {
        let diag = Diagnostic::error(ErrorCode::UnresolvedRoot, "failed to resolve root", Span::new(4, 9));
        assert_eq!(diag.to_string(), "failed to resolve root at 4..9");
    }

    #[test]
    fn test_sink_keeps_order_and_filters() {
        let mut sink = Diagnostics::new();
        sink.report(Diagnostic::error(ErrorCode::UnresolvedSegment, "a", Span::new(0, 1)));
        sink.report(Diagnostic::error(ErrorCode::AmbiguousCandidates, "b", Span::new(1, 2)));
        sink.report(Diagnostic::error(ErrorCode::UnresolvedSegment, "c", Span::new(2, 3)));

        assert_eq!(sink.len(), 3);
        let unresolved = sink.with_code(ErrorCode::UnresolvedSegment);
        assert_eq!(unresolved.len(), 2);
        assert_eq!(unresolved[1].message, "c");
    }

    #[test]
    fn test_render_mentions_message_and_code() {
        let source = "type X = Foo::bar;";
        let message = "multiple applicable items in scope for: bar";
        let diag = Diagnostic::error(ErrorCode::AmbiguousCandidates, message, Span::new(14, 17))
            .with_label(Span::new(9, 12), Some("candidate".to_string()));
        assert_eq!(diag.labels[0].span, Span::new(9, 12));
        let rendered = diag.render("test.rs", source);
        assert!(rendered.contains("multiple applicable items in scope for: bar"));
        assert!(rendered.contains("E0403"));
    }
}
