use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use serde::{Deserialize, Serialize};
use skr_core::SourceRange;
use std::fmt;

/// Severity level for diagnostics.
///
/// Every rule shipped today reports `Error` except the beat collision warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// Blocks session creation.
    Error,
    /// Worth fixing, does not block anything.
    Warning,
    /// Informational.
    Info,
}

impl Severity {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic message with source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule code, e.g. `SKR001`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// How serious the problem is.
    pub severity: Severity,
    /// Where the problem is.
    pub range: SourceRange,
}

impl Diagnostic {
    /// An error-severity diagnostic.
    pub fn error(code: &str, message: impl Into<String>, range: SourceRange) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: Severity::Error,
            range,
        }
    }

    /// A warning-severity diagnostic.
    pub fn warning(code: &str, message: impl Into<String>, range: SourceRange) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message, range)
        }
    }

    /// Returns `true` for error severity.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

/// Returns `true` if any diagnostic has error severity.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Render diagnostics using ariadne for pretty terminal output.
pub fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        let (kind, color) = match diag.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
            Severity::Info => (ReportKind::Advice, Color::Blue),
        };

        let span = diag.range.span();
        let report = Report::build(kind, (filename, span.clone()))
            .with_config(Config::default().with_index_type(IndexType::Byte))
            .with_code(&diag.code)
            .with_message(&diag.message)
            .with_label(
                Label::new((filename, span))
                    .with_message(&diag.message)
                    .with_color(color),
            );

        report
            .finish()
            .write((filename, Source::from(source)), &mut output)
            .ok();
    }

    String::from_utf8(output).unwrap_or_default()
}
