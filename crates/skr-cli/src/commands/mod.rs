pub mod build;
pub mod check;
pub mod new;
pub mod outline;
pub mod play;

use std::fs;
use std::path::Path;

use skr_core::Script;
use skr_dsl::{ParseResult, Severity, render_diagnostics};

/// Parse a script file and print its diagnostics.
/// Returns the built script if there are no errors.
fn parse_file(path: &Path) -> Result<Script, String> {
    let source =
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let result = skr_dsl::parse(&source);
    print_diagnostics(&result, &source, path);

    if result.has_errors() {
        Err("script has errors".into())
    } else {
        Ok(result.script)
    }
}

/// Print diagnostics to stderr using ariadne.
fn print_diagnostics(result: &ParseResult, source: &str, path: &Path) {
    if result.diagnostics.is_empty() {
        return;
    }

    let filename = path.display().to_string();
    let rendered = render_diagnostics(source, &filename, &result.diagnostics);
    eprint!("{rendered}");

    let errors = result
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = result
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();

    if errors > 0 {
        eprintln!(
            "  {} error{}, {} warning{}",
            errors,
            if errors == 1 { "" } else { "s" },
            warnings,
            if warnings == 1 { "" } else { "s" },
        );
    } else if warnings > 0 {
        eprintln!(
            "  {} warning{}",
            warnings,
            if warnings == 1 { "" } else { "s" },
        );
    }
}

/// Display name of a script: its story id, else the metadata id, else the file stem.
fn story_name(script: &Script, path: &Path) -> String {
    script
        .story()
        .map(|story| story.id.clone())
        .or_else(|| script.metadata.get("id").cloned())
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
}
