use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use dbdraft_core::{
    DIAGRAM_VERSION, DependencyReport, Diagnostics, Diagram, Dialect, Severity,
    build_dependency_report, diagram_json_schema, validate_diagram,
};
use dbdraft_dbml::{DbmlImport, export_dbml, import_dbml};
use dbdraft_sql::export_sql;

use crate::CliError;
use crate::config::{Settings, save_settings, write_bytes_atomic};
use crate::transport::{ListenStats, Listener};

/// JSON document printed by `inspect`.
#[derive(Debug, Serialize)]
pub struct DiagramDocument {
    pub version: &'static str,
    pub diagram: Diagram,
    pub diagnostics: Diagnostics,
    pub dependencies: DependencyReport,
}

pub fn export(source: &Path, dialect: Dialect, out: Option<&Path>) -> Result<(), CliError> {
    let mut import = read_dbml(source)?;
    import.diagram.database = dialect;
    let export = export_sql(&import.diagram, dialect)?;
    log_diagnostics(&export.diagnostics);
    emit(out, &export.sql)?;
    tracing::info!(event = "export_finished", dialect = %dialect, source = %source.display());
    Ok(())
}

pub fn format(source: &Path, out: Option<&Path>) -> Result<(), CliError> {
    let import = read_dbml(source)?;
    emit(out, &export_dbml(&import.diagram))?;
    tracing::info!(event = "format_finished", source = %source.display());
    Ok(())
}

/// Import `source` and build its document. Validation errors are reported, not fatal.
pub fn inspect(source: &Path) -> Result<DiagramDocument, CliError> {
    let DbmlImport {
        diagram,
        mut diagnostics,
    } = read_dbml(source)?;
    let validation = validate_diagram(&diagram);
    log_diagnostics(&validation);
    diagnostics.merge(validation);

    let dependencies = build_dependency_report(&diagram);
    Ok(DiagramDocument {
        version: DIAGRAM_VERSION,
        diagram,
        diagnostics,
        dependencies,
    })
}

pub fn print_inspect(source: &Path, out: Option<&Path>) -> Result<(), CliError> {
    let document = inspect(source)?;
    emit(out, &serde_json::to_string_pretty(&document)?)
}

pub fn print_schema(out: Option<&Path>) -> Result<(), CliError> {
    emit(out, &serde_json::to_string_pretty(&diagram_json_schema())?)
}

pub fn listen(origin: &str, dialect: Dialect) -> Result<ListenStats, CliError> {
    let listener = Listener::new(origin, dialect);
    tracing::info!(event = "listen_started", origin = %listener.trusted_origin(), dialect = %dialect);
    let stdin = io::stdin();
    let stdout = io::stdout();
    Ok(listener.run(stdin.lock(), stdout.lock())?)
}

pub fn init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::InvalidConfig(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    save_settings(path, &Settings::default())?;
    tracing::info!(event = "settings_written", path = %path.display());
    Ok(())
}

fn read_dbml(source: &Path) -> Result<DbmlImport, CliError> {
    let text = std::fs::read_to_string(source)?;
    let import = import_dbml(&text)?;
    log_diagnostics(&import.diagnostics);
    Ok(import)
}

fn log_diagnostics(diagnostics: &Diagnostics) {
    for issue in diagnostics.iter() {
        match issue.severity {
            Severity::Error => tracing::error!(
                event = "diagnostic",
                code = %issue.code,
                path = %issue.path,
                message = %issue.message
            ),
            Severity::Warning => tracing::warn!(
                event = "diagnostic",
                code = %issue.code,
                path = %issue.path,
                message = %issue.message
            ),
        }
    }
}

fn emit(out: Option<&Path>, text: &str) -> Result<(), CliError> {
    match out {
        Some(path) => {
            let mut data = text.to_string();
            data.push('\n');
            write_bytes_atomic(path, data.as_bytes())?;
            tracing::info!(event = "output_written", path = %path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{text}")?;
        }
    }
    Ok(())
}
