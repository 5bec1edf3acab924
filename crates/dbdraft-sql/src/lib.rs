//! SQL exporters for dbdraft diagrams.
//!
//! Each dialect is a stateless transform from a [`Diagram`] snapshot to SQL
//! text. Tables are emitted in foreign-key dependency order; malformed fields,
//! dangling relationships and unresolvable index columns are skipped and
//! reported through [`SqlExport::diagnostics`].

mod export;
mod mssql;
mod mysql;
mod postgres;
mod sqlite;

use serde::{Deserialize, Serialize};

use dbdraft_core::{Diagnostics, Diagram, Dialect, Error, Result};

use crate::export::Exporter;

/// Generated SQL together with the issues that were skipped along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlExport {
    pub sql: String,
    pub diagnostics: Diagnostics,
}

/// Dialects that have an exporter.
pub const SUPPORTED_DIALECTS: [Dialect; 5] = [
    Dialect::MySql,
    Dialect::MariaDb,
    Dialect::PostgreSql,
    Dialect::Sqlite,
    Dialect::MsSql,
];

/// Render `diagram` as SQL for `dialect`.
///
/// Returns [`Error::Unsupported`] for [`Dialect::Generic`], which has no
/// concrete SQL vocabulary.
pub fn export_sql(diagram: &Diagram, dialect: Dialect) -> Result<SqlExport> {
    let render: fn(Exporter<'_>) -> SqlExport = match dialect {
        Dialect::MySql | Dialect::MariaDb => mysql::export,
        Dialect::PostgreSql => postgres::export,
        Dialect::Sqlite => sqlite::export,
        Dialect::MsSql => mssql::export,
        Dialect::Generic => {
            return Err(Error::Unsupported(
                "generic diagrams have no SQL dialect; pick a concrete one".to_string(),
            ));
        }
    };

    let exporter = Exporter::new(diagram, dialect);
    if diagram.tables.is_empty() {
        tracing::debug!(event = "sql_export_empty", dialect = %dialect);
        return Ok(exporter.finish(Vec::new()));
    }

    let export = render(exporter);

    tracing::info!(
        event = "sql_exported",
        dialect = %dialect,
        tables = diagram.tables.len(),
        warnings = export.diagnostics.warnings.len()
    );
    Ok(export)
}
