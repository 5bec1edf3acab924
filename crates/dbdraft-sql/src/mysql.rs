//! MySQL and MariaDB share one vocabulary: backtick identifiers, inline
//! `ENUM(...)` columns and foreign keys added once every table exists.

use dbdraft_core::{Field, Table};

use crate::SqlExport;
use crate::export::{ColumnKind, Exporter, column_line, create_table, literal, literal_list};

pub(crate) fn export(mut exporter: Exporter<'_>) -> SqlExport {
    let mut statements = Vec::new();

    for table in exporter.tables() {
        let mut block = vec![create(&mut exporter, table)];
        block.extend(exporter.indices(table));
        statements.push(block.join("\n"));
    }

    for key in exporter.foreign_keys() {
        statements.push(exporter.alter_foreign_key(&key));
    }

    exporter.finish(statements)
}

fn create<'a>(exporter: &mut Exporter<'a>, table: &'a Table) -> String {
    let fields = exporter.fields(table);
    let mut body: Vec<String> = fields
        .iter()
        .map(|field| column(exporter, table, field))
        .collect();
    body.extend(exporter.primary_key(&fields).map(|pk| format!("\t{pk}")));

    let suffix = if table.comment.trim().is_empty() {
        String::new()
    } else {
        format!(" COMMENT {}", literal(table.comment.trim()))
    };
    create_table(&exporter.ident(&table.name), &body, &suffix)
}

fn column(exporter: &mut Exporter<'_>, table: &Table, field: &Field) -> String {
    let rendered = match exporter.column_kind(field) {
        ColumnKind::Enum(item) => format!("ENUM({})", literal_list(&item.values)),
        ColumnKind::Custom(_) => "JSON".to_string(),
        ColumnKind::Plain => exporter.plain_type(&field.data_type),
    };
    let check = exporter.check_clause(table, field, &rendered);

    column_line(vec![
        Some(exporter.ident(&field.name)),
        Some(rendered.clone()),
        field.not_null.then(|| "NOT NULL".to_string()),
        field.increment.then(|| "AUTO_INCREMENT".to_string()),
        field.unique.then(|| "UNIQUE".to_string()),
        exporter.default_clause(field, &rendered),
        check,
        (!field.comment.trim().is_empty())
            .then(|| format!("COMMENT {}", literal(field.comment.trim()))),
    ])
}
