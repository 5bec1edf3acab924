use dbdraft_core::{Field, Table, TypeName, codes};

use crate::SqlExport;
use crate::export::{ColumnKind, Exporter, column_line, create_table, line_comment};

pub(crate) fn export(mut exporter: Exporter<'_>) -> SqlExport {
    let keys = exporter.foreign_keys();
    let mut statements = Vec::new();

    for table in exporter.tables() {
        let mut body = columns(&mut exporter, table);
        body.extend(
            keys.iter()
                .filter(|key| key.table.id == table.id)
                .map(|key| format!("\t{}", exporter.references(key))),
        );

        let mut block = vec![format!(
            "{}{}",
            line_comment("", table.comment.trim()),
            create_table(&exporter.ident(&table.name), &body, "")
        )];
        block.extend(exporter.indices(table));
        statements.push(block.join("\n"));
    }

    exporter.finish(statements)
}

/// The field SQLite can turn into an `INTEGER PRIMARY KEY AUTOINCREMENT`
/// column: the only primary field, flagged increment, with an integer type.
fn rowid_alias<'f>(fields: &[&'f Field]) -> Option<&'f Field> {
    let mut primary = fields.iter().filter(|field| field.primary);
    match (primary.next(), primary.next()) {
        (Some(field), None) if field.increment => {
            let base = TypeName::parse(&field.data_type).base;
            matches!(base.as_str(), "INTEGER" | "INT" | "BIGINT").then_some(*field)
        }
        _ => None,
    }
}

fn columns<'a>(exporter: &mut Exporter<'a>, table: &'a Table) -> Vec<String> {
    let fields = exporter.fields(table);
    let alias = rowid_alias(&fields);

    let mut body = Vec::with_capacity(fields.len() + 1);
    for field in &fields {
        let is_alias = alias.is_some_and(|alias| alias.id == field.id);
        if field.increment && !is_alias {
            exporter.diagnostics.warn(
                codes::UNSUPPORTED,
                format!("tables.{}.fields.{}", table.name, field.name),
                "AUTOINCREMENT needs a single INTEGER primary key; ignoring increment",
            );
        }
        body.push(column(exporter, table, field, is_alias));
    }
    if alias.is_none() {
        body.extend(exporter.primary_key(&fields).map(|pk| format!("\t{pk}")));
    }
    body
}

fn column(exporter: &mut Exporter<'_>, table: &Table, field: &Field, is_alias: bool) -> String {
    let (rendered, enum_check) = match exporter.column_kind(field) {
        ColumnKind::Enum(item) => ("TEXT".to_string(), Some(exporter.enum_check(field, item))),
        ColumnKind::Custom(_) => ("TEXT".to_string(), None),
        ColumnKind::Plain if is_alias => ("INTEGER".to_string(), None),
        ColumnKind::Plain => (exporter.plain_type(&field.data_type), None),
    };
    let check = exporter.check_clause(table, field, &rendered);

    let line = column_line(vec![
        Some(exporter.ident(&field.name)),
        Some(rendered.clone()),
        is_alias.then(|| "PRIMARY KEY AUTOINCREMENT".to_string()),
        (field.not_null && !is_alias).then(|| "NOT NULL".to_string()),
        field.unique.then(|| "UNIQUE".to_string()),
        exporter.default_clause(field, &rendered),
        enum_check,
        check,
    ]);
    format!("{}{line}", line_comment("\t", field.comment.trim()))
}
