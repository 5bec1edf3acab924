use dbdraft_core::{Field, Table};

use crate::SqlExport;
use crate::export::{ColumnKind, Exporter, column_line, create_table, literal, literal_list};

pub(crate) fn export(mut exporter: Exporter<'_>) -> SqlExport {
    let mut statements = Vec::new();
    let diagram = exporter.diagram;

    for item in &diagram.enums {
        statements.push(format!(
            "CREATE TYPE {} AS ENUM ({});",
            exporter.ident(&item.name),
            literal_list(&item.values)
        ));
    }

    for item in &diagram.types {
        let body: Vec<String> = item
            .fields
            .iter()
            .map(|field| {
                format!(
                    "\t{} {}",
                    exporter.ident(&field.name),
                    exporter.plain_type(&field.data_type)
                )
            })
            .collect();
        statements.push(format!(
            "CREATE TYPE {} AS (\n{}\n);",
            exporter.ident(&item.name),
            body.join(",\n")
        ));
    }

    for table in exporter.tables() {
        let mut block = vec![create(&mut exporter, table)];
        block.extend(comments(&exporter, table));
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
    create_table(&exporter.ident(&table.name), &body, "")
}

fn column(exporter: &mut Exporter<'_>, table: &Table, field: &Field) -> String {
    let rendered = match exporter.column_kind(field) {
        ColumnKind::Enum(item) => exporter.ident(&item.name),
        ColumnKind::Custom(item) => exporter.ident(&item.name),
        ColumnKind::Plain => exporter.plain_type(&field.data_type),
    };
    let check = exporter.check_clause(table, field, &rendered);

    column_line(vec![
        Some(exporter.ident(&field.name)),
        Some(rendered.clone()),
        field.not_null.then(|| "NOT NULL".to_string()),
        field
            .increment
            .then(|| "GENERATED BY DEFAULT AS IDENTITY".to_string()),
        field.unique.then(|| "UNIQUE".to_string()),
        exporter.default_clause(field, &rendered),
        check,
    ])
}

/// `COMMENT ON` statements for the table and its commented columns.
fn comments(exporter: &Exporter<'_>, table: &Table) -> Vec<String> {
    let name = exporter.ident(&table.name);
    let mut statements = Vec::new();
    if !table.comment.trim().is_empty() {
        statements.push(format!(
            "COMMENT ON TABLE {name} IS {};",
            literal(table.comment.trim())
        ));
    }
    for field in table.fields.iter().filter(|field| field.is_well_formed()) {
        if !field.comment.trim().is_empty() {
            statements.push(format!(
                "COMMENT ON COLUMN {name}.{} IS {};",
                exporter.ident(&field.name),
                literal(field.comment.trim())
            ));
        }
    }
    statements
}
