use dbdraft_core::{Field, Table};

use crate::SqlExport;
use crate::export::{ColumnKind, Exporter, column_line, create_table, line_comment};

pub(crate) fn export(mut exporter: Exporter<'_>) -> SqlExport {
    let keys = exporter.foreign_keys();
    let mut statements = Vec::new();

    for table in exporter.tables() {
        let fields = exporter.fields(table);
        let mut body: Vec<String> = fields
            .iter()
            .map(|field| column(&mut exporter, table, field))
            .collect();
        body.extend(exporter.primary_key(&fields).map(|pk| format!("\t{pk}")));
        body.extend(
            keys.iter()
                .filter(|key| key.table.id == table.id)
                .map(|key| {
                    format!(
                        "\tCONSTRAINT {} {}",
                        exporter.ident(&key.name),
                        exporter.references(key)
                    )
                }),
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

fn column(exporter: &mut Exporter<'_>, table: &Table, field: &Field) -> String {
    let (rendered, enum_check) = match exporter.column_kind(field) {
        ColumnKind::Enum(item) => (
            "NVARCHAR(255)".to_string(),
            Some(exporter.enum_check(field, item)),
        ),
        ColumnKind::Custom(_) => ("NVARCHAR(MAX)".to_string(), None),
        ColumnKind::Plain => (exporter.plain_type(&field.data_type), None),
    };
    let check = exporter.check_clause(table, field, &rendered);

    let line = column_line(vec![
        Some(exporter.ident(&field.name)),
        Some(rendered.clone()),
        field.increment.then(|| "IDENTITY(1,1)".to_string()),
        Some(if field.not_null { "NOT NULL" } else { "NULL" }.to_string()),
        field.unique.then(|| "UNIQUE".to_string()),
        exporter.default_clause(field, &rendered),
        enum_check,
        check,
    ]);
    format!("{}{line}", line_comment("\t", field.comment.trim()))
}
