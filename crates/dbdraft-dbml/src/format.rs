//! Rendering of a [`Diagram`] as DBML text.
//!
//! Output is: enums, tables, refs, then sticky notes, separated by blank
//! lines. Types are written lowercase and a bare `varchar` gets a length of
//! 255. Everything written here is accepted by [`crate::import_dbml`].

use dbdraft_core::{
    Cardinality, DEFAULT_TABLE_COLOR, Diagram, EnumType, Field, Index, Note, Relationship, Table,
};

const SQL_KEYWORDS: [&str; 4] = [
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "LOCALTIMESTAMP",
];

/// Render `diagram` as DBML.
pub fn export_dbml(diagram: &Diagram) -> String {
    let mut sections = Vec::new();
    sections.extend(diagram.enums.iter().map(enum_block));
    sections.extend(diagram.tables.iter().map(table_block));
    sections.extend(
        diagram
            .relationships
            .iter()
            .filter_map(|relationship| ref_block(diagram, relationship)),
    );
    sections.extend(
        diagram
            .notes
            .iter()
            .enumerate()
            .map(|(i, note)| note_block(i, note)),
    );

    let dbml = sections.join("\n\n").trim().to_string();
    tracing::info!(
        event = "dbml_exported",
        tables = diagram.tables.len(),
        bytes = dbml.len()
    );
    dbml
}

fn enum_block(item: &EnumType) -> String {
    let values: Vec<String> = item
        .values
        .iter()
        .map(|value| format!("\t{}", name(value)))
        .collect();
    format!("enum {} {{\n{}\n}}", name(&item.name), values.join("\n"))
}

fn table_block(table: &Table) -> String {
    let mut header = format!("Table {}", name(&table.name));
    if !table.color.is_empty() && !table.color.eq_ignore_ascii_case(DEFAULT_TABLE_COLOR) {
        header.push_str(&format!(" [headercolor: {}]", table.color));
    }

    let mut body: Vec<String> = table.fields.iter().map(column_line).collect();

    let indexes: Vec<String> = table
        .indices
        .iter()
        .filter_map(|index| index_line(table, index))
        .collect();
    if !indexes.is_empty() {
        body.push(String::new());
        body.push("\tindexes {".to_string());
        body.extend(indexes);
        body.push("\t}".to_string());
    }

    if !table.comment.trim().is_empty() {
        body.push(String::new());
        body.push(format!("\tNote: {}", string(&table.comment)));
    }

    format!("{header} {{\n{}\n}}", body.join("\n"))
}

fn column_line(field: &Field) -> String {
    let mut settings = Vec::new();
    if field.primary {
        settings.push("primary key".to_string());
    }
    if field.increment {
        settings.push("increment".to_string());
    }
    if field.not_null {
        settings.push("not null".to_string());
    }
    if field.unique {
        settings.push("unique".to_string());
    }
    if !field.default.trim().is_empty() {
        settings.push(format!("default: {}", literal(field.default.trim())));
    }
    if !field.check.trim().is_empty() {
        settings.push(format!("check: `{}`", field.check.trim()));
    }
    if !field.comment.trim().is_empty() {
        settings.push(format!("note: {}", string(&field.comment)));
    }

    let mut line = format!("\t{} {}", name(&field.name), data_type(&field.data_type));
    if !settings.is_empty() {
        line.push_str(&format!(" [{}]", settings.join(", ")));
    }
    line
}

fn index_line(table: &Table, index: &Index) -> Option<String> {
    let columns: Vec<String> = index
        .fields
        .iter()
        .filter_map(|id| table.field(*id))
        .map(|field| name(&field.name))
        .collect();
    if columns.is_empty() {
        return None;
    }

    let target = if columns.len() == 1 {
        columns[0].clone()
    } else {
        format!("({})", columns.join(", "))
    };
    let mut settings = Vec::new();
    if index.unique {
        settings.push("unique".to_string());
    }
    if !index.name.trim().is_empty() {
        settings.push(format!("name: {}", string(&index.name)));
    }

    Some(if settings.is_empty() {
        format!("\t\t{target}")
    } else {
        format!("\t\t{target} [{}]", settings.join(", "))
    })
}

fn ref_block(diagram: &Diagram, relationship: &Relationship) -> Option<String> {
    let Some((start_table, start_field)) =
        diagram.resolve(relationship.start.table, relationship.start.field)
    else {
        tracing::warn!(event = "dbml_ref_skipped", relationship = %relationship.id);
        return None;
    };
    let Some((end_table, end_field)) =
        diagram.resolve(relationship.end.table, relationship.end.field)
    else {
        tracing::warn!(event = "dbml_ref_skipped", relationship = %relationship.id);
        return None;
    };

    let token = match relationship.cardinality {
        Cardinality::OneToOne => "-",
        Cardinality::OneToMany => "<",
        Cardinality::ManyToOne => ">",
    };
    // Unnamed refs get the constraint name every SQL exporter derives.
    let ref_name = if relationship.name.trim().is_empty() {
        format!(
            "fk_{}_{}_{}",
            start_table.name, start_field.name, end_table.name
        )
    } else {
        relationship.name.clone()
    };

    Some(format!(
        "Ref {} {{\n\t{}.{} {token} {}.{} [delete: {}, update: {}]\n}}",
        name(&ref_name),
        name(&start_table.name),
        name(&start_field.name),
        name(&end_table.name),
        name(&end_field.name),
        relationship.on_delete.as_dbml(),
        relationship.on_update.as_dbml(),
    ))
}

fn note_block(position: usize, note: &Note) -> String {
    let title = if note.title.trim().is_empty() {
        format!("note_{position}")
    } else {
        name(&note.title)
    };
    format!("Note {title} {{\n\t{}\n}}", string(&note.content))
}

/// Lowercase type text; `varchar` without a length becomes `varchar(255)`.
fn data_type(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    if lower == "varchar" {
        return "varchar(255)".to_string();
    }
    if lower.contains(' ') {
        return format!("\"{lower}\"");
    }
    lower
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|ch| ch == '_' || ch.is_alphanumeric())
        }
        _ => false,
    }
}

/// Bare identifier, or a double-quoted name.
fn name(text: &str) -> String {
    if is_identifier(text) {
        text.to_string()
    } else {
        format!("\"{}\"", escape(text))
    }
}

/// Single-quoted string with `\`, `'` and newlines escaped.
fn string(text: &str) -> String {
    format!("'{}'", escape(text))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            ch => out.push(ch),
        }
    }
    out
}

fn is_number(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    digits.starts_with(|ch: char| ch.is_ascii_digit())
        && digits.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
        && digits.matches('.').count() <= 1
}

/// Render a default value: numbers and boolean/null keywords stay bare,
/// function calls, SQL keywords and already quoted literals become
/// expressions, the rest is a string. Re-importing yields the same text.
fn literal(value: &str) -> String {
    if is_number(value) {
        return value.to_string();
    }
    let upper = value.to_ascii_uppercase();
    if matches!(upper.as_str(), "TRUE" | "FALSE" | "NULL") {
        return value.to_string();
    }
    let quoted = value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'');
    let call = value.ends_with(')') && value.contains('(');
    if !value.contains('`') && (quoted || call || SQL_KEYWORDS.contains(&upper.as_str())) {
        return format!("`{value}`");
    }
    string(value)
}
