use std::collections::BTreeSet;

use crate::diagnostics::{Diagnostics, Issue, codes};
use crate::error::{Error, Result};
use crate::schema::Diagram;

/// Check internal consistency of a diagram.
///
/// This checks:
/// - duplicate table, field, enum and type names
/// - fields without a name or a type
/// - index fields and relationship endpoints that do not resolve
/// - repeated enum values and multiple auto-increment fields
pub fn validate_diagram(diagram: &Diagram) -> Diagnostics {
    let mut report = Diagnostics::default();

    let mut table_names = BTreeSet::new();
    for table in &diagram.tables {
        let table_path = format!("tables.{}", table.name);
        if !table_names.insert(table.name.as_str()) {
            report.push(Issue::error(
                codes::DUPLICATE_NAME,
                &table_path,
                format!("duplicate table name: {}", table.name),
            ));
        }

        let mut field_names = BTreeSet::new();
        for (position, field) in table.fields.iter().enumerate() {
            if !field.is_well_formed() {
                report.push(Issue::error(
                    codes::INVALID_FIELD,
                    format!("{table_path}.fields[{position}]"),
                    "field is missing a name or a type",
                ));
                continue;
            }
            if !field_names.insert(field.name.as_str()) {
                report.push(Issue::error(
                    codes::DUPLICATE_NAME,
                    format!("{table_path}.fields.{}", field.name),
                    format!("duplicate field name: {}.{}", table.name, field.name),
                ));
            }
        }

        if table.fields.iter().filter(|field| field.increment).count() > 1 {
            report.push(Issue::warning(
                codes::MULTIPLE_INCREMENT,
                &table_path,
                "more than one auto-increment field",
            ));
        }

        for index in &table.indices {
            for field in &index.fields {
                if table.field(*field).is_none() {
                    report.push(Issue::error(
                        codes::DANGLING_REFERENCE,
                        format!("{table_path}.indices.{}", index.name),
                        format!("index references missing {field}"),
                    ));
                }
            }
        }
    }

    for relationship in &diagram.relationships {
        for endpoint in [relationship.start, relationship.end] {
            if diagram.resolve(endpoint.table, endpoint.field).is_none() {
                report.push(Issue::error(
                    codes::DANGLING_REFERENCE,
                    format!("relationships.{}", relationship.name),
                    format!(
                        "endpoint {} in {} does not exist",
                        endpoint.field, endpoint.table
                    ),
                ));
            }
        }
    }

    let mut enum_names = BTreeSet::new();
    for item in &diagram.enums {
        let path = format!("enums.{}", item.name);
        if !enum_names.insert(item.name.to_ascii_lowercase()) {
            report.push(Issue::error(
                codes::DUPLICATE_NAME,
                &path,
                format!("duplicate enum name: {}", item.name),
            ));
        }
        let mut values = BTreeSet::new();
        for value in &item.values {
            if !values.insert(value.as_str()) {
                report.push(Issue::error(
                    codes::DUPLICATE_VALUE,
                    &path,
                    format!("duplicate enum value: {value}"),
                ));
            }
        }
    }

    let mut type_names = BTreeSet::new();
    for item in &diagram.types {
        if !type_names.insert(item.name.to_ascii_lowercase()) {
            report.push(Issue::error(
                codes::DUPLICATE_NAME,
                format!("types.{}", item.name),
                format!("duplicate type name: {}", item.name),
            ));
        }
    }

    report
}

/// Fail with [`Error::InvalidSchema`] on the first validation error.
pub fn ensure_valid(diagram: &Diagram) -> Result<()> {
    match validate_diagram(diagram).errors.into_iter().next() {
        Some(issue) => Err(Error::InvalidSchema(format!(
            "{}: {}",
            issue.path, issue.message
        ))),
        None => Ok(()),
    }
}
