//! Lowering of a parsed DBML document into a [`Diagram`].
//!
//! Structural problems that do not prevent building a usable diagram (unknown
//! index columns, refs to missing tables or columns, unknown actions) are
//! dropped and reported as diagnostics instead of failing the import.

use std::collections::HashMap;

use dbdraft_core::{
    Cardinality, Diagnostics, Diagram, Dialect, Endpoint, EnumType, Field, FieldId, FkAction,
    Index, NewRelationship, Note, Position, Table, TableId, codes,
};
use serde::Serialize;

use crate::ast::{
    ColumnDef, Document, EndpointDef, IndexColumn, IndexDef, Literal, RefDef, Relation, TableDef,
};
use crate::error::Result;
use crate::layout::arrange_tables;
use crate::parse::parse_document;

/// Title given to diagrams built from DBML.
pub const IMPORTED_TITLE: &str = "Untitled diagram";

/// A diagram built from DBML together with everything dropped on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DbmlImport {
    pub diagram: Diagram,
    pub diagnostics: Diagnostics,
}

/// Parse DBML source and lower it into a laid-out diagram.
pub fn import_dbml(src: &str) -> Result<DbmlImport> {
    let document = parse_document(src)?;
    let import = lower(&document);
    tracing::info!(
        event = "dbml_imported",
        tables = import.diagram.tables.len(),
        relationships = import.diagram.relationships.len(),
        enums = import.diagram.enums.len(),
        warnings = import.diagnostics.warnings.len()
    );
    Ok(import)
}

/// Lower an already parsed document.
pub fn lower(document: &Document) -> DbmlImport {
    let mut lowering = Lowering {
        diagram: Diagram::new(IMPORTED_TITLE, Dialect::Generic),
        diagnostics: Diagnostics::default(),
        names: HashMap::new(),
    };

    for def in &document.tables {
        lowering.table(def);
    }
    for def in &document.enums {
        lowering
            .diagram
            .add_enum(EnumType::new(def.name.clone(), def.values.clone()));
    }

    let mut refs: Vec<(String, RefDef)> = Vec::new();
    for def in &document.tables {
        for column in &def.columns {
            if let Some(inline) = &column.settings.inline_ref {
                refs.push((
                    format!("tables.{}.fields.{}.ref", def.name, column.name),
                    RefDef {
                        name: None,
                        start: EndpointDef {
                            table: def.name.clone(),
                            columns: vec![column.name.clone()],
                        },
                        relation: inline.relation,
                        end: inline.target.clone(),
                        on_delete: None,
                        on_update: None,
                        span: column.span,
                    },
                ));
            }
        }
    }
    for (i, def) in document.refs.iter().enumerate() {
        refs.push((format!("refs[{i}]"), def.clone()));
    }
    for (path, def) in &refs {
        lowering.relationship(path, def);
    }

    for def in &document.notes {
        lowering.diagram.add_note(Note::new(
            def.name.clone(),
            def.content.clone(),
            Position::default(),
        ));
    }

    arrange_tables(&mut lowering.diagram);

    DbmlImport {
        diagram: lowering.diagram,
        diagnostics: lowering.diagnostics,
    }
}

struct Lowering {
    diagram: Diagram,
    diagnostics: Diagnostics,
    /// Table names and aliases.
    names: HashMap<String, TableId>,
}

impl Lowering {
    fn table(&mut self, def: &TableDef) {
        let mut table = Table::new(def.name.clone());
        if let Some(color) = &def.color {
            table.color = color.clone();
        }
        if let Some(note) = &def.note {
            table.comment = note.clone();
        }

        // Temporary ids by column position; add_table remaps them.
        for (i, column) in def.columns.iter().enumerate() {
            let mut field = field(column);
            field.id = FieldId(i as u32);
            table.fields.push(field);
        }

        for (i, index) in def.indexes.iter().enumerate() {
            let path = format!("tables.{}.indexes[{i}]", def.name);
            let fields = self.index_fields(&table, index, &path);
            if index.primary {
                for id in &fields {
                    if let Some(field) = table.fields.iter_mut().find(|field| field.id == *id) {
                        field.primary = true;
                    }
                }
                continue;
            }
            if fields.is_empty() {
                self.diagnostics.warn(
                    codes::DANGLING_REFERENCE,
                    path,
                    "index has no known columns and was dropped",
                );
                continue;
            }
            let name = index
                .name
                .clone()
                .unwrap_or_else(|| format!("{}_index_{i}", def.name));
            table.indices.push(Index::new(name, fields, index.unique));
        }

        let id = self.diagram.add_table(table);
        self.names.insert(def.name.clone(), id);
        if let Some(alias) = &def.alias {
            self.names.insert(alias.clone(), id);
        }
    }

    fn index_fields(&mut self, table: &Table, index: &IndexDef, path: &str) -> Vec<FieldId> {
        let mut fields = Vec::new();
        for column in &index.columns {
            match column {
                IndexColumn::Name(name) => match table.field_by_name(name) {
                    Some(field) => fields.push(field.id),
                    None => self.diagnostics.warn(
                        codes::DANGLING_REFERENCE,
                        path,
                        format!("unknown index column `{name}`"),
                    ),
                },
                IndexColumn::Expr(expr) => self.diagnostics.warn(
                    codes::UNSUPPORTED,
                    path,
                    format!("expression index column `{expr}` is not supported"),
                ),
            }
        }
        fields
    }

    fn endpoint(&mut self, def: &EndpointDef, path: &str) -> Option<Endpoint> {
        let Some(&table_id) = self.names.get(&def.table) else {
            self.diagnostics.warn(
                codes::DANGLING_REFERENCE,
                path,
                format!("unknown table `{}`; relationship dropped", def.table),
            );
            return None;
        };
        if def.columns.len() > 1 {
            self.diagnostics.warn(
                codes::UNSUPPORTED,
                path,
                format!(
                    "composite endpoint on `{}` reduced to its first column",
                    def.table
                ),
            );
        }
        let column = def.columns.first()?;
        let field = self
            .diagram
            .table(table_id)
            .and_then(|table| table.field_by_name(column))
            .map(|field| field.id);
        match field {
            Some(field) => Some(Endpoint::new(table_id, field)),
            None => {
                self.diagnostics.warn(
                    codes::DANGLING_REFERENCE,
                    path,
                    format!(
                        "unknown column `{}.{column}`; relationship dropped",
                        def.table
                    ),
                );
                None
            }
        }
    }

    fn action(&mut self, raw: Option<&str>, path: &str) -> FkAction {
        let Some(raw) = raw else {
            return FkAction::NoAction;
        };
        FkAction::parse(raw).unwrap_or_else(|| {
            self.diagnostics.warn(
                codes::UNSUPPORTED,
                path,
                format!("unknown referential action `{raw}`; using no action"),
            );
            FkAction::NoAction
        })
    }

    fn relationship(&mut self, path: &str, def: &RefDef) {
        let Some(start) = self.endpoint(&def.start, path) else {
            return;
        };
        let Some(end) = self.endpoint(&def.end, path) else {
            return;
        };

        let cardinality = match def.relation {
            Relation::ManyToOne => Cardinality::ManyToOne,
            Relation::OneToMany => Cardinality::OneToMany,
            Relation::OneToOne => Cardinality::OneToOne,
            Relation::ManyToMany => {
                self.diagnostics.warn(
                    codes::UNSUPPORTED,
                    path,
                    "many-to-many refs are imported as one-to-one",
                );
                Cardinality::OneToOne
            }
        };

        // Aliases resolve to the table's real name.
        let name = def.name.clone().unwrap_or_else(|| {
            let start = self.diagram.resolve(start.table, start.field);
            let end_table = self.diagram.table(end.table).map(|table| table.name.as_str());
            match (start, end_table) {
                (Some((table, field)), Some(end_table)) => {
                    format!("fk_{}_{}_{end_table}", table.name, field.name)
                }
                _ => String::new(),
            }
        });
        let on_update = self.action(def.on_update.as_deref(), path);
        let on_delete = self.action(def.on_delete.as_deref(), path);

        let added = self.diagram.add_relationship(NewRelationship {
            name,
            start,
            end,
            cardinality,
            on_update,
            on_delete,
        });
        if let Err(error) = added {
            self.diagnostics
                .warn(codes::DANGLING_REFERENCE, path, error.to_string());
        }
    }
}

fn field(column: &ColumnDef) -> Field {
    let settings = &column.settings;
    let mut field = Field::new(column.name.clone(), column.data_type.to_uppercase());
    field.primary = settings.primary;
    field.increment = settings.increment;
    field.not_null = settings.not_null;
    field.unique = settings.unique;
    if let Some(default) = &settings.default {
        field.default = match default {
            Literal::Number(text) | Literal::Str(text) | Literal::Expr(text) => text.clone(),
            Literal::Keyword(word) => word.clone(),
        };
    }
    if let Some(check) = &settings.check {
        field.check = check.clone();
    }
    if let Some(note) = &settings.note {
        field.comment = note.clone();
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pk_index_marks_fields_primary() {
        let import = import_dbml(
            "Table pairs {
                a int
                b int
                indexes { (a, b) [pk] }
            }",
        )
        .expect("import");
        let table = &import.diagram.tables[0];
        assert!(table.fields.iter().all(|field| field.primary));
        assert!(table.indices.is_empty());
    }

    #[test]
    fn unknown_actions_fall_back_to_no_action() {
        let import = import_dbml(
            "Table a { id int }
             Table b { a_id int }
             Ref: b.a_id > a.id [delete: explode]",
        )
        .expect("import");
        let relationship = &import.diagram.relationships[0];
        assert_eq!(relationship.on_delete, FkAction::NoAction);
        assert!(import.diagnostics.has_code(codes::UNSUPPORTED));
    }
}
