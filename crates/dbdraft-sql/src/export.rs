use dbdraft_core::{
    CustomType, Diagnostics, Diagram, Dialect, EnumType, Field, FkAction, Table, TypeName, codes,
    dependency_order, format_default, type_info, widen_type,
};

use crate::SqlExport;

/// Shared state of one export run.
pub(crate) struct Exporter<'a> {
    pub(crate) diagram: &'a Diagram,
    pub(crate) dialect: Dialect,
    pub(crate) diagnostics: Diagnostics,
}

/// A relationship whose endpoints both resolved.
pub(crate) struct ForeignKey<'a> {
    pub(crate) name: String,
    pub(crate) table: &'a Table,
    pub(crate) field: &'a Field,
    pub(crate) target: &'a Table,
    pub(crate) target_field: &'a Field,
    pub(crate) on_update: FkAction,
    pub(crate) on_delete: FkAction,
}

/// How a field's declared type maps onto the diagram's named types.
pub(crate) enum ColumnKind<'a> {
    Plain,
    Enum(&'a EnumType),
    Custom(&'a CustomType),
}

impl<'a> Exporter<'a> {
    pub(crate) fn new(diagram: &'a Diagram, dialect: Dialect) -> Self {
        Self {
            diagram,
            dialect,
            diagnostics: Diagnostics::default(),
        }
    }

    pub(crate) fn finish(self, statements: Vec<String>) -> SqlExport {
        SqlExport {
            sql: statements.join("\n\n"),
            diagnostics: self.diagnostics,
        }
    }

    /// Delimit an identifier for the current dialect.
    pub(crate) fn ident(&self, name: &str) -> String {
        match self.dialect {
            Dialect::MySql | Dialect::MariaDb => format!("`{}`", name.replace('`', "``")),
            Dialect::MsSql => format!("[{}]", name.replace(']', "]]")),
            Dialect::PostgreSql | Dialect::Sqlite | Dialect::Generic => {
                format!("\"{}\"", name.replace('"', "\"\""))
            }
        }
    }

    pub(crate) fn ident_list<'f>(&self, names: impl IntoIterator<Item = &'f str>) -> String {
        names
            .into_iter()
            .map(|name| self.ident(name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Tables in dependency order. A table without a single well-formed
    /// field cannot become a valid `CREATE TABLE`; it is reported and skipped
    /// together with its indices.
    pub(crate) fn tables(&mut self) -> Vec<&'a Table> {
        let diagram = self.diagram;
        let mut tables = Vec::with_capacity(diagram.tables.len());
        for table in dependency_order(diagram)
            .into_iter()
            .filter_map(|id| diagram.table(id))
        {
            if table.fields.iter().any(Field::is_well_formed) {
                tables.push(table);
            } else {
                self.diagnostics.warn(
                    codes::INVALID_FIELD,
                    format!("tables.{}", table.name),
                    "skipping table without a well-formed field",
                );
            }
        }
        tables
    }

    /// Well-formed fields of `table`; the rest are reported and skipped.
    pub(crate) fn fields(&mut self, table: &'a Table) -> Vec<&'a Field> {
        let mut fields = Vec::with_capacity(table.fields.len());
        for (position, field) in table.fields.iter().enumerate() {
            if field.is_well_formed() {
                fields.push(field);
            } else {
                self.diagnostics.warn(
                    codes::INVALID_FIELD,
                    format!("tables.{}.fields[{position}]", table.name),
                    "skipping field without a name or a type",
                );
            }
        }
        fields
    }

    pub(crate) fn column_kind(&self, field: &Field) -> ColumnKind<'a> {
        let diagram = self.diagram;
        let base = TypeName::parse(&field.data_type).base;
        if let Some(item) = diagram.enum_by_name(&base) {
            ColumnKind::Enum(item)
        } else if let Some(item) = diagram.custom_type_by_name(&base) {
            ColumnKind::Custom(item)
        } else {
            ColumnKind::Plain
        }
    }

    /// Declared type rendered for the dialect, with sized types widened.
    pub(crate) fn plain_type(&self, raw_type: &str) -> String {
        widen_type(self.dialect, raw_type)
    }

    /// `DEFAULT ...` for a field, if it has a default value.
    pub(crate) fn default_clause(&self, field: &Field, rendered_type: &str) -> Option<String> {
        if field.default.trim().is_empty() {
            return None;
        }
        Some(format!(
            "DEFAULT {}",
            format_default(self.dialect, rendered_type, &field.default)
        ))
    }

    /// `CHECK(...)` for a field when its type allows one.
    pub(crate) fn check_clause(
        &mut self,
        table: &Table,
        field: &Field,
        rendered_type: &str,
    ) -> Option<String> {
        if field.check.trim().is_empty() {
            return None;
        }
        let allowed = type_info(self.dialect, rendered_type)
            .map(|info| info.has_check)
            .unwrap_or(false);
        if allowed {
            Some(format!("CHECK({})", field.check.trim()))
        } else {
            self.diagnostics.warn(
                codes::UNSUPPORTED,
                format!("tables.{}.fields.{}", table.name, field.name),
                format!("type {rendered_type} does not take a CHECK clause in {}", self.dialect),
            );
            None
        }
    }

    /// `col IN ('a', 'b')` check body for enum-typed columns.
    pub(crate) fn enum_check(&self, field: &Field, item: &EnumType) -> String {
        format!("CHECK({} IN ({}))", self.ident(&field.name), literal_list(&item.values))
    }

    /// `PRIMARY KEY(...)` over the given fields, if any are primary.
    pub(crate) fn primary_key(&self, fields: &[&Field]) -> Option<String> {
        let keys: Vec<&str> = fields
            .iter()
            .filter(|field| field.primary)
            .map(|field| field.name.as_str())
            .collect();
        if keys.is_empty() {
            None
        } else {
            Some(format!("PRIMARY KEY({})", self.ident_list(keys)))
        }
    }

    /// Resolve every relationship in diagram order, reporting dangling ones.
    pub(crate) fn foreign_keys(&mut self) -> Vec<ForeignKey<'a>> {
        let diagram = self.diagram;
        let mut keys = Vec::with_capacity(diagram.relationships.len());
        for relationship in &diagram.relationships {
            let start = diagram.resolve(relationship.start.table, relationship.start.field);
            let end = diagram.resolve(relationship.end.table, relationship.end.field);
            let (Some((table, field)), Some((target, target_field))) = (start, end) else {
                self.diagnostics.warn(
                    codes::DANGLING_REFERENCE,
                    format!("relationships.{}", relationship.name),
                    "skipping foreign key with an unresolved endpoint",
                );
                continue;
            };
            if !field.is_well_formed() || !target_field.is_well_formed() {
                self.diagnostics.warn(
                    codes::INVALID_FIELD,
                    format!("relationships.{}", relationship.name),
                    "skipping foreign key on a field without a name or a type",
                );
                continue;
            }
            let name = if relationship.name.trim().is_empty() {
                format!("fk_{}_{}_{}", table.name, field.name, target.name)
            } else {
                relationship.name.clone()
            };
            keys.push(ForeignKey {
                name,
                table,
                field,
                target,
                target_field,
                on_update: relationship.on_update,
                on_delete: relationship.on_delete,
            });
        }
        keys
    }

    /// `FOREIGN KEY(a) REFERENCES t(b) ON UPDATE X ON DELETE Y`.
    pub(crate) fn references(&self, key: &ForeignKey<'_>) -> String {
        format!(
            "FOREIGN KEY({}) REFERENCES {}({}) ON UPDATE {} ON DELETE {}",
            self.ident(&key.field.name),
            self.ident(&key.target.name),
            self.ident(&key.target_field.name),
            key.on_update.as_sql(),
            key.on_delete.as_sql()
        )
    }

    /// `ALTER TABLE ... ADD CONSTRAINT` statement for dialects that add
    /// foreign keys after every table exists.
    pub(crate) fn alter_foreign_key(&self, key: &ForeignKey<'_>) -> String {
        format!(
            "ALTER TABLE {}\nADD CONSTRAINT {} {};",
            self.ident(&key.table.name),
            self.ident(&key.name),
            self.references(key)
        )
    }

    /// `CREATE [UNIQUE] INDEX` statements for `table`.
    pub(crate) fn indices(&mut self, table: &'a Table) -> Vec<String> {
        let mut statements = Vec::with_capacity(table.indices.len());
        for (position, index) in table.indices.iter().enumerate() {
            let name = if index.name.trim().is_empty() {
                format!("{}_index_{position}", table.name)
            } else {
                index.name.clone()
            };
            let path = format!("tables.{}.indices.{name}", table.name);

            let mut columns = Vec::with_capacity(index.fields.len());
            for field_id in &index.fields {
                match table.field(*field_id) {
                    Some(field) if field.is_well_formed() => columns.push(field.name.as_str()),
                    _ => self.diagnostics.warn(
                        codes::DANGLING_REFERENCE,
                        &path,
                        format!("index column {field_id} does not resolve"),
                    ),
                }
            }
            if columns.is_empty() {
                self.diagnostics.warn(
                    codes::DANGLING_REFERENCE,
                    &path,
                    "skipping index without resolvable columns",
                );
                continue;
            }

            statements.push(format!(
                "CREATE {}INDEX {} ON {} ({});",
                if index.unique { "UNIQUE " } else { "" },
                self.ident(&name),
                self.ident(&table.name),
                self.ident_list(columns)
            ));
        }
        statements
    }
}

/// Single-quoted SQL string literal.
pub(crate) fn literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

pub(crate) fn literal_list(values: &[String]) -> String {
    values
        .iter()
        .map(|value| literal(value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `-- ` comment lines, one per line of `text`, each prefixed with `indent`.
pub(crate) fn line_comment(indent: &str, text: &str) -> String {
    text.lines()
        .map(|line| format!("{indent}-- {}\n", line.trim_end()))
        .collect()
}

/// Column definition assembled from optional parts separated by spaces.
pub(crate) fn column_line(parts: Vec<Option<String>>) -> String {
    let parts: Vec<String> = parts.into_iter().flatten().collect();
    format!("\t{}", parts.join(" "))
}

/// `CREATE TABLE name (\n\t...\n)` around the given body lines.
pub(crate) fn create_table(name: &str, body: &[String], suffix: &str) -> String {
    format!("CREATE TABLE {name} (\n{}\n){suffix};", body.join(",\n"))
}
