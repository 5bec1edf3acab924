use dbdraft_core::{
    Cardinality, Diagram, Dialect, Endpoint, EnumType, Field, FkAction, Index, NewRelationship,
    Note, Position, Table, codes,
};
use dbdraft_dbml::{DbmlError, export_dbml, import_dbml};
use dbdraft_sql::export_sql;

const SHOP_DBML: &str = "enum order_status {
\tpending
\tshipped
}

Table users {
\tid integer [primary key, increment, not null]
\temail varchar(255) [not null, unique]

\tNote: 'accounts'
}

Table orders [headercolor: #ff9900] {
\tid integer [primary key, not null]
\tuser_id integer [not null]
\tstatus order_status [default: 'pending']
\tcreated_at timestamp [default: `now()`]

\tindexes {
\t\t(user_id, status) [name: 'orders_user_status']
\t}
}

Ref fk_orders_user_id_users {
\torders.user_id > users.id [delete: cascade, update: no action]
}

Note todo {
\t'ship it'
}";

fn shop() -> Diagram {
    let mut diagram = Diagram::new("shop", Dialect::PostgreSql);
    diagram.add_enum(EnumType::new(
        "order_status",
        vec!["pending".to_string(), "shipped".to_string()],
    ));

    let users = diagram.add_table(Table::new("users").with_comment("accounts"));
    let users_id = diagram
        .add_field(users, Field::new("id", "INTEGER").primary().increment())
        .expect("users.id");
    diagram
        .add_field(users, Field::new("email", "VARCHAR").not_null().unique())
        .expect("users.email");

    let mut orders_table = Table::new("orders");
    orders_table.color = "#ff9900".to_string();
    let orders = diagram.add_table(orders_table);
    diagram
        .add_field(orders, Field::new("id", "INTEGER").primary())
        .expect("orders.id");
    let user_id = diagram
        .add_field(orders, Field::new("user_id", "INTEGER").not_null())
        .expect("orders.user_id");
    let status = diagram
        .add_field(
            orders,
            Field::new("status", "ORDER_STATUS").with_default("pending"),
        )
        .expect("orders.status");
    diagram
        .add_field(
            orders,
            Field::new("created_at", "TIMESTAMP").with_default("now()"),
        )
        .expect("orders.created_at");
    diagram
        .add_index(
            orders,
            Index::new("orders_user_status", vec![user_id, status], false),
        )
        .expect("index");

    diagram
        .add_relationship(NewRelationship {
            name: "fk_orders_user_id_users".to_string(),
            start: Endpoint::new(orders, user_id),
            end: Endpoint::new(users, users_id),
            cardinality: Cardinality::ManyToOne,
            on_update: FkAction::NoAction,
            on_delete: FkAction::Cascade,
        })
        .expect("relationship");

    diagram.add_note(Note::new("todo", "ship it", Position::default()));
    diagram
}

#[test]
fn exports_golden_dbml() {
    assert_eq!(export_dbml(&shop()), SHOP_DBML);
}

#[test]
fn export_of_an_import_is_stable() {
    let import = import_dbml(SHOP_DBML).expect("import");
    assert!(import.diagnostics.is_empty(), "{:?}", import.diagnostics);
    assert_eq!(export_dbml(&import.diagram), SHOP_DBML);
}

#[test]
fn import_uppercases_types_and_keeps_settings() {
    let diagram = import_dbml(SHOP_DBML).expect("import").diagram;
    let orders = diagram.table_by_name("orders").expect("orders");
    let status = orders.field_by_name("status").expect("status");
    assert_eq!(status.data_type, "ORDER_STATUS");
    assert_eq!(status.default, "pending");
    assert_eq!(orders.color, "#ff9900");

    let users = diagram.table_by_name("users").expect("users");
    assert_eq!(users.comment, "accounts");
    assert_eq!(users.color, "#175e7a");
    assert!(users.fields[0].increment);

    assert_eq!(diagram.enums[0].values, vec!["pending", "shipped"]);
    assert_eq!(diagram.notes[0].content, "ship it");
}

#[test]
fn dangling_ref_is_dropped_with_a_warning() {
    let import = import_dbml("Table t { id int [pk] }\nRef { t.id > missing.col }").expect("import");

    assert_eq!(import.diagram.tables.len(), 1);
    assert_eq!(import.diagram.tables[0].fields.len(), 1);
    assert!(import.diagram.relationships.is_empty());
    assert!(import.diagnostics.has_code(codes::DANGLING_REFERENCE));
    assert!(import.diagnostics.is_ok());

    let id = &import.diagram.tables[0].fields[0];
    assert!(id.primary);
    assert!(!id.not_null);
}

#[test]
fn unknown_ref_column_is_dropped() {
    let import = import_dbml(
        "Table a { id int }
         Table b { a_id int }
         Ref: b.missing > a.id",
    )
    .expect("import");
    assert!(import.diagram.relationships.is_empty());
    assert_eq!(import.diagnostics.warnings.len(), 1);
    assert_eq!(import.diagnostics.warnings[0].path, "refs[0]");
}

#[test]
fn aliases_and_inline_refs_resolve_to_tables() {
    let import = import_dbml(
        "Table users as U { id int [pk] }
         Table posts { author int [ref: > U.id] }",
    )
    .expect("import");
    let diagram = &import.diagram;
    assert_eq!(diagram.relationships.len(), 1);

    let relationship = &diagram.relationships[0];
    assert_eq!(relationship.name, "fk_posts_author_users");
    assert_eq!(relationship.cardinality, Cardinality::ManyToOne);
    assert_eq!(relationship.on_delete, FkAction::NoAction);
    let (table, field) = diagram
        .resolve(relationship.end.table, relationship.end.field)
        .expect("end");
    assert_eq!((table.name.as_str(), field.name.as_str()), ("users", "id"));
}

#[test]
fn relation_tokens_map_to_cardinalities() {
    let import = import_dbml(
        "Table a { id int }
         Table b { id int }
         Ref: a.id < b.id
         Ref: a.id - b.id
         Ref: a.id <> b.id",
    )
    .expect("import");
    let cardinalities: Vec<Cardinality> = import
        .diagram
        .relationships
        .iter()
        .map(|relationship| relationship.cardinality)
        .collect();
    assert_eq!(
        cardinalities,
        vec![
            Cardinality::OneToMany,
            Cardinality::OneToOne,
            Cardinality::OneToOne
        ]
    );
    assert!(import.diagnostics.has_code(codes::UNSUPPORTED));
}

#[test]
fn composite_endpoints_use_their_first_column() {
    let import = import_dbml(
        "Table a { x int\n y int }
         Table b { x int\n y int }
         Ref pair: b.(x, y) > a.(x, y)",
    )
    .expect("import");
    let diagram = &import.diagram;
    let relationship = &diagram.relationships[0];
    assert_eq!(relationship.name, "pair");
    let (_, field) = diagram
        .resolve(relationship.start.table, relationship.start.field)
        .expect("start");
    assert_eq!(field.name, "x");
    assert_eq!(import.diagnostics.warnings.len(), 2);
}

#[test]
fn unknown_index_columns_are_reported() {
    let import = import_dbml(
        "Table t {
            a int
            b int
            indexes {
                (a, ghost)
                ghost
            }
        }",
    )
    .expect("import");
    let table = &import.diagram.tables[0];
    assert_eq!(table.indices.len(), 1);
    assert_eq!(table.indices[0].name, "t_index_0");
    assert_eq!(table.indices[0].fields, vec![table.fields[0].id]);
    assert_eq!(import.diagnostics.warnings.len(), 3);
}

#[test]
fn empty_source_is_rejected() {
    assert_eq!(import_dbml("  \n\t"), Err(DbmlError::EmptySource));
}

#[test]
fn parse_errors_carry_positions() {
    let error = import_dbml("Table t {\n  id int [pk\n}").expect_err("must fail");
    assert!(
        matches!(error, DbmlError::Parse { line: 3, column: 1, .. }),
        "{error}"
    );
}

#[test]
fn imported_diagrams_export_to_sql() {
    let mut diagram = import_dbml(SHOP_DBML).expect("import").diagram;
    diagram.database = Dialect::PostgreSql;

    let export = export_sql(&diagram, Dialect::PostgreSql).expect("sql");
    assert!(export.sql.contains("CREATE TYPE \"order_status\" AS ENUM ('pending', 'shipped');"));
    assert!(export.sql.contains("CREATE TABLE \"users\""));
    assert!(
        export
            .sql
            .contains("FOREIGN KEY(\"user_id\") REFERENCES \"users\"(\"id\")")
    );
}

#[test]
fn imported_tables_are_laid_out() {
    let diagram = import_dbml(SHOP_DBML).expect("import").diagram;
    assert_eq!(diagram.tables[0].position, Position::new(0.0, 0.0));
    assert_eq!(diagram.tables[1].position, Position::new(0.0, 209.0));
}

/// Content of a diagram with ids and positions replaced by names.
fn content(diagram: &Diagram) -> serde_json::Value {
    let field_name = |table: &Table, id| {
        table
            .field(id)
            .map(|field| field.name.clone())
            .unwrap_or_default()
    };
    let endpoint = |endpoint: &Endpoint| {
        diagram
            .resolve(endpoint.table, endpoint.field)
            .map(|(table, field)| format!("{}.{}", table.name, field.name))
            .unwrap_or_default()
    };
    serde_json::json!({
        "tables": diagram.tables.iter().map(|table| serde_json::json!({
            "name": table.name,
            "comment": table.comment,
            "color": table.color,
            "fields": table.fields.iter().map(|field| serde_json::json!({
                "name": field.name,
                "type": field.data_type,
                "default": field.default,
                "check": field.check,
                "flags": [field.primary, field.unique, field.not_null, field.increment],
                "comment": field.comment,
            })).collect::<Vec<_>>(),
            "indices": table.indices.iter().map(|index| serde_json::json!({
                "name": index.name,
                "unique": index.unique,
                "fields": index.fields.iter().map(|id| field_name(table, *id)).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
        "relationships": diagram.relationships.iter().map(|relationship| serde_json::json!({
            "name": relationship.name,
            "start": endpoint(&relationship.start),
            "end": endpoint(&relationship.end),
            "cardinality": relationship.cardinality,
            "on_update": relationship.on_update,
            "on_delete": relationship.on_delete,
        })).collect::<Vec<_>>(),
        "enums": diagram.enums.iter().map(|item| serde_json::json!({
            "name": item.name,
            "values": item.values,
        })).collect::<Vec<_>>(),
        "notes": diagram.notes.iter().map(|note| serde_json::json!({
            "title": note.title,
            "content": note.content,
        })).collect::<Vec<_>>(),
    })
}

fn ledger() -> Diagram {
    let mut diagram = Diagram::new("ledger", Dialect::PostgreSql);
    diagram.add_enum(EnumType::new(
        "entry_kind",
        vec!["debit".to_string(), "credit".to_string()],
    ));

    let accounts = diagram.add_table(Table::new("accounts").with_comment("chart of accounts"));
    let account_id = diagram
        .add_field(accounts, Field::new("id", "INTEGER").primary().increment())
        .expect("accounts.id");
    diagram
        .add_field(
            accounts,
            Field::new("code", "VARCHAR(12)")
                .not_null()
                .unique()
                .with_default("'x'")
                .with_comment("ledger code"),
        )
        .expect("accounts.code");
    diagram
        .add_field(accounts, Field::new("active", "BOOLEAN").with_default("TRUE"))
        .expect("accounts.active");

    let mut entries_table = Table::new("entries");
    entries_table.color = "#336699".to_string();
    let entries = diagram.add_table(entries_table);
    diagram
        .add_field(entries, Field::new("id", "BIGINT").primary())
        .expect("entries.id");
    let entry_account = diagram
        .add_field(entries, Field::new("account_id", "INTEGER").not_null())
        .expect("entries.account_id");
    let amount = diagram
        .add_field(
            entries,
            Field::new("amount", "NUMERIC(12,2)")
                .with_default("0")
                .with_check("amount >= 0"),
        )
        .expect("entries.amount");
    diagram
        .add_field(entries, Field::new("kind", "ENTRY_KIND").with_default("debit"))
        .expect("entries.kind");
    diagram
        .add_field(entries, Field::new("booked_at", "TIMESTAMP").with_default("now()"))
        .expect("entries.booked_at");
    diagram
        .add_index(
            entries,
            Index::new("entries_account_amount", vec![entry_account, amount], true),
        )
        .expect("index");

    diagram
        .add_relationship(NewRelationship {
            name: "entries_account".to_string(),
            start: Endpoint::new(entries, entry_account),
            end: Endpoint::new(accounts, account_id),
            cardinality: Cardinality::ManyToOne,
            on_update: FkAction::Restrict,
            on_delete: FkAction::SetNull,
        })
        .expect("relationship");

    diagram.add_note(Note::new("close", "month end", Position::default()));
    diagram
}

#[test]
fn import_of_an_export_keeps_the_model() {
    let model = ledger();
    let import = import_dbml(&export_dbml(&model)).expect("import");

    assert!(import.diagnostics.is_empty(), "{:?}", import.diagnostics);
    assert_eq!(content(&import.diagram), content(&model));

    let accounts = import.diagram.table_by_name("accounts").expect("accounts");
    assert_eq!(accounts.field_by_name("code").expect("code").default, "'x'");
    assert_eq!(accounts.field_by_name("active").expect("active").default, "TRUE");
}

#[test]
fn unnamed_refs_come_back_with_their_constraint_name() {
    let mut model = Diagram::new("pair", Dialect::PostgreSql);
    let a = model.add_table(Table::new("a"));
    let a_id = model
        .add_field(a, Field::new("id", "INTEGER").primary())
        .expect("a.id");
    let b = model.add_table(Table::new("b"));
    let b_a_id = model
        .add_field(b, Field::new("a_id", "INTEGER"))
        .expect("b.a_id");
    model
        .add_relationship(NewRelationship {
            name: String::new(),
            start: Endpoint::new(b, b_a_id),
            end: Endpoint::new(a, a_id),
            cardinality: Cardinality::ManyToOne,
            on_update: FkAction::NoAction,
            on_delete: FkAction::NoAction,
        })
        .expect("relationship");

    let dbml = export_dbml(&model);
    assert!(dbml.contains("Ref fk_b_a_id_a {"), "{dbml}");

    let mut imported = import_dbml(&dbml).expect("import").diagram;
    assert_eq!(imported.relationships[0].name, "fk_b_a_id_a");
    assert_eq!(export_dbml(&imported), dbml);

    imported.database = Dialect::PostgreSql;
    for dialect in [Dialect::PostgreSql, Dialect::MySql, Dialect::Sqlite] {
        assert_eq!(
            export_sql(&imported, dialect).expect("imported sql").sql,
            export_sql(&model, dialect).expect("model sql").sql,
            "{dialect}"
        );
    }
}
