use dbdraft_core::{
    Cardinality, Diagram, Dialect, Endpoint, EnumType, Error, Field, FieldId, FkAction, Index,
    NewRelationship, Table, TableId, codes,
};
use dbdraft_sql::{SUPPORTED_DIALECTS, export_sql};

struct Shop {
    diagram: Diagram,
    orders: TableId,
}

/// `orders` is added before `users` so ordering has to come from the foreign key.
fn shop() -> Shop {
    let mut diagram = Diagram::default();
    let orders = diagram.add_table(Table::new("orders"));
    diagram
        .add_field(orders, Field::new("id", "INT").primary())
        .expect("orders.id");
    let user_id = diagram
        .add_field(orders, Field::new("user_id", "INT").not_null())
        .expect("orders.user_id");
    diagram
        .add_index(orders, Index::new("orders_user_id", vec![user_id], false))
        .expect("index");

    let users = diagram.add_table(Table::new("users"));
    let users_id = diagram
        .add_field(users, Field::new("id", "INT").primary().increment())
        .expect("users.id");
    diagram
        .add_field(users, Field::new("name", "VARCHAR"))
        .expect("users.name");

    diagram
        .add_relationship(NewRelationship {
            name: "fk_orders_users".to_string(),
            start: Endpoint::new(orders, user_id),
            end: Endpoint::new(users, users_id),
            cardinality: Cardinality::ManyToOne,
            on_update: FkAction::Cascade,
            on_delete: FkAction::SetNull,
        })
        .expect("relationship");

    Shop { diagram, orders }
}

fn sql(diagram: &Diagram, dialect: Dialect) -> String {
    export_sql(diagram, dialect).expect("export").sql
}

#[test]
fn mysql_adds_foreign_keys_after_tables() {
    let expected = "CREATE TABLE `users` (
\t`id` INT NOT NULL AUTO_INCREMENT,
\t`name` VARCHAR(255),
\tPRIMARY KEY(`id`)
);

CREATE TABLE `orders` (
\t`id` INT NOT NULL,
\t`user_id` INT NOT NULL,
\tPRIMARY KEY(`id`)
);
CREATE INDEX `orders_user_id` ON `orders` (`user_id`);

ALTER TABLE `orders`
ADD CONSTRAINT `fk_orders_users` FOREIGN KEY(`user_id`) REFERENCES `users`(`id`) ON UPDATE CASCADE ON DELETE SET NULL;";

    assert_eq!(sql(&shop().diagram, Dialect::MySql), expected);
    assert_eq!(sql(&shop().diagram, Dialect::MariaDb), expected);
}

#[test]
fn postgres_uses_identity_columns() {
    let expected = "CREATE TABLE \"users\" (
\t\"id\" INT NOT NULL GENERATED BY DEFAULT AS IDENTITY,
\t\"name\" VARCHAR(255),
\tPRIMARY KEY(\"id\")
);

CREATE TABLE \"orders\" (
\t\"id\" INT NOT NULL,
\t\"user_id\" INT NOT NULL,
\tPRIMARY KEY(\"id\")
);
CREATE INDEX \"orders_user_id\" ON \"orders\" (\"user_id\");

ALTER TABLE \"orders\"
ADD CONSTRAINT \"fk_orders_users\" FOREIGN KEY(\"user_id\") REFERENCES \"users\"(\"id\") ON UPDATE CASCADE ON DELETE SET NULL;";

    assert_eq!(sql(&shop().diagram, Dialect::PostgreSql), expected);
}

#[test]
fn sqlite_inlines_foreign_keys_and_rowid_alias() {
    let expected = "CREATE TABLE \"users\" (
\t\"id\" INTEGER PRIMARY KEY AUTOINCREMENT,
\t\"name\" VARCHAR
);

CREATE TABLE \"orders\" (
\t\"id\" INT NOT NULL,
\t\"user_id\" INT NOT NULL,
\tPRIMARY KEY(\"id\"),
\tFOREIGN KEY(\"user_id\") REFERENCES \"users\"(\"id\") ON UPDATE CASCADE ON DELETE SET NULL
);
CREATE INDEX \"orders_user_id\" ON \"orders\" (\"user_id\");";

    assert_eq!(sql(&shop().diagram, Dialect::Sqlite), expected);
}

#[test]
fn mssql_inlines_named_constraints() {
    let expected = "CREATE TABLE [users] (
\t[id] INT IDENTITY(1,1) NOT NULL,
\t[name] VARCHAR(255) NULL,
\tPRIMARY KEY([id])
);

CREATE TABLE [orders] (
\t[id] INT NOT NULL,
\t[user_id] INT NOT NULL,
\tPRIMARY KEY([id]),
\tCONSTRAINT [fk_orders_users] FOREIGN KEY([user_id]) REFERENCES [users]([id]) ON UPDATE CASCADE ON DELETE SET NULL
);
CREATE INDEX [orders_user_id] ON [orders] ([user_id]);";

    assert_eq!(sql(&shop().diagram, Dialect::MsSql), expected);
}

#[test]
fn referenced_tables_come_first_in_every_dialect() {
    let shop = shop();
    for dialect in SUPPORTED_DIALECTS {
        let text = sql(&shop.diagram, dialect);
        let created: Vec<&str> = text
            .lines()
            .filter(|line| line.starts_with("CREATE TABLE"))
            .collect();
        assert_eq!(created.len(), 2, "{dialect}: {text}");
        assert!(created[0].contains("users"), "{dialect}: {text}");
        assert!(created[1].contains("orders"), "{dialect}: {text}");
        assert!(text.contains("ON UPDATE CASCADE ON DELETE SET NULL"));
    }
}

#[test]
fn enums_follow_each_dialect_policy() {
    let mut shop = shop();
    shop.diagram.add_enum(EnumType::new(
        "order_status",
        vec!["open".to_string(), "paid".to_string()],
    ));
    shop.diagram
        .add_field(
            shop.orders,
            Field::new("status", "order_status")
                .not_null()
                .with_default("open"),
        )
        .expect("status");

    let mysql = sql(&shop.diagram, Dialect::MySql);
    assert!(mysql.contains("\t`status` ENUM('open', 'paid') NOT NULL DEFAULT 'open'"));

    let postgres = sql(&shop.diagram, Dialect::PostgreSql);
    assert!(postgres.starts_with("CREATE TYPE \"order_status\" AS ENUM ('open', 'paid');\n\n"));
    assert!(postgres.contains("\t\"status\" \"order_status\" NOT NULL DEFAULT 'open'"));

    let sqlite = sql(&shop.diagram, Dialect::Sqlite);
    assert!(sqlite.contains(
        "\t\"status\" TEXT NOT NULL DEFAULT 'open' CHECK(\"status\" IN ('open', 'paid'))"
    ));

    let mssql = sql(&shop.diagram, Dialect::MsSql);
    assert!(mssql.contains(
        "\t[status] NVARCHAR(255) NOT NULL DEFAULT 'open' CHECK([status] IN ('open', 'paid'))"
    ));
}

#[test]
fn comments_use_each_dialect_syntax() {
    let mut diagram = Diagram::default();
    let mut table = Table::new("notes").with_comment("free text");
    table
        .fields
        .push(Field::new("body", "TEXT").with_comment("markdown"));
    diagram.add_table(table);

    let mysql = sql(&diagram, Dialect::MySql);
    assert!(mysql.contains("\t`body` TEXT COMMENT 'markdown'"));
    assert!(mysql.ends_with(") COMMENT 'free text';"));

    let postgres = sql(&diagram, Dialect::PostgreSql);
    assert!(postgres.contains("COMMENT ON TABLE \"notes\" IS 'free text';"));
    assert!(postgres.contains("COMMENT ON COLUMN \"notes\".\"body\" IS 'markdown';"));

    let mssql = sql(&diagram, Dialect::MsSql);
    assert!(mssql.starts_with("-- free text\nCREATE TABLE [notes] (\n\t-- markdown\n\t[body] TEXT NULL\n);"));
}

#[test]
fn malformed_fields_and_dangling_indices_are_skipped() {
    let mut diagram = Diagram::default();
    let table = diagram.add_table(Table::new("logs"));
    diagram
        .add_field(table, Field::new("id", "INT").primary())
        .expect("id");
    let message = diagram
        .add_field(table, Field::new("message", "TEXT"))
        .expect("message");
    diagram
        .add_field(table, Field::new("", "TEXT"))
        .expect("nameless");
    diagram
        .add_field(table, Field::new("level", ""))
        .expect("typeless");
    diagram
        .add_index(table, Index::new("logs_message", vec![message], false))
        .expect("index");
    diagram.delete_field(table, message).expect("drop message");
    // Hand-edited documents may still carry stale members.
    diagram.tables[0].indices[0].fields.push(FieldId(999));

    let export = export_sql(&diagram, Dialect::PostgreSql).expect("export");
    assert_eq!(
        export.sql,
        "CREATE TABLE \"logs\" (\n\t\"id\" INT NOT NULL,\n\tPRIMARY KEY(\"id\")\n);"
    );
    assert_eq!(
        export
            .diagnostics
            .warnings
            .iter()
            .filter(|issue| issue.code == codes::INVALID_FIELD)
            .count(),
        2
    );
    assert!(export.diagnostics.has_code(codes::DANGLING_REFERENCE));
}

#[test]
fn tables_without_usable_fields_are_skipped_in_every_dialect() {
    let mut diagram = Diagram::default();
    diagram.add_table(Table::new("empty"));
    let broken = diagram.add_table(Table::new("broken"));
    let nameless = diagram
        .add_field(broken, Field::new("", "INT"))
        .expect("nameless");
    // A stale index must not resurface for the skipped table.
    diagram.tables[1]
        .indices
        .push(Index::new("broken_idx", vec![nameless], false));
    let kept = diagram.add_table(Table::new("kept"));
    diagram
        .add_field(kept, Field::new("id", "INT").primary())
        .expect("kept.id");

    for dialect in SUPPORTED_DIALECTS {
        let export = export_sql(&diagram, dialect).expect("export");
        assert!(!export.sql.contains("empty"), "{dialect}: {}", export.sql);
        assert!(!export.sql.contains("broken"), "{dialect}: {}", export.sql);
        assert!(!export.sql.contains("(\n\n)"), "{dialect}: {}", export.sql);
        assert!(export.sql.starts_with("CREATE TABLE"), "{dialect}: {}", export.sql);
        assert_eq!(
            export
                .diagnostics
                .warnings
                .iter()
                .filter(|issue| issue.code == codes::INVALID_FIELD)
                .count(),
            2,
            "{dialect}"
        );
    }
}

#[test]
fn check_clauses_need_a_check_capable_type() {
    let mut diagram = Diagram::default();
    let table = diagram.add_table(Table::new("items"));
    diagram
        .add_field(table, Field::new("qty", "INT").with_check("qty > 0"))
        .expect("qty");
    diagram
        .add_field(table, Field::new("flag", "BOOLEAN").with_check("flag"))
        .expect("flag");

    let export = export_sql(&diagram, Dialect::MySql).expect("export");
    assert!(export.sql.contains("\t`qty` INT CHECK(qty > 0)"));
    assert!(export.sql.contains("\t`flag` BOOLEAN\n"));
    assert!(export.diagnostics.has_code(codes::UNSUPPORTED));
}

#[test]
fn empty_diagram_exports_nothing() {
    let export = export_sql(&Diagram::default(), Dialect::MySql).expect("export");
    assert_eq!(export.sql, "");
    assert!(export.diagnostics.is_empty());
}

#[test]
fn generic_dialect_is_unsupported() {
    let result = export_sql(&shop().diagram, Dialect::Generic);
    assert!(matches!(result, Err(Error::Unsupported(_))));
}
