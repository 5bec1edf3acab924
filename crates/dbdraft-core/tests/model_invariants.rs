use dbdraft_core::{
    Cardinality, CustomType, Diagram, Endpoint, EnumType, Error, Field, FieldId, FkAction, Index,
    NewRelationship, Table, TableId, TypeField, TypePatch, codes, ensure_valid, validate_diagram,
};

fn table_with_fields(diagram: &mut Diagram, name: &str, fields: &[&str]) -> TableId {
    let mut table = Table::new(name);
    for field in fields {
        table.fields.push(Field::new(*field, "INT"));
    }
    diagram.add_table(table)
}

#[test]
fn positions_stay_contiguous_after_adds_and_deletes() {
    let mut diagram = Diagram::default();
    let table = table_with_fields(&mut diagram, "metrics", &["a", "b", "c", "d"]);

    let ids: Vec<FieldId> = diagram
        .table(table)
        .expect("table")
        .fields
        .iter()
        .map(|field| field.id)
        .collect();
    diagram.delete_field(table, ids[1]).expect("delete b");
    diagram
        .add_field(table, Field::new("e", "INT"))
        .expect("add e");
    diagram.delete_field(table, ids[0]).expect("delete a");

    let owner = diagram.table(table).expect("table");
    let names: Vec<&str> = owner.fields.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(names, vec!["c", "d", "e"]);
    for (expected, field) in owner.fields.iter().enumerate() {
        assert_eq!(owner.field_position(field.id), Some(expected));
    }
}

#[test]
fn add_table_remaps_index_fields_to_fresh_ids() {
    let mut diagram = Diagram::default();
    let mut table = Table::new("events");
    let mut kind = Field::new("kind", "VARCHAR(20)");
    kind.id = FieldId(7);
    table.fields.push(kind);
    table
        .indices
        .push(Index::new("events_kind", vec![FieldId(7)], false));

    let id = diagram.add_table(table);
    let stored = diagram.table(id).expect("table");
    assert_eq!(stored.indices[0].fields, vec![stored.fields[0].id]);
    assert!(validate_diagram(&diagram).is_ok());
}

#[test]
fn relationship_endpoints_must_exist() {
    let mut diagram = Diagram::default();
    let users = table_with_fields(&mut diagram, "users", &["id"]);
    let field = diagram.table(users).expect("users").fields[0].id;

    let result = diagram.add_relationship(NewRelationship {
        name: "broken".to_string(),
        start: Endpoint::new(users, field),
        end: Endpoint::new(TableId(42), FieldId(0)),
        cardinality: Cardinality::OneToOne,
        on_update: FkAction::NoAction,
        on_delete: FkAction::NoAction,
    });
    assert!(matches!(result, Err(Error::InvalidReference(_))));
    assert!(diagram.relationships.is_empty());
}

#[test]
fn validation_reports_structural_problems() {
    let mut diagram = Diagram::default();
    let first = table_with_fields(&mut diagram, "dup", &["id", "id"]);
    table_with_fields(&mut diagram, "dup", &["id"]);
    diagram
        .add_field(first, Field::new("", "INT"))
        .expect("add nameless field");
    diagram.add_enum(EnumType::new(
        "mood",
        vec!["ok".to_string(), "ok".to_string()],
    ));

    let report = validate_diagram(&diagram);
    assert!(!report.is_ok());
    assert!(report.has_code(codes::DUPLICATE_NAME));
    assert!(report.has_code(codes::INVALID_FIELD));
    assert!(report.has_code(codes::DUPLICATE_VALUE));
    assert!(matches!(ensure_valid(&diagram), Err(Error::InvalidSchema(_))));
}

#[test]
fn type_rename_reports_retyped_fields_and_can_be_reverted() {
    let mut diagram = Diagram::default();
    let point = diagram.add_type(CustomType::new(
        "point",
        vec![TypeField::new("x", "REAL"), TypeField::new("y", "REAL")],
    ));
    let shapes = table_with_fields(&mut diagram, "shapes", &["id"]);
    let origin = diagram
        .add_field(shapes, Field::new("origin", "point"))
        .expect("origin");
    let target = diagram
        .add_field(shapes, Field::new("target", "COORD"))
        .expect("target");

    let renamed = diagram
        .update_type(
            point,
            &TypePatch {
                name: Some("coord".to_string()),
            },
        )
        .expect("rename type");
    assert_eq!(renamed.fields.len(), 1);
    assert_eq!(renamed.fields[0].field, origin);

    let (_, field) = diagram.resolve(shapes, origin).expect("origin");
    assert_eq!(field.data_type, "COORD");

    diagram.patch_type(point, &renamed.inverse).expect("revert");
    diagram
        .retype_fields(&renamed.fields, false)
        .expect("retype back");
    let type_of = |diagram: &Diagram, id| {
        diagram
            .resolve(shapes, id)
            .map(|(_, field)| field.data_type.clone())
    };
    assert_eq!(type_of(&diagram, origin).as_deref(), Some("point"));
    assert_eq!(type_of(&diagram, target).as_deref(), Some("COORD"));
    assert_eq!(diagram.custom_type(point).expect("type").name, "point");
}
