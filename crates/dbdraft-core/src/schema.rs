use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constraints::Relationship;
use crate::ids::{
    AreaId, EnumId, FieldId, IdSequence, IndexId, NoteId, RelationshipId, TableId, TypeId,
};
use crate::types::Dialect;

/// Default header color for new tables.
pub const DEFAULT_TABLE_COLOR: &str = "#175e7a";

/// Canvas coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pan and zoom of the editing canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Viewport {
    pub pan: Position,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Position::default(),
            zoom: 1.0,
        }
    }
}

/// The single editable schema of one open diagram.
///
/// Deserializing advances the id counter past every id in the document, so a
/// missing or stale `sequence` never leads to reused ids.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct Diagram {
    pub title: String,
    /// Dialect the diagram is designed for; drives default-literal rules.
    pub database: Dialect,
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
    pub enums: Vec<EnumType>,
    pub types: Vec<CustomType>,
    pub areas: Vec<Area>,
    pub notes: Vec<Note>,
    pub viewport: Viewport,
    #[serde(default)]
    pub(crate) sequence: IdSequence,
}

/// A table with ordered fields and indices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub comment: String,
    pub color: String,
    pub position: Position,
    pub fields: Vec<Field>,
    pub indices: Vec<Index>,
}

/// Column of a table. `default`, `check` and `comment` are raw text; an empty
/// string means unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    pub data_type: String,
    pub default: String,
    pub check: String,
    pub primary: bool,
    pub unique: bool,
    pub not_null: bool,
    pub increment: bool,
    pub comment: String,
}

/// Index over an ordered list of fields of the owning table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Index {
    pub id: IndexId,
    pub name: String,
    pub fields: Vec<FieldId>,
    pub unique: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct EnumType {
    pub id: EnumId,
    pub name: String,
    pub values: Vec<String>,
}

/// Composite user-defined type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct CustomType {
    pub id: TypeId,
    pub name: String,
    pub fields: Vec<TypeField>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct TypeField {
    pub name: String,
    pub data_type: String,
}

/// Colored rectangle grouping tables on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    pub position: Position,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

/// Sticky note on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub position: Position,
    pub color: String,
}

/// Diagrams compare by content; the id sequence is bookkeeping.
#[derive(Deserialize)]
struct DiagramDocument {
    title: String,
    database: Dialect,
    tables: Vec<Table>,
    relationships: Vec<Relationship>,
    enums: Vec<EnumType>,
    types: Vec<CustomType>,
    areas: Vec<Area>,
    notes: Vec<Note>,
    viewport: Viewport,
    #[serde(default)]
    sequence: IdSequence,
}

impl From<DiagramDocument> for Diagram {
    fn from(document: DiagramDocument) -> Self {
        let mut diagram = Diagram {
            title: document.title,
            database: document.database,
            tables: document.tables,
            relationships: document.relationships,
            enums: document.enums,
            types: document.types,
            areas: document.areas,
            notes: document.notes,
            viewport: document.viewport,
            sequence: document.sequence,
        };
        diagram.reseat_sequence();
        diagram
    }
}

impl<'de> Deserialize<'de> for Diagram {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        DiagramDocument::deserialize(deserializer).map(Diagram::from)
    }
}

impl PartialEq for Diagram {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
            && self.database == other.database
            && self.tables == other.tables
            && self.relationships == other.relationships
            && self.enums == other.enums
            && self.types == other.types
            && self.areas == other.areas
            && self.notes == other.notes
            && self.viewport == other.viewport
    }
}

impl Table {
    /// Create a detached table. Ids are assigned when it is added to a diagram.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TableId(0),
            name: name.into(),
            comment: String::new(),
            color: DEFAULT_TABLE_COLOR.to_string(),
            position: Position::default(),
            fields: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn field_position(&self, id: FieldId) -> Option<usize> {
        self.fields.iter().position(|field| field.id == id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn index(&self, id: IndexId) -> Option<&Index> {
        self.indices.iter().find(|index| index.id == id)
    }

    pub fn index_position(&self, id: IndexId) -> Option<usize> {
        self.indices.iter().position(|index| index.id == id)
    }

    /// Fields flagged as primary key, in column order.
    pub fn primary_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.primary)
    }
}

impl Field {
    /// Create a nullable field. Its id is assigned when it is added to a table.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            id: FieldId(0),
            name: name.into(),
            data_type: data_type.into(),
            default: String::new(),
            check: String::new(),
            primary: false,
            unique: false,
            not_null: false,
            increment: false,
            comment: String::new(),
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.not_null = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn increment(mut self) -> Self {
        self.increment = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.check = check.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// A field without a name or type cannot be exported.
    pub fn is_well_formed(&self) -> bool {
        !self.name.trim().is_empty() && !self.data_type.trim().is_empty()
    }
}

impl Index {
    pub fn new(name: impl Into<String>, fields: Vec<FieldId>, unique: bool) -> Self {
        Self {
            id: IndexId(0),
            name: name.into(),
            fields,
            unique,
        }
    }
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            id: EnumId(0),
            name: name.into(),
            values,
        }
    }
}

impl CustomType {
    pub fn new(name: impl Into<String>, fields: Vec<TypeField>) -> Self {
        Self {
            id: TypeId(0),
            name: name.into(),
            fields,
        }
    }
}

impl TypeField {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

impl Area {
    pub fn new(name: impl Into<String>, position: Position, width: f64, height: f64) -> Self {
        Self {
            id: AreaId(0),
            name: name.into(),
            position,
            width,
            height,
            color: DEFAULT_TABLE_COLOR.to_string(),
        }
    }
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>, position: Position) -> Self {
        Self {
            id: NoteId(0),
            title: title.into(),
            content: content.into(),
            position,
            color: "#fcf7ac".to_string(),
        }
    }
}

impl Diagram {
    pub fn new(title: impl Into<String>, database: Dialect) -> Self {
        Self {
            title: title.into(),
            database,
            ..Self::default()
        }
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.iter().find(|table| table.id == id)
    }

    pub fn table_position(&self, id: TableId) -> Option<usize> {
        self.tables.iter().position(|table| table.id == id)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.iter().find(|rel| rel.id == id)
    }

    pub fn relationship_position(&self, id: RelationshipId) -> Option<usize> {
        self.relationships.iter().position(|rel| rel.id == id)
    }

    pub fn enum_type(&self, id: EnumId) -> Option<&EnumType> {
        self.enums.iter().find(|item| item.id == id)
    }

    /// Enum whose name matches `name` ignoring ASCII case.
    pub fn enum_by_name(&self, name: &str) -> Option<&EnumType> {
        self.enums
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(name))
    }

    pub fn custom_type(&self, id: TypeId) -> Option<&CustomType> {
        self.types.iter().find(|item| item.id == id)
    }

    /// Custom type whose name matches `name` ignoring ASCII case.
    pub fn custom_type_by_name(&self, name: &str) -> Option<&CustomType> {
        self.types
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(name))
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.iter().find(|area| area.id == id)
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Resolve a relationship endpoint into its table and field.
    pub fn resolve(&self, table: TableId, field: FieldId) -> Option<(&Table, &Field)> {
        let table = self.table(table)?;
        let field = table.field(field)?;
        Some((table, field))
    }
}

/// Emit the JSON Schema for diagram documents.
pub fn diagram_json_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(Diagram)
}
