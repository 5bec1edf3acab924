//! Undoable action records.
//!
//! Every record carries enough state to be applied again (redo) or inverted
//! (undo) without consulting anything else: ADD keeps the created snapshot,
//! DELETE keeps the removed value with its cascade, EDIT keeps both patches.

use serde::{Deserialize, Serialize};

use dbdraft_core::{
    Area, AreaId, AreaPatch, CustomType, Diagram, EnumId, EnumPatch, EnumType, Field, FieldId,
    FieldPatch, FieldRef, FieldRemoval, Index, IndexId, IndexPatch, Note, NoteId, NotePatch,
    Position, Relationship, RelationshipId, RelationshipPatch, Result, Table, TableId, TablePatch,
    TableRemoval, TypeField, TypeFieldPatch, TypeId, TypePatch,
};

/// Snapshot of one element together with where it sits in its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum Element {
    Table {
        position: usize,
        table: Table,
    },
    Field {
        table: TableId,
        position: usize,
        field: Field,
    },
    Index {
        table: TableId,
        position: usize,
        index: Index,
    },
    Relationship {
        position: usize,
        relationship: Relationship,
    },
    Enum {
        position: usize,
        item: EnumType,
    },
    Type {
        position: usize,
        item: CustomType,
    },
    TypeField {
        owner: TypeId,
        position: usize,
        field: TypeField,
    },
    Area {
        position: usize,
        area: Area,
    },
    Note {
        position: usize,
        note: Note,
    },
}

impl Element {
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Table { .. } => "table",
            Element::Field { .. } => "field",
            Element::Index { .. } => "index",
            Element::Relationship { .. } => "relationship",
            Element::Enum { .. } => "enum",
            Element::Type { .. } => "type",
            Element::TypeField { .. } => "type_field",
            Element::Area { .. } => "area",
            Element::Note { .. } => "note",
        }
    }

    /// Put the snapshot back at its position, keeping its id.
    fn insert(&self, diagram: &mut Diagram) -> Result<()> {
        match self.clone() {
            Element::Table { position, table } => diagram.insert_table_at(position, table),
            Element::Field {
                table,
                position,
                field,
            } => diagram.insert_field_at(table, position, field),
            Element::Index {
                table,
                position,
                index,
            } => diagram.insert_index_at(table, position, index),
            Element::Relationship {
                position,
                relationship,
            } => diagram.insert_relationship_at(position, relationship),
            Element::Enum { position, item } => diagram.insert_enum_at(position, item),
            Element::Type { position, item } => diagram.insert_type_at(position, item),
            Element::TypeField {
                owner,
                position,
                field,
            } => diagram.insert_type_field_at(owner, position, field),
            Element::Area { position, area } => diagram.insert_area_at(position, area),
            Element::Note { position, note } => diagram.insert_note_at(position, note),
        }
    }

    /// Remove the element by its stable id.
    fn remove(&self, diagram: &mut Diagram) -> Result<()> {
        match self {
            Element::Table { table, .. } => diagram.delete_table(table.id).map(drop),
            Element::Field { table, field, .. } => diagram.delete_field(*table, field.id).map(drop),
            Element::Index { table, index, .. } => diagram.delete_index(*table, index.id).map(drop),
            Element::Relationship { relationship, .. } => {
                diagram.delete_relationship(relationship.id).map(drop)
            }
            Element::Enum { item, .. } => diagram.delete_enum(item.id).map(drop),
            Element::Type { item, .. } => diagram.delete_type(item.id).map(drop),
            Element::TypeField {
                owner, position, ..
            } => diagram.delete_type_field(*owner, *position).map(drop),
            Element::Area { area, .. } => diagram.delete_area(area.id).map(drop),
            Element::Note { note, .. } => diagram.delete_note(note.id).map(drop),
        }
    }
}

/// Payload of a DELETE record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "removed", rename_all = "snake_case")]
pub enum Removed {
    /// A table and the relationships it took with it.
    Table(TableRemoval),
    /// A field, the relationships using it and its index memberships.
    Field(FieldRemoval),
    /// An element whose removal cascades to nothing.
    Element(Element),
}

impl Removed {
    pub fn kind(&self) -> &'static str {
        match self {
            Removed::Table(_) => "table",
            Removed::Field(_) => "field",
            Removed::Element(element) => element.kind(),
        }
    }

    fn restore(&self, diagram: &mut Diagram) -> Result<()> {
        match self.clone() {
            Removed::Table(removal) => diagram.restore_table(removal),
            Removed::Field(removal) => diagram.restore_field(removal),
            Removed::Element(element) => element.insert(diagram),
        }
    }

    /// Delete again, refreshing the captured cascade.
    fn delete(&mut self, diagram: &mut Diagram) -> Result<()> {
        match self {
            Removed::Table(removal) => *removal = diagram.delete_table(removal.table.id)?,
            Removed::Field(removal) => {
                *removal = diagram.delete_field(removal.table, removal.field.id)?;
            }
            Removed::Element(element) => element.remove(diagram)?,
        }
        Ok(())
    }
}

/// Something with a canvas position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "element", content = "id", rename_all = "snake_case")]
pub enum Movable {
    Table(TableId),
    Area(AreaId),
    Note(NoteId),
}

impl Movable {
    pub fn kind(&self) -> &'static str {
        match self {
            Movable::Table(_) => "table",
            Movable::Area(_) => "area",
            Movable::Note(_) => "note",
        }
    }

    fn move_to(self, diagram: &mut Diagram, to: Position) -> Result<()> {
        match self {
            Movable::Table(id) => diagram.move_table(id, to).map(drop),
            Movable::Area(id) => diagram.move_area(id, to).map(drop),
            Movable::Note(id) => diagram.move_note(id, to).map(drop),
        }
    }
}

/// Payload of an EDIT record: the edited element and the patches captured
/// when the edit was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum EditTarget {
    Table {
        id: TableId,
        undo: TablePatch,
        redo: TablePatch,
    },
    Field {
        table: TableId,
        field: FieldId,
        undo: FieldPatch,
        redo: FieldPatch,
    },
    Index {
        table: TableId,
        index: IndexId,
        undo: IndexPatch,
        redo: IndexPatch,
    },
    Relationship {
        id: RelationshipId,
        undo: RelationshipPatch,
        redo: RelationshipPatch,
    },
    /// Renames also retype exactly the listed fields, and nothing else.
    Enum {
        id: EnumId,
        undo: EnumPatch,
        redo: EnumPatch,
        retyped: Vec<FieldRef>,
    },
    Type {
        id: TypeId,
        undo: TypePatch,
        redo: TypePatch,
        retyped: Vec<FieldRef>,
    },
    TypeField {
        owner: TypeId,
        position: usize,
        undo: TypeFieldPatch,
        redo: TypeFieldPatch,
    },
    Area {
        id: AreaId,
        undo: AreaPatch,
        redo: AreaPatch,
    },
    Note {
        id: NoteId,
        undo: NotePatch,
        redo: NotePatch,
    },
}

impl EditTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            EditTarget::Table { .. } => "table",
            EditTarget::Field { .. } => "field",
            EditTarget::Index { .. } => "index",
            EditTarget::Relationship { .. } => "relationship",
            EditTarget::Enum { .. } => "enum",
            EditTarget::Type { .. } => "type",
            EditTarget::TypeField { .. } => "type_field",
            EditTarget::Area { .. } => "area",
            EditTarget::Note { .. } => "note",
        }
    }

    /// Apply the redo patch when `forward`, the undo patch otherwise.
    fn patch(&self, diagram: &mut Diagram, forward: bool) -> Result<()> {
        fn pick<'a, P>(forward: bool, undo: &'a P, redo: &'a P) -> &'a P {
            if forward { redo } else { undo }
        }

        match self {
            EditTarget::Table { id, undo, redo } => {
                diagram.update_table(*id, pick(forward, undo, redo)).map(drop)
            }
            EditTarget::Field {
                table,
                field,
                undo,
                redo,
            } => diagram
                .update_field(*table, *field, pick(forward, undo, redo))
                .map(drop),
            EditTarget::Index {
                table,
                index,
                undo,
                redo,
            } => diagram
                .update_index(*table, *index, pick(forward, undo, redo))
                .map(drop),
            EditTarget::Relationship { id, undo, redo } => diagram
                .update_relationship(*id, pick(forward, undo, redo))
                .map(drop),
            EditTarget::Enum {
                id,
                undo,
                redo,
                retyped,
            } => {
                diagram.patch_enum(*id, pick(forward, undo, redo))?;
                diagram.retype_fields(retyped, forward)
            }
            EditTarget::Type {
                id,
                undo,
                redo,
                retyped,
            } => {
                diagram.patch_type(*id, pick(forward, undo, redo))?;
                diagram.retype_fields(retyped, forward)
            }
            EditTarget::TypeField {
                owner,
                position,
                undo,
                redo,
            } => diagram
                .update_type_field(*owner, *position, pick(forward, undo, redo))
                .map(drop),
            EditTarget::Area { id, undo, redo } => {
                diagram.update_area(*id, pick(forward, undo, redo)).map(drop)
            }
            EditTarget::Note { id, undo, redo } => {
                diagram.update_note(*id, pick(forward, undo, redo)).map(drop)
            }
        }
    }
}

/// One entry of the undo/redo log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Add { element: Element },
    Delete { removed: Removed },
    Move {
        target: Movable,
        from: Position,
        to: Position,
    },
    Edit { target: EditTarget },
    Pan { from: Position, to: Position },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Add { .. } => "add",
            Action::Delete { .. } => "delete",
            Action::Move { .. } => "move",
            Action::Edit { .. } => "edit",
            Action::Pan { .. } => "pan",
        }
    }

    /// Kind of element the action touched.
    pub fn element(&self) -> &'static str {
        match self {
            Action::Add { element } => element.kind(),
            Action::Delete { removed } => removed.kind(),
            Action::Move { target, .. } => target.kind(),
            Action::Edit { target } => target.kind(),
            Action::Pan { .. } => "viewport",
        }
    }

    /// Perform the action again.
    pub fn apply(&mut self, diagram: &mut Diagram) -> Result<()> {
        match self {
            Action::Add { element } => element.insert(diagram),
            Action::Delete { removed } => removed.delete(diagram),
            Action::Move { target, to, .. } => target.move_to(diagram, *to),
            Action::Edit { target } => target.patch(diagram, true),
            Action::Pan { to, .. } => {
                diagram.pan_to(*to);
                Ok(())
            }
        }
    }

    /// Invert the action.
    pub fn revert(&self, diagram: &mut Diagram) -> Result<()> {
        match self {
            Action::Add { element } => element.remove(diagram),
            Action::Delete { removed } => removed.restore(diagram),
            Action::Move { target, from, .. } => target.move_to(diagram, *from),
            Action::Edit { target } => target.patch(diagram, false),
            Action::Pan { from, .. } => {
                diagram.pan_to(*from);
                Ok(())
            }
        }
    }
}
