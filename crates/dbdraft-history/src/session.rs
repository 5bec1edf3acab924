//! An editing session: one diagram and its history.
//!
//! Each mutation is applied to the diagram and recorded in one call, so the
//! history can never drift from what actually happened.

use dbdraft_core::{
    Area, AreaId, AreaPatch, CustomType, Diagram, EnumId, EnumPatch, EnumType, Error, Field,
    FieldId, FieldPatch, Index, IndexId, IndexPatch, NewRelationship, Note, NoteId, NotePatch,
    Position, RelationshipId, RelationshipPatch, Result, Table, TableId, TablePatch, TypeField,
    TypeFieldPatch, TypeId, TypePatch,
};

use crate::action::{Action, EditTarget, Element, Movable, Removed};
use crate::history::History;

fn position_of<T>(
    items: &[T],
    what: impl std::fmt::Display,
    found: impl Fn(&T) -> bool,
) -> Result<usize> {
    items
        .iter()
        .position(found)
        .ok_or_else(|| Error::NotFound(what.to_string()))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    diagram: Diagram,
    history: History,
}

impl Session {
    pub fn new(diagram: Diagram, history: History) -> Self {
        Self { diagram, history }
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn into_parts(self) -> (Diagram, History) {
        (self.diagram, self.history)
    }

    pub fn undo(&mut self) -> Result<bool> {
        self.history.undo(&mut self.diagram)
    }

    pub fn redo(&mut self) -> Result<bool> {
        self.history.redo(&mut self.diagram)
    }

    fn added(&mut self, element: Element) {
        self.history.record(Action::Add { element });
    }

    fn removed(&mut self, removed: Removed) {
        self.history.record(Action::Delete { removed });
    }

    fn edited(&mut self, target: EditTarget) {
        self.history.record(Action::Edit { target });
    }

    fn moved(&mut self, target: Movable, from: Position, to: Position) {
        if from != to {
            self.history.record(Action::Move { target, from, to });
        }
    }

    // Tables

    pub fn add_table(&mut self, table: Table) -> Result<TableId> {
        let id = self.diagram.add_table(table);
        let position = position_of(&self.diagram.tables, id, |item| item.id == id)?;
        let table = self.diagram.tables[position].clone();
        self.added(Element::Table { position, table });
        Ok(id)
    }

    pub fn update_table(&mut self, id: TableId, patch: TablePatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let undo = self.diagram.update_table(id, &patch)?;
        self.edited(EditTarget::Table {
            id,
            undo,
            redo: patch,
        });
        Ok(())
    }

    pub fn move_table(&mut self, id: TableId, to: Position) -> Result<()> {
        let from = self.diagram.move_table(id, to)?;
        self.moved(Movable::Table(id), from, to);
        Ok(())
    }

    pub fn delete_table(&mut self, id: TableId) -> Result<()> {
        let removal = self.diagram.delete_table(id)?;
        self.removed(Removed::Table(removal));
        Ok(())
    }

    // Fields

    pub fn add_field(&mut self, table: TableId, field: Field) -> Result<FieldId> {
        let id = self.diagram.add_field(table, field)?;
        let owner = self
            .diagram
            .table(table)
            .ok_or_else(|| Error::NotFound(table.to_string()))?;
        let position = position_of(&owner.fields, id, |item| item.id == id)?;
        let field = owner.fields[position].clone();
        self.added(Element::Field {
            table,
            position,
            field,
        });
        Ok(id)
    }

    pub fn update_field(
        &mut self,
        table: TableId,
        field: FieldId,
        patch: FieldPatch,
    ) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let undo = self.diagram.update_field(table, field, &patch)?;
        self.edited(EditTarget::Field {
            table,
            field,
            undo,
            redo: patch,
        });
        Ok(())
    }

    pub fn delete_field(&mut self, table: TableId, field: FieldId) -> Result<()> {
        let removal = self.diagram.delete_field(table, field)?;
        self.removed(Removed::Field(removal));
        Ok(())
    }

    // Indices

    pub fn add_index(&mut self, table: TableId, index: Index) -> Result<IndexId> {
        let id = self.diagram.add_index(table, index)?;
        let owner = self
            .diagram
            .table(table)
            .ok_or_else(|| Error::NotFound(table.to_string()))?;
        let position = position_of(&owner.indices, id, |item| item.id == id)?;
        let index = owner.indices[position].clone();
        self.added(Element::Index {
            table,
            position,
            index,
        });
        Ok(id)
    }

    pub fn update_index(
        &mut self,
        table: TableId,
        index: IndexId,
        patch: IndexPatch,
    ) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let undo = self.diagram.update_index(table, index, &patch)?;
        self.edited(EditTarget::Index {
            table,
            index,
            undo,
            redo: patch,
        });
        Ok(())
    }

    pub fn delete_index(&mut self, table: TableId, index: IndexId) -> Result<()> {
        let (position, index) = self.diagram.delete_index(table, index)?;
        self.removed(Removed::Element(Element::Index {
            table,
            position,
            index,
        }));
        Ok(())
    }

    // Relationships

    pub fn add_relationship(&mut self, new: NewRelationship) -> Result<RelationshipId> {
        let id = self.diagram.add_relationship(new)?;
        let position = position_of(&self.diagram.relationships, id, |item| item.id == id)?;
        let relationship = self.diagram.relationships[position].clone();
        self.added(Element::Relationship {
            position,
            relationship,
        });
        Ok(id)
    }

    pub fn update_relationship(
        &mut self,
        id: RelationshipId,
        patch: RelationshipPatch,
    ) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let undo = self.diagram.update_relationship(id, &patch)?;
        self.edited(EditTarget::Relationship {
            id,
            undo,
            redo: patch,
        });
        Ok(())
    }

    pub fn delete_relationship(&mut self, id: RelationshipId) -> Result<()> {
        let removed = self.diagram.delete_relationship(id)?;
        self.removed(Removed::Element(Element::Relationship {
            position: removed.position,
            relationship: removed.relationship,
        }));
        Ok(())
    }

    // Enums and custom types

    pub fn add_enum(&mut self, item: EnumType) -> Result<EnumId> {
        let id = self.diagram.add_enum(item);
        let position = position_of(&self.diagram.enums, id, |item| item.id == id)?;
        let item = self.diagram.enums[position].clone();
        self.added(Element::Enum { position, item });
        Ok(id)
    }

    /// Edit an enum; a rename retypes the fields using it and undo restores them.
    pub fn update_enum(&mut self, id: EnumId, patch: EnumPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let retyped = self.diagram.update_enum(id, &patch)?;
        self.edited(EditTarget::Enum {
            id,
            undo: retyped.inverse,
            redo: patch,
            retyped: retyped.fields,
        });
        Ok(())
    }

    pub fn delete_enum(&mut self, id: EnumId) -> Result<()> {
        let (position, item) = self.diagram.delete_enum(id)?;
        self.removed(Removed::Element(Element::Enum { position, item }));
        Ok(())
    }

    pub fn add_type(&mut self, item: CustomType) -> Result<TypeId> {
        let id = self.diagram.add_type(item);
        let position = position_of(&self.diagram.types, id, |item| item.id == id)?;
        let item = self.diagram.types[position].clone();
        self.added(Element::Type { position, item });
        Ok(id)
    }

    pub fn update_type(&mut self, id: TypeId, patch: TypePatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let retyped = self.diagram.update_type(id, &patch)?;
        self.edited(EditTarget::Type {
            id,
            undo: retyped.inverse,
            redo: patch,
            retyped: retyped.fields,
        });
        Ok(())
    }

    pub fn delete_type(&mut self, id: TypeId) -> Result<()> {
        let (position, item) = self.diagram.delete_type(id)?;
        self.removed(Removed::Element(Element::Type { position, item }));
        Ok(())
    }

    pub fn add_type_field(&mut self, owner: TypeId, field: TypeField) -> Result<usize> {
        let position = self.diagram.add_type_field(owner, field.clone())?;
        self.added(Element::TypeField {
            owner,
            position,
            field,
        });
        Ok(position)
    }

    pub fn update_type_field(
        &mut self,
        owner: TypeId,
        position: usize,
        patch: TypeFieldPatch,
    ) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let undo = self.diagram.update_type_field(owner, position, &patch)?;
        self.edited(EditTarget::TypeField {
            owner,
            position,
            undo,
            redo: patch,
        });
        Ok(())
    }

    pub fn delete_type_field(&mut self, owner: TypeId, position: usize) -> Result<()> {
        let field = self.diagram.delete_type_field(owner, position)?;
        self.removed(Removed::Element(Element::TypeField {
            owner,
            position,
            field,
        }));
        Ok(())
    }

    // Areas, notes and viewport

    pub fn add_area(&mut self, area: Area) -> Result<AreaId> {
        let id = self.diagram.add_area(area);
        let position = position_of(&self.diagram.areas, id, |item| item.id == id)?;
        let area = self.diagram.areas[position].clone();
        self.added(Element::Area { position, area });
        Ok(id)
    }

    pub fn update_area(&mut self, id: AreaId, patch: AreaPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let undo = self.diagram.update_area(id, &patch)?;
        self.edited(EditTarget::Area {
            id,
            undo,
            redo: patch,
        });
        Ok(())
    }

    pub fn move_area(&mut self, id: AreaId, to: Position) -> Result<()> {
        let from = self.diagram.move_area(id, to)?;
        self.moved(Movable::Area(id), from, to);
        Ok(())
    }

    pub fn delete_area(&mut self, id: AreaId) -> Result<()> {
        let (position, area) = self.diagram.delete_area(id)?;
        self.removed(Removed::Element(Element::Area { position, area }));
        Ok(())
    }

    pub fn add_note(&mut self, note: Note) -> Result<NoteId> {
        let id = self.diagram.add_note(note);
        let position = position_of(&self.diagram.notes, id, |item| item.id == id)?;
        let note = self.diagram.notes[position].clone();
        self.added(Element::Note { position, note });
        Ok(id)
    }

    pub fn update_note(&mut self, id: NoteId, patch: NotePatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let undo = self.diagram.update_note(id, &patch)?;
        self.edited(EditTarget::Note {
            id,
            undo,
            redo: patch,
        });
        Ok(())
    }

    pub fn move_note(&mut self, id: NoteId, to: Position) -> Result<()> {
        let from = self.diagram.move_note(id, to)?;
        self.moved(Movable::Note(id), from, to);
        Ok(())
    }

    pub fn delete_note(&mut self, id: NoteId) -> Result<()> {
        let (position, note) = self.diagram.delete_note(id)?;
        self.removed(Removed::Element(Element::Note { position, note }));
        Ok(())
    }

    pub fn pan_to(&mut self, to: Position) {
        let from = self.diagram.pan_to(to);
        if from != to {
            self.history.record(Action::Pan { from, to });
        }
    }
}
