//! Mutation API of [`Diagram`].
//!
//! Every mutator validates the ids it is given and fails with
//! [`Error::NotFound`] instead of silently ignoring unknown targets. Removals
//! return the removed value together with every dependent they cascaded to, so
//! the exact previous state can be restored with the matching `restore_*`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{Endpoint, NewRelationship, Relationship};
use crate::error::{Error, Result};
use crate::ids::{AreaId, EnumId, FieldId, IndexId, NoteId, RelationshipId, TableId, TypeId};
use crate::patch::{
    AreaPatch, EnumPatch, FieldPatch, IndexPatch, NotePatch, RelationshipPatch, TablePatch,
    TypeFieldPatch, TypePatch,
};
use crate::schema::{
    Area, CustomType, Diagram, EnumType, Field, Index, Note, Position, Table, TypeField,
};

/// A relationship removed as part of a cascade, with its former position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RemovedRelationship {
    pub position: usize,
    pub relationship: Relationship,
}

/// Former membership of a deleted field in an index's field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndexMembership {
    pub index: IndexId,
    pub position: usize,
}

/// A deleted table and the relationships that pointed at or from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableRemoval {
    pub position: usize,
    pub table: Table,
    pub relationships: Vec<RemovedRelationship>,
}

/// A deleted field and the references it took with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldRemoval {
    pub table: TableId,
    pub position: usize,
    pub field: Field,
    pub relationships: Vec<RemovedRelationship>,
    pub memberships: Vec<IndexMembership>,
}

/// A field whose type was rewritten by an enum or type rename, with the
/// exact type text before and after the rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldRef {
    pub table: TableId,
    pub field: FieldId,
    pub before: String,
    pub after: String,
}

/// Result of renaming or editing an enum or custom type.
#[derive(Debug, Clone, PartialEq)]
pub struct Retyped<P> {
    pub inverse: P,
    pub fields: Vec<FieldRef>,
}

fn not_found(what: impl std::fmt::Display) -> Error {
    Error::NotFound(what.to_string())
}

impl Diagram {
    fn table_mut(&mut self, id: TableId) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|table| table.id == id)
            .ok_or_else(|| not_found(id))
    }

    fn field_mut(&mut self, table: TableId, field: FieldId) -> Result<&mut Field> {
        self.table_mut(table)?
            .fields
            .iter_mut()
            .find(|item| item.id == field)
            .ok_or_else(|| not_found(format!("{field} in {table}")))
    }

    fn check_endpoint(&self, endpoint: Endpoint) -> Result<()> {
        match self.resolve(endpoint.table, endpoint.field) {
            Some(_) => Ok(()),
            None => Err(Error::InvalidReference(format!(
                "{} in {} does not exist",
                endpoint.field, endpoint.table
            ))),
        }
    }

    fn check_index_fields(&self, table: TableId, fields: &[FieldId]) -> Result<()> {
        let owner = self.table(table).ok_or_else(|| not_found(table))?;
        for field in fields {
            if owner.field(*field).is_none() {
                return Err(Error::InvalidReference(format!(
                    "index field {field} is not part of {table}"
                )));
            }
        }
        Ok(())
    }

    fn observe_table(&mut self, table: &Table) {
        self.sequence.observe(table.id.0);
        for field in &table.fields {
            self.sequence.observe(field.id.0);
        }
        for index in &table.indices {
            self.sequence.observe(index.id.0);
        }
    }

    /// Advance the id counter past every id present in the diagram.
    pub fn reseat_sequence(&mut self) {
        let tables = std::mem::take(&mut self.tables);
        for table in &tables {
            self.observe_table(table);
        }
        self.tables = tables;

        let ids = self
            .relationships
            .iter()
            .map(|item| item.id.0)
            .chain(self.enums.iter().map(|item| item.id.0))
            .chain(self.types.iter().map(|item| item.id.0))
            .chain(self.areas.iter().map(|item| item.id.0))
            .chain(self.notes.iter().map(|item| item.id.0))
            .collect::<Vec<_>>();
        for raw in ids {
            self.sequence.observe(raw);
        }
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    /// Append a table, assigning fresh ids to it, its fields and its indices.
    /// Index field lists are remapped onto the new field ids.
    pub fn add_table(&mut self, mut table: Table) -> TableId {
        table.id = TableId(self.sequence.next_raw());
        let mut remap = Vec::with_capacity(table.fields.len());
        for field in &mut table.fields {
            let fresh = FieldId(self.sequence.next_raw());
            remap.push((field.id, fresh));
            field.id = fresh;
        }
        for index in &mut table.indices {
            index.id = IndexId(self.sequence.next_raw());
            index.fields = index
                .fields
                .iter()
                .filter_map(|old| {
                    remap
                        .iter()
                        .find(|(from, _)| from == old)
                        .map(|(_, to)| *to)
                })
                .collect();
        }
        let id = table.id;
        self.tables.push(table);
        id
    }

    /// Put a previously removed table back at `position`, keeping its ids.
    pub fn insert_table_at(&mut self, position: usize, table: Table) -> Result<()> {
        if self.table(table.id).is_some() {
            return Err(Error::InvalidSchema(format!("{} already exists", table.id)));
        }
        self.observe_table(&table);
        let position = position.min(self.tables.len());
        self.tables.insert(position, table);
        Ok(())
    }

    pub fn update_table(&mut self, id: TableId, patch: &TablePatch) -> Result<TablePatch> {
        let table = self.table_mut(id)?;
        Ok(patch.apply(table))
    }

    /// Move a table, returning where it was.
    pub fn move_table(&mut self, id: TableId, to: Position) -> Result<Position> {
        let table = self.table_mut(id)?;
        Ok(std::mem::replace(&mut table.position, to))
    }

    /// Remove a table together with every relationship touching it.
    pub fn delete_table(&mut self, id: TableId) -> Result<TableRemoval> {
        let position = self.table_position(id).ok_or_else(|| not_found(id))?;
        let relationships = self.take_relationships(|rel| rel.touches_table(id));
        let table = self.tables.remove(position);
        tracing::debug!(
            event = "table_deleted",
            table = %table.name,
            cascaded = relationships.len()
        );
        Ok(TableRemoval {
            position,
            table,
            relationships,
        })
    }

    pub fn restore_table(&mut self, removal: TableRemoval) -> Result<()> {
        let TableRemoval {
            position,
            table,
            relationships,
        } = removal;
        self.insert_table_at(position, table)?;
        self.restore_relationships(relationships)
    }

    // ------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------

    pub fn add_field(&mut self, table: TableId, mut field: Field) -> Result<FieldId> {
        let id = FieldId(self.sequence.next_raw());
        field.id = id;
        self.table_mut(table)?.fields.push(field);
        Ok(id)
    }

    pub fn insert_field_at(&mut self, table: TableId, position: usize, field: Field) -> Result<()> {
        let field_id = field.id;
        let owner = self.table_mut(table)?;
        if owner.field(field_id).is_some() {
            return Err(Error::InvalidSchema(format!(
                "{field_id} already exists in {table}"
            )));
        }
        let position = position.min(owner.fields.len());
        owner.fields.insert(position, field);
        self.sequence.observe(field_id.0);
        Ok(())
    }

    pub fn update_field(
        &mut self,
        table: TableId,
        field: FieldId,
        patch: &FieldPatch,
    ) -> Result<FieldPatch> {
        let target = self.field_mut(table, field)?;
        Ok(patch.apply(target))
    }

    /// Remove a field, dropping relationships that use it and stripping it from
    /// the indices of its table. Nothing else shifts: references are by id.
    pub fn delete_field(&mut self, table: TableId, field: FieldId) -> Result<FieldRemoval> {
        let owner = self.table(table).ok_or_else(|| not_found(table))?;
        let position = owner
            .field_position(field)
            .ok_or_else(|| not_found(format!("{field} in {table}")))?;

        let relationships = self.take_relationships(|rel| rel.touches_field(table, field));

        let owner = self.table_mut(table)?;
        let removed = owner.fields.remove(position);
        let mut memberships = Vec::new();
        for index in &mut owner.indices {
            let index_id = index.id;
            let mut offset = 0;
            index.fields.retain(|member| {
                let keep = *member != field;
                if !keep {
                    memberships.push(IndexMembership {
                        index: index_id,
                        position: offset,
                    });
                }
                offset += 1;
                keep
            });
        }

        Ok(FieldRemoval {
            table,
            position,
            field: removed,
            relationships,
            memberships,
        })
    }

    pub fn restore_field(&mut self, removal: FieldRemoval) -> Result<()> {
        let FieldRemoval {
            table,
            position,
            field,
            relationships,
            memberships,
        } = removal;
        let field_id = field.id;
        self.insert_field_at(table, position, field)?;

        let owner = self.table_mut(table)?;
        for membership in memberships {
            let index = owner
                .indices
                .iter_mut()
                .find(|index| index.id == membership.index)
                .ok_or_else(|| not_found(membership.index))?;
            let at = membership.position.min(index.fields.len());
            index.fields.insert(at, field_id);
        }

        self.restore_relationships(relationships)
    }

    // ------------------------------------------------------------------
    // Indices
    // ------------------------------------------------------------------

    pub fn add_index(&mut self, table: TableId, mut index: Index) -> Result<IndexId> {
        self.check_index_fields(table, &index.fields)?;
        let id = IndexId(self.sequence.next_raw());
        index.id = id;
        self.table_mut(table)?.indices.push(index);
        Ok(id)
    }

    pub fn insert_index_at(&mut self, table: TableId, position: usize, index: Index) -> Result<()> {
        self.check_index_fields(table, &index.fields)?;
        let index_id = index.id;
        let owner = self.table_mut(table)?;
        if owner.index(index_id).is_some() {
            return Err(Error::InvalidSchema(format!(
                "{index_id} already exists in {table}"
            )));
        }
        let position = position.min(owner.indices.len());
        owner.indices.insert(position, index);
        self.sequence.observe(index_id.0);
        Ok(())
    }

    pub fn update_index(
        &mut self,
        table: TableId,
        index: IndexId,
        patch: &IndexPatch,
    ) -> Result<IndexPatch> {
        if let Some(fields) = &patch.fields {
            self.check_index_fields(table, fields)?;
        }
        let target = self
            .table_mut(table)?
            .indices
            .iter_mut()
            .find(|item| item.id == index)
            .ok_or_else(|| not_found(format!("{index} in {table}")))?;
        Ok(patch.apply(target))
    }

    /// Remove an index, returning its former position and value.
    pub fn delete_index(&mut self, table: TableId, index: IndexId) -> Result<(usize, Index)> {
        let owner = self.table_mut(table)?;
        let position = owner
            .index_position(index)
            .ok_or_else(|| not_found(format!("{index} in {table}")))?;
        Ok((position, owner.indices.remove(position)))
    }

    // ------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------

    pub fn add_relationship(&mut self, new: NewRelationship) -> Result<RelationshipId> {
        self.check_endpoint(new.start)?;
        self.check_endpoint(new.end)?;
        let id = RelationshipId(self.sequence.next_raw());
        self.relationships.push(Relationship {
            id,
            name: new.name,
            start: new.start,
            end: new.end,
            cardinality: new.cardinality,
            on_update: new.on_update,
            on_delete: new.on_delete,
        });
        Ok(id)
    }

    pub fn insert_relationship_at(
        &mut self,
        position: usize,
        relationship: Relationship,
    ) -> Result<()> {
        self.check_endpoint(relationship.start)?;
        self.check_endpoint(relationship.end)?;
        if self.relationship(relationship.id).is_some() {
            return Err(Error::InvalidSchema(format!(
                "{} already exists",
                relationship.id
            )));
        }
        self.sequence.observe(relationship.id.0);
        let position = position.min(self.relationships.len());
        self.relationships.insert(position, relationship);
        Ok(())
    }

    pub fn update_relationship(
        &mut self,
        id: RelationshipId,
        patch: &RelationshipPatch,
    ) -> Result<RelationshipPatch> {
        let target = self
            .relationships
            .iter_mut()
            .find(|rel| rel.id == id)
            .ok_or_else(|| not_found(id))?;
        Ok(patch.apply(target))
    }

    pub fn delete_relationship(&mut self, id: RelationshipId) -> Result<RemovedRelationship> {
        let position = self
            .relationship_position(id)
            .ok_or_else(|| not_found(id))?;
        Ok(RemovedRelationship {
            position,
            relationship: self.relationships.remove(position),
        })
    }

    /// Remove every relationship matching `predicate`, remembering original positions.
    fn take_relationships<F>(&mut self, predicate: F) -> Vec<RemovedRelationship>
    where
        F: Fn(&Relationship) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.relationships.len());
        for (position, relationship) in std::mem::take(&mut self.relationships)
            .into_iter()
            .enumerate()
        {
            if predicate(&relationship) {
                removed.push(RemovedRelationship {
                    position,
                    relationship,
                });
            } else {
                kept.push(relationship);
            }
        }
        self.relationships = kept;
        removed
    }

    /// Re-insert cascaded relationships in ascending original position.
    fn restore_relationships(&mut self, mut removed: Vec<RemovedRelationship>) -> Result<()> {
        removed.sort_by_key(|item| item.position);
        for item in removed {
            self.insert_relationship_at(item.position, item.relationship)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Enums and custom types
    // ------------------------------------------------------------------

    pub fn add_enum(&mut self, mut item: EnumType) -> EnumId {
        let id = EnumId(self.sequence.next_raw());
        item.id = id;
        self.enums.push(item);
        id
    }

    pub fn insert_enum_at(&mut self, position: usize, item: EnumType) -> Result<()> {
        if self.enum_type(item.id).is_some() {
            return Err(Error::InvalidSchema(format!("{} already exists", item.id)));
        }
        self.sequence.observe(item.id.0);
        let position = position.min(self.enums.len());
        self.enums.insert(position, item);
        Ok(())
    }

    /// Edit an enum. A rename retypes every field that used the old name.
    pub fn update_enum(&mut self, id: EnumId, patch: &EnumPatch) -> Result<Retyped<EnumPatch>> {
        let old_name = self.enum_type(id).ok_or_else(|| not_found(id))?.name.clone();
        let inverse = self.patch_enum(id, patch)?;
        let fields = match &patch.name {
            Some(new_name) if *new_name != old_name => self.retype_by_name(&old_name, new_name),
            _ => Vec::new(),
        };
        Ok(Retyped { inverse, fields })
    }

    /// Apply `patch` to the enum alone, leaving field types untouched.
    pub fn patch_enum(&mut self, id: EnumId, patch: &EnumPatch) -> Result<EnumPatch> {
        let target = self
            .enums
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| not_found(id))?;
        Ok(patch.apply(target))
    }

    pub fn delete_enum(&mut self, id: EnumId) -> Result<(usize, EnumType)> {
        let position = self
            .enums
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| not_found(id))?;
        Ok((position, self.enums.remove(position)))
    }

    pub fn add_type(&mut self, mut item: CustomType) -> TypeId {
        let id = TypeId(self.sequence.next_raw());
        item.id = id;
        self.types.push(item);
        id
    }

    pub fn insert_type_at(&mut self, position: usize, item: CustomType) -> Result<()> {
        if self.custom_type(item.id).is_some() {
            return Err(Error::InvalidSchema(format!("{} already exists", item.id)));
        }
        self.sequence.observe(item.id.0);
        let position = position.min(self.types.len());
        self.types.insert(position, item);
        Ok(())
    }

    /// Edit a custom type. A rename retypes every field that used the old name.
    pub fn update_type(&mut self, id: TypeId, patch: &TypePatch) -> Result<Retyped<TypePatch>> {
        let old_name = self.custom_type_mut(id)?.name.clone();
        let inverse = self.patch_type(id, patch)?;
        let fields = match &patch.name {
            Some(new_name) if *new_name != old_name => self.retype_by_name(&old_name, new_name),
            _ => Vec::new(),
        };
        Ok(Retyped { inverse, fields })
    }

    /// Apply `patch` to the custom type alone, leaving field types untouched.
    pub fn patch_type(&mut self, id: TypeId, patch: &TypePatch) -> Result<TypePatch> {
        Ok(patch.apply(self.custom_type_mut(id)?))
    }

    pub fn delete_type(&mut self, id: TypeId) -> Result<(usize, CustomType)> {
        let position = self
            .types
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| not_found(id))?;
        Ok((position, self.types.remove(position)))
    }

    fn custom_type_mut(&mut self, id: TypeId) -> Result<&mut CustomType> {
        self.types
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| not_found(id))
    }

    pub fn add_type_field(&mut self, id: TypeId, field: TypeField) -> Result<usize> {
        let target = self.custom_type_mut(id)?;
        target.fields.push(field);
        Ok(target.fields.len() - 1)
    }

    pub fn insert_type_field_at(
        &mut self,
        id: TypeId,
        position: usize,
        field: TypeField,
    ) -> Result<()> {
        let target = self.custom_type_mut(id)?;
        let position = position.min(target.fields.len());
        target.fields.insert(position, field);
        Ok(())
    }

    pub fn update_type_field(
        &mut self,
        id: TypeId,
        position: usize,
        patch: &TypeFieldPatch,
    ) -> Result<TypeFieldPatch> {
        let target = self
            .custom_type_mut(id)?
            .fields
            .get_mut(position)
            .ok_or_else(|| not_found(format!("field {position} of {id}")))?;
        Ok(patch.apply(target))
    }

    pub fn delete_type_field(&mut self, id: TypeId, position: usize) -> Result<TypeField> {
        let target = self.custom_type_mut(id)?;
        if position >= target.fields.len() {
            return Err(not_found(format!("field {position} of {id}")));
        }
        Ok(target.fields.remove(position))
    }

    fn retype_by_name(&mut self, old_name: &str, new_name: &str) -> Vec<FieldRef> {
        let mut retyped = Vec::new();
        let new_type = new_name.to_uppercase();
        for table in &mut self.tables {
            for field in &mut table.fields {
                if field.data_type.eq_ignore_ascii_case(old_name) {
                    let before = std::mem::replace(&mut field.data_type, new_type.clone());
                    retyped.push(FieldRef {
                        table: table.id,
                        field: field.id,
                        before,
                        after: new_type.clone(),
                    });
                }
            }
        }
        retyped
    }

    /// Rewrite exactly the listed fields to their recorded type text:
    /// `after` when `forward`, `before` otherwise.
    pub fn retype_fields(&mut self, fields: &[FieldRef], forward: bool) -> Result<()> {
        for item in fields {
            let data_type = if forward { &item.after } else { &item.before };
            self.field_mut(item.table, item.field)?.data_type = data_type.clone();
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Areas, notes and viewport
    // ------------------------------------------------------------------

    pub fn add_area(&mut self, mut area: Area) -> AreaId {
        let id = AreaId(self.sequence.next_raw());
        area.id = id;
        self.areas.push(area);
        id
    }

    pub fn insert_area_at(&mut self, position: usize, area: Area) -> Result<()> {
        if self.area(area.id).is_some() {
            return Err(Error::InvalidSchema(format!("{} already exists", area.id)));
        }
        self.sequence.observe(area.id.0);
        let position = position.min(self.areas.len());
        self.areas.insert(position, area);
        Ok(())
    }

    fn area_mut(&mut self, id: AreaId) -> Result<&mut Area> {
        self.areas
            .iter_mut()
            .find(|area| area.id == id)
            .ok_or_else(|| not_found(id))
    }

    pub fn update_area(&mut self, id: AreaId, patch: &AreaPatch) -> Result<AreaPatch> {
        Ok(patch.apply(self.area_mut(id)?))
    }

    pub fn move_area(&mut self, id: AreaId, to: Position) -> Result<Position> {
        let area = self.area_mut(id)?;
        Ok(std::mem::replace(&mut area.position, to))
    }

    pub fn delete_area(&mut self, id: AreaId) -> Result<(usize, Area)> {
        let position = self
            .areas
            .iter()
            .position(|area| area.id == id)
            .ok_or_else(|| not_found(id))?;
        Ok((position, self.areas.remove(position)))
    }

    pub fn add_note(&mut self, mut note: Note) -> NoteId {
        let id = NoteId(self.sequence.next_raw());
        note.id = id;
        self.notes.push(note);
        id
    }

    pub fn insert_note_at(&mut self, position: usize, note: Note) -> Result<()> {
        if self.note(note.id).is_some() {
            return Err(Error::InvalidSchema(format!("{} already exists", note.id)));
        }
        self.sequence.observe(note.id.0);
        let position = position.min(self.notes.len());
        self.notes.insert(position, note);
        Ok(())
    }

    fn note_mut(&mut self, id: NoteId) -> Result<&mut Note> {
        self.notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or_else(|| not_found(id))
    }

    pub fn update_note(&mut self, id: NoteId, patch: &NotePatch) -> Result<NotePatch> {
        Ok(patch.apply(self.note_mut(id)?))
    }

    pub fn move_note(&mut self, id: NoteId, to: Position) -> Result<Position> {
        let note = self.note_mut(id)?;
        Ok(std::mem::replace(&mut note.position, to))
    }

    pub fn delete_note(&mut self, id: NoteId) -> Result<(usize, Note)> {
        let position = self
            .notes
            .iter()
            .position(|note| note.id == id)
            .ok_or_else(|| not_found(id))?;
        Ok((position, self.notes.remove(position)))
    }

    /// Pan the canvas, returning the previous pan offset.
    pub fn pan_to(&mut self, to: Position) -> Position {
        std::mem::replace(&mut self.viewport.pan, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{Cardinality, FkAction};

    fn shop() -> (Diagram, TableId, TableId, FieldId, FieldId) {
        let mut diagram = Diagram::default();
        let users = diagram.add_table(Table::new("users"));
        let users_id = diagram
            .add_field(users, Field::new("id", "INT").primary())
            .expect("users.id");
        diagram
            .add_field(users, Field::new("name", "VARCHAR(80)"))
            .expect("users.name");
        let orders = diagram.add_table(Table::new("orders"));
        diagram
            .add_field(orders, Field::new("id", "INT").primary())
            .expect("orders.id");
        let user_id = diagram
            .add_field(orders, Field::new("user_id", "INT"))
            .expect("orders.user_id");
        diagram
            .add_relationship(NewRelationship {
                name: "fk_orders_user".to_string(),
                start: Endpoint::new(orders, user_id),
                end: Endpoint::new(users, users_id),
                cardinality: Cardinality::ManyToOne,
                on_update: FkAction::Cascade,
                on_delete: FkAction::SetNull,
            })
            .expect("relationship");
        (diagram, users, orders, users_id, user_id)
    }

    #[test]
    fn delete_table_cascades_relationships() {
        let (mut diagram, users, _, _, _) = shop();
        let before = diagram.clone();

        let removal = diagram.delete_table(users).expect("delete users");
        assert_eq!(removal.position, 0);
        assert_eq!(removal.relationships.len(), 1);
        assert!(diagram.relationships.is_empty());

        diagram.restore_table(removal).expect("restore users");
        assert_eq!(diagram, before);
    }

    #[test]
    fn delete_field_strips_indices_and_restores_them() {
        let (mut diagram, _, orders, _, user_id) = shop();
        let order_pk = diagram.table(orders).expect("orders").fields[0].id;
        diagram
            .add_index(
                orders,
                Index::new("orders_lookup", vec![user_id, order_pk], false),
            )
            .expect("index");
        let before = diagram.clone();

        let removal = diagram.delete_field(orders, user_id).expect("delete field");
        assert_eq!(removal.position, 1);
        assert_eq!(removal.relationships.len(), 1);
        assert_eq!(removal.memberships[0].position, 0);
        assert_eq!(diagram.table(orders).expect("orders").indices[0].fields, vec![order_pk]);

        diagram.restore_field(removal).expect("restore field");
        assert_eq!(diagram, before);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let (mut diagram, _, orders, _, _) = shop();
        assert!(matches!(
            diagram.delete_table(TableId(999)),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            diagram.delete_field(orders, FieldId(999)),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            diagram.add_index(orders, Index::new("bad", vec![FieldId(999)], false)),
            Err(Error::InvalidReference(_))
        ));
    }

    #[test]
    fn enum_rename_retypes_fields() {
        let (mut diagram, users, _, _, _) = shop();
        let status = diagram.add_enum(EnumType::new(
            "status",
            vec!["active".to_string(), "banned".to_string()],
        ));
        let field = diagram
            .add_field(users, Field::new("status", "STATUS"))
            .expect("status field");

        let outcome = diagram
            .update_enum(
                status,
                &EnumPatch {
                    name: Some("user_status".to_string()),
                    ..EnumPatch::default()
                },
            )
            .expect("rename enum");

        assert_eq!(
            outcome.fields,
            vec![FieldRef {
                table: users,
                field,
                before: "STATUS".to_string(),
                after: "USER_STATUS".to_string(),
            }]
        );
        assert_eq!(outcome.inverse.name.as_deref(), Some("status"));
        let (_, retyped) = diagram.resolve(users, field).expect("field");
        assert_eq!(retyped.data_type, "USER_STATUS");
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let (mut diagram, _, orders, _, user_id) = shop();
        diagram.delete_field(orders, user_id).expect("delete field");
        let fresh = diagram
            .add_field(orders, Field::new("customer_id", "INT"))
            .expect("add field");
        assert_ne!(fresh, user_id);
    }
}
