use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{FieldId, RelationshipId, TableId};

/// Foreign key action semantics for `ON UPDATE` / `ON DELETE`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FkAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl FkAction {
    /// Keyword as it appears in SQL, always uppercase.
    pub fn as_sql(self) -> &'static str {
        match self {
            FkAction::NoAction => "NO ACTION",
            FkAction::Restrict => "RESTRICT",
            FkAction::Cascade => "CASCADE",
            FkAction::SetNull => "SET NULL",
            FkAction::SetDefault => "SET DEFAULT",
        }
    }

    /// Keyword as it appears in DBML ref settings.
    pub fn as_dbml(self) -> &'static str {
        match self {
            FkAction::NoAction => "no action",
            FkAction::Restrict => "restrict",
            FkAction::Cascade => "cascade",
            FkAction::SetNull => "set null",
            FkAction::SetDefault => "set default",
        }
    }

    /// Parse an action keyword, ignoring case and repeated whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw
            .split_whitespace()
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        match normalized.as_str() {
            "no action" | "none" => Some(FkAction::NoAction),
            "restrict" => Some(FkAction::Restrict),
            "cascade" => Some(FkAction::Cascade),
            "set null" => Some(FkAction::SetNull),
            "set default" => Some(FkAction::SetDefault),
            _ => None,
        }
    }
}

impl fmt::Display for FkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Relationship multiplicity, read from the start endpoint towards the end endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[default]
    OneToOne,
    OneToMany,
    ManyToOne,
}

/// Multiplicity marker of one relationship endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    One,
    Many,
}

impl Cardinality {
    /// Derive the cardinality from the two endpoint markers.
    ///
    /// `(*, 1)` is many-to-one, `(1, *)` one-to-many, `(1, 1)` one-to-one; every
    /// other combination falls back to one-to-one.
    pub fn from_endpoints(start: Multiplicity, end: Multiplicity) -> Self {
        match (start, end) {
            (Multiplicity::Many, Multiplicity::One) => Cardinality::ManyToOne,
            (Multiplicity::One, Multiplicity::Many) => Cardinality::OneToMany,
            _ => Cardinality::OneToOne,
        }
    }
}

/// One end of a relationship.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Endpoint {
    pub table: TableId,
    pub field: FieldId,
}

impl Endpoint {
    pub fn new(table: TableId, field: FieldId) -> Self {
        Self { table, field }
    }
}

/// Foreign key between two table fields. The start endpoint is the referencing
/// side, the end endpoint the referenced one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Relationship {
    pub id: RelationshipId,
    pub name: String,
    pub start: Endpoint,
    pub end: Endpoint,
    pub cardinality: Cardinality,
    pub on_update: FkAction,
    pub on_delete: FkAction,
}

impl Relationship {
    pub fn touches_table(&self, table: TableId) -> bool {
        self.start.table == table || self.end.table == table
    }

    pub fn touches_field(&self, table: TableId, field: FieldId) -> bool {
        self.start == Endpoint::new(table, field) || self.end == Endpoint::new(table, field)
    }
}

/// Values used to create a relationship; the id is assigned by the diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRelationship {
    pub name: String,
    pub start: Endpoint,
    pub end: Endpoint,
    pub cardinality: Cardinality,
    pub on_update: FkAction,
    pub on_delete: FkAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions_loosely() {
        assert_eq!(FkAction::parse("No   Action"), Some(FkAction::NoAction));
        assert_eq!(FkAction::parse("SET NULL"), Some(FkAction::SetNull));
        assert_eq!(FkAction::parse("cascade"), Some(FkAction::Cascade));
        assert_eq!(FkAction::parse("explode"), None);
    }

    #[test]
    fn cardinality_follows_endpoint_markers() {
        use Multiplicity::*;
        assert_eq!(Cardinality::from_endpoints(Many, One), Cardinality::ManyToOne);
        assert_eq!(Cardinality::from_endpoints(One, Many), Cardinality::OneToMany);
        assert_eq!(Cardinality::from_endpoints(One, One), Cardinality::OneToOne);
        assert_eq!(Cardinality::from_endpoints(Many, Many), Cardinality::OneToOne);
    }
}
