//! Core contracts and helpers for dbdraft.
//!
//! This crate defines the canonical diagram model, its mutation API, the
//! per-dialect type catalog and the table dependency ordering shared by the
//! exporters, the DBML codec and the history engine.

pub mod constraints;
pub mod diagnostics;
pub mod edit;
pub mod error;
pub mod graph;
pub mod ids;
pub mod patch;
pub mod schema;
pub mod types;
pub mod validation;

pub use constraints::{Cardinality, Endpoint, FkAction, Multiplicity, NewRelationship, Relationship};
pub use diagnostics::{Diagnostics, Issue, Severity, codes};
pub use edit::{FieldRef, FieldRemoval, IndexMembership, RemovedRelationship, Retyped, TableRemoval};
pub use error::{Error, Result};
pub use graph::{DependencyReport, DependencySummary, build_dependency_report, dependency_order};
pub use ids::{AreaId, EnumId, FieldId, IndexId, NoteId, RelationshipId, TableId, TypeId};
pub use patch::{
    AreaPatch, EnumPatch, FieldPatch, IndexPatch, NotePatch, RelationshipPatch, TablePatch,
    TypeFieldPatch, TypePatch,
};
pub use schema::{
    Area, CustomType, DEFAULT_TABLE_COLOR, Diagram, EnumType, Field, Index, Note, Position, Table,
    TypeField, Viewport, diagram_json_schema,
};
pub use types::{Dialect, TypeInfo, TypeName, format_default, type_info, widen_type};
pub use validation::{ensure_valid, validate_diagram};

/// Current version of the JSON diagram document.
pub const DIAGRAM_VERSION: &str = "0.1";
