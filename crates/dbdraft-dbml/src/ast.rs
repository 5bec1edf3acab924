//! Syntax tree of the supported DBML subset.
//!
//! Nodes keep the position of their first token so lowering can point at the
//! offending source when it has to drop something.

use std::fmt;

/// 1-based source position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub tables: Vec<TableDef>,
    pub enums: Vec<EnumDef>,
    pub refs: Vec<RefDef>,
    pub notes: Vec<NoteDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub alias: Option<String>,
    pub color: Option<String>,
    pub note: Option<String>,
    pub columns: Vec<ColumnDef>,
    pub indexes: Vec<IndexDef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    /// Type text as written, e.g. `varchar(255)`.
    pub data_type: String,
    pub settings: ColumnSettings,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSettings {
    pub primary: bool,
    pub increment: bool,
    pub not_null: bool,
    pub unique: bool,
    pub default: Option<Literal>,
    pub note: Option<String>,
    pub check: Option<String>,
    pub inline_ref: Option<InlineRef>,
}

/// `ref: > table.column` written in a column's settings.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineRef {
    pub relation: Relation,
    pub target: EndpointDef,
}

/// Literal value of a `default:` setting.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(String),
    Str(String),
    /// Backtick expression such as `` `now()` ``.
    Expr(String),
    /// Bare keyword such as `true`, `false` or `null`.
    Keyword(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexColumn {
    Name(String),
    Expr(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexDef {
    pub columns: Vec<IndexColumn>,
    pub name: Option<String>,
    pub unique: bool,
    pub primary: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<String>,
    pub span: Span,
}

/// Relationship operator between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `>` many-to-one
    ManyToOne,
    /// `<` one-to-many
    OneToMany,
    /// `-` one-to-one
    OneToOne,
    /// `<>` many-to-many
    ManyToMany,
}

impl Relation {
    pub fn token(self) -> &'static str {
        match self {
            Relation::ManyToOne => ">",
            Relation::OneToMany => "<",
            Relation::OneToOne => "-",
            Relation::ManyToMany => "<>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDef {
    pub table: String,
    /// One entry per column; composite endpoints have several.
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefDef {
    pub name: Option<String>,
    pub start: EndpointDef,
    pub relation: Relation,
    pub end: EndpointDef,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
    pub span: Span,
}

/// Top-level sticky note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDef {
    pub name: String,
    pub content: String,
    pub span: Span,
}
