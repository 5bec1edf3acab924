use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Stable handle of a table. Never reused within a diagram.
    TableId,
    "table"
);
define_id!(
    /// Stable handle of a field, unique across the whole diagram.
    FieldId,
    "field"
);
define_id!(IndexId, "index");
define_id!(RelationshipId, "relationship");
define_id!(EnumId, "enum");
define_id!(TypeId, "type");
define_id!(AreaId, "area");
define_id!(NoteId, "note");

/// Monotonic id source shared by every entity kind of one diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct IdSequence(u32);

impl IdSequence {
    pub fn next_raw(&mut self) -> u32 {
        let id = self.0;
        self.0 += 1;
        id
    }

    /// Make sure ids restored from a snapshot are never handed out again.
    pub fn observe(&mut self, raw: u32) {
        if raw >= self.0 {
            self.0 = raw + 1;
        }
    }
}
