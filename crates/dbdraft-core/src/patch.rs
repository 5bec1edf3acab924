//! Typed partial updates.
//!
//! Applying a patch returns the patch that restores the overwritten values, so
//! an edit can be inverted by applying what it returned.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{FkAction, Relationship};
use crate::ids::FieldId;
use crate::schema::{Area, CustomType, EnumType, Field, Index, Note, Table, TypeField};

macro_rules! define_patch {
    ($(#[$meta:meta])* $name:ident for $target:ty { $($field:ident: $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
        pub struct $name {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl $name {
            pub fn is_empty(&self) -> bool {
                true $(&& self.$field.is_none())*
            }

            /// Overwrite the set attributes of `target`, returning the previous values.
            pub fn apply(&self, target: &mut $target) -> $name {
                let mut inverse = $name::default();
                $(
                    if let Some(value) = &self.$field {
                        inverse.$field =
                            Some(std::mem::replace(&mut target.$field, value.clone()));
                    }
                )*
                inverse
            }
        }
    };
}

define_patch!(
    /// Table-level attributes.
    TablePatch for Table {
        name: String,
        comment: String,
        color: String,
    }
);

define_patch!(FieldPatch for Field {
    name: String,
    data_type: String,
    default: String,
    check: String,
    primary: bool,
    unique: bool,
    not_null: bool,
    increment: bool,
    comment: String,
});

define_patch!(IndexPatch for Index {
    name: String,
    fields: Vec<FieldId>,
    unique: bool,
});

define_patch!(
    /// Cardinality is fixed at creation and deliberately absent here.
    RelationshipPatch for Relationship {
        name: String,
        on_update: FkAction,
        on_delete: FkAction,
    }
);

define_patch!(EnumPatch for EnumType {
    name: String,
    values: Vec<String>,
});

define_patch!(TypePatch for CustomType {
    name: String,
});

define_patch!(TypeFieldPatch for TypeField {
    name: String,
    data_type: String,
});

define_patch!(AreaPatch for Area {
    name: String,
    color: String,
    width: f64,
    height: f64,
});

define_patch!(NotePatch for Note {
    title: String,
    content: String,
    color: String,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_returns_inverse() {
        let mut field = Field::new("email", "VARCHAR(100)");
        let patch = FieldPatch {
            name: Some("mail".to_string()),
            not_null: Some(true),
            ..FieldPatch::default()
        };

        let inverse = patch.apply(&mut field);
        assert_eq!(field.name, "mail");
        assert!(field.not_null);
        assert_eq!(inverse.name.as_deref(), Some("email"));
        assert_eq!(inverse.not_null, Some(false));
        assert_eq!(inverse.data_type, None);

        inverse.apply(&mut field);
        assert_eq!(field, Field::new("email", "VARCHAR(100)"));
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let json = serde_json::to_string(&TablePatch::default()).expect("serialize patch");
        assert_eq!(json, "{}");
        assert!(TablePatch::default().is_empty());
    }
}
