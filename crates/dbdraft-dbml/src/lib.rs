//! DBML codec for dbdraft diagrams.
//!
//! [`import_dbml`] lexes and parses the supported DBML subset into a syntax
//! tree, lowers it into a [`dbdraft_core::Diagram`] and assigns an initial
//! layout. [`export_dbml`] renders a diagram back to DBML.

pub mod ast;
pub mod error;
mod format;
mod import;
pub mod layout;
mod parse;

pub use error::{DbmlError, Result};
pub use format::export_dbml;
pub use import::{DbmlImport, IMPORTED_TITLE, import_dbml, lower};
pub use layout::arrange_tables;
pub use parse::parse_document;
