//! Undo/redo history for dbdraft diagrams.
//!
//! [`Action`] records are a closed set of typed payloads; [`History`] keeps
//! the two stacks and applies records against a [`dbdraft_core::Diagram`];
//! [`Session`] mutates a diagram and records the matching action in one call.

pub mod action;
mod history;
mod session;

pub use action::{Action, EditTarget, Element, Movable, Removed};
pub use history::{BranchPolicy, History};
pub use session::Session;
