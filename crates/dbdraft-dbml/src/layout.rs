//! Initial canvas placement for imported diagrams.

use dbdraft_core::{Diagram, Position};

pub const TABLE_WIDTH: f64 = 200.0;
pub const GAP_X: f64 = 54.0;
pub const GAP_Y: f64 = 40.0;

const FIELD_HEIGHT: f64 = 36.0;
const HEADER_HEIGHT: f64 = 50.0;
const BORDER: f64 = 7.0;

/// Rendered height of a table with `fields` columns.
pub fn table_height(fields: usize) -> f64 {
    fields as f64 * FIELD_HEIGHT + HEADER_HEIGHT + BORDER
}

/// Place the first half of the tables left to right in a top row and the rest
/// right to left in a second row below it. Sticky notes go in a row under both.
pub fn arrange_tables(diagram: &mut Diagram) {
    let count = diagram.tables.len();
    let top = count.div_ceil(2);
    let step = TABLE_WIDTH + GAP_X;

    let top_height = diagram.tables[..top]
        .iter()
        .map(|table| table_height(table.fields.len()))
        .fold(0.0, f64::max);
    let second_y = top_height + 2.0 * GAP_Y;

    for (i, table) in diagram.tables.iter_mut().enumerate() {
        table.position = if i < top {
            Position::new(i as f64 * step, 0.0)
        } else {
            let slot = top - 1 - (i - top);
            Position::new(slot as f64 * step, second_y)
        };
    }

    let bottom = diagram
        .tables
        .iter()
        .map(|table| table.position.y + table_height(table.fields.len()))
        .fold(0.0, f64::max);
    let notes_y = if count == 0 { 0.0 } else { bottom + GAP_Y };
    for (i, note) in diagram.notes.iter_mut().enumerate() {
        note.position = Position::new(i as f64 * step, notes_y);
    }

    tracing::debug!(event = "tables_arranged", tables = count, notes = diagram.notes.len());
}
