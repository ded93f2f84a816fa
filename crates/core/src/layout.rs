//! Masonry layout: greedy shortest-column-first placement.
//!
//! Each image is appended to the column with the smallest accumulated
//! height (leftmost wins ties) and adds `1 / aspect_ratio` to it. The
//! pass keeps no state between calls, so the same input always yields
//! the same columns.

use crate::types::Image;

/// Column count used by the gallery grid.
pub const DEFAULT_COLUMN_COUNT: usize = 3;

/// One column of the layout, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<'a> {
    pub images: Vec<&'a Image>,
    /// Sum of unit-width heights of `images`.
    pub height: f64,
}

/// Distribute `images` into `column_count` columns.
///
/// A `column_count` of zero is treated as one.
pub fn layout(images: &[Image], column_count: usize) -> Vec<Column<'_>> {
    let column_count = column_count.max(1);
    let mut columns: Vec<Column<'_>> = (0..column_count)
        .map(|_| Column {
            images: Vec::new(),
            height: 0.0,
        })
        .collect();

    for image in images {
        let target = shortest_column(&columns);
        let column = &mut columns[target];
        column.images.push(image);
        column.height += image.unit_height();
    }

    columns
}

/// Index of the shortest column, leftmost on ties.
fn shortest_column(columns: &[Column<'_>]) -> usize {
    let mut best = 0;
    for (i, column) in columns.iter().enumerate().skip(1) {
        if column.height < columns[best].height {
            best = i;
        }
    }
    best
}
