//! Grid layout contract for rendering controls.
//!
//! Controls place their handles through the [`GridLayout`] trait:
//! `add_cell(column, row, handle, options)` returns the placed
//! [`GridCell`], whose alignment the control then configures. How cells are
//! sized and positioned is the container's business.
//!
//! [`Grid`] is a plain in-memory container that records placements. It
//! owns the handles it receives.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::grid::{CellOptions, Grid, GridLayout, HorizontalAlign, VerticalAlign};
//! use trellis::handle::{Handle, LabelHandle};
//!
//! let mut grid = Grid::new();
//! let label = Arc::new(LabelHandle::new("Colour", "ctrl-1"));
//!
//! grid.add_cell(0, 0, Handle::from(label), CellOptions::default())
//!     .set_alignment(HorizontalAlign::Left, VerticalAlign::Center);
//!
//! assert_eq!(grid.column_count(), 1);
//! ```

use crate::handle::Handle;
use trellis_core::logging::targets;

/// Horizontal alignment within a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlign {
    /// Flush with the left edge.
    #[default]
    Left,
    /// Centered horizontally.
    Center,
    /// Flush with the right edge.
    Right,
}

/// Vertical alignment within a cell or row band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlign {
    /// Flush with the top edge.
    #[default]
    Top,
    /// Centered vertically.
    Center,
    /// Flush with the bottom edge.
    Bottom,
}

/// Alignment of a handle within its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellAlignment {
    /// Horizontal alignment.
    pub horizontal: HorizontalAlign,
    /// Vertical alignment.
    pub vertical: VerticalAlign,
}

impl CellAlignment {
    /// Create a new cell alignment.
    pub fn new(horizontal: HorizontalAlign, vertical: VerticalAlign) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Left edge, vertically centered.
    pub fn left_center() -> Self {
        Self::new(HorizontalAlign::Left, VerticalAlign::Center)
    }
}

/// Number of rows and columns a cell covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spans {
    /// Rows covered, at least 1.
    pub rows: usize,
    /// Columns covered, at least 1.
    pub columns: usize,
}

impl Spans {
    /// Create spans, clamping each dimension to at least 1.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows: rows.max(1),
            columns: columns.max(1),
        }
    }
}

impl Default for Spans {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Placement options for [`GridLayout::add_cell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellOptions {
    /// Cells covered.
    pub spans: Spans,
    /// Vertical alignment of the cell within its row band.
    pub v_align: VerticalAlign,
}

impl CellOptions {
    /// Options with the given spans and vertical alignment.
    pub fn new(spans: Spans, v_align: VerticalAlign) -> Self {
        Self { spans, v_align }
    }
}

/// A handle placed in the grid.
#[derive(Debug, Clone)]
pub struct GridCell {
    handle: Handle,
    row: usize,
    column: usize,
    spans: Spans,
    v_align: VerticalAlign,
    alignment: CellAlignment,
}

impl GridCell {
    fn new(handle: Handle, column: usize, row: usize, options: CellOptions) -> Self {
        Self {
            handle,
            row,
            column,
            spans: options.spans,
            v_align: options.v_align,
            alignment: CellAlignment::default(),
        }
    }

    /// Set the alignment of the handle within the cell.
    pub fn set_alignment(&mut self, horizontal: HorizontalAlign, vertical: VerticalAlign) {
        self.alignment = CellAlignment::new(horizontal, vertical);
    }

    /// The placed handle.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Starting row.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Starting column.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Rows and columns covered.
    pub fn spans(&self) -> Spans {
        self.spans
    }

    /// Vertical alignment within the row band.
    pub fn v_align(&self) -> VerticalAlign {
        self.v_align
    }

    /// Alignment of the handle within the cell.
    pub fn alignment(&self) -> CellAlignment {
        self.alignment
    }

    /// Check if this cell occupies the given position.
    pub fn occupies(&self, column: usize, row: usize) -> bool {
        row >= self.row
            && row < self.row + self.spans.rows
            && column >= self.column
            && column < self.column + self.spans.columns
    }
}

/// A container that accepts handles at grid positions.
pub trait GridLayout {
    /// Place `handle` at `(column, row)` and return the new cell.
    fn add_cell(
        &mut self,
        column: usize,
        row: usize,
        handle: Handle,
        options: CellOptions,
    ) -> &mut GridCell;
}

/// An in-memory grid recording every placement.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    cells: Vec<GridCell>,
    row_count: usize,
    column_count: usize,
}

impl Grid {
    /// Create a new empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// All cells in placement order.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Number of placed cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether nothing has been placed.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Rows covered by placed cells.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Columns covered by placed cells.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// The most recently placed cell covering `(column, row)`.
    pub fn cell_at(&self, column: usize, row: usize) -> Option<&GridCell> {
        self.cells.iter().rev().find(|c| c.occupies(column, row))
    }

    /// The cell holding `handle`.
    pub fn find(&self, handle: &Handle) -> Option<&GridCell> {
        self.cells.iter().find(|c| c.handle.same_as(handle))
    }

    /// Remove the cell holding `handle`, releasing the grid's reference.
    pub fn remove(&mut self, handle: &Handle) -> bool {
        let before = self.cells.len();
        self.cells.retain(|c| !c.handle.same_as(handle));
        let removed = self.cells.len() != before;
        if removed {
            self.recount();
        }
        removed
    }

    /// Remove every cell, releasing all handles.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.recount();
    }

    fn recount(&mut self) {
        self.row_count = self
            .cells
            .iter()
            .map(|c| c.row + c.spans.rows)
            .max()
            .unwrap_or(0);
        self.column_count = self
            .cells
            .iter()
            .map(|c| c.column + c.spans.columns)
            .max()
            .unwrap_or(0);
    }
}

impl GridLayout for Grid {
    fn add_cell(
        &mut self,
        column: usize,
        row: usize,
        handle: Handle,
        options: CellOptions,
    ) -> &mut GridCell {
        tracing::trace!(target: targets::GRID, column, row, columns = options.spans.columns, "adding cell");
        let cell = GridCell::new(handle, column, row, options);
        self.row_count = self.row_count.max(cell.row + cell.spans.rows);
        self.column_count = self.column_count.max(cell.column + cell.spans.columns);
        self.cells.push(cell);
        let last = self.cells.len() - 1;
        &mut self.cells[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{LabelHandle, SelectHandle};
    use std::sync::Arc;

    fn label(text: &str) -> Handle {
        Handle::from(Arc::new(LabelHandle::new(text, "ctrl-1")))
    }

    #[test]
    fn test_add_cell_updates_dimensions() {
        let mut grid = Grid::new();
        grid.add_cell(0, 0, label("a"), CellOptions::default());
        grid.add_cell(
            1,
            2,
            label("b"),
            CellOptions::new(Spans::new(1, 2), VerticalAlign::Center),
        );

        assert_eq!(grid.len(), 2);
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.column_count(), 3);
    }

    #[test]
    fn test_set_alignment_on_returned_cell() {
        let mut grid = Grid::new();
        grid.add_cell(0, 0, label("a"), CellOptions::default())
            .set_alignment(HorizontalAlign::Left, VerticalAlign::Center);

        assert_eq!(grid.cells()[0].alignment(), CellAlignment::left_center());
    }

    #[test]
    fn test_spanning_cell_occupies() {
        let mut grid = Grid::new();
        let select = Handle::from(Arc::new(SelectHandle::new("ctrl-1", Vec::new())));
        grid.add_cell(
            0,
            0,
            select.clone(),
            CellOptions::new(Spans::new(1, 2), VerticalAlign::Center),
        );

        assert!(grid.cell_at(1, 0).is_some_and(|c| c.handle().same_as(&select)));
        assert!(grid.cell_at(2, 0).is_none());
        assert!(grid.cell_at(0, 1).is_none());
    }

    #[test]
    fn test_spans_clamp_to_one() {
        assert_eq!(Spans::new(0, 0), Spans::default());
    }

    #[test]
    fn test_remove_releases_handle() {
        let mut grid = Grid::new();
        let label_arc = Arc::new(LabelHandle::new("a", "ctrl-1"));
        let handle = Handle::from(label_arc.clone());
        grid.add_cell(3, 1, handle.clone(), CellOptions::default());
        assert_eq!(Arc::strong_count(&label_arc), 3);

        drop(handle);
        assert!(grid.remove(&Handle::from(label_arc.clone())));
        assert_eq!(Arc::strong_count(&label_arc), 1);
        assert_eq!(grid.column_count(), 0);
        assert!(grid.is_empty());
    }
}
