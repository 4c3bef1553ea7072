use lattice_model::TileRange;

/// Half-open rectangle in row/column (not tile) coordinates, used for
/// keyboard-focus bookkeeping.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellRect {
    pub row_start: u32,
    pub row_end: u32,
    pub col_start: u32,
    pub col_end: u32,
}

/// A measurement of the scrollable viewport, in CSS pixels.
///
/// `row_height` is inferred from a rendered row, and `column_offsets`
/// from rendered column edges: `column_offsets[i]` is the left edge of
/// column `i`, with one final entry for the table's total width.
///
/// Transient zero-size measurements (a `display: none` container, a
/// not-yet-laid-out table) never produce an empty range: spans are
/// clamped to at least one row/column/tile.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewportGeometry {
    pub scroll_left: f64,
    pub scroll_top: f64,
    pub client_width: f64,
    pub client_height: f64,
    /// Height of one rendered row, px.
    pub row_height: f64,
    /// Left edge of each column plus the total width; `n_columns + 1`
    /// entries, ascending.
    pub column_offsets: Vec<f64>,
    pub n_rows: u32,
    pub rows_per_tile: u32,
    pub columns_per_tile: u32,
}

impl ViewportGeometry {
    pub fn n_columns(&self) -> u32 {
        (self.column_offsets.len().saturating_sub(1)) as u32
    }

    pub fn n_tile_rows(&self) -> u32 {
        self.n_rows.div_ceil(self.rows_per_tile.max(1))
    }

    pub fn n_tile_columns(&self) -> u32 {
        self.n_columns().div_ceil(self.columns_per_tile.max(1))
    }

    /// The tile rectangle this measurement wants visible. Feed straight
    /// into `TileLoader::set_wanted_tile_range`.
    pub fn wanted_tile_range(&self) -> TileRange {
        let rows_per_tile = self.rows_per_tile.max(1);
        let columns_per_tile = self.columns_per_tile.max(1);
        let (row_begin, row_end) = self.visible_rows();
        let (col_begin, col_end) = self.visible_columns();

        let (r1, r2) = clamp_span(
            row_begin / rows_per_tile,
            row_end.div_ceil(rows_per_tile),
            self.n_tile_rows(),
        );
        let (c1, c2) = clamp_span(
            col_begin / columns_per_tile,
            col_end.div_ceil(columns_per_tile),
            self.n_tile_columns(),
        );
        TileRange::new(r1, r2, c1, c2)
    }

    /// The same measurement in row/column coordinates, for focus
    /// bookkeeping.
    pub fn focus_cell_range(&self) -> CellRect {
        let (row_start, row_end) = self.visible_rows();
        let (col_start, col_end) = self.visible_columns();
        CellRect {
            row_start,
            row_end,
            col_start,
            col_end,
        }
    }

    /// Visible half-open row span, clamped to the table and to a
    /// minimum span of one.
    fn visible_rows(&self) -> (u32, u32) {
        let row_height = if self.row_height > 0.0 {
            self.row_height
        } else {
            1.0
        };
        let first = (self.scroll_top / row_height).floor().max(0.0) as u32;
        let end = ((self.scroll_top + self.client_height.max(0.0)) / row_height).ceil() as u32;
        clamp_span(first, end, self.n_rows)
    }

    /// Visible half-open column span, clamped like [`Self::visible_rows`].
    fn visible_columns(&self) -> (u32, u32) {
        let left = self.scroll_left.max(0.0);
        let right = left + self.client_width.max(0.0);
        let n_columns = self.n_columns();

        // Column i spans [offsets[i], offsets[i + 1]).
        let first = self
            .column_offsets
            .partition_point(|&edge| edge <= left)
            .saturating_sub(1) as u32;
        let end = (self.column_offsets.partition_point(|&edge| edge < right) as u32).min(n_columns);
        clamp_span(first, end, n_columns)
    }
}

/// Clamp a half-open span into `[0, count)` with a minimum length of
/// one. An empty table yields `(0, 1)`, matching the loader's initial
/// wanted range.
fn clamp_span(begin: u32, end: u32, count: u32) -> (u32, u32) {
    let begin = if count > 0 { begin.min(count - 1) } else { 0 };
    let end = end.clamp(begin + 1, count.max(begin + 1));
    (begin, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// 100 rows x 6 columns of 50px, 5-row and 2-column tiles.
    fn geometry() -> ViewportGeometry {
        ViewportGeometry {
            scroll_left: 0.0,
            scroll_top: 0.0,
            client_width: 120.0,
            client_height: 100.0,
            row_height: 20.0,
            column_offsets: vec![0.0, 50.0, 100.0, 150.0, 200.0, 250.0, 300.0],
            n_rows: 100,
            rows_per_tile: 5,
            columns_per_tile: 2,
        }
    }

    #[test]
    fn top_left_viewport_wants_the_first_tiles() {
        let geometry = geometry();
        // Rows [0, 5) and columns [0, 3) are visible.
        assert_eq!(
            geometry.focus_cell_range(),
            CellRect { row_start: 0, row_end: 5, col_start: 0, col_end: 3 }
        );
        assert_eq!(geometry.wanted_tile_range(), TileRange::new(0, 1, 0, 2));
    }

    #[test]
    fn scrolling_down_moves_the_row_span() {
        let geometry = ViewportGeometry {
            scroll_top: 200.0,
            ..geometry()
        };
        // Rows [10, 15) -> tile-rows [2, 3).
        assert_eq!(geometry.focus_cell_range().row_start, 10);
        assert_eq!(geometry.focus_cell_range().row_end, 15);
        assert_eq!(geometry.wanted_tile_range(), TileRange::new(2, 3, 0, 2));
    }

    #[test]
    fn partially_visible_rows_and_columns_count() {
        let geometry = ViewportGeometry {
            scroll_top: 30.0,
            scroll_left: 60.0,
            ..geometry()
        };
        // Pixel rows [30, 130) touch rows 1..7; pixels [60, 180) touch
        // columns 1..4.
        assert_eq!(
            geometry.focus_cell_range(),
            CellRect { row_start: 1, row_end: 7, col_start: 1, col_end: 4 }
        );
        // Tile-rows [0, 2), tile-columns [0, 2).
        assert_eq!(geometry.wanted_tile_range(), TileRange::new(0, 2, 0, 2));
    }

    #[test]
    fn zero_size_measurements_clamp_to_a_span_of_one() {
        let geometry = ViewportGeometry {
            client_width: 0.0,
            client_height: 0.0,
            ..geometry()
        };
        let range = geometry.wanted_tile_range();
        assert!(!range.is_empty());
        assert_eq!(range, TileRange::new(0, 1, 0, 1));
    }

    #[test]
    fn scroll_past_the_end_clamps_into_the_table() {
        let geometry = ViewportGeometry {
            scroll_top: 1_000_000.0,
            scroll_left: 1_000_000.0,
            ..geometry()
        };
        // The last tile-row/tile-column is still wanted.
        assert_eq!(geometry.wanted_tile_range(), TileRange::new(19, 20, 2, 3));
    }

    #[test]
    fn empty_table_wants_the_initial_range() {
        let geometry = ViewportGeometry {
            n_rows: 0,
            column_offsets: vec![0.0],
            ..geometry()
        };
        assert_eq!(geometry.wanted_tile_range(), TileRange::initial());
    }

    #[test]
    fn viewport_wider_than_the_table_is_clamped() {
        let geometry = ViewportGeometry {
            client_width: 10_000.0,
            client_height: 10_000.0,
            ..geometry()
        };
        assert_eq!(
            geometry.focus_cell_range(),
            CellRect { row_start: 0, row_end: 100, col_start: 0, col_end: 6 }
        );
        assert_eq!(geometry.wanted_tile_range(), TileRange::new(0, 20, 0, 3));
    }
}
