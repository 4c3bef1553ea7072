use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;

use crate::{Tile, TileCoord, TileRange};

static LOADING_TILE: Tile = Tile::Loading;

/// One entry in a [`SparseTileGrid`]: either a fully-materialized row of
/// tiles (one per tile-column), or a run of consecutive tile-rows that
/// exist but have not been materialized.
///
/// Gap rows read as [`Tile::Loading`] for query purposes without
/// allocating anything per row.
#[derive(Clone, Debug, PartialEq)]
pub enum TileRowEntry {
    /// A materialized tile-row. The `Arc` is the sharing unit: grid
    /// operations that don't touch a row reuse its allocation, so
    /// consumers can detect change with [`Arc::ptr_eq`].
    Row(Arc<[Tile]>),
    /// `n` consecutive unmaterialized tile-rows, `n > 0`.
    Gap(u32),
}

impl TileRowEntry {
    fn loading_row(n_tile_columns: u32) -> Self {
        TileRowEntry::Row(vec![Tile::Loading; n_tile_columns as usize].into())
    }

    /// Number of logical tile-rows this entry stands for.
    pub fn row_span(&self) -> u32 {
        match self {
            TileRowEntry::Row(_) => 1,
            TileRowEntry::Gap(n) => *n,
        }
    }
}

// Snapshots keep the compact wire shape display layers consume: a
// materialized row serializes as an array of tiles, a gap as its size.
impl Serialize for TileRowEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TileRowEntry::Row(tiles) => {
                let mut seq = serializer.serialize_seq(Some(tiles.len()))?;
                for tile in tiles.iter() {
                    seq.serialize_element(tile)?;
                }
                seq.end()
            }
            TileRowEntry::Gap(n) => serializer.serialize_u32(*n),
        }
    }
}

/// The full table's tile state: an ordered mix of materialized tile-rows
/// and gaps.
///
/// Invariants (checked in debug builds after every transition):
/// - every materialized row has exactly `n_tile_columns` tiles
/// - gaps are positive and never adjacent (runs are coalesced)
/// - the first entry is never a gap (grids are seeded with at least one
///   materialized row)
/// - the logical tile-row count never changes after construction
///
/// All mutating operations are persistent: they return a new grid whose
/// untouched row entries share their [`Arc`] with the input.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseTileGrid {
    entries: Vec<TileRowEntry>,
    n_tile_columns: u32,
}

impl SparseTileGrid {
    /// Create a grid for a table of `n_tile_rows` x `n_tile_columns`
    /// tiles: the first tile-row materialized as all-[`Tile::Loading`],
    /// every following row collapsed into a single gap.
    pub fn new(n_tile_rows: u32, n_tile_columns: u32) -> Self {
        let mut entries = Vec::new();
        if n_tile_rows > 0 {
            entries.push(TileRowEntry::loading_row(n_tile_columns));
            if n_tile_rows > 1 {
                entries.push(TileRowEntry::Gap(n_tile_rows - 1));
            }
        }
        let grid = Self {
            entries,
            n_tile_columns,
        };
        grid.debug_validate();
        grid
    }

    /// Number of tile-columns per materialized row.
    pub fn n_tile_columns(&self) -> u32 {
        self.n_tile_columns
    }

    /// Logical tile-row count, counting every row a gap stands for.
    pub fn n_tile_rows(&self) -> u32 {
        self.entries.iter().map(TileRowEntry::row_span).sum()
    }

    /// True when the table has no tile-rows at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The grid's entries, in tile-row order.
    pub fn entries(&self) -> &[TileRowEntry] {
        &self.entries
    }

    /// Read one tile. Rows inside a gap read as [`Tile::Loading`];
    /// out-of-bounds coordinates read as `None`.
    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        if coord.tile_column >= self.n_tile_columns {
            return None;
        }
        let mut row = 0u32;
        for entry in &self.entries {
            match entry {
                TileRowEntry::Row(tiles) => {
                    if row == coord.tile_row {
                        return tiles.get(coord.tile_column as usize);
                    }
                    row += 1;
                }
                TileRowEntry::Gap(n) => {
                    if coord.tile_row < row + n {
                        return Some(&LOADING_TILE);
                    }
                    row += n;
                }
            }
        }
        None
    }

    /// Materialize every tile-row in `[row_begin, row_end)` as an explicit
    /// row of [`Tile::Loading`] tiles, splitting any overlapping gap and
    /// preserving its remainder on either side.
    ///
    /// Identity-preserving no-op: when no gap overlaps the range (or the
    /// range is degenerate) the borrowed input is returned unchanged, so
    /// callers can cheaply detect "nothing to do".
    pub fn split_gaps_into_loading_tiles(&self, row_begin: u32, row_end: u32) -> Cow<'_, Self> {
        if row_begin >= row_end || !self.any_gap_overlaps(row_begin, row_end) {
            return Cow::Borrowed(self);
        }

        let mut entries = Vec::with_capacity(self.entries.len() + (row_end - row_begin) as usize);
        let mut row = 0u32;
        for entry in &self.entries {
            match entry {
                TileRowEntry::Row(tiles) => {
                    entries.push(TileRowEntry::Row(Arc::clone(tiles)));
                    row += 1;
                }
                TileRowEntry::Gap(n) => {
                    let gap_begin = row;
                    let gap_end = row + n;
                    if gap_end <= row_begin || gap_begin >= row_end {
                        entries.push(TileRowEntry::Gap(*n));
                    } else {
                        if gap_begin < row_begin {
                            entries.push(TileRowEntry::Gap(row_begin - gap_begin));
                        }
                        for _ in gap_begin.max(row_begin)..gap_end.min(row_end) {
                            entries.push(TileRowEntry::loading_row(self.n_tile_columns));
                        }
                        if gap_end > row_end {
                            entries.push(TileRowEntry::Gap(gap_end - row_end));
                        }
                    }
                    row = gap_end;
                }
            }
        }

        let grid = Self {
            entries,
            n_tile_columns: self.n_tile_columns,
        };
        grid.debug_validate();
        debug_assert_eq!(grid.n_tile_rows(), self.n_tile_rows());
        Cow::Owned(grid)
    }

    /// Replace the tile at `coord`, returning a new grid.
    ///
    /// Only the touched row is reallocated; every other row entry keeps
    /// its original `Arc`.
    ///
    /// # Panics
    ///
    /// Panics if `coord` is out of bounds or falls inside a gap. Both are
    /// programmer errors: callers must split gaps over a range before
    /// placing tiles into it.
    pub fn place_tile(&self, coord: TileCoord, tile: Tile) -> Self {
        assert!(
            coord.tile_column < self.n_tile_columns,
            "place_tile: tile-column {} out of bounds ({} tile-columns)",
            coord.tile_column,
            self.n_tile_columns
        );

        let mut entries = self.entries.clone();
        let mut row = 0u32;
        for entry in entries.iter_mut() {
            match entry {
                TileRowEntry::Row(tiles) => {
                    if row == coord.tile_row {
                        let mut new_row = tiles.to_vec();
                        new_row[coord.tile_column as usize] = tile;
                        *entry = TileRowEntry::Row(new_row.into());
                        let grid = Self {
                            entries,
                            n_tile_columns: self.n_tile_columns,
                        };
                        grid.debug_validate();
                        return grid;
                    }
                    row += 1;
                }
                TileRowEntry::Gap(n) => {
                    let gap_end = row + *n;
                    assert!(
                        coord.tile_row >= gap_end,
                        "place_tile: tile-row {} is inside an unmaterialized gap",
                        coord.tile_row
                    );
                    row = gap_end;
                }
            }
        }
        panic!(
            "place_tile: tile-row {} out of bounds ({row} tile-rows)",
            coord.tile_row
        );
    }

    /// Find the first [`Tile::Loading`] tile inside `range`, scanning
    /// row-major, left-to-right. Deterministic scan-line fetch order.
    ///
    /// Gaps are skipped by their size without inspection: callers split
    /// gaps over the wanted range before searching, so a gap can only sit
    /// outside the range.
    pub fn find_wanted_loading_tile(&self, range: TileRange) -> Option<TileCoord> {
        if range.is_empty() {
            return None;
        }
        let mut row = 0u32;
        for entry in &self.entries {
            if row >= range.row_end {
                return None;
            }
            match entry {
                TileRowEntry::Row(tiles) => {
                    if row >= range.row_start {
                        let col_end = (range.col_end as usize).min(tiles.len());
                        for col in (range.col_start as usize)..col_end {
                            if tiles[col].is_loading() {
                                return Some(TileCoord::new(row, col as u32));
                            }
                        }
                    }
                    row += 1;
                }
                TileRowEntry::Gap(n) => {
                    row += n;
                }
            }
        }
        None
    }

    /// True when no tile in `range` is still [`Tile::Loading`].
    pub fn is_fully_loaded_in(&self, range: TileRange) -> bool {
        self.find_wanted_loading_tile(range).is_none()
    }

    fn any_gap_overlaps(&self, row_begin: u32, row_end: u32) -> bool {
        let mut row = 0u32;
        for entry in &self.entries {
            if row >= row_end {
                return false;
            }
            match entry {
                TileRowEntry::Row(_) => row += 1,
                TileRowEntry::Gap(n) => {
                    let gap_end = row + n;
                    if gap_end > row_begin && row < row_end {
                        return true;
                    }
                    row = gap_end;
                }
            }
        }
        false
    }

    #[inline]
    fn debug_validate(&self) {
        #[cfg(debug_assertions)]
        {
            let mut prev_was_gap = false;
            for (i, entry) in self.entries.iter().enumerate() {
                match entry {
                    TileRowEntry::Row(tiles) => {
                        assert_eq!(
                            tiles.len(),
                            self.n_tile_columns as usize,
                            "tile-row {i} has the wrong column count"
                        );
                        prev_was_gap = false;
                    }
                    TileRowEntry::Gap(n) => {
                        assert!(*n > 0, "entry {i} is a zero-length gap");
                        assert!(i > 0, "grid must not start with a gap");
                        assert!(!prev_was_gap, "entries {} and {i} are adjacent gaps", i - 1);
                        prev_was_gap = true;
                    }
                }
            }
        }
    }
}

impl Serialize for SparseTileGrid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for entry in &self.entries {
            seq.serialize_element(entry)?;
        }
        seq.end()
    }
}
