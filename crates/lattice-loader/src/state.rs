use std::borrow::Cow;

use lattice_model::{SparseTileGrid, Tile, TileCoord, TileError, TileRange, TileRows};

/// An event the orchestrator reacts to: a viewport range change, or the
/// completion of the in-flight fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum TilesEvent {
    SetWantedTileRange(TileRange),
    FetchSucceeded { coord: TileCoord, rows: TileRows },
    FetchFailed { coord: TileCoord, error: TileError },
}

/// A side effect for the executor: start fetching this tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FetchCommand {
    pub coord: TileCoord,
}

impl FetchCommand {
    fn new(coord: TileCoord) -> Self {
        Self { coord }
    }
}

/// Outcome of applying one event.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Applied {
    /// Whether the state changed at all. Unchanged states must not be
    /// republished: downstream consumers rely on "no change, no
    /// notification" to avoid spurious re-renders.
    pub changed: bool,
    /// The fetch to start, when the event moved a new tile into the
    /// loading slot.
    pub fetch: Option<FetchCommand>,
}

impl Applied {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed(fetch: Option<FetchCommand>) -> Self {
        Self {
            changed: true,
            fetch,
        }
    }
}

/// The orchestrator's whole state: the sparse grid, the rectangle the
/// viewport wants visible, and the single currently-loading tile.
///
/// Pure: transitions happen only through [`TilesState::apply`], which
/// never performs I/O. The executor owns the one instance and runs the
/// returned fetch commands.
#[derive(Clone, Debug, PartialEq)]
pub struct TilesState {
    sparse_tile_grid: SparseTileGrid,
    wanted_tile_range: TileRange,
    loading_tile: Option<TileCoord>,
}

impl TilesState {
    /// Seed state for a `n_tile_rows` x `n_tile_columns` table: the
    /// top-left tile is wanted and (when the table is non-empty)
    /// immediately loading.
    pub fn new(n_tile_rows: u32, n_tile_columns: u32) -> (Self, Option<FetchCommand>) {
        let state = Self {
            sparse_tile_grid: SparseTileGrid::new(n_tile_rows, n_tile_columns),
            wanted_tile_range: TileRange::initial(),
            loading_tile: (n_tile_rows > 0).then(|| TileCoord::new(0, 0)),
        };
        let fetch = state.loading_tile.map(FetchCommand::new);
        (state, fetch)
    }

    pub fn sparse_tile_grid(&self) -> &SparseTileGrid {
        &self.sparse_tile_grid
    }

    pub fn wanted_tile_range(&self) -> TileRange {
        self.wanted_tile_range
    }

    /// The tile a fetch is (or is about to be) in flight for.
    pub fn loading_tile(&self) -> Option<TileCoord> {
        self.loading_tile
    }

    pub fn is_loading(&self) -> bool {
        self.loading_tile.is_some()
    }

    /// Apply one event and report what the executor should do about it.
    pub fn apply(&mut self, event: TilesEvent) -> Applied {
        match event {
            TilesEvent::SetWantedTileRange(range) => self.set_wanted_tile_range(range),
            TilesEvent::FetchSucceeded { coord, rows } => {
                self.finish_fetch(coord, Tile::loaded(rows))
            }
            TilesEvent::FetchFailed { coord, error } => self.finish_fetch(coord, Tile::from(error)),
        }
    }

    fn set_wanted_tile_range(&mut self, range: TileRange) -> Applied {
        if range == self.wanted_tile_range {
            // Value-equal range: don't touch state, so the executor
            // publishes nothing.
            return Applied::unchanged();
        }

        let split = self
            .sparse_tile_grid
            .split_gaps_into_loading_tiles(range.row_start, range.row_end);
        if let Cow::Owned(split) = split {
            self.sparse_tile_grid = split;
        }
        self.wanted_tile_range = range;

        if self.loading_tile.is_some() {
            // Never interrupt an in-flight fetch; the next completion
            // searches the updated range.
            return Applied::changed(None);
        }

        self.loading_tile = self.sparse_tile_grid.find_wanted_loading_tile(range);
        Applied::changed(self.loading_tile.map(FetchCommand::new))
    }

    fn finish_fetch(&mut self, coord: TileCoord, tile: Tile) -> Applied {
        self.sparse_tile_grid = self.sparse_tile_grid.place_tile(coord, tile);
        self.loading_tile = self
            .sparse_tile_grid
            .find_wanted_loading_tile(self.wanted_tile_range);
        Applied::changed(self.loading_tile.map(FetchCommand::new))
    }
}
