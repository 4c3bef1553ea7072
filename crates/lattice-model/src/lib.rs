//! `lattice-model` defines the core in-memory tile data structures.
//!
//! A Lattice table's data is a sparse grid of rectangular "tiles". The crate
//! is intentionally self-contained so it can be reused by:
//! - the tile-fetch orchestrator (`lattice-loader`)
//! - the HTTP tile fetcher (`lattice-http`)
//! - rendering layers, which consume grid snapshots purely for display
//!
//! Grids are persistent structures: every mutating operation returns a new
//! grid that shares untouched tile-rows with its input by reference
//! (`Arc`), so consumers can detect change with a pointer comparison
//! instead of a deep walk.

mod grid;
mod range;
mod tile;
mod value;

pub use grid::{SparseTileGrid, TileRowEntry};
pub use range::TileRange;
pub use tile::{FailureDetail, Tile, TileCoord, TileError, TileRows};
pub use value::CellValue;
