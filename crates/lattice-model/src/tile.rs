use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::CellValue;

/// One tile's worth of row data: a row-major 2D block of cell values.
pub type TileRows = Vec<Vec<CellValue>>;

/// Address of a tile within a table's tile grid.
///
/// A tile-row spans the table's full column count; a tile-column spans a
/// fixed band of columns. Both coordinates are 0-indexed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileCoord {
    /// Tile-row index (0-indexed).
    pub tile_row: u32,
    /// Tile-column index (0-indexed).
    pub tile_column: u32,
}

impl TileCoord {
    /// Create a new [`TileCoord`].
    #[inline]
    pub const fn new(tile_row: u32, tile_column: u32) -> Self {
        Self {
            tile_row,
            tile_column,
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.tile_row, self.tile_column)
    }
}

/// Name + message pair describing an underlying failure.
///
/// Mirrors the `{name, message}` shape rendering layers display inline in
/// place of the tile's data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    pub name: String,
    pub message: String,
}

impl FailureDetail {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Why a tile fetch failed. Terminal per tile: errors are never retried
/// automatically.
///
/// Serializes with an explicit `type` tag so snapshots keep a stable
/// JSON shape for display layers.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TileError {
    /// The server responded, but not with HTTP 200.
    #[error("HTTP status not OK: {http_status}")]
    #[serde(rename_all = "camelCase")]
    HttpStatusNotOk { http_status: String },

    /// The response body could not be parsed as JSON.
    #[error("tile body JSON error: {}: {}", .error.name, .error.message)]
    JsonError { error: FailureDetail },

    /// Transport-level failure (DNS, connection reset, aborted request).
    #[error("tile fetch error: {}: {}", .error.name, .error.message)]
    FetchError { error: FailureDetail },
}

impl TileError {
    /// Build an [`TileError::HttpStatusNotOk`] from a status line such as
    /// `"500 Internal Server Error"`.
    pub fn http_status_not_ok(http_status: impl Into<String>) -> Self {
        TileError::HttpStatusNotOk {
            http_status: http_status.into(),
        }
    }

    pub fn json_error(name: impl Into<String>, message: impl Into<String>) -> Self {
        TileError::JsonError {
            error: FailureDetail::new(name, message),
        }
    }

    pub fn fetch_error(name: impl Into<String>, message: impl Into<String>) -> Self {
        TileError::FetchError {
            error: FailureDetail::new(name, message),
        }
    }
}

/// One rectangular block of table data at a given tile coordinate.
#[derive(Clone, Debug, PartialEq)]
pub enum Tile {
    /// No data yet: a fetch is (or will be) in flight, or the tile is a
    /// placeholder no fetch has been requested for.
    Loading,
    /// Fetched data. `rows` is carried exactly as served; dimensions are
    /// not validated against the tile span.
    Loaded { rows: TileRows },
    /// A failed fetch. Terminal: stays in place until a full reset.
    Error { error: TileError },
}

impl Tile {
    /// Create a [`Tile::Loaded`] from a row block.
    pub fn loaded(rows: TileRows) -> Self {
        Tile::Loaded { rows }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Tile::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Tile::Loaded { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Tile::Error { .. })
    }

    /// The tile's row block, if loaded.
    pub fn rows(&self) -> Option<&TileRows> {
        match self {
            Tile::Loaded { rows } => Some(rows),
            _ => None,
        }
    }

    /// The tile's error, if failed.
    pub fn error(&self) -> Option<&TileError> {
        match self {
            Tile::Error { error } => Some(error),
            _ => None,
        }
    }
}

impl From<TileError> for Tile {
    fn from(error: TileError) -> Self {
        Tile::Error { error }
    }
}

// Snapshots serialize tiles in the shape display layers consume: `null`
// while loading, the bare row block once loaded, `{"error": ...}` on
// failure.
impl Serialize for Tile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Tile::Loading => serializer.serialize_none(),
            Tile::Loaded { rows } => rows.serialize(serializer),
            Tile::Error { error } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}
