//! `lattice-viewport` turns pixel scroll state into tile coordinates.
//!
//! [`ViewportGeometry`] is the pure half: given scroll offsets, client
//! size, row height and per-column pixel offsets, it computes the tile
//! rectangle the viewport wants visible (for the tile loader) and the
//! same rectangle in row/column coordinates (for keyboard-focus
//! bookkeeping).
//!
//! [`FrameThrottle`] is the scheduling half: scroll and resize events
//! arrive in flurries, so recomputation is coalesced to at most one
//! callback per frame interval.

mod geometry;
mod throttle;

pub use geometry::{CellRect, ViewportGeometry};
pub use throttle::FrameThrottle;
