//! `lattice-loader` drives tile fetching for a Lattice table.
//!
//! The design splits "what to load next" from "how to load it":
//! - [`TilesState`] is a pure state machine over the sparse tile grid,
//!   the wanted tile range and the (at most one) currently-loading tile.
//!   Applying an event returns the fetch to start, if any.
//! - [`TileLoader`] is the executor: a spawned task that owns the state,
//!   runs one [`TileFetcher`] fetch at a time, feeds completions back in
//!   as events, and publishes grid snapshots over a `watch` channel.
//!
//! Fetches are deliberately serialized: a new wanted range never starts a
//! second fetch while one is outstanding, it only changes which tile the
//! *next* search picks.

mod fetcher;
mod loader;
mod state;

pub use fetcher::TileFetcher;
pub use loader::{TileLoader, TileLoaderStats, TilesSnapshot};
pub use state::{Applied, FetchCommand, TilesEvent, TilesState};
