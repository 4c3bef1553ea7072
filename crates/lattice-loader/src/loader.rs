use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use lattice_model::{SparseTileGrid, TileCoord, TileError, TileRange, TileRows};

use crate::state::{Applied, FetchCommand, TilesEvent, TilesState};
use crate::TileFetcher;

/// What consumers render: the current grid plus a convenience loading
/// flag. Untouched tile-rows keep their `Arc` across snapshots, so
/// renderers can skip rows whose pointer didn't change.
#[derive(Clone, Debug, PartialEq)]
pub struct TilesSnapshot {
    pub sparse_tile_grid: SparseTileGrid,
    /// True iff some tile is currently loading.
    pub is_loading: bool,
}

/// Cumulative fetch-lifecycle counters, for telemetry and debug
/// overlays.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TileLoaderStats {
    pub fetches_started: u64,
    pub tiles_loaded: u64,
    pub tiles_failed: u64,
    /// Results that arrived for a generation that had already been
    /// reset away, and were dropped without touching state.
    pub stale_results_dropped: u64,
}

#[derive(Default)]
struct StatsCells {
    fetches_started: AtomicU64,
    tiles_loaded: AtomicU64,
    tiles_failed: AtomicU64,
    stale_results_dropped: AtomicU64,
}

impl StatsCells {
    fn snapshot(&self) -> TileLoaderStats {
        TileLoaderStats {
            fetches_started: self.fetches_started.load(Ordering::Relaxed),
            tiles_loaded: self.tiles_loaded.load(Ordering::Relaxed),
            tiles_failed: self.tiles_failed.load(Ordering::Relaxed),
            stale_results_dropped: self.stale_results_dropped.load(Ordering::Relaxed),
        }
    }
}

enum Msg {
    SetWantedTileRange(TileRange),
    Reset {
        n_tile_rows: u32,
        n_tile_columns: u32,
    },
    FetchFinished {
        generation: u64,
        coord: TileCoord,
        result: Result<TileRows, TileError>,
    },
    Shutdown,
}

/// Handle to a spawned tile-loading task.
///
/// Usage:
///
/// ```no_run
/// # async fn example(fetcher: impl lattice_loader::TileFetcher) {
/// use lattice_loader::TileLoader;
///
/// let loader = TileLoader::spawn(fetcher, 40, 3);
/// let mut snapshots = loader.subscribe();
///
/// // The viewport scrolled: tiles rows [2, 5) x columns [0, 2) are
/// // wanted now. Idempotent for unchanged ranges.
/// loader.set_wanted_tile_range(2, 5, 0, 2);
///
/// while snapshots.changed().await.is_ok() {
///     let snapshot = snapshots.borrow_and_update().clone();
///     // ...render snapshot.sparse_tile_grid...
///     if !snapshot.is_loading {
///         break;
///     }
/// }
/// # }
/// ```
///
/// Dropping the handle shuts the task down and aborts any in-flight
/// fetch.
pub struct TileLoader {
    messages: mpsc::UnboundedSender<Msg>,
    snapshots: watch::Receiver<TilesSnapshot>,
    stats: Arc<StatsCells>,
    task: Option<JoinHandle<()>>,
}

impl TileLoader {
    /// Spawn a loader for a `n_tile_rows` x `n_tile_columns` table.
    /// When the table is non-empty, tile (0, 0) starts fetching
    /// immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F: TileFetcher>(fetcher: F, n_tile_rows: u32, n_tile_columns: u32) -> Self {
        let (messages, mailbox) = mpsc::unbounded_channel();
        let (state, first_fetch) = TilesState::new(n_tile_rows, n_tile_columns);
        let (snapshot_tx, snapshots) = watch::channel(snapshot_of(&state));
        let stats = Arc::new(StatsCells::default());

        let mut executor = Executor {
            fetcher: Arc::new(fetcher),
            state,
            generation: 0,
            in_flight: None,
            messages: messages.clone(),
            snapshots: snapshot_tx,
            stats: Arc::clone(&stats),
        };
        if let Some(command) = first_fetch {
            executor.start_fetch(command);
        }
        let task = tokio::spawn(executor.run(mailbox));

        Self {
            messages,
            snapshots,
            stats,
            task: Some(task),
        }
    }

    /// Suggest the next tiles to load: tile-rows `[row_start, row_end)`
    /// by tile-columns `[col_start, col_end)`. Fire-and-forget and
    /// idempotent: a range equal to the current one changes nothing and
    /// notifies nobody.
    ///
    /// The caller cannot force a request; it only declares what it is
    /// looking at and trusts that tiles will be forthcoming.
    pub fn set_wanted_tile_range(&self, row_start: u32, row_end: u32, col_start: u32, col_end: u32) {
        let range = TileRange::new(row_start, row_end, col_start, col_end);
        let _ = self.messages.send(Msg::SetWantedTileRange(range));
    }

    /// Throw the grid away and start over with new table dimensions, as
    /// if freshly mounted. Any in-flight fetch is aborted and its late
    /// result dropped.
    pub fn reset(&self, n_tile_rows: u32, n_tile_columns: u32) {
        let _ = self.messages.send(Msg::Reset {
            n_tile_rows,
            n_tile_columns,
        });
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> TilesSnapshot {
        self.snapshots.borrow().clone()
    }

    /// True iff some tile is currently loading.
    pub fn is_loading(&self) -> bool {
        self.snapshots.borrow().is_loading
    }

    /// Subscribe to snapshot changes. Snapshots are published only when
    /// state actually changed.
    pub fn subscribe(&self) -> watch::Receiver<TilesSnapshot> {
        self.snapshots.clone()
    }

    pub fn stats(&self) -> TileLoaderStats {
        self.stats.snapshot()
    }

    /// Stop the loader task and wait for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.messages.send(Msg::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TileLoader {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.messages.send(Msg::Shutdown);
        }
    }
}

fn snapshot_of(state: &TilesState) -> TilesSnapshot {
    TilesSnapshot {
        sparse_tile_grid: state.sparse_tile_grid().clone(),
        is_loading: state.is_loading(),
    }
}

struct InFlight {
    coord: TileCoord,
    task: JoinHandle<()>,
}

struct Executor<F: TileFetcher> {
    fetcher: Arc<F>,
    state: TilesState,
    /// Bumped on every reset. Fetch results carry the generation they
    /// were started under; a mismatch means the state they belong to is
    /// gone and the result must be dropped unseen.
    generation: u64,
    in_flight: Option<InFlight>,
    messages: mpsc::UnboundedSender<Msg>,
    snapshots: watch::Sender<TilesSnapshot>,
    stats: Arc<StatsCells>,
}

impl<F: TileFetcher> Executor<F> {
    async fn run(mut self, mut mailbox: mpsc::UnboundedReceiver<Msg>) {
        while let Some(msg) = mailbox.recv().await {
            match msg {
                Msg::SetWantedTileRange(range) => {
                    let applied = self.state.apply(TilesEvent::SetWantedTileRange(range));
                    self.after_apply(applied);
                }
                Msg::Reset {
                    n_tile_rows,
                    n_tile_columns,
                } => self.reset(n_tile_rows, n_tile_columns),
                Msg::FetchFinished {
                    generation,
                    coord,
                    result,
                } => self.finish_fetch(generation, coord, result),
                Msg::Shutdown => break,
            }
        }
        self.abort_in_flight();
    }

    fn reset(&mut self, n_tile_rows: u32, n_tile_columns: u32) {
        tracing::debug!(n_tile_rows, n_tile_columns, "resetting tile loader");
        self.abort_in_flight();
        self.generation += 1;
        let (state, first_fetch) = TilesState::new(n_tile_rows, n_tile_columns);
        self.state = state;
        self.publish();
        if let Some(command) = first_fetch {
            self.start_fetch(command);
        }
    }

    fn finish_fetch(
        &mut self,
        generation: u64,
        coord: TileCoord,
        result: Result<TileRows, TileError>,
    ) {
        if generation != self.generation {
            self.stats
                .stale_results_dropped
                .fetch_add(1, Ordering::Relaxed);
            tracing::debug!(%coord, "dropping stale tile fetch result");
            return;
        }
        self.in_flight = None;

        let event = match result {
            Ok(rows) => {
                self.stats.tiles_loaded.fetch_add(1, Ordering::Relaxed);
                TilesEvent::FetchSucceeded { coord, rows }
            }
            Err(error) => {
                self.stats.tiles_failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%coord, %error, "tile fetch failed");
                TilesEvent::FetchFailed { coord, error }
            }
        };
        let applied = self.state.apply(event);
        self.after_apply(applied);
    }

    fn after_apply(&mut self, applied: Applied) {
        if applied.changed {
            self.publish();
        }
        if let Some(command) = applied.fetch {
            self.start_fetch(command);
        }
    }

    fn publish(&self) {
        let _ = self.snapshots.send(snapshot_of(&self.state));
    }

    fn start_fetch(&mut self, command: FetchCommand) {
        // Tile loads are serialized: one fetch in flight, ever.
        debug_assert!(
            self.in_flight.is_none(),
            "a tile fetch is already in flight"
        );
        let coord = command.coord;
        self.stats.fetches_started.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%coord, "starting tile fetch");

        let generation = self.generation;
        let future = self.fetcher.fetch_tile(coord);
        let messages = self.messages.clone();
        let task = tokio::spawn(async move {
            let result = future.await;
            let _ = messages.send(Msg::FetchFinished {
                generation,
                coord,
                result,
            });
        });
        self.in_flight = Some(InFlight { coord, task });
    }

    fn abort_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            tracing::debug!(coord = %in_flight.coord, "aborting in-flight tile fetch");
            in_flight.task.abort();
        }
    }
}
