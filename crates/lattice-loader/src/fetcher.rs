use futures_util::future::BoxFuture;
use lattice_model::{TileCoord, TileError, TileRows};

/// The external collaborator that fetches one tile's data.
///
/// Implementations map their whole failure surface into [`TileError`]:
/// a non-success status, an unparseable body, or a transport failure.
/// The returned future must be cancel-safe in the drop sense: the
/// executor cancels an unwanted fetch by dropping it.
pub trait TileFetcher: Send + Sync + 'static {
    fn fetch_tile(&self, coord: TileCoord) -> BoxFuture<'static, Result<TileRows, TileError>>;
}

/// Plain functions and closures are fetchers. Mostly useful for tests
/// and adapters.
impl<F> TileFetcher for F
where
    F: Fn(TileCoord) -> BoxFuture<'static, Result<TileRows, TileError>> + Send + Sync + 'static,
{
    fn fetch_tile(&self, coord: TileCoord) -> BoxFuture<'static, Result<TileRows, TileError>> {
        self(coord)
    }
}
