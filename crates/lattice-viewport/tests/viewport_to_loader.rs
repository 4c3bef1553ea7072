//! The full scroll loop: measurements are throttled to the frame rate,
//! translated into a wanted tile range, and fed to the tile loader.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt;
use lattice_loader::TileLoader;
use lattice_model::{CellValue, TileCoord};
use lattice_viewport::{FrameThrottle, ViewportGeometry};

async fn wait_until_idle(loader: &TileLoader) {
    let mut snapshots = loader.subscribe();
    loop {
        if !snapshots.borrow_and_update().is_loading {
            return;
        }
        snapshots.changed().await.expect("loader task alive");
    }
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn a_scroll_flurry_loads_only_the_final_viewport() {
    let fetched = Arc::new(Mutex::new(Vec::new()));
    let fetcher = {
        let fetched = Arc::clone(&fetched);
        move |coord: TileCoord| {
            fetched.lock().expect("fetched coords").push(coord);
            async move { Ok(vec![vec![CellValue::Number(1.0)]]) }.boxed()
        }
    };

    // 100 rows x 6 columns in 5-row x 2-column tiles: 20 x 3 tiles.
    let loader = Arc::new(TileLoader::spawn(fetcher, 20, 3));
    let mut throttle = FrameThrottle::new();
    let mut geometry = ViewportGeometry {
        scroll_left: 0.0,
        scroll_top: 0.0,
        client_width: 120.0,
        client_height: 100.0,
        row_height: 20.0,
        column_offsets: vec![0.0, 50.0, 100.0, 150.0, 200.0, 250.0, 300.0],
        n_rows: 100,
        rows_per_tile: 5,
        columns_per_tile: 2,
    };

    wait_until_idle(&loader).await;

    // Scroll events arrive much faster than the frame rate; only the
    // newest measurement survives to reach the loader.
    for scroll_top in [40.0, 120.0, 800.0] {
        geometry.scroll_top = scroll_top;
        let range = geometry.wanted_tile_range();
        let loader = Arc::clone(&loader);
        throttle.schedule(move || {
            loader.set_wanted_tile_range(
                range.row_start,
                range.row_end,
                range.col_start,
                range.col_end,
            );
        });
    }

    tokio::time::sleep(FrameThrottle::DEFAULT_FRAME_INTERVAL * 2).await;
    wait_until_idle(&loader).await;

    // scroll_top = 800 shows rows [40, 45): tile-row 8, columns [0, 3)
    // -> tile-columns [0, 2). The two dropped measurements fetched
    // nothing.
    assert_eq!(
        *fetched.lock().expect("fetched coords"),
        vec![
            TileCoord::new(0, 0),
            TileCoord::new(8, 0),
            TileCoord::new(8, 1),
        ]
    );
}
