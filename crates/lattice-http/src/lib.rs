//! `lattice-http` fetches tiles over HTTP.
//!
//! [`HttpTileFetcher`] implements `lattice-loader`'s `TileFetcher`
//! against the tile endpoint
//! `GET {base}/tiles/{tileRow},{tileColumn}.json`, mapping the whole
//! failure surface onto the tile error taxonomy:
//! - non-200 status -> `httpStatusNotOk` with the status line
//! - unparseable body -> `jsonError` with the parser failure
//! - transport failure -> `fetchError` with the transport failure
//!
//! Cancellation is drop-based: the loader aborts an unwanted fetch by
//! dropping its future, which tears down the underlying request.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Deserialize;

use lattice_loader::TileFetcher;
use lattice_model::{TileCoord, TileError, TileRows};

/// The tile endpoint's response body. The server echoes the tile
/// coordinate alongside the rows; only the rows matter here, and
/// unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct TileResponse {
    rows: TileRows,
}

/// Fetches tiles from a Lattice table endpoint.
///
/// Cheap to clone; reuses one `reqwest::Client` (and so its connection
/// pool) across fetches.
#[derive(Clone, Debug)]
pub struct HttpTileFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTileFetcher {
    /// Fetcher for the table rooted at `base_url`, e.g.
    /// `https://app.example.com/api/steps/42`. A trailing slash is
    /// tolerated.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Like [`HttpTileFetcher::new`] with a caller-configured client
    /// (custom timeouts, proxies, headers).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// URL of one tile's JSON document.
    pub fn tile_url(&self, coord: TileCoord) -> String {
        format!(
            "{}/tiles/{},{}.json",
            self.base_url, coord.tile_row, coord.tile_column
        )
    }
}

impl TileFetcher for HttpTileFetcher {
    fn fetch_tile(&self, coord: TileCoord) -> BoxFuture<'static, Result<TileRows, TileError>> {
        let client = self.client.clone();
        let url = self.tile_url(coord);
        async move {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|error| transport_error(&error))?;

            let status = response.status();
            if status != reqwest::StatusCode::OK {
                return Err(TileError::http_status_not_ok(status_line(status)));
            }

            let body = response
                .bytes()
                .await
                .map_err(|error| transport_error(&error))?;
            let parsed: TileResponse = serde_json::from_slice(&body)
                .map_err(|error| TileError::json_error(json_error_name(&error), error.to_string()))?;
            Ok(parsed.rows)
        }
        .boxed()
    }
}

/// `"500 Internal Server Error"`-style status line.
fn status_line(status: reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

fn transport_error(error: &reqwest::Error) -> TileError {
    TileError::fetch_error(transport_error_name(error), error.to_string())
}

fn transport_error_name(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "TimeoutError"
    } else if error.is_connect() {
        "ConnectError"
    } else if error.is_body() || error.is_decode() {
        "BodyError"
    } else if error.is_request() {
        "RequestError"
    } else {
        "FetchError"
    }
}

fn json_error_name(error: &serde_json::Error) -> &'static str {
    match error.classify() {
        serde_json::error::Category::Syntax => "SyntaxError",
        serde_json::error::Category::Eof => "EofError",
        serde_json::error::Category::Data => "DataError",
        serde_json::error::Category::Io => "IoError",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_url_joins_base_and_coordinate() {
        let fetcher = HttpTileFetcher::new("https://app.example.com/api/steps/42");
        assert_eq!(
            fetcher.tile_url(TileCoord::new(3, 1)),
            "https://app.example.com/api/steps/42/tiles/3,1.json"
        );
    }

    #[test]
    fn tile_url_tolerates_a_trailing_slash() {
        let fetcher = HttpTileFetcher::new("http://localhost:8000/table/");
        assert_eq!(
            fetcher.tile_url(TileCoord::new(0, 0)),
            "http://localhost:8000/table/tiles/0,0.json"
        );
    }

    #[test]
    fn status_lines_include_the_canonical_reason() {
        assert_eq!(
            status_line(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            "500 Internal Server Error"
        );
        assert_eq!(status_line(reqwest::StatusCode::NOT_FOUND), "404 Not Found");
    }

    #[test]
    fn json_failures_are_classified() {
        let syntax = serde_json::from_str::<TileResponse>("not json").unwrap_err();
        assert_eq!(json_error_name(&syntax), "SyntaxError");

        let missing = serde_json::from_str::<TileResponse>("{}").unwrap_err();
        assert_eq!(json_error_name(&missing), "DataError");

        let truncated = serde_json::from_str::<TileResponse>(r#"{"rows": [["#).unwrap_err();
        assert_eq!(json_error_name(&truncated), "EofError");
    }

    #[test]
    fn tile_response_ignores_echoed_coordinates() {
        let parsed: TileResponse =
            serde_json::from_str(r#"{"tileRow": 0, "tileColumn": 1, "rows": [[1.5]]}"#)
                .expect("parse");
        assert_eq!(parsed.rows.len(), 1);
    }
}
