use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use tracing::warn;

use super::client::{Catalog, CatalogError};
use super::download::save_download;
use super::model::TrackDescriptor;

#[derive(Debug)]
pub struct SearchOutcome {
    pub seq: u64,
    pub query: String,
    pub result: Result<Vec<TrackDescriptor>, CatalogError>,
}

#[derive(Debug)]
pub struct DownloadOutcome {
    pub track: TrackDescriptor,
    pub result: Result<PathBuf, String>,
}

pub fn spawn_search(
    catalog: Arc<dyn Catalog>,
    seq: u64,
    query: String,
    tx: Sender<SearchOutcome>,
) {
    thread::spawn(move || {
        let result = catalog.search(&query);
        if let Err(e) = &result {
            warn!(%query, error = %e, "search failed");
        }
        // The UI may be gone by now; nothing to do about it.
        let _ = tx.send(SearchOutcome { seq, query, result });
    });
}

pub fn spawn_download(
    catalog: Arc<dyn Catalog>,
    track: TrackDescriptor,
    dir: PathBuf,
    tx: Sender<DownloadOutcome>,
) {
    thread::spawn(move || {
        let url = catalog.stream_url(&track.id);
        let result = catalog
            .fetch_audio(&url)
            .map_err(|e| e.to_string())
            .and_then(|audio| save_download(&dir, &track, &audio).map_err(|e| e.to_string()));
        if let Err(e) = &result {
            warn!(id = %track.id, error = %e, "download failed");
        }
        let _ = tx.send(DownloadOutcome { track, result });
    });
}
