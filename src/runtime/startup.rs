use std::sync::Arc;
use std::time::Duration;

use crate::audio::{EngineOptions, RodioEngine, Transport, TransportOptions};
use crate::catalog::{Catalog, CatalogError, HttpCatalog};
use crate::config;

pub fn build_catalog(settings: &config::Settings) -> Result<Arc<dyn Catalog>, CatalogError> {
    let catalog = HttpCatalog::new(
        &settings.api.base_url,
        Duration::from_secs(settings.api.timeout_secs),
    )?;
    Ok(Arc::new(catalog))
}

pub fn transport_options(settings: &config::Settings) -> TransportOptions {
    TransportOptions {
        initial_volume: settings.audio.initial_volume,
        filter_q: settings.audio.filter_q,
        autoplay: settings.audio.autoplay,
    }
}

/// The one audio engine of the process, still suspended, wrapped in a
/// transport. Output opens on the first play.
pub fn build_transport(settings: &config::Settings, catalog: Arc<dyn Catalog>) -> Transport {
    let engine = RodioEngine::new(
        catalog.clone(),
        EngineOptions {
            tick: Duration::from_millis(settings.audio.tick_ms.max(1)),
            waveform_buckets: settings.waveform.buckets.max(1),
        },
    );
    Transport::new(Box::new(engine), catalog, transport_options(settings))
}
