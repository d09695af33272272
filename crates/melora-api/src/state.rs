//! Shared application state handed to every handler.

use crate::streaming::StreamingService;
use melora_core::catalog::Catalog;
use melora_core::Config;
use melora_processing::{RetentionHandler, ThumbnailDeriver, UploadPipeline};
use melora_storage::Storage;
use std::sync::Arc;
use std::time::Duration;

pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn Catalog>,
    pub pipeline: UploadPipeline,
    pub streaming: StreamingService,
    pub retention: RetentionHandler,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>, catalog: Arc<dyn Catalog>) -> Self {
        let thumbnails = ThumbnailDeriver::new(
            Arc::clone(&storage),
            config.thumbnail_max_width,
            config.thumbnail_max_height,
        );
        let pipeline = UploadPipeline::new(Arc::clone(&storage), Arc::clone(&catalog), thumbnails);
        let streaming = StreamingService::new(
            Arc::clone(&storage),
            Duration::from_secs(config.signed_url_ttl_secs),
        );
        let retention = RetentionHandler::new(storage);

        AppState {
            config,
            catalog,
            pipeline,
            streaming,
            retention,
        }
    }
}
