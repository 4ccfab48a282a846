use crate::backend::driver::block_blob::BlockBlobStore;
use crate::backend::driver::twirp::TwirpCacheService;
use crate::backend::{BlobStore, CacheService};
use crate::config::Config;
use crate::domain::reservation::ReservationTable;
use std::sync::Arc;

pub struct AppState {
    pub reservations: ReservationTable,
    pub cache_service: Arc<dyn CacheService>,
    pub blob_store: Arc<dyn BlobStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let cache_service = Arc::new(TwirpCacheService::new(
            &config.results_url,
            &config.runtime_token,
        )?);
        let blob_store = Arc::new(BlockBlobStore::new()?);
        Ok(Self::with_backends(config, cache_service, blob_store))
    }

    pub fn with_backends(
        config: Config,
        cache_service: Arc<dyn CacheService>,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        AppState {
            reservations: ReservationTable::new(),
            cache_service,
            blob_store,
            config: Arc::new(config),
        }
    }
}
