use std::sync::Arc;

use tracing::error;

use statusboard_db::Store;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn Store>,
}

impl AppStateInner {
    pub fn new(store: Arc<dyn Store>) -> AppState {
        Arc::new(Self { store })
    }

    /// Run a blocking store call off the async runtime.
    pub async fn with_store<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&dyn Store) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Internal(anyhow::anyhow!("store task failed: {}", e))
            })?
            .map_err(ApiError::Internal)
    }
}
