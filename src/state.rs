use crate::config::AppConfig;
use crate::inference::InferenceClient;
use crate::storage::{DiskStore, TransientStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn TransientStore>,
    pub inference: InferenceClient,
}

impl AppState {
    /// Builds the process-wide capabilities once. The inference variant is
    /// fixed from here on.
    pub fn init(config: AppConfig) -> anyhow::Result<Self> {
        let inference = InferenceClient::from_config(&config.gemini)?;
        let store = Arc::new(DiskStore::new(&config.upload_dir)) as Arc<dyn TransientStore>;
        Ok(Self::from_parts(Arc::new(config), store, inference))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn TransientStore>,
        inference: InferenceClient,
    ) -> Self {
        Self {
            config,
            store,
            inference,
        }
    }

    #[cfg(test)]
    pub(crate) fn fake(store: Arc<dyn TransientStore>, inference: InferenceClient) -> Self {
        let config = AppConfig::from_lookup(|_| None).expect("default config");
        Self::from_parts(Arc::new(config), store, inference)
    }
}
