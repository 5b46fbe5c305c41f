use std::path::PathBuf;
use std::sync::Arc;

use calzone_core::{Calzone, CalzoneResult};
use calzone_core::config::CalzoneConfig;

use crate::routes::AppError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    calzone: Arc<Calzone>,
    pub static_dir: PathBuf,
    pub storage_root: PathBuf,
}

impl AppState {
    pub fn new(config: &CalzoneConfig) -> Self {
        AppState {
            calzone: Arc::new(Calzone::from_config(config)),
            static_dir: config.static_dir.clone(),
            storage_root: config.storage_path(),
        }
    }

    /// Run a ledger operation on the blocking pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Calzone) -> CalzoneResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let calzone = Arc::clone(&self.calzone);
        let result = tokio::task::spawn_blocking(move || f(&calzone)).await?;
        Ok(result?)
    }
}
