pub mod assist;
pub mod class;
pub mod events;
pub mod grade;
pub mod init;
pub mod progress;
pub mod report;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use gurukul_core::assistant::Assistant;
use gurukul_core::events::EventLog;
use gurukul_core::traits::DocumentStore;
use gurukul_core::{ClassAggregator, OperationState, ProgressTracker};
use gurukul_providers::{create_generator, create_store, load_config_from, GurukulConfig, StoreHandle};

/// Loaded configuration plus the store it selects.
pub struct Session {
    config: GurukulConfig,
    handle: StoreHandle,
}

impl Session {
    pub fn open(config_path: Option<PathBuf>) -> Result<Self> {
        let config = load_config_from(config_path.as_deref())?;
        let handle = create_store(&config.store)?;
        tracing::debug!(backend = handle.store().name(), "store opened");
        Ok(Self { config, handle })
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.handle.store()
    }

    pub fn tracker(&self) -> ProgressTracker {
        ProgressTracker::new(self.store())
    }

    pub fn aggregator(&self) -> ClassAggregator {
        ClassAggregator::new(self.store(), &self.config.analytics)
    }

    pub fn events(&self) -> EventLog {
        EventLog::new(self.store())
    }

    pub fn assistant(&self) -> Result<Assistant> {
        let generator = create_generator(self.config.generator.as_ref())?;
        Ok(Assistant::new(generator))
    }

    /// Flush writes for file-backed stores.
    pub fn persist(&self) -> Result<()> {
        self.handle.persist()
    }
}

/// Await a generation, reporting progress on stderr.
pub async fn generate<T, F>(label: &str, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let mut state = OperationState::default();
    eprintln!("{label}...");
    state.track(operation).await;

    match state {
        OperationState::Success(text) => Ok(text),
        OperationState::Failed(message) => Err(anyhow::anyhow!(message)),
        OperationState::Idle | OperationState::Loading => {
            Err(anyhow::anyhow!("{label} did not complete"))
        }
    }
}
