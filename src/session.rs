// In-memory session store
// One slot: uploading a new file replaces the previous dataset wholesale.

use crate::contracts::{SessionInfo, SessionStore, StoredDataset};
use crate::dashboard::Selection;
use crate::dataset::Dataset;
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct InMemorySession {
    stored: Option<StoredDataset>,
    selection: Selection,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySession {
    async fn replace(&mut self, dataset: Dataset) -> Result<SessionInfo> {
        let info = SessionInfo::for_dataset(&dataset);
        info!(
            session_id = %info.session_id,
            rows = info.row_count,
            replaced = self.stored.is_some(),
            "Dataset stored in session"
        );
        self.stored = Some(StoredDataset {
            info: info.clone(),
            dataset,
        });
        self.selection = Selection::Default;
        Ok(info)
    }

    async fn current(&self) -> Result<Option<StoredDataset>> {
        Ok(self.stored.clone())
    }

    async fn clear(&mut self) -> Result<bool> {
        self.selection = Selection::Default;
        Ok(self.stored.take().is_some())
    }

    async fn selection(&self) -> Result<Selection> {
        Ok(self.selection.clone())
    }

    async fn set_selection(&mut self, selection: Selection) -> Result<()> {
        debug!(selection = ?selection, "KPI selection updated");
        self.selection = selection;
        Ok(())
    }
}

/// Create a session store ready to be shared by the HTTP server
pub fn create_session_store() -> std::sync::Arc<tokio::sync::Mutex<dyn SessionStore>> {
    std::sync::Arc::new(tokio::sync::Mutex::new(InMemorySession::new()))
}
