// Contracts
// Traits at the seams between the HTTP layer and the state it works on,
// with their preconditions and postconditions spelled out.

use crate::dashboard::Selection;
use crate::dataset::Dataset;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bookkeeping for the dataset currently held by a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub uploaded_at: DateTime<Utc>,
    pub row_count: usize,
    pub column_count: usize,
}

impl SessionInfo {
    pub fn for_dataset(dataset: &Dataset) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            uploaded_at: Utc::now(),
            row_count: dataset.len(),
            column_count: dataset.columns().len(),
        }
    }
}

/// A dataset together with its session bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDataset {
    pub info: SessionInfo,
    pub dataset: Dataset,
}

/// Holds the single dataset of a dashboard session and the user's KPI filter
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Replace the held dataset
    ///
    /// # Preconditions
    /// - `dataset` has already passed schema validation
    ///
    /// # Postconditions
    /// - The previous dataset is discarded
    /// - The KPI selection is reset to [`Selection::Default`]
    /// - Returns fresh [`SessionInfo`] with a new session id
    async fn replace(&mut self, dataset: Dataset) -> Result<SessionInfo>;

    /// The held dataset, if any. Does not modify any state.
    async fn current(&self) -> Result<Option<StoredDataset>>;

    /// Drop the held dataset and selection
    ///
    /// # Postconditions
    /// - Returns `true` if a dataset was held
    async fn clear(&mut self) -> Result<bool>;

    /// Current KPI filter
    async fn selection(&self) -> Result<Selection>;

    /// Update the KPI filter for subsequent renders
    async fn set_selection(&mut self, selection: Selection) -> Result<()>;
}
