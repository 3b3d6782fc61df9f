//! # Status Pipeline
//!
//! The transaction interceptors that turn raw marker edits into canonical
//! status changes and keep lifecycle dates in step with them.
//!
//! ## Flow
//!
//! 1. [`ChangeDetector`] rejects non-semantic edits and finds candidates
//! 2. [`StatusCommitter`] rewrites candidates to the next status in the cycle
//! 3. [`LifecycleDateManager`] adds and removes dates for type transitions

mod clock;
mod committer;
mod detector;
mod guards;
mod lifecycle;

pub use clock::{Clock, FixedClock, SystemClock};
pub use committer::StatusCommitter;
pub use detector::{ChangeDetector, StatusChangeCandidate};
pub use guards::{Guards, RejectReason, DETECTOR_GUARDS, LIFECYCLE_GUARDS};
pub use lifecycle::LifecycleDateManager;

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{DateError, DateSettings, LineClassifier, ModelError, StatusModel};
use crate::editor::{FilterChain, Transaction};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid status model: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid date settings: {0}")]
    Dates(#[from] DateError),
}

/// The committer followed by the lifecycle date manager
pub struct StatusPipeline {
    model: Arc<StatusModel>,
    chain: FilterChain,
}

impl StatusPipeline {
    /// Builds a pipeline stamping dates with the system clock
    pub fn new(model: StatusModel, dates: DateSettings) -> Result<Self, PipelineError> {
        Self::with_clock(model, dates, SystemClock)
    }

    pub fn with_clock(
        model: StatusModel,
        dates: DateSettings,
        clock: impl Clock + 'static,
    ) -> Result<Self, PipelineError> {
        model.validate()?;

        let classifier = LineClassifier::new().with_date_markers(dates.markers());
        let model = Arc::new(model);
        let dates = Arc::new(dates);

        let detector = ChangeDetector::new(model.clone()).with_classifier(classifier);
        let committer = StatusCommitter::new(model.clone(), detector);
        let lifecycle = LifecycleDateManager::new(model.clone(), dates, Arc::new(clock))?;

        let chain = FilterChain::new().with(committer).with(lifecycle);
        Ok(Self { model, chain })
    }

    pub fn model(&self) -> &StatusModel {
        &self.model
    }

    /// Runs the transaction through both filters
    pub fn resolve(&self, tr: Transaction) -> Transaction {
        self.chain.resolve(tr)
    }
}
