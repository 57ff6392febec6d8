//! Invocation context — the capabilities a single handler call may use.

use std::sync::Arc;

use uuid::Uuid;

use crate::capabilities::{ActivityUpdater, Extractor};

/// Per-invocation bundle of capabilities.
///
/// The activity record being updated is implicit: it is bound into the
/// `updater` by whoever builds the context. The handler only borrows the
/// context for the duration of one call.
#[derive(Clone)]
pub struct InvocationContext {
    /// Unique invocation ID, used to correlate log lines.
    pub invocation_id: Uuid,
    pub extractor: Arc<dyn Extractor>,
    pub updater: Arc<dyn ActivityUpdater>,
}

impl InvocationContext {
    /// Create a context with a fresh invocation ID.
    pub fn new(extractor: Arc<dyn Extractor>, updater: Arc<dyn ActivityUpdater>) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            extractor,
            updater,
        }
    }
}

impl std::fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationContext")
            .field("invocation_id", &self.invocation_id)
            .finish_non_exhaustive()
    }
}
