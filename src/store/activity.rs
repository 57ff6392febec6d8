//! Update capability backed by an `ActivityStore`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::capabilities::{ActivityPatch, ActivityUpdater};
use crate::error::UpdateError;
use crate::store::traits::ActivityStore;

/// Longest address accepted: 64-octet local part, `@`, 255-octet domain.
pub const MAX_EMAIL_LEN: usize = 320;

/// Applies patches to one activity record.
pub struct ActivityRecordUpdater {
    store: Arc<dyn ActivityStore>,
    activity_id: String,
}

impl ActivityRecordUpdater {
    pub fn new(store: Arc<dyn ActivityStore>, activity_id: impl Into<String>) -> Self {
        Self {
            store,
            activity_id: activity_id.into(),
        }
    }
}

#[async_trait]
impl ActivityUpdater for ActivityRecordUpdater {
    async fn update(&self, patch: &ActivityPatch) -> Result<(), UpdateError> {
        let len = patch.email.chars().count();
        if len > MAX_EMAIL_LEN {
            return Err(UpdateError::Validation {
                reason: format!("email is {len} characters, limit is {MAX_EMAIL_LEN}"),
            });
        }

        self.store
            .update_activity_fields(&self.activity_id, &patch.to_fields())
            .await?;
        Ok(())
    }
}
